//! Identifier and keyword lexing.

use crate::token::{keyword_from_ident, Token, TokenKind, TokenValue};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes `[A-Za-z_][A-Za-z0-9_]*`.
    ///
    /// A `__` prefix makes the identifier global. Anything else is checked
    /// against the keyword table first.
    pub(crate) fn lex_identifier(&mut self) -> Token {
        let start = self.cursor.position();
        while matches!(self.cursor.current_char(), c if c.is_ascii_alphanumeric() || c == '_') {
            self.cursor.advance();
        }

        let text = self.cursor.slice_from(start);

        if text.starts_with("__") {
            return Token::with_value(
                TokenKind::GlobalIdent,
                self.token_line,
                TokenValue::Str(text.to_string()),
            );
        }

        match keyword_from_ident(text) {
            Some(kind) => Token::new(kind, self.token_line),
            None => Token::with_value(
                TokenKind::Ident,
                self.token_line,
                TokenValue::Str(text.to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(source: &str) -> Token {
        Lexer::new(source).next().expect("lexical error")
    }

    #[test]
    fn test_plain_identifier() {
        let token = first("counter1");
        assert_eq!(token.kind, TokenKind::Ident);
        assert_eq!(token.text(), "counter1");
    }

    #[test]
    fn test_keyword() {
        assert_eq!(first("while").kind, TokenKind::KwWhile);
        assert_eq!(first("static").kind, TokenKind::KwStatic);
    }

    #[test]
    fn test_global_identifier() {
        let token = first("__total");
        assert_eq!(token.kind, TokenKind::GlobalIdent);
        assert_eq!(token.text(), "__total");
    }

    #[test]
    fn test_single_underscore_prefix_is_plain() {
        let token = first("_x");
        assert_eq!(token.kind, TokenKind::Ident);
        assert_eq!(token.text(), "_x");
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(first("iffy").kind, TokenKind::Ident);
        assert_eq!(first("variance").kind, TokenKind::Ident);
    }
}
