//! Operator lexing.
//!
//! Two-character operators are read by committing the first character and
//! peeking one more; on a mismatch the peeked character stays in the source.

use ifjc_util::CompileResult;

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes `=` or `==`.
    pub(crate) fn lex_equals(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::new(TokenKind::EqEq, self.token_line)
        } else {
            Token::new(TokenKind::Assign, self.token_line)
        }
    }

    /// Lexes `<` or `<=`.
    pub(crate) fn lex_less(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::new(TokenKind::LtEq, self.token_line)
        } else {
            Token::new(TokenKind::Lt, self.token_line)
        }
    }

    /// Lexes `>` or `>=`.
    pub(crate) fn lex_greater(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::new(TokenKind::GtEq, self.token_line)
        } else {
            Token::new(TokenKind::Gt, self.token_line)
        }
    }

    /// Lexes `!` or `!=`.
    pub(crate) fn lex_bang(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            Token::new(TokenKind::NotEq, self.token_line)
        } else {
            Token::new(TokenKind::Not, self.token_line)
        }
    }

    /// Lexes `&&`; a lone `&` is a lexical error.
    pub(crate) fn lex_ampersand(&mut self) -> CompileResult<Token> {
        self.cursor.advance();
        if self.cursor.match_char('&') {
            Ok(Token::new(TokenKind::AndAnd, self.token_line))
        } else {
            Err(self.error("unexpected character '&', did you mean '&&'?"))
        }
    }

    /// Lexes `||`; a lone `|` is a lexical error.
    pub(crate) fn lex_pipe(&mut self) -> CompileResult<Token> {
        self.cursor.advance();
        if self.cursor.match_char('|') {
            Ok(Token::new(TokenKind::OrOr, self.token_line))
        } else {
            Err(self.error("unexpected character '|', did you mean '||'?"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next().expect("lexical error");
            if token.kind == TokenKind::Eof {
                break;
            }
            kinds.push(token.kind);
        }
        kinds
    }

    #[test]
    fn test_single_char_operators() {
        assert_eq!(
            kinds("+ - * / < > ="),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Assign,
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("== != <= >= && ||"),
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::AndAnd,
                TokenKind::OrOr,
            ]
        );
    }

    #[test]
    fn test_mismatch_pushes_peeked_character_back() {
        // `=!` is assignment followed by logical not
        assert_eq!(kinds("=!"), vec![TokenKind::Assign, TokenKind::Not]);
        assert_eq!(kinds("<5"), vec![TokenKind::Lt, TokenKind::IntLit]);
    }

    #[test]
    fn test_lone_ampersand_and_pipe_are_errors() {
        assert_eq!(Lexer::new("&x").next().unwrap_err().exit_code(), 1);
        assert_eq!(Lexer::new("|x").next().unwrap_err().exit_code(), 1);
    }
}
