//! Core lexer: dispatch, lookahead and the prologue reader.

use ifjc_util::{CompileError, CompileResult};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Lexer for IFJ25 source text.
///
/// Produces one token per [`next`](Lexer::next) call; [`peek`](Lexer::peek)
/// buffers a single token of lookahead. Whitespace and comments never reach
/// the caller, and consecutive line feeds collapse into one `EOL` token.
pub struct Lexer<'a> {
    /// Character cursor for source traversal.
    pub(crate) cursor: Cursor<'a>,

    /// Buffered lookahead token.
    peeked: Option<Token>,

    /// Whether the previously produced token was an `EOL`.
    last_was_eol: bool,

    /// Line the current token started on.
    pub(crate) token_line: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            peeked: None,
            last_was_eol: false,
            token_line: 1,
        }
    }

    /// Consumes and returns the next token.
    pub fn next(&mut self) -> CompileResult<Token> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }
        self.scan_token()
    }

    /// Buffers and returns the next token without consuming it.
    pub fn peek(&mut self) -> CompileResult<&Token> {
        if self.peeked.is_none() {
            let token = self.scan_token()?;
            self.peeked = Some(token);
        }
        Ok(self.peeked.as_ref().expect("lookahead buffer just filled"))
    }

    /// Current line number of the cursor.
    pub fn line(&self) -> u32 {
        self.cursor.line()
    }

    /// Consumes the mandatory program prologue: `import "ifj25" for Ifj`
    /// followed by a line break or end of input. Leading blank lines are
    /// skipped. Any deviation is a syntax error.
    pub fn read_prologue(&mut self) -> CompileResult<()> {
        let mut token = self.next()?;
        while token.kind == TokenKind::Eol {
            token = self.next()?;
        }

        if token.kind != TokenKind::KwImport {
            return Err(self.prologue_error(token.line));
        }
        let module = self.next()?;
        if module.kind != TokenKind::StrLit || module.text() != "ifj25" {
            return Err(self.prologue_error(module.line));
        }
        let token = self.next()?;
        if token.kind != TokenKind::KwFor {
            return Err(self.prologue_error(token.line));
        }
        let token = self.next()?;
        if token.kind != TokenKind::KwIfj {
            return Err(self.prologue_error(token.line));
        }
        let token = self.next()?;
        if token.kind != TokenKind::Eol && token.kind != TokenKind::Eof {
            return Err(self.prologue_error(token.line));
        }
        Ok(())
    }

    fn prologue_error(&self, line: u32) -> CompileError {
        CompileError::syntax("invalid prologue, expected 'import \"ifj25\" for Ifj'", line)
    }

    /// Scans one token from the source.
    fn scan_token(&mut self) -> CompileResult<Token> {
        loop {
            self.skip_blanks_and_comments()?;

            if self.cursor.is_at_end() {
                return Ok(Token::new(TokenKind::Eof, self.cursor.line()));
            }

            if self.cursor.current_char() == '\n' {
                let line = self.cursor.line();
                self.cursor.advance();
                if self.last_was_eol {
                    continue;
                }
                self.last_was_eol = true;
                return Ok(Token::new(TokenKind::Eol, line));
            }

            break;
        }

        self.last_was_eol = false;
        self.token_line = self.cursor.line();

        match self.cursor.current_char() {
            '(' => Ok(self.single(TokenKind::LPar)),
            ')' => Ok(self.single(TokenKind::RPar)),
            '{' => Ok(self.single(TokenKind::LCurly)),
            '}' => Ok(self.single(TokenKind::RCurly)),
            ',' => Ok(self.single(TokenKind::Comma)),
            '.' => Ok(self.single(TokenKind::Dot)),
            '+' => Ok(self.single(TokenKind::Plus)),
            '-' => Ok(self.single(TokenKind::Minus)),
            '*' => Ok(self.single(TokenKind::Star)),
            '/' => Ok(self.single(TokenKind::Slash)),
            '=' => Ok(self.lex_equals()),
            '<' => Ok(self.lex_less()),
            '>' => Ok(self.lex_greater()),
            '!' => Ok(self.lex_bang()),
            '&' => self.lex_ampersand(),
            '|' => self.lex_pipe(),
            '"' => self.lex_string(),
            c if c.is_ascii_digit() => self.lex_number(),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.lex_identifier()),
            c => Err(self.error(format!("unexpected character '{}'", c))),
        }
    }

    /// Consumes one character and returns a payload-free token.
    pub(crate) fn single(&mut self, kind: TokenKind) -> Token {
        self.cursor.advance();
        Token::new(kind, self.token_line)
    }

    /// Builds a lexical error at the current token's start line.
    pub(crate) fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::lexical(message, self.token_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenValue;

    /// Collects all tokens up to and including EOF.
    fn lex_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next().expect("lexical error");
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex_all(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_prologue_token_sequence() {
        let tokens = lex_all("import \"ifj25\" for Ifj\n");
        let expected = [
            TokenKind::KwImport,
            TokenKind::StrLit,
            TokenKind::KwFor,
            TokenKind::KwIfj,
            TokenKind::Eol,
            TokenKind::Eof,
        ];
        let got: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(got, expected);
        assert_eq!(tokens[1].value, TokenValue::Str("ifj25".into()));
    }

    #[test]
    fn test_read_prologue_accepts_canonical_header() {
        let mut lexer = Lexer::new("import \"ifj25\" for Ifj\nclass");
        assert!(lexer.read_prologue().is_ok());
        assert_eq!(lexer.next().unwrap().kind, TokenKind::KwClass);
    }

    #[test]
    fn test_read_prologue_skips_leading_blank_lines() {
        let mut lexer = Lexer::new("\n\n\nimport \"ifj25\" for Ifj\n");
        assert!(lexer.read_prologue().is_ok());
    }

    #[test]
    fn test_read_prologue_accepts_eof_terminator() {
        let mut lexer = Lexer::new("import \"ifj25\" for Ifj");
        assert!(lexer.read_prologue().is_ok());
    }

    #[test]
    fn test_read_prologue_rejects_wrong_module() {
        let mut lexer = Lexer::new("import \"ifj24\" for Ifj\n");
        let err = lexer.read_prologue().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_read_prologue_rejects_missing_for() {
        let mut lexer = Lexer::new("import \"ifj25\" Ifj\n");
        assert!(lexer.read_prologue().is_err());
    }

    #[test]
    fn test_consecutive_newlines_collapse() {
        let got = kinds("a\n\n\nb");
        assert_eq!(
            got,
            vec![TokenKind::Ident, TokenKind::Eol, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_no_two_consecutive_eols_with_comments_between() {
        let got = kinds("a\n// comment\n\n/* block */\nb");
        assert_eq!(
            got,
            vec![TokenKind::Ident, TokenKind::Eol, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_peek_buffers_one_token() {
        let mut lexer = Lexer::new("a b");
        assert_eq!(lexer.peek().unwrap().kind, TokenKind::Ident);
        assert_eq!(lexer.peek().unwrap().text(), "a");
        let token = lexer.next().unwrap();
        assert_eq!(token.text(), "a");
        assert_eq!(lexer.next().unwrap().text(), "b");
    }

    #[test]
    fn test_carriage_return_is_discarded() {
        let got = kinds("a\r\nb");
        assert_eq!(
            got,
            vec![TokenKind::Ident, TokenKind::Eol, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_token_lines() {
        let tokens = lex_all("a\nb");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 1); // the EOL itself
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = Lexer::new("@");
        let err = lexer.next().unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
