//! String literal lexing.

use ifjc_util::CompileResult;

use crate::token::{Token, TokenKind, TokenValue};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a string literal starting at a `"`.
    ///
    /// `""` is the empty string; `"""` opens a multi-line string.
    pub(crate) fn lex_string(&mut self) -> CompileResult<Token> {
        self.cursor.advance();

        if self.cursor.current_char() == '"' {
            self.cursor.advance();
            if self.cursor.current_char() == '"' {
                self.cursor.advance();
                return self.lex_multiline_string();
            }
            return Ok(Token::with_value(
                TokenKind::StrLit,
                self.token_line,
                TokenValue::Str(String::new()),
            ));
        }

        let mut content = String::new();

        loop {
            if self.cursor.is_at_end() {
                return Err(self.error("unterminated string literal"));
            }

            let c = self.cursor.current_char();

            if c == '"' {
                self.cursor.advance();
                break;
            }

            // Raw control bytes, the line feed included, may not appear in a
            // single-line string.
            if (c as u32) < 32 {
                return Err(self.error("control character in string literal"));
            }

            if c == '\\' {
                self.cursor.advance();
                content.push(self.lex_escape()?);
            } else {
                content.push(c);
                self.cursor.advance();
            }
        }

        Ok(Token::with_value(
            TokenKind::StrLit,
            self.token_line,
            TokenValue::Str(content),
        ))
    }

    /// Lexes the body of a `"""…"""` string; the opening quotes are gone.
    ///
    /// The first line feed after the opening is dropped; later line feeds are
    /// part of the value. Inner quotes that are not a closing triple are
    /// preserved. Escape sequences are processed the same way as in
    /// single-line strings.
    fn lex_multiline_string(&mut self) -> CompileResult<Token> {
        if self.cursor.current_char() == '\r' {
            self.cursor.advance();
        }
        if self.cursor.current_char() == '\n' {
            self.cursor.advance();
        }

        let mut content = String::new();

        loop {
            if self.cursor.is_at_end() {
                return Err(self.error("unterminated multiline string literal"));
            }

            if self.cursor.current_char() == '"'
                && self.cursor.peek_char(1) == '"'
                && self.cursor.peek_char(2) == '"'
            {
                self.cursor.advance();
                self.cursor.advance();
                self.cursor.advance();
                break;
            }

            let c = self.cursor.current_char();
            if c == '\\' {
                self.cursor.advance();
                content.push(self.lex_escape()?);
            } else if c == '\r' {
                self.cursor.advance();
            } else {
                content.push(c);
                self.cursor.advance();
            }
        }

        Ok(Token::with_value(
            TokenKind::MultilineStrLit,
            self.token_line,
            TokenValue::Str(content),
        ))
    }

    /// Lexes one escape sequence; the backslash is already consumed.
    ///
    /// Recognised: `\"`, `\n`, `\r`, `\t`, `\\`, `\0`, `\xHH` with the value
    /// restricted to 0…127.
    fn lex_escape(&mut self) -> CompileResult<char> {
        if self.cursor.is_at_end() {
            return Err(self.error("unterminated escape sequence"));
        }

        let c = self.cursor.current_char();
        self.cursor.advance();

        match c {
            '"' => Ok('"'),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            '\\' => Ok('\\'),
            '0' => Ok('\0'),
            'x' => {
                let mut value: u32 = 0;
                for _ in 0..2 {
                    let h = self.cursor.current_char();
                    let digit = h
                        .to_digit(16)
                        .ok_or_else(|| self.error("invalid hex escape in string literal"))?;
                    value = value * 16 + digit;
                    self.cursor.advance();
                }
                if value > 127 {
                    return Err(self.error("hex escape value out of range (0..=127)"));
                }
                Ok(value as u8 as char)
            }
            _ => Err(self.error(format!("unknown escape sequence '\\{}'", c))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(source: &str) -> Token {
        Lexer::new(source).next().expect("lexical error")
    }

    fn first_err(source: &str) -> ifjc_util::CompileError {
        Lexer::new(source).next().unwrap_err()
    }

    fn str_value(token: &Token) -> &str {
        token.value.as_str().expect("string payload")
    }

    #[test]
    fn test_plain_string() {
        let token = first("\"hello\"");
        assert_eq!(token.kind, TokenKind::StrLit);
        assert_eq!(str_value(&token), "hello");
    }

    #[test]
    fn test_empty_string_is_not_multiline_start() {
        let mut lexer = Lexer::new("\"\" x");
        let token = lexer.next().unwrap();
        assert_eq!(token.kind, TokenKind::StrLit);
        assert_eq!(str_value(&token), "");
        assert_eq!(lexer.next().unwrap().kind, TokenKind::Ident);
    }

    #[test]
    fn test_escapes() {
        let token = first(r#""a\nb\tc\\d\"e\rf\0g""#);
        assert_eq!(str_value(&token), "a\nb\tc\\d\"e\rf\0g");
    }

    #[test]
    fn test_hex_escape() {
        assert_eq!(str_value(&first(r#""\x41""#)), "A");
        assert_eq!(str_value(&first(r#""\x7F""#)), "\x7f");
        assert_eq!(str_value(&first(r#""\x00""#)), "\0");
    }

    #[test]
    fn test_hex_escape_out_of_range() {
        assert_eq!(first_err(r#""\x80""#).exit_code(), 1);
        assert_eq!(first_err(r#""\xFF""#).exit_code(), 1);
    }

    #[test]
    fn test_hex_escape_bad_digit() {
        assert_eq!(first_err(r#""\xg1""#).exit_code(), 1);
    }

    #[test]
    fn test_raw_newline_in_string_is_error() {
        assert_eq!(first_err("\"a\nb\"").exit_code(), 1);
    }

    #[test]
    fn test_raw_control_byte_is_error() {
        assert_eq!(first_err("\"a\u{1}b\"").exit_code(), 1);
    }

    #[test]
    fn test_unterminated_string() {
        assert_eq!(first_err("\"open").exit_code(), 1);
    }

    #[test]
    fn test_multiline_basic() {
        let token = first("\"\"\"\nhello\nworld\"\"\"");
        assert_eq!(token.kind, TokenKind::MultilineStrLit);
        assert_eq!(str_value(&token), "hello\nworld");
    }

    #[test]
    fn test_multiline_first_linefeed_dropped_only_once() {
        let token = first("\"\"\"\n\nx\"\"\"");
        assert_eq!(str_value(&token), "\nx");
    }

    #[test]
    fn test_multiline_without_leading_linefeed() {
        let token = first("\"\"\"abc\"\"\"");
        assert_eq!(str_value(&token), "abc");
    }

    #[test]
    fn test_multiline_preserves_inner_quotes() {
        let token = first("\"\"\"say \"hi\" twice\"\"\"");
        assert_eq!(str_value(&token), "say \"hi\" twice");
    }

    #[test]
    fn test_multiline_processes_escapes() {
        // The body `"\n` yields a quote followed by a real newline, not the
        // two-character sequence backslash-n.
        let token = first("\"\"\"\"\\n\"\"\"");
        assert_eq!(str_value(&token), "\"\n");
    }

    #[test]
    fn test_multiline_counts_lines() {
        let mut lexer = Lexer::new("\"\"\"\na\nb\"\"\" x");
        lexer.next().unwrap();
        let token = lexer.next().unwrap();
        assert_eq!(token.kind, TokenKind::Ident);
        assert_eq!(token.line, 3);
    }

    #[test]
    fn test_multiline_unterminated() {
        assert_eq!(first_err("\"\"\"abc\"\"").exit_code(), 1);
    }
}
