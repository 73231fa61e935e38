//! Numeric literal lexing.

use ifjc_util::CompileResult;

use crate::token::{Token, TokenKind, TokenValue};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an integer or floating-point literal.
    ///
    /// Decimal digits form an integer; a `.` followed by at least one digit
    /// upgrades to a float, as does an `e`/`E` exponent with optional sign.
    /// A `0x`/`0X` prefix starts a hexadecimal integer.
    pub(crate) fn lex_number(&mut self) -> CompileResult<Token> {
        if self.cursor.current_char() == '0'
            && matches!(self.cursor.peek_char(1), 'x' | 'X')
        {
            self.cursor.advance();
            self.cursor.advance();
            return self.lex_hex_integer();
        }

        let start = self.cursor.position();
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        let mut is_float = false;

        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            is_float = true;
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        if matches!(self.cursor.current_char(), 'e' | 'E') {
            is_float = true;
            self.cursor.advance();
            if matches!(self.cursor.current_char(), '+' | '-') {
                self.cursor.advance();
            }
            if !self.cursor.current_char().is_ascii_digit() {
                return Err(self.error("missing digits in float exponent"));
            }
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }

        let text = self.cursor.slice_from(start);

        if is_float {
            match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Token::with_value(
                    TokenKind::FloatLit,
                    self.token_line,
                    TokenValue::Float(value),
                )),
                _ => Err(self.error(format!("invalid float literal '{}'", text))),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Ok(Token::with_value(
                    TokenKind::IntLit,
                    self.token_line,
                    TokenValue::Int(value),
                )),
                Err(_) => Err(self.error(format!("integer literal '{}' out of range", text))),
            }
        }
    }

    /// Lexes the digits of a hex integer; the `0x` prefix is already gone.
    fn lex_hex_integer(&mut self) -> CompileResult<Token> {
        let start = self.cursor.position();
        while self.cursor.current_char().is_ascii_hexdigit() {
            self.cursor.advance();
        }

        let digits = self.cursor.slice_from(start);
        if digits.is_empty() {
            return Err(self.error("missing digits after '0x'"));
        }

        match i64::from_str_radix(digits, 16) {
            Ok(value) => Ok(Token::with_value(
                TokenKind::IntLit,
                self.token_line,
                TokenValue::Int(value),
            )),
            Err(_) => Err(self.error(format!("hex literal '0x{}' out of range", digits))),
        }
    }
}
