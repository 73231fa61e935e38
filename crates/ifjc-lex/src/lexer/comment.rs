//! Whitespace and comment skipping.

use ifjc_util::CompileResult;

use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Skips spaces, tabs, carriage returns and comments.
    ///
    /// Line feeds are left in place; the dispatcher turns them into `EOL`
    /// tokens. A carriage return is silently discarded.
    pub(crate) fn skip_blanks_and_comments(&mut self) -> CompileResult<()> {
        loop {
            match self.cursor.current_char() {
                ' ' | '\t' | '\r' => self.cursor.advance(),
                '/' => {
                    if self.cursor.peek_char(1) == '/' {
                        self.cursor.advance();
                        self.cursor.advance();
                        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                            self.cursor.advance();
                        }
                    } else if self.cursor.peek_char(1) == '*' {
                        self.cursor.advance();
                        self.cursor.advance();
                        self.skip_block_comment()?;
                    } else {
                        return Ok(());
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skips a block comment body, honouring unbounded nesting.
    fn skip_block_comment(&mut self) -> CompileResult<()> {
        let start_line = self.cursor.line();
        let mut depth = 1u32;

        while depth > 0 && !self.cursor.is_at_end() {
            if self.cursor.current_char() == '/' && self.cursor.peek_char(1) == '*' {
                self.cursor.advance();
                self.cursor.advance();
                depth += 1;
            } else if self.cursor.current_char() == '*' && self.cursor.peek_char(1) == '/' {
                self.cursor.advance();
                self.cursor.advance();
                depth -= 1;
            } else {
                self.cursor.advance();
            }
        }

        if depth > 0 {
            return Err(ifjc_util::CompileError::lexical(
                "unterminated block comment",
                start_line,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::token::TokenKind;
    use crate::Lexer;

    fn first_kind(source: &str) -> TokenKind {
        Lexer::new(source).next().expect("lexical error").kind
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(first_kind("// nothing here\nvar"), TokenKind::Eol);
        let mut lexer = Lexer::new("// only a comment");
        assert_eq!(lexer.next().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_block_comment() {
        assert_eq!(first_kind("/* skip */ var"), TokenKind::KwVar);
    }

    #[test]
    fn test_nested_block_comment() {
        assert_eq!(first_kind("/* a /* b /* c */ */ */ if"), TokenKind::KwIf);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut lexer = Lexer::new("/* never closed");
        let err = lexer.next().unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_line_counter_counts_comment_newlines() {
        let mut lexer = Lexer::new("/* a\nb\nc */ x");
        let token = lexer.next().unwrap();
        assert_eq!(token.kind, TokenKind::Ident);
        assert_eq!(token.line, 3);
    }
}
