//! Error taxonomy for the compiler.
//!
//! Every fallible phase returns [`CompileError`]; the driver prints it to
//! stderr and terminates the process with the exit code of its kind. There is
//! no recovery: the first error wins.

use std::fmt;

use thiserror::Error;

/// Closed set of error kinds, each mapped to a process exit code.
///
/// The runtime kinds (`RuntimeArgType`, `RuntimeCompat`) are never raised by
/// the compiler itself; their codes are baked into the emitted program as
/// `EXIT` operands inside the builtin templates and arithmetic dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed lexeme (exit 1).
    Lexical,
    /// Grammar violation (exit 2).
    Syntax,
    /// Undefined variable, function, getter or setter (exit 3).
    UndefinedSymbol,
    /// Redefinition of a symbol in the same scope (exit 4).
    Redefinition,
    /// Wrong argument count or argument type in a call (exit 5).
    ArgMismatch,
    /// Operand types incompatible in an expression (exit 6).
    TypeMismatch,
    /// Remaining semantic violations (exit 10).
    OtherSemantic,
    /// Runtime type error of a builtin argument (exit 25, emitted code only).
    RuntimeArgType,
    /// Runtime type incompatibility (exit 26, emitted code only).
    RuntimeCompat,
    /// Broken compiler invariant; a bug, not a user error (exit 99).
    Internal,
}

impl ErrorKind {
    /// The process exit code for this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Lexical => 1,
            ErrorKind::Syntax => 2,
            ErrorKind::UndefinedSymbol => 3,
            ErrorKind::Redefinition => 4,
            ErrorKind::ArgMismatch => 5,
            ErrorKind::TypeMismatch => 6,
            ErrorKind::OtherSemantic => 10,
            ErrorKind::RuntimeArgType => 25,
            ErrorKind::RuntimeCompat => 26,
            ErrorKind::Internal => 99,
        }
    }
}

/// Rendering of the offending token for diagnostics.
///
/// Kept as plain strings so this crate does not depend on the lexer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    /// Token kind name, e.g. `IDENTIFIER`.
    pub kind: String,
    /// Token value rendering, e.g. the identifier text or literal value.
    pub value: String,
}

/// A fatal compilation error: kind, message, source line and, when one is at
/// hand, the offending token.
#[derive(Clone, Debug, Error, PartialEq)]
pub struct CompileError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Source line the error was detected on (0 when unknown).
    pub line: u32,
    /// The token under the cursor when the error fired, if any.
    pub token: Option<TokenInfo>,
}

impl CompileError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            token: None,
        }
    }

    /// Attaches the offending token's rendering.
    pub fn with_token(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.token = Some(TokenInfo {
            kind: kind.into(),
            value: value.into(),
        });
        self
    }

    /// The process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    pub fn lexical(message: impl Into<String>, line: u32) -> Self {
        Self::new(ErrorKind::Lexical, message, line)
    }

    pub fn syntax(message: impl Into<String>, line: u32) -> Self {
        Self::new(ErrorKind::Syntax, message, line)
    }

    pub fn undefined(message: impl Into<String>, line: u32) -> Self {
        Self::new(ErrorKind::UndefinedSymbol, message, line)
    }

    pub fn redefinition(message: impl Into<String>, line: u32) -> Self {
        Self::new(ErrorKind::Redefinition, message, line)
    }

    pub fn arg_mismatch(message: impl Into<String>, line: u32) -> Self {
        Self::new(ErrorKind::ArgMismatch, message, line)
    }

    pub fn type_mismatch(message: impl Into<String>, line: u32) -> Self {
        Self::new(ErrorKind::TypeMismatch, message, line)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message, 0)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error (code {}) at line {}: {}",
            self.kind.exit_code(),
            self.line,
            self.message
        )?;
        if let Some(token) = &self.token {
            write!(f, "\n\ttoken type: {}\n\ttoken value: {}", token.kind, token.value)?;
        }
        Ok(())
    }
}

/// Result alias used by all phases.
pub type CompileResult<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ErrorKind::Lexical.exit_code(), 1);
        assert_eq!(ErrorKind::Syntax.exit_code(), 2);
        assert_eq!(ErrorKind::UndefinedSymbol.exit_code(), 3);
        assert_eq!(ErrorKind::Redefinition.exit_code(), 4);
        assert_eq!(ErrorKind::ArgMismatch.exit_code(), 5);
        assert_eq!(ErrorKind::TypeMismatch.exit_code(), 6);
        assert_eq!(ErrorKind::OtherSemantic.exit_code(), 10);
        assert_eq!(ErrorKind::RuntimeArgType.exit_code(), 25);
        assert_eq!(ErrorKind::RuntimeCompat.exit_code(), 26);
        assert_eq!(ErrorKind::Internal.exit_code(), 99);
    }

    #[test]
    fn test_display_without_token() {
        let err = CompileError::syntax("expected '}'", 12);
        assert_eq!(err.to_string(), "error (code 2) at line 12: expected '}'");
    }

    #[test]
    fn test_display_with_token() {
        let err = CompileError::undefined("undefined variable", 3).with_token("IDENTIFIER", "x");
        let text = err.to_string();
        assert!(text.starts_with("error (code 3) at line 3: undefined variable"));
        assert!(text.contains("token type: IDENTIFIER"));
        assert!(text.contains("token value: x"));
    }
}
