//! Code-generator errors.
//!
//! All of these are broken compiler invariants rather than user errors; the
//! driver maps them to the internal error kind (exit 99).

use ifjc_util::{CompileError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("unknown operator '{0}' in code generation")]
    UnknownOperator(String),

    #[error("unknown literal kind '{0}' in code generation")]
    UnknownLiteral(String),

    #[error("unknown builtin 'Ifj.{0}'")]
    UnknownBuiltin(String),

    #[error("malformed syntax tree: {0}")]
    MalformedTree(&'static str),
}

impl From<GenError> for CompileError {
    fn from(err: GenError) -> Self {
        CompileError::new(ErrorKind::Internal, err.to_string(), 0)
    }
}
