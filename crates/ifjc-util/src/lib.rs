//! ifjc-util - Shared infrastructure for the IFJ25 compiler.
//!
//! This crate carries the pieces every phase needs:
//! - the diagnostic types (`ErrorKind`, `CompileError`) and their mapping to
//!   process exit codes,
//! - typed-index vectors (`Idx`, `IndexVec`) used for arena storage.

pub mod error;
pub mod index_vec;

pub use error::{CompileError, CompileResult, ErrorKind, TokenInfo};
pub use index_vec::{Idx, IndexVec};
