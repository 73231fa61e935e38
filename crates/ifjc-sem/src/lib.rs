//! ifjc-sem - Semantic analysis for IFJ25.
//!
//! The binary-operand rules run while the parser reduces expressions (they
//! live in `ifjc_par::types`); this crate finishes the job after parsing:
//!
//! - [`resolve_deferred`] walks the deferred-reference list and fixes the
//!   meaning of calls and assignments whose target declaration appeared
//!   later in the source;
//! - [`check_declared`] verifies every callable name in the global scope
//!   reached its definition site.

pub mod resolve;

pub use resolve::{check_declared, resolve_deferred};
