//! ifjc-sym - Symbol store for the IFJ25 compiler.
//!
//! Symbols live in open-addressed hash tables, one table per scope, arranged
//! on a stack that is pushed for every function body and `{…}` block.
//! Functions, getters and setters share the identifier namespace with
//! variables; they are disambiguated by a systematic name suffix (`$arity`,
//! `#get`, `#set`) so a single table per scope suffices.

pub mod scope;
pub mod symbol;
pub mod types;

pub use scope::{Scope, ScopeStack};
pub use symbol::{mangle, Symbol, SymbolKind};
pub use types::TypeMask;
