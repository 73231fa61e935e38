//! ifjc-gen - IFJcode25 emission.
//!
//! A pre-order walk over the resolved AST produces line-oriented stack-VM
//! text. The source language is dynamically typed, so arithmetic,
//! comparisons and the `Ifj.*` builtins dispatch on runtime types read with
//! `TYPE`; bad builtin arguments terminate the emitted program with
//! `EXIT int@25`.

pub mod builtins;
pub mod codegen;
pub mod error;
pub mod escape;
pub mod ops;


pub use codegen::{generate, CodeGen};
pub use error::GenError;
