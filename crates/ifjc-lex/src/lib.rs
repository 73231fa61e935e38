//! ifjc-lex - Lexical analyser for IFJ25.
//!
//! Transforms source text into a stream of [`Token`]s with one-token
//! lookahead. The lexer is hand-written: a [`Cursor`] walks the characters,
//! and per-family methods (`lex_identifier`, `lex_number`, …) build tokens.
//!
//! Two behaviours worth calling out:
//! - consecutive line feeds collapse into a single `EOL` token before they
//!   leave the lexer, so the parser never sees two `EOL`s in a row;
//! - [`Lexer::read_prologue`] consumes the mandatory
//!   `import "ifj25" for Ifj` header in one shot.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{keyword_from_ident, Token, TokenKind, TokenValue};
