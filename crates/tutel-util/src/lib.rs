//! tutel-util — shared foundation types for the Tutel front end, interpreter,
//! and debugger.
//!
//! One concern lives here because every later crate needs it:
//!
//! - [`symbol`] — interned identifiers (`Symbol`), so the lexer, parser,
//!   interpreter, and debugger can compare names in O(1) instead of hashing
//!   or comparing strings at every lookup.
//!
//! Tokens and AST nodes carry their `(line, column)` directly as `u32`
//! fields rather than through a separate span/source-map type (spec.md §3:
//! a `Token` is `{kind, value, line, column}`; each AST node carries
//! `line`) — one Tutel program is one file, so there is no cross-file
//! span bookkeeping to do.
//!
//! Everything else (lexical, syntactic, semantic, and debugger error
//! taxonomies) lives in the crate that owns that phase.

pub mod error;
pub mod symbol;

pub use error::{SymbolError, SymbolResult};
pub use rustc_hash::{FxHashMap, FxHashSet};
pub use symbol::Symbol;
