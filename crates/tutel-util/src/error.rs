//! Core error types for tutel-util.
//!
//! This covers the shared plumbing (symbol interning) used by every later
//! phase. Lexer/parser/interpreter/debugger errors live in their own
//! crates as their own `thiserror::Error` enums.

use thiserror::Error;

/// Error type for symbol interning operations.
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("Failed to intern symbol: {0}")]
    InternFailed(String),

    #[error("Symbol not found: index {index}")]
    NotFound { index: u32 },
}

/// Result type alias for symbol operations.
pub type SymbolResult<T> = std::result::Result<T, SymbolError>;
