//! Error handling module for the `tutel` CLI.
//!
//! Library crates (`tutel-lex`, `tutel-par`, `tutel-interp`, `tutel-debug`)
//! each own their own `thiserror::Error` taxonomy; this binary aggregates
//! them behind one enum at the process boundary and maps each variant to
//! the exit code spec.md §6 assigns it, the same separation the teacher
//! draws between its library-ish command modules and its own aggregate
//! error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TutelCliError {
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Lex(#[from] tutel_lex::LexError),

    #[error("{0}")]
    Parse(#[from] tutel_par::ParseError),

    #[error("{0}")]
    Interp(#[from] tutel_interp::InterpError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TutelCliError {
    /// The batch-runner process exit code for this error, per spec.md §6:
    /// `-1` file not found, `-2` lexical error, `-3` parse error,
    /// `-4` runtime error, `0` success.
    pub fn exit_code(&self) -> i32 {
        match self {
            TutelCliError::FileNotFound(_) => -1,
            TutelCliError::Lex(_) => -2,
            TutelCliError::Parse(_) => -3,
            TutelCliError::Interp(_) => -4,
            TutelCliError::Io(_) | TutelCliError::Config(_) => -4,
        }
    }
}

pub type Result<T> = std::result::Result<T, TutelCliError>;
