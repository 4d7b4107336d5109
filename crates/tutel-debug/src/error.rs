//! Debugger error taxonomy, grounded in the exceptions
//! `TutelDebugger.py`/`TutelDebuggerInteractive.py` raise while servicing a
//! request: a malformed command line, a breakpoint on a non-statement
//! line, an out-of-range frame index, or a source file that doesn't parse.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DebuggerError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Lex(#[from] tutel_lex::LexError),

    #[error("{0}")]
    Parse(#[from] tutel_par::ParseError),

    #[error("no source file is loaded, use 'file' first")]
    NoFileLoaded,

    #[error("unknown file '{0}'")]
    UnknownFile(String),

    #[error("could not set breakpoint at line {line}, it is not a statement boundary")]
    InvalidBreakpointLine { line: u32 },

    #[error("there is no breakpoint at line {line}")]
    NoSuchBreakpoint { line: u32 },

    #[error("stack index out of range, stack size is {depth}")]
    NoSuchFrame { depth: usize },

    #[error("unknown command")]
    UnknownCommand,

    #[error("usage: {usage}")]
    InvalidArgs { usage: &'static str },

    #[error("command not terminated properly")]
    CommandNotEndedProperly,

    #[error("program is already running, use 'restart' to restart it")]
    AlreadyRunning,

    #[error("program is not running, use 'run' to run it")]
    NotRunning,
}

pub type DebuggerResult<T> = std::result::Result<T, DebuggerError>;
