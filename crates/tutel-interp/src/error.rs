//! Interpreter error taxonomy (spec.md §7), one-for-one with
//! `ErrorType.py`'s "Interpreter exceptions" section.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InterpError {
    #[error("Execution error: nothing to run at {line}:{column}")]
    NothingToRun { line: u32, column: u32 },

    #[error("Execution error: maximum recursion depth exceeded at {line}:{column}")]
    Recursion { line: u32, column: u32 },

    #[error("Execution error: name '{name}' is not defined at {line}:{column}")]
    NotDefined {
        name: String,
        line: u32,
        column: u32,
    },

    #[error("Execution error: value is not iterable at {line}:{column}")]
    NotIterable { line: u32, column: u32 },

    #[error("Execution error: cannot assign to this expression at {line}:{column}")]
    CannotAssign { line: u32, column: u32 },

    #[error("Execution error: unsupported operand type(s) for '{op}' at {line}:{column}")]
    UnsupportedOperand {
        op: String,
        line: u32,
        column: u32,
    },

    #[error("Execution error: bad operand type for unary '{op}' at {line}:{column}")]
    BadOperandForUnary {
        op: String,
        line: u32,
        column: u32,
    },

    #[error("Execution error: '{type_name}' object has no attribute '{attribute}' at {line}:{column}")]
    Attribute {
        type_name: String,
        attribute: String,
        line: u32,
        column: u32,
    },

    #[error("Execution error: {name}() expected {min}..{max} arguments, got {actual} at {line}:{column}")]
    MismatchedArgsCount {
        name: String,
        min: usize,
        max: usize,
        actual: usize,
        line: u32,
        column: u32,
    },

    #[error("Execution error: index out of range at {line}:{column}")]
    OutOfRange { line: u32, column: u32 },

    #[error("Execution error: cannot assign to built-in name '{name}' at {line}:{column}")]
    BuiltinFunctionShadow {
        name: String,
        line: u32,
        column: u32,
    },

    #[error("Execution error: unexpected type '{type_name}' at {line}:{column}")]
    Type {
        type_name: String,
        line: u32,
        column: u32,
    },

    #[error("Execution error: {message} at {line}:{column}")]
    Unknown {
        message: String,
        line: u32,
        column: u32,
    },

    /// Cooperative termination requested via `Interpreter::stop`; not a
    /// user-visible error (the debugger swallows it rather than rendering
    /// a post-mortem).
    #[error("execution stopped")]
    Stop,
}

impl InterpError {
    /// Position of the error, when it carries one (`Stop` does not).
    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            InterpError::NothingToRun { line, column }
            | InterpError::Recursion { line, column }
            | InterpError::NotDefined { line, column, .. }
            | InterpError::NotIterable { line, column }
            | InterpError::CannotAssign { line, column }
            | InterpError::UnsupportedOperand { line, column, .. }
            | InterpError::BadOperandForUnary { line, column, .. }
            | InterpError::Attribute { line, column, .. }
            | InterpError::MismatchedArgsCount { line, column, .. }
            | InterpError::OutOfRange { line, column }
            | InterpError::BuiltinFunctionShadow { line, column, .. }
            | InterpError::Type { line, column, .. }
            | InterpError::Unknown { line, column, .. } => Some((*line, *column)),
            InterpError::Stop => None,
        }
    }
}

pub type InterpResult<T> = std::result::Result<T, InterpError>;
