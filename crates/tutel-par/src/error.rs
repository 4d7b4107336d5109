//! Syntax error taxonomy (spec.md §7), one-for-one with
//! `ErrorType.py`'s `*Exception` classes raised by the parser.
//!
//! Every variant carries the name of the `try_parse_*` rule that raised
//! it (`method`, mirroring the original's `self.<rule>.__name__`) and the
//! token actually found, so the rendered message reads the same as the
//! original: `"Syntax error: <rule>: <what was expected> instead got
//! '<token>' at <line>:<column>"`.

use thiserror::Error;
use tutel_lex::LexError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// A lexical error encountered while the parser was pulling tokens.
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Syntax error: {method}: missing function body (block or statement) instead got '{found}' at {line}:{column}")]
    MissingFunctionBlock {
        method: &'static str,
        found: String,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: redefinition of function '{found}' at {line}:{column}")]
    FunctionRedefinition {
        method: &'static str,
        found: String,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing '(', instead got '{found}' at {line}:{column}")]
    MissingLeftBracket {
        method: &'static str,
        found: String,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing ')', instead got '{found}' at {line}:{column}")]
    MissingRightBracket {
        method: &'static str,
        found: String,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing identifier after comma, instead got '{found}' at {line}:{column}")]
    MissingIdentifierAfterComma {
        method: &'static str,
        found: String,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing expression after comma, instead got '{found}' at {line}:{column}")]
    MissingExpressionAfterComma {
        method: &'static str,
        found: String,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing '}}', instead got '{found}' at {line}:{column}")]
    MissingRightCurlyBracket {
        method: &'static str,
        found: String,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing ';', instead got '{found}' at {line}:{column}")]
    MissingSemicolon {
        method: &'static str,
        found: String,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing right side of expression at {line}:{column}")]
    MissingRightSideOfAssignment {
        method: &'static str,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing statement condition at {line}:{column}")]
    MissingCondition {
        method: &'static str,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing statement body at {line}:{column}")]
    MissingBody {
        method: &'static str,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing iterator at {line}:{column}")]
    MissingIterator {
        method: &'static str,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing 'in' keyword at {line}:{column}")]
    MissingKeywordIn {
        method: &'static str,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing iterable at {line}:{column}")]
    MissingIterable {
        method: &'static str,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing right side of expression at {line}:{column}")]
    ExprMissingRightSide {
        method: &'static str,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing identifier after dot operator at {line}:{column}")]
    MissingIdentifierAfterDot {
        method: &'static str,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: missing ']', instead got '{found}' at {line}:{column}")]
    MissingRightSquareBracket {
        method: &'static str,
        found: String,
        line: u32,
        column: u32,
    },

    #[error("Syntax error: {method}: unknown character (not a function def): '{found}' at {line}:{column}")]
    MissingEtx {
        method: &'static str,
        found: String,
        line: u32,
        column: u32,
    },
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;
