//! Lexical error taxonomy (spec.md §7), one-for-one with
//! `ErrorType.py`'s `*LexerException` classes.

use thiserror::Error;

use crate::token::{Token, TokenKind};

/// Maximum identifier length in characters.
pub const MAX_IDENTIFIER_LENGTH: usize = 64;
/// Maximum string literal length in characters.
pub const MAX_TEXT_CONST_LENGTH: usize = 1024;
/// Maximum comment length in characters.
pub const MAX_COMMENT_LENGTH: usize = 1024;
/// Maximum value of an integer literal.
pub const MAX_INTEGER: i64 = 2_147_483_647;

/// An error raised while scanning source text into tokens.
///
/// `Display` renders the exact `"Lexical error: ... at <line>:<column>"`
/// line spec.md §7 requires.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("Lexical error: symbol '{symbol}' at {line}:{column} is not recognized")]
    UnknownToken {
        symbol: String,
        line: u32,
        column: u32,
    },

    #[error(
        "Lexical error: identifier '{prefix}...' at {line}:{column} is too long (max length: {MAX_IDENTIFIER_LENGTH})"
    )]
    IdentifierTooLong {
        prefix: String,
        line: u32,
        column: u32,
    },

    #[error(
        "Lexical error: comment '{prefix}...' at {line}:{column} is too long (max length: {MAX_COMMENT_LENGTH})"
    )]
    CommentTooLong {
        prefix: String,
        line: u32,
        column: u32,
    },

    #[error(
        "Lexical error: string '{prefix}...' at {line}:{column} is too long (max length: {MAX_TEXT_CONST_LENGTH})"
    )]
    TextConstTooLong {
        prefix: String,
        line: u32,
        column: u32,
    },

    #[error("Lexical error: unterminated text const at {line}:{column}")]
    UnterminatedString { line: u32, column: u32 },

    #[error("Lexical error: leading zeros in integer at {line}:{column} are not allowed")]
    LeadingZerosInInteger { line: u32, column: u32 },

    #[error("Lexical error: integer at {line}:{column} is too large (max: {MAX_INTEGER})")]
    IntegerTooLarge { line: u32, column: u32 },

    #[error("Lexical error: unknown escaped character '\\{escaped}' at {line}:{column}")]
    UnknownEscaping {
        escaped: char,
        line: u32,
        column: u32,
    },
}

impl LexError {
    pub fn line(&self) -> u32 {
        match self {
            LexError::UnknownToken { line, .. }
            | LexError::IdentifierTooLong { line, .. }
            | LexError::CommentTooLong { line, .. }
            | LexError::TextConstTooLong { line, .. }
            | LexError::UnterminatedString { line, .. }
            | LexError::LeadingZerosInInteger { line, .. }
            | LexError::IntegerTooLarge { line, .. }
            | LexError::UnknownEscaping { line, .. } => *line,
        }
    }

    pub fn column(&self) -> u32 {
        match self {
            LexError::UnknownToken { column, .. }
            | LexError::IdentifierTooLong { column, .. }
            | LexError::CommentTooLong { column, .. }
            | LexError::TextConstTooLong { column, .. }
            | LexError::UnterminatedString { column, .. }
            | LexError::LeadingZerosInInteger { column, .. }
            | LexError::IntegerTooLarge { column, .. }
            | LexError::UnknownEscaping { column, .. } => *column,
        }
    }

    /// The partial token this error aborted scanning, if any, so a debugger
    /// can display what was read before the error fired rather than just
    /// the error itself.
    pub fn partial_token(&self) -> Option<Token> {
        match self {
            LexError::UnknownToken { symbol, line, column } => Some(Token::new(
                TokenKind::Unknown(symbol.clone()),
                *line,
                *column,
            )),
            LexError::IdentifierTooLong { prefix, line, column }
            | LexError::CommentTooLong { prefix, line, column }
            | LexError::TextConstTooLong { prefix, line, column } => Some(Token::new(
                TokenKind::Illegal(prefix.clone()),
                *line,
                *column,
            )),
            LexError::UnterminatedString { .. }
            | LexError::LeadingZerosInInteger { .. }
            | LexError::IntegerTooLarge { .. }
            | LexError::UnknownEscaping { .. } => None,
        }
    }
}

pub type LexResult<T> = std::result::Result<T, LexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_token_has_a_partial_token() {
        let err = LexError::UnknownToken {
            symbol: "@".into(),
            line: 1,
            column: 3,
        };
        assert_eq!(
            err.partial_token(),
            Some(Token::new(TokenKind::Unknown("@".into()), 1, 3))
        );
    }

    #[test]
    fn too_long_errors_have_an_illegal_partial_token() {
        let err = LexError::IdentifierTooLong {
            prefix: "abc".into(),
            line: 2,
            column: 1,
        };
        assert_eq!(
            err.partial_token(),
            Some(Token::new(TokenKind::Illegal("abc".into()), 2, 1))
        );
    }

    #[test]
    fn other_errors_have_no_partial_token() {
        let err = LexError::UnterminatedString { line: 1, column: 1 };
        assert_eq!(err.partial_token(), None);
    }
}
