//! tutel-lex — the Tutel lexer.
//!
//! Turns source text into a stream of [`token::Token`]s, one token at a
//! time, following `LexerModule/Lexer.py`'s dispatch order: whitespace,
//! then end-of-source, comments, identifiers/keywords, string literals,
//! number literals, and operators/punctuators, in that order.

pub mod cursor;
pub mod error;
pub mod lexer;
pub mod token;

pub use cursor::Cursor;
pub use error::{LexError, LexResult};
pub use lexer::Lexer;
pub use token::{Token, TokenKind};
