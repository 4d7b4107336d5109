//! The Tutel lexer: turns source text into a stream of [`Token`]s.
//!
//! Grounded directly in `LexerModule/Lexer.py::get_next_token`'s seven-step
//! decision order (spec.md §4.2): skip whitespace, then try end-of-source,
//! comment, identifier-or-keyword, string, number, operator, in that order;
//! whichever succeeds first wins.

use crate::cursor::Cursor;
use crate::error::{
    LexError, LexResult, MAX_COMMENT_LENGTH, MAX_IDENTIFIER_LENGTH, MAX_INTEGER,
    MAX_TEXT_CONST_LENGTH,
};
use crate::token::{Token, TokenKind};

/// Lexes a single Tutel source file into a stream of tokens.
///
/// Holds no buffered token: each call to [`Lexer::next_token`] scans exactly
/// one token (or one error) starting at the cursor's current position.
pub struct Lexer<'a> {
    cursor: Cursor<'a>,
}

const ETX: char = '\u{3}';

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Scans and returns the next token, skipping whitespace but returning
    /// comments as `TokenKind::Comment` tokens rather than skipping them.
    ///
    /// Returns `TokenKind::Etx` (never an error) once the source is
    /// exhausted; callers should stop calling `next_token` after that.
    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_whitespace();
        let (line, column) = (self.cursor.line(), self.cursor.column());

        if self.cursor.is_at_end() || self.cursor.current_char() == ETX {
            return Ok(Token::new(TokenKind::Etx, line, column));
        }
        if let Some(tok) = self.try_comment(line, column)? {
            return Ok(tok);
        }
        if let Some(tok) = self.try_identifier_or_keyword(line, column)? {
            return Ok(tok);
        }
        if let Some(tok) = self.try_text_const(line, column)? {
            return Ok(tok);
        }
        if let Some(tok) = self.try_number(line, column)? {
            return Ok(tok);
        }
        if let Some(tok) = self.try_operator(line, column) {
            return Ok(tok);
        }

        let symbol = self.cursor.current_char();
        self.cursor.advance();
        Err(LexError::UnknownToken {
            symbol: symbol.to_string(),
            line,
            column,
        })
    }

    fn skip_whitespace(&mut self) {
        while !self.cursor.is_at_end() && self.cursor.current_char().is_whitespace() {
            self.cursor.advance();
        }
    }

    /// `#` to end of line. The body is handed back as a `Comment` token
    /// rather than swallowed here; filtering it out of the token stream is
    /// the parser's job.
    fn try_comment(&mut self, line: u32, column: u32) -> LexResult<Option<Token>> {
        if self.cursor.current_char() != '#' {
            return Ok(None);
        }
        self.cursor.advance();
        let mut text = String::new();
        while !matches!(self.cursor.current_char(), '\n' | ETX) && !self.cursor.is_at_end() {
            if text.len() >= MAX_COMMENT_LENGTH {
                return Err(LexError::CommentTooLong {
                    prefix: text,
                    line,
                    column,
                });
            }
            text.push(self.cursor.current_char());
            self.cursor.advance();
        }
        Ok(Some(Token::new(TokenKind::Comment(text), line, column)))
    }

    fn try_identifier_or_keyword(&mut self, line: u32, column: u32) -> LexResult<Option<Token>> {
        let c = self.cursor.current_char();
        if !(c.is_alphabetic() || c == '_') {
            return Ok(None);
        }
        let mut name = String::new();
        name.push(c);
        self.cursor.advance();
        loop {
            let c = self.cursor.current_char();
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            if name.len() >= MAX_IDENTIFIER_LENGTH {
                return Err(LexError::IdentifierTooLong {
                    prefix: name,
                    line,
                    column,
                });
            }
            name.push(c);
            self.cursor.advance();
        }

        let kind = TokenKind::keyword(&name).unwrap_or(TokenKind::Identifier(name));
        Ok(Some(Token::new(kind, line, column)))
    }

    fn try_text_const(&mut self, line: u32, column: u32) -> LexResult<Option<Token>> {
        let quote = self.cursor.current_char();
        if quote != '"' && quote != '\'' {
            return Ok(None);
        }
        self.cursor.advance();

        let mut text = String::new();
        loop {
            let c = self.cursor.current_char();
            if c == quote {
                break;
            }
            if c == '\n' || c == ETX || self.cursor.is_at_end() {
                return Err(LexError::UnterminatedString { line, column });
            }
            if text.len() >= MAX_TEXT_CONST_LENGTH {
                return Err(LexError::TextConstTooLong {
                    prefix: text,
                    line,
                    column,
                });
            }
            if c == '\\' {
                let (esc_line, esc_column) = (self.cursor.line(), self.cursor.column());
                self.cursor.advance();
                let escaped = self.cursor.current_char();
                let mapped = match escaped {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    '"' => '"',
                    '\'' => '\'',
                    _ => {
                        return Err(LexError::UnknownEscaping {
                            escaped,
                            line: esc_line,
                            column: esc_column,
                        })
                    }
                };
                text.push(mapped);
            } else {
                text.push(c);
            }
            self.cursor.advance();
        }
        self.cursor.advance(); // closing quote
        Ok(Some(Token::new(TokenKind::TextConst(text), line, column)))
    }

    fn try_number(&mut self, line: u32, column: u32) -> LexResult<Option<Token>> {
        if !self.cursor.current_char().is_ascii_digit() {
            return Ok(None);
        }
        let mut value: i64 = (self.cursor.current_char() as u8 - b'0') as i64;
        let first_digit = value;
        self.cursor.advance();

        while self.cursor.current_char().is_ascii_digit() && value <= MAX_INTEGER {
            let digit = (self.cursor.current_char() as u8 - b'0') as i64;
            if value == 0 && digit != 0 && first_digit == 0 {
                return Err(LexError::LeadingZerosInInteger { line, column });
            }
            value = value * 10 + digit;
            self.cursor.advance();
            if value > MAX_INTEGER {
                return Err(LexError::IntegerTooLarge { line, column });
            }
        }
        Ok(Some(Token::new(TokenKind::Number(value), line, column)))
    }

    fn try_operator(&mut self, line: u32, column: u32) -> Option<Token> {
        use TokenKind::*;
        let two = (self.cursor.char_at(0), self.cursor.char_at(1));
        let (kind, len) = match two {
            ('<', '=') => (LessEqualThan, 2),
            ('>', '=') => (GreaterEqualThan, 2),
            ('=', '=') => (Equal, 2),
            ('!', '=') => (NotEqual, 2),
            ('+', '=') => (PlusAssignment, 2),
            ('-', '=') => (MinusAssignment, 2),
            ('*', '=') => (MultiplyAssignment, 2),
            ('/', '=') => (DivideAssignment, 2),
            ('/', '/') => (IntDivide, 2),
            ('%', '=') => (ModulusAssignment, 2),
            ('+', _) => (Plus, 1),
            ('-', _) => (Minus, 1),
            ('*', _) => (Multiply, 1),
            ('/', _) => (Divide, 1),
            ('%', _) => (Modulus, 1),
            ('<', _) => (LessThan, 1),
            ('>', _) => (GreaterThan, 1),
            ('=', _) => (Assignment, 1),
            (':', _) => (Colon, 1),
            (';', _) => (Semicolon, 1),
            ('(', _) => (LeftBracket, 1),
            (')', _) => (RightBracket, 1),
            ('[', _) => (LeftSquareBracket, 1),
            (']', _) => (RightSquareBracket, 1),
            ('{', _) => (LeftCurlyBracket, 1),
            ('}', _) => (RightCurlyBracket, 1),
            ('.', _) => (Dot, 1),
            (',', _) => (Comma, 1),
            _ => return None,
        };
        self.cursor.advance_n(len);
        Some(Token::new(kind, line, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().expect("lex error");
            let done = tok.kind == TokenKind::Etx;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        let ks = kinds("if elif else for while return and or in not true false null foo_bar");
        assert_eq!(
            ks,
            vec![
                TokenKind::If,
                TokenKind::Elif,
                TokenKind::Else,
                TokenKind::For,
                TokenKind::While,
                TokenKind::Return,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::In,
                TokenKind::Not,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Identifier("foo_bar".into()),
                TokenKind::Etx,
            ]
        );
    }

    #[test]
    fn lexes_two_char_operators_before_one_char() {
        let ks = kinds("<= >= == != += -= *= /= // %=");
        assert_eq!(
            ks,
            vec![
                TokenKind::LessEqualThan,
                TokenKind::GreaterEqualThan,
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::PlusAssignment,
                TokenKind::MinusAssignment,
                TokenKind::MultiplyAssignment,
                TokenKind::DivideAssignment,
                TokenKind::IntDivide,
                TokenKind::ModulusAssignment,
                TokenKind::Etx,
            ]
        );
    }

    #[test]
    fn lexes_string_with_escapes() {
        let ks = kinds(r#" "hi\n\"there\"" "#);
        assert_eq!(
            ks,
            vec![
                TokenKind::TextConst("hi\n\"there\"".into()),
                TokenKind::Etx
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut lexer = Lexer::new("\"abc");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn leading_zero_in_integer_is_an_error() {
        let mut lexer = Lexer::new("007");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::LeadingZerosInInteger { .. })
        ));
    }

    #[test]
    fn lone_zero_is_not_an_error() {
        let mut lexer = Lexer::new("0");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Number(0));
    }

    #[test]
    fn integer_at_max_is_accepted() {
        let mut lexer = Lexer::new("2147483647");
        assert_eq!(
            lexer.next_token().unwrap().kind,
            TokenKind::Number(MAX_INTEGER)
        );
    }

    #[test]
    fn integer_over_max_is_an_error() {
        let mut lexer = Lexer::new("2147483648");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::IntegerTooLarge { .. })
        ));
    }

    #[test]
    fn comments_are_emitted_as_tokens() {
        // The lexer hands comments to the caller rather than swallowing
        // them; `tutel-par`'s parser is the one that filters them out.
        let ks = kinds("x # trailing comment\ny");
        assert_eq!(
            ks,
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Comment(" trailing comment".into()),
                TokenKind::Identifier("y".into()),
                TokenKind::Etx,
            ]
        );
    }

    #[test]
    fn comment_too_long_is_an_error() {
        let src = format!("#{}", "a".repeat(MAX_COMMENT_LENGTH + 1));
        let mut lexer = Lexer::new(&src);
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::CommentTooLong { .. })
        ));
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let mut lexer = Lexer::new("@");
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::UnknownToken { .. })
        ));
    }

    #[test]
    fn identifier_at_max_length_is_accepted() {
        let name = "a".repeat(MAX_IDENTIFIER_LENGTH);
        let mut lexer = Lexer::new(&name);
        assert_eq!(
            lexer.next_token().unwrap().kind,
            TokenKind::Identifier(name)
        );
    }

    #[test]
    fn identifier_over_max_length_is_an_error() {
        let name = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        let mut lexer = Lexer::new(&name);
        assert!(matches!(
            lexer.next_token(),
            Err(LexError::IdentifierTooLong { .. })
        ));
    }

    #[test]
    fn tracks_line_and_column() {
        let mut lexer = Lexer::new("a\nbb");
        let first = lexer.next_token().unwrap();
        assert_eq!((first.line(), first.column()), (1, 1));
        let second = lexer.next_token().unwrap();
        assert_eq!((second.line(), second.column()), (2, 1));
    }

    proptest::proptest! {
        /// Tokenizing arbitrary text never panics and always terminates:
        /// every input eventually reaches `T_ETX`, whether by tokenizing
        /// cleanly or by hitting a lexical error first.
        #[test]
        fn lexing_arbitrary_text_terminates(text in "\\PC{0,200}") {
            let mut lexer = Lexer::new(&text);
            for _ in 0..10_000 {
                match lexer.next_token() {
                    Ok(token) if token.kind == TokenKind::Etx => return Ok(()),
                    Ok(_) => continue,
                    Err(_) => return Ok(()),
                }
            }
            panic!("lexer did not reach ETX or an error within 10,000 tokens");
        }
    }
}
