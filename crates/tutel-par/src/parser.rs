//! Recursive-descent parser with single-token look-ahead (spec.md §4.3).
//!
//! One production per grammar rule, grounded in `ParserModule/Parser.py`'s
//! `try_parse_*` methods: each function consumes exactly the tokens of its
//! rule and returns `None` when the rule doesn't start at the current
//! token, letting the caller try the next alternative. The first
//! structural error aborts the parse (no recovery), matching the original.

use tutel_lex::{Lexer, Token, TokenKind};
use tutel_util::Symbol;

use crate::ast::*;
use crate::error::{ParseError, ParseResult};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    token: Token,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> ParseResult<Self> {
        let mut lexer = Lexer::new(source);
        let token = Self::next_significant_token(&mut lexer)?;
        Ok(Self { lexer, token })
    }

    fn advance(&mut self) -> ParseResult<()> {
        self.token = Self::next_significant_token(&mut self.lexer)?;
        Ok(())
    }

    /// Pulls the next token from the lexer, silently discarding comment
    /// tokens (spec.md §4.3: the parser "filters comments silently").
    fn next_significant_token(lexer: &mut Lexer<'a>) -> ParseResult<Token> {
        loop {
            let token = lexer.next_token().map_err(ParseError::from)?;
            if !matches!(token.kind, TokenKind::Comment(_)) {
                return Ok(token);
            }
        }
    }

    fn line(&self) -> u32 {
        self.token.line()
    }

    fn column(&self) -> u32 {
        self.token.column()
    }

    /// A human-readable rendering of the current token, for error messages.
    fn found(&self) -> String {
        match &self.token.kind {
            TokenKind::Identifier(name) => name.clone(),
            TokenKind::Number(n) => n.to_string(),
            TokenKind::TextConst(s) => s.clone(),
            other => other.describe().trim_matches('\'').to_string(),
        }
    }

    fn token_is(&self, kind: &TokenKind) -> bool {
        &self.token.kind == kind
    }

    fn check_and_consume(&mut self, kind: &TokenKind) -> ParseResult<bool> {
        if !self.token_is(kind) {
            return Ok(false);
        }
        self.advance()?;
        Ok(true)
    }

    /// Top-level entry: `program := function_def* ETX`.
    pub fn parse(mut self) -> ParseResult<Program> {
        let mut functions = Vec::new();
        let mut names: std::collections::HashSet<Symbol> = std::collections::HashSet::new();

        while let Some(function) = self.try_parse_function_def(&names)? {
            names.insert(function.name);
            functions.push(function);
        }

        if !self.token_is(&TokenKind::Etx) {
            return Err(ParseError::MissingEtx {
                method: "parse",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }

        Ok(Program { functions })
    }

    /// Parses `source` as a single expression rather than a program,
    /// for conditional-breakpoint expressions typed at the debugger
    /// prompt. Grounded in `TutelDebugger.py::set_breakpoint`, which
    /// builds a fresh `Parser` over the condition text and calls
    /// `try_parse_expression` directly rather than `parse_program`.
    pub fn parse_standalone_expression(source: &str) -> ParseResult<Expr> {
        let mut parser = Parser::new(source)?;
        let Some(expr) = parser.try_parse_expression()? else {
            return Err(ParseError::MissingCondition {
                method: "parse_standalone_expression",
                line: parser.line(),
                column: parser.column(),
            });
        };
        if !parser.token_is(&TokenKind::Etx) {
            return Err(ParseError::MissingEtx {
                method: "parse_standalone_expression",
                found: parser.found(),
                line: parser.line(),
                column: parser.column(),
            });
        }
        Ok(expr)
    }

    fn try_parse_function_def(
        &mut self,
        seen: &std::collections::HashSet<Symbol>,
    ) -> ParseResult<Option<Function>> {
        let line = self.line();
        let column = self.column();
        let name = match &self.token.kind {
            TokenKind::Identifier(name) => Symbol::intern(name),
            _ => return Ok(None),
        };

        if seen.contains(&name) {
            return Err(ParseError::FunctionRedefinition {
                method: "try_parse_function_def",
                found: self.found(),
                line,
                column,
            });
        }
        self.advance()?;

        if !self.check_and_consume(&TokenKind::LeftBracket)? {
            return Err(ParseError::MissingLeftBracket {
                method: "try_parse_function_def",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }

        let params = self.try_parse_params_list()?;

        if !self.check_and_consume(&TokenKind::RightBracket)? {
            return Err(ParseError::MissingRightBracket {
                method: "try_parse_function_def",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }

        let body = self.try_parse_block()?.ok_or_else(|| ParseError::MissingFunctionBlock {
            method: "try_parse_function_def",
            found: self.found(),
            line: self.line(),
            column: self.column(),
        })?;

        Ok(Some(Function {
            name,
            params,
            body,
            line,
            column,
        }))
    }

    fn try_parse_params_list(&mut self) -> ParseResult<Vec<Identifier>> {
        let mut params = Vec::new();
        let Some(first) = self.try_parse_identifier()? else {
            return Ok(params);
        };
        params.push(first);

        while self.check_and_consume(&TokenKind::Comma)? {
            let Some(param) = self.try_parse_identifier()? else {
                return Err(ParseError::MissingIdentifierAfterComma {
                    method: "try_parse_params_list",
                    found: self.found(),
                    line: self.line(),
                    column: self.column(),
                });
            };
            params.push(param);
        }

        Ok(params)
    }

    fn try_parse_block(&mut self) -> ParseResult<Option<Block>> {
        if !self.check_and_consume(&TokenKind::LeftCurlyBracket)? {
            return Ok(None);
        }

        let mut statements = Vec::new();
        while let Some(statement) = self.try_parse_statement()? {
            statements.push(statement);
        }

        if !self.check_and_consume(&TokenKind::RightCurlyBracket)? {
            return Err(ParseError::MissingRightCurlyBracket {
                method: "try_parse_block",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }

        Ok(Some(Block { statements }))
    }

    fn try_parse_statement(&mut self) -> ParseResult<Option<Statement>> {
        if let Some(statement) = self.try_parse_simple_statement()? {
            if !self.check_and_consume(&TokenKind::Semicolon)? {
                return Err(ParseError::MissingSemicolon {
                    method: "try_parse_statement",
                    found: self.found(),
                    line: self.line(),
                    column: self.column(),
                });
            }
            return Ok(Some(statement));
        }

        self.try_parse_compound_statement()
    }

    fn try_parse_simple_statement(&mut self) -> ParseResult<Option<Statement>> {
        if let Some(statement) = self.try_parse_return_statement()? {
            return Ok(Some(statement));
        }

        let Some(expr) = self.try_parse_expression()? else {
            return Ok(None);
        };

        if let Some(statement) = self.try_parse_assignment(expr.clone())? {
            return Ok(Some(statement));
        }

        Ok(Some(Statement::Expr(expr)))
    }

    fn try_parse_compound_statement(&mut self) -> ParseResult<Option<Statement>> {
        if let Some(stmt) = self.try_parse_if_statement()? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.try_parse_for_statement()? {
            return Ok(Some(stmt));
        }
        if let Some(stmt) = self.try_parse_while_statement()? {
            return Ok(Some(stmt));
        }
        Ok(None)
    }

    fn try_parse_assignment(&mut self, target: Expr) -> ParseResult<Option<Statement>> {
        let line = self.line();
        let column = self.column();
        let op = match &self.token.kind {
            TokenKind::Assignment => AssignOp::Assign,
            TokenKind::PlusAssignment => AssignOp::AddAssign,
            TokenKind::MinusAssignment => AssignOp::SubAssign,
            TokenKind::MultiplyAssignment => AssignOp::MulAssign,
            TokenKind::DivideAssignment => AssignOp::DivAssign,
            TokenKind::ModulusAssignment => AssignOp::ModAssign,
            _ => return Ok(None),
        };
        self.advance()?;

        let Some(value) = self.try_parse_expression()? else {
            return Err(ParseError::MissingRightSideOfAssignment {
                method: "try_parse_assignment",
                line: self.line(),
                column: self.column(),
            });
        };

        Ok(Some(Statement::Assignment {
            target,
            op,
            value,
            line,
            column,
        }))
    }

    fn try_parse_return_statement(&mut self) -> ParseResult<Option<Statement>> {
        let line = self.line();
        let column = self.column();
        if !self.check_and_consume(&TokenKind::Return)? {
            return Ok(None);
        }

        let values = self.try_parse_return_values()?;
        Ok(Some(Statement::Return { values, line, column }))
    }

    fn try_parse_return_values(&mut self) -> ParseResult<Vec<Expr>> {
        let mut values = Vec::new();
        let Some(first) = self.try_parse_expression()? else {
            return Ok(values);
        };
        values.push(first);

        while self.check_and_consume(&TokenKind::Comma)? {
            let Some(value) = self.try_parse_expression()? else {
                return Err(ParseError::MissingExpressionAfterComma {
                    method: "try_parse_return_values",
                    found: self.found(),
                    line: self.line(),
                    column: self.column(),
                });
            };
            values.push(value);
        }

        Ok(values)
    }

    fn try_parse_if_statement(&mut self) -> ParseResult<Option<Statement>> {
        let line = self.line();
        let column = self.column();
        if !self.check_and_consume(&TokenKind::If)? {
            return Ok(None);
        }

        if !self.check_and_consume(&TokenKind::LeftBracket)? {
            return Err(ParseError::MissingLeftBracket {
                method: "try_parse_if_statement",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }
        let Some(condition) = self.try_parse_expression()? else {
            return Err(ParseError::MissingCondition {
                method: "try_parse_if_statement",
                line: self.line(),
                column: self.column(),
            });
        };
        if !self.check_and_consume(&TokenKind::RightBracket)? {
            return Err(ParseError::MissingRightBracket {
                method: "try_parse_if_statement",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }
        let body = self.try_parse_compound_statement_body()?.ok_or_else(|| ParseError::MissingBody {
            method: "try_parse_if_statement",
            line: self.line(),
            column: self.column(),
        })?;

        let mut elif_blocks = Vec::new();
        while let Some(elif_block) = self.try_parse_elif_block()? {
            elif_blocks.push(elif_block);
        }

        let else_block = self.try_parse_else_block()?;

        Ok(Some(Statement::If(IfStatement {
            condition,
            body,
            elif_blocks,
            else_block,
            line,
            column,
        })))
    }

    fn try_parse_elif_block(&mut self) -> ParseResult<Option<ElifBlock>> {
        let line = self.line();
        let column = self.column();
        if !self.check_and_consume(&TokenKind::Elif)? {
            return Ok(None);
        }

        if !self.check_and_consume(&TokenKind::LeftBracket)? {
            return Err(ParseError::MissingLeftBracket {
                method: "try_parse_elif_block",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }
        let Some(condition) = self.try_parse_expression()? else {
            return Err(ParseError::MissingCondition {
                method: "try_parse_elif_block",
                line: self.line(),
                column: self.column(),
            });
        };
        if !self.check_and_consume(&TokenKind::RightBracket)? {
            return Err(ParseError::MissingRightBracket {
                method: "try_parse_elif_block",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }
        let body = self.try_parse_compound_statement_body()?.ok_or_else(|| ParseError::MissingBody {
            method: "try_parse_elif_block",
            line: self.line(),
            column: self.column(),
        })?;

        Ok(Some(ElifBlock { condition, body, line, column }))
    }

    fn try_parse_else_block(&mut self) -> ParseResult<Option<Block>> {
        if !self.check_and_consume(&TokenKind::Else)? {
            return Ok(None);
        }

        let body = self.try_parse_compound_statement_body()?.ok_or_else(|| ParseError::MissingBody {
            method: "try_parse_else_block",
            line: self.line(),
            column: self.column(),
        })?;

        Ok(Some(body))
    }

    fn try_parse_for_statement(&mut self) -> ParseResult<Option<Statement>> {
        let line = self.line();
        let column = self.column();
        if !self.check_and_consume(&TokenKind::For)? {
            return Ok(None);
        }

        if !self.check_and_consume(&TokenKind::LeftBracket)? {
            return Err(ParseError::MissingLeftBracket {
                method: "try_parse_for_statement",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }
        let Some(iterator) = self.try_parse_identifier()? else {
            return Err(ParseError::MissingIterator {
                method: "try_parse_for_statement",
                line: self.line(),
                column: self.column(),
            });
        };
        if !self.check_and_consume(&TokenKind::In)? {
            return Err(ParseError::MissingKeywordIn {
                method: "try_parse_for_statement",
                line: self.line(),
                column: self.column(),
            });
        }
        let Some(iterable) = self.try_parse_expression()? else {
            return Err(ParseError::MissingIterable {
                method: "try_parse_for_statement",
                line: self.line(),
                column: self.column(),
            });
        };
        if !self.check_and_consume(&TokenKind::RightBracket)? {
            return Err(ParseError::MissingRightBracket {
                method: "try_parse_for_statement",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }
        let body = self.try_parse_compound_statement_body()?.ok_or_else(|| ParseError::MissingBody {
            method: "try_parse_for_statement",
            line: self.line(),
            column: self.column(),
        })?;

        Ok(Some(Statement::For { iterator, iterable, body, line, column }))
    }

    fn try_parse_while_statement(&mut self) -> ParseResult<Option<Statement>> {
        let line = self.line();
        let column = self.column();
        if !self.check_and_consume(&TokenKind::While)? {
            return Ok(None);
        }

        if !self.check_and_consume(&TokenKind::LeftBracket)? {
            return Err(ParseError::MissingLeftBracket {
                method: "try_parse_while_statement",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }
        let Some(condition) = self.try_parse_expression()? else {
            return Err(ParseError::MissingCondition {
                method: "try_parse_while_statement",
                line: self.line(),
                column: self.column(),
            });
        };
        if !self.check_and_consume(&TokenKind::RightBracket)? {
            return Err(ParseError::MissingRightBracket {
                method: "try_parse_while_statement",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }
        let body = self.try_parse_compound_statement_body()?.ok_or_else(|| ParseError::MissingBody {
            method: "try_parse_while_statement",
            line: self.line(),
            column: self.column(),
        })?;

        Ok(Some(Statement::While { condition, body, line, column }))
    }

    /// `body := block | statement` — a single bare statement is wrapped
    /// in a one-element block so callers have a uniform `Block` to walk.
    fn try_parse_compound_statement_body(&mut self) -> ParseResult<Option<Block>> {
        if let Some(block) = self.try_parse_block()? {
            return Ok(Some(block));
        }

        if let Some(statement) = self.try_parse_statement()? {
            return Ok(Some(Block { statements: vec![statement] }));
        }

        Ok(None)
    }

    // ---- expression grammar, lowest to highest precedence ----

    fn try_parse_expression(&mut self) -> ParseResult<Option<Expr>> {
        let line = self.line();
        let column = self.column();
        let Some(mut left) = self.try_parse_or_expr()? else {
            return Ok(None);
        };

        while self.check_and_consume(&TokenKind::Or)? {
            let Some(right) = self.try_parse_or_expr()? else {
                return Err(ParseError::ExprMissingRightSide {
                    method: "try_parse_expression",
                    line: self.line(),
                    column: self.column(),
                });
            };
            left = Expr::Binary {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                line,
                column,
            };
        }

        Ok(Some(left))
    }

    fn try_parse_or_expr(&mut self) -> ParseResult<Option<Expr>> {
        let line = self.line();
        let column = self.column();
        let Some(mut left) = self.try_parse_and_expr()? else {
            return Ok(None);
        };

        while self.check_and_consume(&TokenKind::And)? {
            let Some(right) = self.try_parse_and_expr()? else {
                return Err(ParseError::ExprMissingRightSide {
                    method: "try_parse_or_expr",
                    line: self.line(),
                    column: self.column(),
                });
            };
            left = Expr::Binary {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
                line,
                column,
            };
        }

        Ok(Some(left))
    }

    /// `and_expr := ('not')* comp_chain` — an even number of `not` cancels.
    fn try_parse_and_expr(&mut self) -> ParseResult<Option<Expr>> {
        let line = self.line();
        let column = self.column();
        let mut negate = false;
        let mut at_least_one = false;
        while self.check_and_consume(&TokenKind::Not)? {
            negate = !negate;
            at_least_one = true;
        }

        let Some(expr) = self.try_parse_comp_chain()? else {
            if at_least_one {
                return Err(ParseError::ExprMissingRightSide {
                    method: "try_parse_and_expr",
                    line: self.line(),
                    column: self.column(),
                });
            }
            return Ok(None);
        };

        if negate {
            return Ok(Some(Expr::Invert {
                value: Box::new(expr),
                line,
                column,
            }));
        }

        Ok(Some(expr))
    }

    /// `comp_chain := sum (comp_op sum)?` — non-associative: at most one
    /// comparison operator, so `a < b < c` is rejected by the grammar.
    fn try_parse_comp_chain(&mut self) -> ParseResult<Option<Expr>> {
        let line = self.line();
        let column = self.column();
        let Some(left) = self.try_parse_sum()? else {
            return Ok(None);
        };

        let op = match &self.token.kind {
            TokenKind::Equal => Some(BinOp::Eq),
            TokenKind::NotEqual => Some(BinOp::NotEq),
            TokenKind::LessThan => Some(BinOp::Less),
            TokenKind::LessEqualThan => Some(BinOp::LessEq),
            TokenKind::GreaterThan => Some(BinOp::Greater),
            TokenKind::GreaterEqualThan => Some(BinOp::GreaterEq),
            TokenKind::In => Some(BinOp::In),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(Some(left));
        };
        self.advance()?;

        let Some(right) = self.try_parse_sum()? else {
            return Err(ParseError::ExprMissingRightSide {
                method: "try_parse_comp_chain",
                line: self.line(),
                column: self.column(),
            });
        };

        Ok(Some(Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            line,
            column,
        }))
    }

    fn try_parse_sum(&mut self) -> ParseResult<Option<Expr>> {
        let line = self.line();
        let column = self.column();
        let Some(mut left) = self.try_parse_mul()? else {
            return Ok(None);
        };

        loop {
            let op = match &self.token.kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance()?;
            let Some(right) = self.try_parse_mul()? else {
                return Err(ParseError::ExprMissingRightSide {
                    method: "try_parse_sum",
                    line: self.line(),
                    column: self.column(),
                });
            };
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
                column,
            };
        }

        Ok(Some(left))
    }

    fn try_parse_mul(&mut self) -> ParseResult<Option<Expr>> {
        let line = self.line();
        let column = self.column();
        let Some(mut left) = self.try_parse_unary()? else {
            return Ok(None);
        };

        loop {
            let op = match &self.token.kind {
                TokenKind::Multiply => BinOp::Mul,
                TokenKind::Divide => BinOp::Div,
                TokenKind::IntDivide => BinOp::IntDiv,
                TokenKind::Modulus => BinOp::Mod,
                _ => break,
            };
            self.advance()?;
            let Some(right) = self.try_parse_unary()? else {
                return Err(ParseError::ExprMissingRightSide {
                    method: "try_parse_mul",
                    line: self.line(),
                    column: self.column(),
                });
            };
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line,
                column,
            };
        }

        Ok(Some(left))
    }

    /// `unary := ('+'|'-')* postfix` — an odd count of leading `-` inverts
    /// the sign; leading `+` is absorbed without effect. At least one
    /// operand must follow any prefix run (spec.md §9).
    fn try_parse_unary(&mut self) -> ParseResult<Option<Expr>> {
        let line = self.line();
        let column = self.column();
        let mut negate = false;
        let mut at_least_one = false;
        loop {
            if self.token_is(&TokenKind::Minus) {
                negate = !negate;
            } else if !self.token_is(&TokenKind::Plus) {
                break;
            }
            self.advance()?;
            at_least_one = true;
        }

        let Some(expr) = self.try_parse_postfix()? else {
            if at_least_one {
                return Err(ParseError::ExprMissingRightSide {
                    method: "try_parse_unary",
                    line: self.line(),
                    column: self.column(),
                });
            }
            return Ok(None);
        };

        if negate {
            return Ok(Some(Expr::Negate {
                value: Box::new(expr),
                line,
                column,
            }));
        }

        Ok(Some(expr))
    }

    /// `postfix := atom ('.' IDENT | '(' args? ')' | '[' expr ']')*`
    fn try_parse_postfix(&mut self) -> ParseResult<Option<Expr>> {
        let Some(mut expr) = self.try_parse_atom()? else {
            return Ok(None);
        };

        loop {
            let line = self.line();
            let column = self.column();
            if self.check_and_consume(&TokenKind::Dot)? {
                let Some(attribute) = self.try_parse_identifier()? else {
                    return Err(ParseError::MissingIdentifierAfterDot {
                        method: "try_parse_postfix",
                        line: self.line(),
                        column: self.column(),
                    });
                };
                expr = Expr::Dot {
                    target: Box::new(expr),
                    attribute,
                    line,
                    column,
                };
            } else if self.check_and_consume(&TokenKind::LeftBracket)? {
                let arguments = self.try_parse_arguments()?;
                if !self.check_and_consume(&TokenKind::RightBracket)? {
                    return Err(ParseError::MissingRightBracket {
                        method: "try_parse_postfix",
                        found: self.found(),
                        line: self.line(),
                        column: self.column(),
                    });
                }
                expr = Expr::Call {
                    callee: Box::new(expr),
                    arguments,
                    line,
                    column,
                };
            } else if self.check_and_consume(&TokenKind::LeftSquareBracket)? {
                let Some(index) = self.try_parse_expression()? else {
                    return Err(ParseError::ExprMissingRightSide {
                        method: "try_parse_postfix",
                        line: self.line(),
                        column: self.column(),
                    });
                };
                if !self.check_and_consume(&TokenKind::RightSquareBracket)? {
                    return Err(ParseError::MissingRightSquareBracket {
                        method: "try_parse_postfix",
                        found: self.found(),
                        line: self.line(),
                        column: self.column(),
                    });
                }
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                    line,
                    column,
                };
            } else {
                break;
            }
        }

        Ok(Some(expr))
    }

    fn try_parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        let Some(first) = self.try_parse_expression()? else {
            return Ok(args);
        };
        args.push(first);

        while self.check_and_consume(&TokenKind::Comma)? {
            let Some(arg) = self.try_parse_expression()? else {
                return Err(ParseError::MissingExpressionAfterComma {
                    method: "try_parse_arguments",
                    found: self.found(),
                    line: self.line(),
                    column: self.column(),
                });
            };
            args.push(arg);
        }

        Ok(args)
    }

    fn try_parse_atom(&mut self) -> ParseResult<Option<Expr>> {
        let line = self.line();
        let column = self.column();

        if let Some(identifier) = self.try_parse_identifier()? {
            return Ok(Some(Expr::Identifier(identifier)));
        }

        if self.check_and_consume(&TokenKind::LeftBracket)? {
            let Some(expr) = self.try_parse_expression()? else {
                return Err(ParseError::ExprMissingRightSide {
                    method: "try_parse_atom",
                    line: self.line(),
                    column: self.column(),
                });
            };
            if !self.check_and_consume(&TokenKind::RightBracket)? {
                return Err(ParseError::MissingRightBracket {
                    method: "try_parse_atom",
                    found: self.found(),
                    line: self.line(),
                    column: self.column(),
                });
            }
            return Ok(Some(expr));
        }

        if let Some(list) = self.try_parse_list()? {
            return Ok(Some(list));
        }

        if let TokenKind::TextConst(text) = &self.token.kind {
            let value = text.clone();
            self.advance()?;
            return Ok(Some(Expr::StringLit { value, line, column }));
        }

        if let TokenKind::Number(n) = self.token.kind {
            self.advance()?;
            return Ok(Some(Expr::Integer { value: n, line, column }));
        }

        if self.check_and_consume(&TokenKind::True)? {
            return Ok(Some(Expr::Boolean { value: true, line, column }));
        }
        if self.check_and_consume(&TokenKind::False)? {
            return Ok(Some(Expr::Boolean { value: false, line, column }));
        }
        if self.check_and_consume(&TokenKind::Null)? {
            return Ok(Some(Expr::Null { line, column }));
        }

        Ok(None)
    }

    fn try_parse_list(&mut self) -> ParseResult<Option<Expr>> {
        let line = self.line();
        let column = self.column();
        if !self.check_and_consume(&TokenKind::LeftSquareBracket)? {
            return Ok(None);
        }

        let mut elements = Vec::new();
        if let Some(first) = self.try_parse_expression()? {
            elements.push(first);
            while self.check_and_consume(&TokenKind::Comma)? {
                let Some(element) = self.try_parse_expression()? else {
                    return Err(ParseError::MissingExpressionAfterComma {
                        method: "try_parse_list",
                        found: self.found(),
                        line: self.line(),
                        column: self.column(),
                    });
                };
                elements.push(element);
            }
        }

        if !self.check_and_consume(&TokenKind::RightSquareBracket)? {
            return Err(ParseError::MissingRightSquareBracket {
                method: "try_parse_list",
                found: self.found(),
                line: self.line(),
                column: self.column(),
            });
        }

        Ok(Some(Expr::List { elements, line, column }))
    }

    fn try_parse_identifier(&mut self) -> ParseResult<Option<Identifier>> {
        let line = self.line();
        let column = self.column();
        let name = match &self.token.kind {
            TokenKind::Identifier(name) => Symbol::intern(name),
            _ => return Ok(None),
        };
        self.advance()?;
        Ok(Some(Identifier { name, line, column }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        Parser::new(src).expect("lex error").parse().expect("parse error")
    }

    #[test]
    fn parses_single_function_with_basic_assignment() {
        let program = parse_ok("foo(){a = 1;}");
        assert_eq!(program.functions.len(), 1);
        let foo = &program.functions[0];
        assert_eq!(foo.name.as_str(), "foo");
        assert_eq!(foo.body.statements.len(), 1);
        assert!(matches!(
            &foo.body.statements[0],
            Statement::Assignment { op: AssignOp::Assign, .. }
        ));
    }

    #[test]
    fn rejects_duplicate_function_names() {
        let err = Parser::new("foo(){} foo(){}").unwrap().parse().unwrap_err();
        assert!(matches!(err, ParseError::FunctionRedefinition { .. }));
    }

    #[test]
    fn rejects_chained_comparisons() {
        // `a < b < c` is not valid: comp_chain allows at most one comp_op.
        // After `a < b`, the parser returns to `sum`'s caller which has no
        // further alternative for a bare `< c`, so the statement fails to
        // find a terminating `;` at the right place.
        let err = Parser::new("foo(){ x = a < b < c; }").unwrap().parse();
        assert!(err.is_err());
    }

    #[test]
    fn parses_if_elif_else() {
        let program = parse_ok("foo(){ if (a) { x = 1; } elif (b) { x = 2; } else { x = 3; } }");
        let stmt = &program.functions[0].body.statements[0];
        match stmt {
            Statement::If(if_stmt) => {
                assert_eq!(if_stmt.elif_blocks.len(), 1);
                assert!(if_stmt.else_block.is_some());
            }
            _ => panic!("expected if statement"),
        }
    }

    #[test]
    fn parses_for_loop() {
        let program = parse_ok("foo(){ for (el in items) { x = el; } }");
        assert!(matches!(
            program.functions[0].body.statements[0],
            Statement::For { .. }
        ));
    }

    #[test]
    fn parses_unary_minus_and_not() {
        let program = parse_ok("foo(){ x = --1; y = not not true; }");
        match &program.functions[0].body.statements[0] {
            Statement::Assignment { value, .. } => {
                assert!(matches!(value, Expr::Integer { value: 1, .. }));
            }
            _ => panic!(),
        }
    }

    #[test]
    fn parses_call_index_and_dot_chain() {
        let program = parse_ok("foo(){ x = a.b(1, 2)[0]; }");
        match &program.functions[0].body.statements[0] {
            Statement::Assignment { value, .. } => {
                assert!(matches!(value, Expr::Index { .. }));
            }
            _ => panic!(),
        }
    }

    #[test]
    fn missing_semicolon_is_an_error() {
        let err = Parser::new("foo(){ a = 1 }").unwrap().parse().unwrap_err();
        assert!(matches!(err, ParseError::MissingSemicolon { .. }));
    }

    #[test]
    fn parses_standalone_expression() {
        let expr = Parser::parse_standalone_expression("x > 0 and y < 10").unwrap();
        assert!(matches!(expr, Expr::Binary { op: BinOp::And, .. }));
    }

    #[test]
    fn standalone_expression_rejects_trailing_tokens() {
        let err = Parser::parse_standalone_expression("x == 1 y").unwrap_err();
        assert!(matches!(err, ParseError::MissingEtx { .. }));
    }

    #[test]
    fn standalone_expression_rejects_empty_source() {
        let err = Parser::parse_standalone_expression("").unwrap_err();
        assert!(matches!(err, ParseError::MissingCondition { .. }));
    }
}
