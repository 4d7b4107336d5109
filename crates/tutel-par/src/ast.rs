//! The Tutel abstract syntax tree (spec.md §4).
//!
//! One-for-one with `ParserModule/Classes.py`: every statement and
//! expression node the original parser builds has exactly one variant
//! here. `line`/`column` on each node come straight from the token that
//! started it, so later phases (interpreter, debugger) can report
//! positions without re-walking the tree.

use tutel_util::Symbol;

#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: Symbol,
    pub params: Vec<Identifier>,
    pub body: Block,
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Identifier {
    pub name: Symbol,
    pub line: u32,
    pub column: u32,
}

/// Assignment operators (spec.md §4.3); `=` and the four compound forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Assignment {
        target: Expr,
        op: AssignOp,
        value: Expr,
        line: u32,
        column: u32,
    },
    Expr(Expr),
    Return {
        values: Vec<Expr>,
        line: u32,
        column: u32,
    },
    If(IfStatement),
    For {
        iterator: Identifier,
        iterable: Expr,
        body: Block,
        line: u32,
        column: u32,
    },
    While {
        condition: Expr,
        body: Block,
        line: u32,
        column: u32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfStatement {
    pub condition: Expr,
    pub body: Block,
    pub elif_blocks: Vec<ElifBlock>,
    pub else_block: Option<Block>,
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElifBlock {
    pub condition: Expr,
    pub body: Block,
    pub line: u32,
    pub column: u32,
}

/// Binary operators on the arithmetic/comparison/logical spine
/// (spec.md §4.3's precedence table), one variant per `Classes.py`
/// `TwoSidedExpression` subclass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    In,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    IntDiv,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Identifier(Identifier),
    Integer {
        value: i64,
        line: u32,
        column: u32,
    },
    StringLit {
        value: String,
        line: u32,
        column: u32,
    },
    Boolean {
        value: bool,
        line: u32,
        column: u32,
    },
    Null {
        line: u32,
        column: u32,
    },
    List {
        elements: Vec<Expr>,
        line: u32,
        column: u32,
    },
    Negate {
        value: Box<Expr>,
        line: u32,
        column: u32,
    },
    Invert {
        value: Box<Expr>,
        line: u32,
        column: u32,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        line: u32,
        column: u32,
    },
    Dot {
        target: Box<Expr>,
        attribute: Identifier,
        line: u32,
        column: u32,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
        line: u32,
        column: u32,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        line: u32,
        column: u32,
    },
}

impl Expr {
    pub fn line(&self) -> u32 {
        match self {
            Expr::Identifier(id) => id.line,
            Expr::Integer { line, .. }
            | Expr::StringLit { line, .. }
            | Expr::Boolean { line, .. }
            | Expr::Null { line, .. }
            | Expr::List { line, .. }
            | Expr::Negate { line, .. }
            | Expr::Invert { line, .. }
            | Expr::Binary { line, .. }
            | Expr::Dot { line, .. }
            | Expr::Call { line, .. }
            | Expr::Index { line, .. } => *line,
        }
    }

    pub fn column(&self) -> u32 {
        match self {
            Expr::Identifier(id) => id.column,
            Expr::Integer { column, .. }
            | Expr::StringLit { column, .. }
            | Expr::Boolean { column, .. }
            | Expr::Null { column, .. }
            | Expr::List { column, .. }
            | Expr::Negate { column, .. }
            | Expr::Invert { column, .. }
            | Expr::Binary { column, .. }
            | Expr::Dot { column, .. }
            | Expr::Call { column, .. }
            | Expr::Index { column, .. } => *column,
        }
    }
}
