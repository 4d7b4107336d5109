//! Conditional-breakpoint expression evaluation (spec.md §4.5: "evaluate
//! it under the current frame").
//!
//! A deliberately narrow evaluator: it shares `tutel-interp`'s arithmetic,
//! comparison, and truthiness rules (`Interpreter::eval_binary` et al.)
//! but only resolves names against the stopped frame's locals, never the
//! interpreter's globals, built-ins, or turtle/host state. A breakpoint
//! condition runs on the request-handling thread while the worker is
//! blocked in the line hook, so it must not be able to call back into
//! running interpreter state.

use thiserror::Error;
use tutel_interp::Value;
use tutel_par::ast::{BinOp, Expr};
use tutel_util::{FxHashMap, Symbol};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CondEvalError {
    #[error("name '{0}' is not defined in this frame")]
    NotDefined(String),
    #[error("unsupported operand type(s) for '{0}'")]
    UnsupportedOperand(&'static str),
    #[error("bad operand type for unary '{0}'")]
    BadOperandForUnary(&'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("index out of range")]
    OutOfRange,
    #[error("unexpected type '{0}'")]
    Type(&'static str),
    #[error("'{0}' is not usable inside a breakpoint condition")]
    Unsupported(&'static str),
}

type CondResult<T> = Result<T, CondEvalError>;

/// Evaluates `expr` against `locals` only, returning its truthiness.
pub fn eval_condition(expr: &Expr, locals: &FxHashMap<Symbol, Value>) -> CondResult<bool> {
    Ok(eval(expr, locals)?.truthy())
}

fn eval(expr: &Expr, locals: &FxHashMap<Symbol, Value>) -> CondResult<Value> {
    match expr {
        Expr::Identifier(id) => locals
            .get(&id.name)
            .cloned()
            .ok_or_else(|| CondEvalError::NotDefined(id.name.as_str().to_string())),
        Expr::Integer { value, .. } => Ok(Value::Integer(*value)),
        Expr::StringLit { value, .. } => Ok(Value::String(value.clone())),
        Expr::Boolean { value, .. } => Ok(Value::Boolean(*value)),
        Expr::Null { .. } => Ok(Value::Null),
        Expr::List { elements, .. } => {
            let values = elements.iter().map(|e| eval(e, locals)).collect::<CondResult<Vec<_>>>()?;
            Ok(Value::new_list(values))
        }
        Expr::Negate { value, .. } => match eval(value, locals)? {
            Value::Integer(n) => Ok(Value::Integer(-n)),
            _ => Err(CondEvalError::BadOperandForUnary("-")),
        },
        Expr::Invert { value, .. } => Ok(Value::Boolean(!eval(value, locals)?.truthy())),
        Expr::Binary { op, left, right, .. } => eval_binary(*op, left, right, locals),
        Expr::Index { target, index, .. } => eval_index(target, index, locals),
        Expr::Dot { .. } => Err(CondEvalError::Unsupported("attribute access")),
        Expr::Call { .. } => Err(CondEvalError::Unsupported("function calls")),
    }
}

fn eval_binary(op: BinOp, left: &Expr, right: &Expr, locals: &FxHashMap<Symbol, Value>) -> CondResult<Value> {
    match op {
        BinOp::Or => {
            let l = eval(left, locals)?;
            if l.truthy() {
                Ok(l)
            } else {
                eval(right, locals)
            }
        }
        BinOp::And => {
            let l = eval(left, locals)?;
            if !l.truthy() {
                Ok(l)
            } else {
                eval(right, locals)
            }
        }
        _ => {
            let l = eval(left, locals)?;
            let r = eval(right, locals)?;
            eval_binary_values(op, l, r)
        }
    }
}

fn eval_binary_values(op: BinOp, left: Value, right: Value) -> CondResult<Value> {
    use BinOp::*;
    match op {
        Eq => Ok(Value::Boolean(left.structural_eq(&right))),
        NotEq => Ok(Value::Boolean(!left.structural_eq(&right))),
        Less | Greater | LessEq | GreaterEq => compare(op, &left, &right),
        In => contains(&left, &right),
        Add => add(left, right),
        Sub | Mul | Div | IntDiv | Mod => arith(op, left, right),
        Or | And => unreachable!("short-circuit operators are handled by eval_binary"),
    }
}

fn add(left: Value, right: Value) -> CondResult<Value> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a + b)),
        (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (Value::List(a), Value::List(b)) => {
            let mut combined = a.borrow().clone();
            combined.extend(b.borrow().iter().cloned());
            Ok(Value::new_list(combined))
        }
        _ => Err(CondEvalError::UnsupportedOperand("+")),
    }
}

fn arith(op: BinOp, left: Value, right: Value) -> CondResult<Value> {
    let (Value::Integer(a), Value::Integer(b)) = (&left, &right) else {
        return Err(CondEvalError::UnsupportedOperand(arith_symbol(op)));
    };
    let (a, b) = (*a, *b);
    match op {
        BinOp::Sub => Ok(Value::Integer(a - b)),
        BinOp::Mul => Ok(Value::Integer(a * b)),
        BinOp::Div | BinOp::IntDiv => {
            if b == 0 {
                return Err(CondEvalError::DivisionByZero);
            }
            Ok(Value::Integer(floor_div(a, b)))
        }
        BinOp::Mod => {
            if b == 0 {
                return Err(CondEvalError::DivisionByZero);
            }
            Ok(Value::Integer(floor_mod(a, b)))
        }
        _ => unreachable!(),
    }
}

/// Python-style floor division: rounds toward negative infinity, not zero.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

/// Python-style modulo: result takes the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

fn compare(op: BinOp, left: &Value, right: &Value) -> CondResult<Value> {
    let ordering = match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => return Err(CondEvalError::UnsupportedOperand(compare_symbol(op))),
    };
    let result = match op {
        BinOp::Less => ordering.is_lt(),
        BinOp::LessEq => ordering.is_le(),
        BinOp::Greater => ordering.is_gt(),
        BinOp::GreaterEq => ordering.is_ge(),
        _ => unreachable!(),
    };
    Ok(Value::Boolean(result))
}

fn contains(left: &Value, right: &Value) -> CondResult<Value> {
    match right {
        Value::List(list) => Ok(Value::Boolean(list.borrow().iter().any(|v| v.structural_eq(left)))),
        Value::String(haystack) => match left {
            Value::String(needle) => Ok(Value::Boolean(haystack.contains(needle.as_str()))),
            _ => Err(CondEvalError::Type("str")),
        },
        other => Err(CondEvalError::Type(other.type_name())),
    }
}

fn eval_index(target: &Expr, index: &Expr, locals: &FxHashMap<Symbol, Value>) -> CondResult<Value> {
    let coll = eval(target, locals)?;
    let idx = eval(index, locals)?;
    let Value::Integer(idx) = idx else {
        return Err(CondEvalError::Type("int"));
    };
    match coll {
        Value::List(list) => {
            let list = list.borrow();
            resolve_index(idx, list.len()).map(|i| list[i].clone())
        }
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            resolve_index(idx, chars.len()).map(|i| Value::String(chars[i].to_string()))
        }
        other => Err(CondEvalError::Type(other.type_name())),
    }
}

fn resolve_index(idx: i64, len: usize) -> CondResult<usize> {
    let resolved = if idx < 0 { idx + len as i64 } else { idx };
    if resolved < 0 || resolved as usize >= len {
        Err(CondEvalError::OutOfRange)
    } else {
        Ok(resolved as usize)
    }
}

fn arith_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::IntDiv => "//",
        BinOp::Mod => "%",
        _ => unreachable!(),
    }
}

fn compare_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Less => "<",
        BinOp::LessEq => "<=",
        BinOp::Greater => ">",
        BinOp::GreaterEq => ">=",
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutel_par::Parser;

    fn locals_with(pairs: &[(&str, Value)]) -> FxHashMap<Symbol, Value> {
        pairs.iter().map(|(name, value)| (Symbol::intern(name), value.clone())).collect()
    }

    fn cond(source: &str) -> Expr {
        Parser::parse_standalone_expression(source).unwrap()
    }

    #[test]
    fn floor_division_rounds_toward_negative_infinity() {
        let locals = locals_with(&[]);
        assert_eq!(eval_condition(&cond("7 // -2 == -4"), &locals).unwrap(), true);
        assert_eq!(eval_condition(&cond("7 % -2 == -1"), &locals).unwrap(), true);
    }

    #[test]
    fn simple_comparison_against_a_local() {
        let locals = locals_with(&[("x", Value::Integer(5))]);
        assert!(eval_condition(&cond("x > 0"), &locals).unwrap());
        assert!(!eval_condition(&cond("x > 10"), &locals).unwrap());
    }

    #[test]
    fn short_circuiting_and_or() {
        let locals = locals_with(&[("x", Value::Integer(0)), ("y", Value::Integer(1))]);
        assert!(!eval_condition(&cond("x and y"), &locals).unwrap());
        assert!(eval_condition(&cond("x or y"), &locals).unwrap());
    }

    #[test]
    fn undefined_name_is_an_error_not_a_panic() {
        let locals = locals_with(&[]);
        assert!(matches!(eval_condition(&cond("missing == 1"), &locals), Err(CondEvalError::NotDefined(_))));
    }

    #[test]
    fn indexing_into_a_local_list() {
        let locals = locals_with(&[("items", Value::new_list(vec![Value::Integer(1), Value::Integer(2)]))]);
        assert!(eval_condition(&cond("items[1] == 2"), &locals).unwrap());
    }

    #[test]
    fn function_calls_are_rejected() {
        let locals = locals_with(&[]);
        assert!(matches!(eval_condition(&cond("foo()"), &locals), Err(CondEvalError::Unsupported(_))));
    }
}
