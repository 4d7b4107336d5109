//! The Tutel runtime value model (spec.md §3 Value).
//!
//! Lists and turtle handles carry reference semantics (mirroring Python's
//! object-identity lists and turtle instances): `Rc<RefCell<_>>` lets two
//! variables bound to the same list or turtle observe each other's
//! in-place mutations, as `Value.py`'s dunder-wrapped container did.

use std::cell::RefCell;
use std::rc::Rc;

use tutel_util::Symbol;

use crate::turtle::{Color, Position, Turtle};

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type TurtleRef = Rc<RefCell<Turtle>>;

#[derive(Clone, Debug)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    String(String),
    Null,
    List(ListRef),
    Turtle(TurtleRef),
    /// A built-in function, looked up by name at call time.
    Builtin(Symbol),
    /// A reference to a user-defined function, resolved by name against
    /// the running program's function table at call time.
    Function(Symbol),
    Color(Color),
    Position(Position),
}

impl Value {
    pub fn new_list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "int",
            Value::Boolean(_) => "bool",
            Value::String(_) => "str",
            Value::Null => "null",
            Value::List(_) => "list",
            Value::Turtle(_) => "Turtle",
            Value::Builtin(_) => "builtin_function",
            Value::Function(_) => "function",
            Value::Color(_) => "Color",
            Value::Position(_) => "Position",
        }
    }

    /// Python-style truthiness (spec.md §4.4): `null`, `false`, `0`, and
    /// empty string/list are false; everything else is true.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Null => false,
            Value::List(list) => !list.borrow().is_empty(),
            Value::Turtle(_)
            | Value::Builtin(_)
            | Value::Function(_)
            | Value::Color(_)
            | Value::Position(_) => true,
        }
    }

    /// `str(value)`-style rendering, used by `print` and the `str` builtin.
    pub fn display(&self) -> String {
        match self {
            Value::Integer(n) => n.to_string(),
            Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Value::String(s) => s.clone(),
            Value::Null => "null".to_string(),
            Value::List(list) => {
                let items: Vec<String> = list.borrow().iter().map(Value::repr).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Turtle(turtle) => format!("Turtle#{}", turtle.borrow().id),
            Value::Builtin(name) => format!("<built-in function {}>", name.as_str()),
            Value::Function(name) => format!("<function {}>", name.as_str()),
            Value::Color(c) => format!("Color(r={}, g={}, b={})", c.r, c.g, c.b),
            Value::Position(p) => format!("Position(x={}, y={})", p.x, p.y),
        }
    }

    /// `repr(value)`-style rendering for elements nested inside a list
    /// display: strings are quoted.
    fn repr(&self) -> String {
        match self {
            Value::String(s) => format!("'{s}'"),
            other => other.display(),
        }
    }

    /// Structural (`==`) equality; turtle handles compare by identity.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::List(a), Value::List(b)) => {
                let a = a.borrow();
                let b = b.borrow();
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
            }
            (Value::Turtle(a), Value::Turtle(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            (Value::Color(a), Value::Color(b)) => a == b,
            (Value::Position(a), Value::Position(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_containers_are_falsy() {
        assert!(!Value::String(String::new()).truthy());
        assert!(!Value::new_list(vec![]).truthy());
        assert!(!Value::Integer(0).truthy());
        assert!(!Value::Null.truthy());
    }

    #[test]
    fn lists_sharing_an_rc_observe_each_others_mutation() {
        let a = Value::new_list(vec![Value::Integer(1)]);
        let b = a.clone();
        if let Value::List(list) = &a {
            list.borrow_mut().push(Value::Integer(2));
        }
        if let Value::List(list) = &b {
            assert_eq!(list.borrow().len(), 2);
        } else {
            panic!("expected list");
        }
    }

    #[test]
    fn structural_eq_compares_list_contents() {
        let a = Value::new_list(vec![Value::Integer(1), Value::Integer(2)]);
        let b = Value::new_list(vec![Value::Integer(1), Value::Integer(2)]);
        assert!(a.structural_eq(&b));
    }
}
