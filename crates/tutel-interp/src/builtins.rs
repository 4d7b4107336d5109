//! The fixed catalogue of built-in names (spec.md §4.4, §6, §9) plus the
//! `Color`/`Position`/`Turtle` constructors (`TutelBuiltins.py`).
//!
//! This module owns only the name table and arity ranges, used for
//! global registration, shadow-detection, and `MismatchedArgsCount`
//! checks. Call dispatch lives in `interp::Interpreter::call_builtin`,
//! which needs the full interpreter context (globals, turtle id counter,
//! the `GuiHost`) that this table does not carry.

pub struct BuiltinSpec {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
}

pub const BUILTINS: &[BuiltinSpec] = &[
    BuiltinSpec { name: "print", min_args: 0, max_args: usize::MAX },
    BuiltinSpec { name: "input", min_args: 0, max_args: 1 },
    BuiltinSpec { name: "sleep", min_args: 1, max_args: 1 },
    BuiltinSpec { name: "type", min_args: 1, max_args: 1 },
    BuiltinSpec { name: "hex", min_args: 1, max_args: 1 },
    BuiltinSpec { name: "range", min_args: 1, max_args: 3 },
    BuiltinSpec { name: "len", min_args: 1, max_args: 1 },
    BuiltinSpec { name: "pow", min_args: 2, max_args: 2 },
    BuiltinSpec { name: "str", min_args: 1, max_args: 1 },
    BuiltinSpec { name: "int", min_args: 1, max_args: 1 },
    BuiltinSpec { name: "Turtle", min_args: 0, max_args: 0 },
    BuiltinSpec { name: "Color", min_args: 3, max_args: 3 },
    BuiltinSpec { name: "Position", min_args: 2, max_args: 2 },
];

pub fn lookup(name: &str) -> Option<&'static BuiltinSpec> {
    BUILTINS.iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_is_looked_up_by_its_own_name() {
        for spec in BUILTINS {
            assert!(lookup(spec.name).is_some());
        }
    }

    #[test]
    fn unknown_name_is_not_a_builtin() {
        assert!(lookup("definitely_not_a_builtin").is_none());
    }
}
