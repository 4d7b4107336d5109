//! Per-file breakpoint bookkeeping (spec.md §4.5).
//!
//! Grounded in `TutelDebugger.py`'s `bp_possible_lines`/`breakpoints` state
//! and `_get_bp_possible_lines`: a line is a valid breakpoint location if,
//! once its `#`-comment suffix is stripped, it has any non-whitespace
//! content left.

use std::collections::BTreeMap;

use tutel_par::ast::Expr;
use tutel_par::Parser;

use crate::error::{DebuggerError, DebuggerResult};
use crate::protocol::BreakpointInfo;

/// One set breakpoint: an optional source condition, parsed once at
/// `set` time so evaluating it at a hit never re-parses.
pub struct Breakpoint {
    pub condition_source: Option<String>,
    pub condition: Option<Expr>,
}

/// Everything the debugger tracks for one loaded source file.
pub struct FileState {
    pub source: String,
    bp_possible_lines: Vec<u32>,
    breakpoints: BTreeMap<u32, Breakpoint>,
}

impl FileState {
    pub fn new(source: String) -> Self {
        let bp_possible_lines = compute_bp_possible_lines(&source);
        Self {
            source,
            bp_possible_lines,
            breakpoints: BTreeMap::new(),
        }
    }

    pub fn bp_possible_lines(&self) -> &[u32] {
        &self.bp_possible_lines
    }

    pub fn is_possible_line(&self, line: u32) -> bool {
        self.bp_possible_lines.binary_search(&line).is_ok()
    }

    pub fn set_breakpoint(&mut self, line: u32, condition_source: Option<String>) -> DebuggerResult<()> {
        if !self.is_possible_line(line) {
            return Err(DebuggerError::InvalidBreakpointLine { line });
        }
        let condition = condition_source
            .as_deref()
            .map(Parser::parse_standalone_expression)
            .transpose()?;
        self.breakpoints.insert(line, Breakpoint { condition_source, condition });
        Ok(())
    }

    pub fn remove_breakpoint(&mut self, line: u32) -> DebuggerResult<()> {
        self.breakpoints
            .remove(&line)
            .map(|_| ())
            .ok_or(DebuggerError::NoSuchBreakpoint { line })
    }

    pub fn remove_all_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn breakpoint_at(&self, line: u32) -> Option<&Breakpoint> {
        self.breakpoints.get(&line)
    }

    pub fn has_breakpoint_at(&self, line: u32) -> bool {
        self.breakpoints.contains_key(&line)
    }

    pub fn list_breakpoints(&self) -> Vec<BreakpointInfo> {
        self.breakpoints
            .iter()
            .map(|(line, bp)| BreakpointInfo { line: *line, condition: bp.condition_source.clone() })
            .collect()
    }

    /// Already-parsed conditions, keyed by line, for handing straight to
    /// the line hook at `run` time without re-parsing condition text.
    pub fn breakpoint_conditions(&self) -> BTreeMap<u32, Option<Expr>> {
        self.breakpoints.iter().map(|(line, bp)| (*line, bp.condition.clone())).collect()
    }

    /// Drops breakpoints set on lines the (re)loaded source no longer
    /// recognises as statement boundaries (`TutelDebuggerInteractive.py`'s
    /// `do_file`: "retain only still-valid breakpoints").
    pub fn reload(&mut self, source: String) {
        self.bp_possible_lines = compute_bp_possible_lines(&source);
        self.source = source;
        let possible = &self.bp_possible_lines;
        self.breakpoints.retain(|line, _| possible.binary_search(line).is_ok());
    }
}

fn compute_bp_possible_lines(source: &str) -> Vec<u32> {
    source
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let code = line.split('#').next().unwrap_or("");
            if code.trim().is_empty() {
                None
            } else {
                Some((idx + 1) as u32)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_comment_only_lines_are_excluded() {
        let lines = compute_bp_possible_lines("foo(){\n\n  # a comment\n  x = 1;\n}\n");
        assert_eq!(lines, vec![1, 4, 5]);
    }

    #[test]
    fn setting_a_breakpoint_on_an_impossible_line_fails() {
        let mut state = FileState::new("foo(){\n\n  x = 1;\n}\n".to_string());
        assert!(matches!(
            state.set_breakpoint(2, None),
            Err(DebuggerError::InvalidBreakpointLine { line: 2 })
        ));
    }

    #[test]
    fn conditional_breakpoint_parses_its_condition() {
        let mut state = FileState::new("foo(){\n  x = 1;\n}\n".to_string());
        state.set_breakpoint(2, Some("x > 0".to_string())).unwrap();
        let bp = state.breakpoint_at(2).unwrap();
        assert!(bp.condition.is_some());
    }

    #[test]
    fn reload_drops_breakpoints_that_no_longer_land_on_a_statement() {
        let mut state = FileState::new("foo(){\n  x = 1;\n  y = 2;\n}\n".to_string());
        state.set_breakpoint(2, None).unwrap();
        state.set_breakpoint(3, None).unwrap();
        state.reload("foo(){\n  x = 1;\n}\n".to_string());
        assert!(state.has_breakpoint_at(2));
        assert!(!state.has_breakpoint_at(3));
    }
}
