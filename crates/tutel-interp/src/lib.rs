//! tutel-interp — the Tutel tree-walking interpreter.
//!
//! Evaluates a `tutel-par` [`tutel_par::ast::Program`] against a call-stack
//! frame model, built-in dispatch table, and a pluggable turtle-graphics
//! host, following `InterpreterModule/Interpreter.py` (spec.md §4.4). The
//! interpreter also exposes the debugger seam used by `tutel-debug`:
//! [`Interpreter::set_debug_callback`], [`Interpreter::stop_handle`], and
//! [`Interpreter::call_stack`].

pub mod builtins;
pub mod error;
pub mod frame;
pub mod interp;
pub mod turtle;
pub mod value;

pub use error::{InterpError, InterpResult};
pub use frame::{CallStack, StackFrame};
pub use interp::Interpreter;
pub use turtle::{Color, GuiHost, GuiMock, Position, Turtle};
pub use value::Value;
