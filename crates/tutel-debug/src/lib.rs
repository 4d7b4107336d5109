//! tutel-debug — the interactive Tutel debugger (spec.md §4.5-4.6).
//!
//! Drives a `tutel_interp::Interpreter` on a worker thread while
//! [`debugger::Debugger`] services commands from a request/response
//! [`transport`] on the calling thread, following `TutelDebugger.py` and
//! `TutelDebuggerInteractive.py`.

pub mod breakpoints;
pub mod condeval;
pub mod debugger;
pub mod error;
pub mod protocol;
pub mod transport;

pub use debugger::Debugger;
pub use error::{DebuggerError, DebuggerResult};
pub use protocol::{parse_request, render_traceback, Command, DebuggerRequest, Event, Response};
pub use transport::{socket::SocketTransport, stdio::StdioTransport, EventSink, Transport};
