//! Request/response transports (spec.md §4.6), grounded in
//! `RequestsHandlerInterface.py`'s four-method shape (`start`/`stop`/
//! `emit_event`/`join`) but adapted to synchronous Rust: a transport owns
//! the request-reading loop and drives a [`Debugger`] directly instead of
//! handing requests to it through a shared queue, since nothing else here
//! touches the `Debugger` concurrently (the worker thread only ever talks
//! back through [`Event`]s).
//!
//! Neither transport pulls in an async runtime: the teacher crate's
//! dependency stack carries none, so both are built on blocking
//! `std::io`/`std::net` plus a handful of OS threads, in the same style
//! `tutel-debug`'s own worker/resume-gate plumbing already uses.

pub mod socket;
pub mod stdio;

use std::sync::Arc;

use crate::debugger::Debugger;
use crate::protocol::Event;

/// A function that renders one [`Event`] to the wire. Each transport
/// builds its own before constructing the [`Debugger`] that uses it,
/// since events can be emitted from the interpreter worker thread at any
/// time, not just in response to a request.
pub type EventSink = Arc<dyn Fn(Event) + Send + Sync>;

/// Serves requests until the client disconnects or sends `exit`. Mirrors
/// `RequestsHandlerInterface::start` + its handler-thread loop, collapsed
/// into one blocking call since each transport already owns whatever
/// background threads it needs.
///
/// The transport, not the caller, owns the `EventSink` it hands to
/// `make_debugger`: the socket transport's sink writes onto the very
/// outgoing channel its send thread drains, which only exists once a
/// client has connected, so the `Debugger` can't be built until `serve`
/// is already underway.
pub trait Transport {
    fn serve(self, make_debugger: Box<dyn FnOnce(EventSink) -> Debugger>) -> std::io::Result<()>;
}

fn render_response(response: &crate::protocol::Response) -> String {
    serde_json::to_string(response).expect("Response serialization is infallible")
}

fn render_event(event: &Event) -> String {
    serde_json::to_string(event).expect("Event serialization is infallible")
}
