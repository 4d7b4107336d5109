//! Line-oriented stdin/stdout transport, grounded in
//! `StdRequestsHandler.py`: prompt, blocking read of one line, parse,
//! dispatch, write the response — no framing beyond newlines, since
//! `sys.stdin.readline()`/`sys.stdout.write()` already give that for free
//! and `BufRead::read_line` gives the same here.

use std::io::{self, BufRead, Write};

use crate::debugger::Debugger;
use crate::protocol::{parse_request, Command, Event};

use super::{render_event, render_response, EventSink, Transport};

pub struct StdioTransport {
    prompt: &'static str,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self { prompt: "> " }
    }

    /// Built before the [`Debugger`] it will be handed to, since the
    /// debugger's worker thread can call this at any time.
    pub fn event_sink() -> EventSink {
        std::sync::Arc::new(|event: Event| {
            println!("{}", render_event(&event));
            let _ = io::stdout().flush();
        })
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for StdioTransport {
    fn serve(self, make_debugger: Box<dyn FnOnce(EventSink) -> Debugger>) -> io::Result<()> {
        let mut debugger = make_debugger(Self::event_sink());
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            print!("{}", self.prompt);
            io::stdout().flush()?;

            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let (response, exiting) = match parse_request(trimmed) {
                Ok(request) => {
                    let exiting = request.command == Command::Exit;
                    (debugger.handle_request(request), exiting)
                }
                Err(error) => (crate::protocol::Response::BadRequest { message: error.to_string() }, false),
            };
            println!("{}", render_response(&response));
            io::stdout().flush()?;

            if exiting {
                break;
            }
        }
        Ok(())
    }
}
