//! Newline-framed TCP transport with ACK-gated flow control, grounded in
//! `WebSocketsRequestsHandler.py`: at most one message is in flight from
//! server to client at a time, and the client must echo a literal `ACK`
//! line before the next one is sent (including before the very first
//! message, which doubles as a connect handshake in the original).
//!
//! The original runs three `asyncio` tasks (`handle_send`/`handle_receive`/
//! `handle_request`) cooperating through `asyncio.Queue`s; here each
//! becomes a blocking OS thread cooperating through `crossbeam::channel`s,
//! since this crate carries no async runtime.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};

use crossbeam::channel::{unbounded, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::debugger::Debugger;
use crate::protocol::{parse_request, Command, Response};

use super::{render_event, render_response, EventSink, Transport};

const ACK: &str = "ACK";

#[derive(Default)]
struct AckGate {
    acked: Mutex<bool>,
    condvar: Condvar,
}

impl AckGate {
    fn wait_until_acked(&self) {
        let mut acked = self.acked.lock();
        while !*acked {
            self.condvar.wait(&mut acked);
        }
    }

    fn clear(&self) {
        *self.acked.lock() = false;
    }

    fn signal(&self) {
        *self.acked.lock() = true;
        self.condvar.notify_one();
    }
}

pub struct SocketTransport<A> {
    addr: A,
}

impl<A: ToSocketAddrs> SocketTransport<A> {
    pub fn new(addr: A) -> Self {
        Self { addr }
    }
}

/// Built before the [`Debugger`], since events can arrive from the worker
/// thread at any point during the session. Free function, not tied to any
/// particular `SocketTransport<A>`, since it only needs the output channel.
fn event_sink(output_tx: Sender<String>) -> EventSink {
    std::sync::Arc::new(move |event| {
        let _ = output_tx.send(render_event(&event));
    })
}

impl<A: ToSocketAddrs> Transport for SocketTransport<A> {
    fn serve(self, make_debugger: Box<dyn FnOnce(EventSink) -> Debugger>) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.addr)?;
        let (stream, peer) = listener.accept()?;
        debug!(%peer, "debugger client connected");
        run_session(stream, make_debugger)
    }
}

fn run_session(stream: TcpStream, make_debugger: Box<dyn FnOnce(EventSink) -> Debugger>) -> std::io::Result<()> {
    let reader_stream = stream.try_clone()?;
    let mut writer = stream;

    let gate = std::sync::Arc::new(AckGate::default());
    let (output_tx, output_rx) = unbounded::<String>();
    let (request_tx, request_rx) = unbounded::<String>();
    let mut debugger = make_debugger(event_sink(output_tx.clone()));

    let receiver = {
        let gate = std::sync::Arc::clone(&gate);
        std::thread::Builder::new()
            .name("tutel-debugger-socket-receive".to_string())
            .spawn(move || {
                let reader = BufReader::new(reader_stream);
                for line in reader.lines() {
                    let Ok(line) = line else { break };
                    if line == ACK {
                        gate.signal();
                    } else if request_tx.send(line).is_err() {
                        break;
                    }
                }
                // Unblock a sender that's waiting on an ACK that will never
                // arrive now that the client is gone.
                gate.signal();
            })
            .expect("failed to spawn debugger socket receive thread")
    };

    let sender = {
        let gate = std::sync::Arc::clone(&gate);
        std::thread::Builder::new()
            .name("tutel-debugger-socket-send".to_string())
            .spawn(move || {
                gate.wait_until_acked();
                for message in output_rx.iter() {
                    gate.clear();
                    if writer.write_all(message.as_bytes()).is_err() || writer.write_all(b"\n").is_err() {
                        break;
                    }
                    gate.wait_until_acked();
                }
            })
            .expect("failed to spawn debugger socket send thread")
    };

    for line in request_rx.iter() {
        let (response, exiting) = match parse_request(line.trim()) {
            Ok(request) => {
                let exiting = request.command == Command::Exit;
                (debugger.handle_request(request), exiting)
            }
            Err(error) => (Response::BadRequest { message: error.to_string() }, false),
        };
        if output_tx.send(render_response(&response)).is_err() || exiting {
            break;
        }
    }

    drop(output_tx);
    let _ = receiver.join();
    let _ = sender.join();
    Ok(())
}
