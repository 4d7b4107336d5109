//! The interactive debugger entry point: loads a source file, then serves
//! debugger requests over the chosen transport until the client sends
//! `exit` or disconnects (spec.md §4.5-4.6).

use std::path::PathBuf;

use tracing::info;
use tutel_debug::{Debugger, SocketTransport, StdioTransport, Transport};

use crate::error::{Result, TutelCliError};

pub enum TransportKind {
    Stdio,
    Socket(String),
}

impl TransportKind {
    pub fn parse(name: &str, addr: Option<&str>) -> Result<Self> {
        match name {
            "stdio" => Ok(TransportKind::Stdio),
            "socket" => {
                let addr = addr.ok_or_else(|| {
                    TutelCliError::Config("socket transport requires --addr <host:port>".to_string())
                })?;
                Ok(TransportKind::Socket(addr.to_string()))
            }
            other => Err(TutelCliError::Config(format!("unknown transport '{other}', expected stdio or socket"))),
        }
    }
}

pub struct DebugArgs {
    pub file: Option<PathBuf>,
    pub transport: TransportKind,
}

/// Starts a debugging session. If `args.file` is given, it is loaded
/// before the transport starts serving requests (so an IDE that connects
/// and immediately sends `get_bp_lines`/`break`/`run` doesn't need a
/// round trip through `file` first); the `file` command remains
/// available over the wire regardless, for sessions that load a file by
/// request instead.
pub fn run(args: DebugArgs) -> Result<()> {
    let preload = match &args.file {
        Some(path) => {
            if !path.exists() {
                return Err(TutelCliError::FileNotFound(path.display().to_string()));
            }
            let source = std::fs::read_to_string(path)?;
            Some((path.display().to_string(), source))
        }
        None => None,
    };

    info!(transport = ?preload.as_ref().map(|_| "file-preloaded"), "starting debugger session");

    let make_debugger = Box::new(move |sink| {
        let mut debugger = Debugger::new(sink);
        if let Some((path, source)) = preload {
            debugger.load_source(path, source);
        }
        debugger
    });

    match args.transport {
        TransportKind::Stdio => StdioTransport::new().serve(make_debugger)?,
        TransportKind::Socket(addr) => SocketTransport::new(addr).serve(make_debugger)?,
    }
    Ok(())
}
