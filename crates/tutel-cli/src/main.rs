//! `tutel` - batch runner and interactive debugger for the Tutel
//! scripting language.
//!
//! This is the main entry point. It uses clap for argument parsing and
//! dispatches to the batch runner or the debugger based on `--debug`.

mod commands;
mod config;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::debug::{run as run_debug, DebugArgs, TransportKind};
use commands::run::{run as run_batch, RunArgs};
use config::Config;
use error::Result;

/// Tutel - interpreter and debugger for the Tutel turtle-graphics language.
#[derive(Parser, Debug)]
#[command(name = "tutel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run or debug a Tutel program", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true, env = "TUTEL_VERBOSE")]
    verbose: bool,

    /// Path to a `tutel.toml` configuration file.
    #[arg(long, global = true, env = "TUTEL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a Tutel source file to completion (batch mode, spec.md §6 exit codes).
    Run(RunCommand),

    /// Start an interactive debugger session (spec.md §4.5-4.6).
    Debug(DebugCommand),
}

#[derive(Parser, Debug)]
struct RunCommand {
    /// The Tutel source file to execute.
    file: PathBuf,

    /// Entry function name (default: `main`, or the first function defined).
    #[arg(long)]
    entry: Option<String>,
}

#[derive(Parser, Debug)]
struct DebugCommand {
    /// The Tutel source file to preload before serving requests.
    file: Option<PathBuf>,

    /// Transport to serve the debugger protocol over: `stdio` or `socket`.
    #[arg(long)]
    transport: Option<String>,

    /// Socket address to bind, required when `--transport socket`.
    #[arg(long)]
    addr: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Configuration error: {error}");
            std::process::exit(-4);
        }
    };

    let result = match cli.command {
        Commands::Run(args) => execute_run(args, &config),
        Commands::Debug(args) => execute_debug(args, &config),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(error.exit_code());
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { EnvFilter::new("debug") } else { EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")) };
    let subscriber = fmt::layer().with_target(false).with_thread_ids(false).with_thread_names(false);
    let _ = tracing_subscriber::registry().with(filter).with(subscriber).try_init();
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

fn execute_run(args: RunCommand, config: &Config) -> Result<()> {
    let entry = args.entry.unwrap_or_else(|| config.entry.clone());
    run_batch(RunArgs { file: args.file, entry })
}

fn execute_debug(args: DebugCommand, config: &Config) -> Result<()> {
    let transport_name = args.transport.unwrap_or_else(|| config.transport.clone());
    let addr = args.addr.or_else(|| config.addr.clone());
    let transport = TransportKind::parse(&transport_name, addr.as_deref())?;
    run_debug(DebugArgs { file: args.file, transport })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_subcommand() {
        let cli = Cli::parse_from(["tutel", "run", "program.tutel"]);
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn parses_run_with_entry_override() {
        let cli = Cli::parse_from(["tutel", "run", "program.tutel", "--entry", "start"]);
        if let Commands::Run(args) = cli.command {
            assert_eq!(args.entry, Some("start".to_string()));
        } else {
            panic!("expected Run command");
        }
    }

    #[test]
    fn parses_debug_subcommand_with_socket_transport() {
        let cli = Cli::parse_from(["tutel", "debug", "program.tutel", "--transport", "socket", "--addr", "127.0.0.1:9000"]);
        if let Commands::Debug(args) = cli.command {
            assert_eq!(args.transport, Some("socket".to_string()));
            assert_eq!(args.addr, Some("127.0.0.1:9000".to_string()));
        } else {
            panic!("expected Debug command");
        }
    }

    #[test]
    fn parses_global_verbose_flag() {
        let cli = Cli::parse_from(["tutel", "--verbose", "run", "program.tutel"]);
        assert!(cli.verbose);
    }

    #[test]
    fn debug_without_file_is_allowed() {
        let cli = Cli::parse_from(["tutel", "debug"]);
        if let Commands::Debug(args) = cli.command {
            assert!(args.file.is_none());
        } else {
            panic!("expected Debug command");
        }
    }
}
