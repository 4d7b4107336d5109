//! Command modules for the `tutel` CLI.
//!
//! Each subcommand is implemented in its own file, following the teacher's
//! one-module-per-subcommand layout.

pub mod debug;
pub mod run;
