//! CLI for the `mcpforge-gen` binary: generate, inspect, and validate.

mod commands;

pub use commands::{generate_to_dir, run_cli, Cli, Commands};
