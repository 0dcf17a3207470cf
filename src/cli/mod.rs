//! CLI module for autotdd - command-line arguments for a single run.

pub mod commands;

pub use commands::Cli;
