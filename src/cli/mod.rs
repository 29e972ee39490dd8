//! CLI module for taskpilot - command-line interface, subcommands and output.

pub mod commands;
pub mod report;

pub use commands::Cli;
