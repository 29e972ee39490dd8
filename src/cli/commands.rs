//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - ask: run a query through the pipeline
//! - tools: list the registered tools
//!
//! With no subcommand the query is read from stdin.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Taskpilot - break a request into tool calls, run them, and answer
#[derive(Parser, Debug)]
#[command(name = "taskpilot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a query through the planner, the tools and the final answer
    Ask {
        /// The query; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print the whole outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the tools the planner may use
    Tools,
}

impl Commands {
    /// The query text of an `ask` command
    pub fn query_text(&self) -> Option<String> {
        match self {
            Commands::Ask { query, .. } => Some(query.join(" ")),
            Commands::Tools => None,
        }
    }
}
