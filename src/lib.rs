//! Taskpilot - natural-language task orchestration over a fixed tool set
//!
//! A query is broken into tool calls by a language model, the calls run in
//! dependency order (with later calls filled in from earlier results), and a
//! final model call turns the conversation trace into an answer.

pub mod config;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod plan;
pub mod prompt;
pub mod tools;

pub use error::{Result, TaskpilotError};
