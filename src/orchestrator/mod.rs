//! Orchestrator module - the query pipeline
//!
//! This module provides:
//! - Orchestrator for running a query from planning to final answer
//! - TaskResult and QueryOutcome for what a run produced
//! - The resolver heuristics and the synthesis trace builder

mod outcome;
mod pipeline;
mod resolver;
mod trace;

pub use outcome::{QueryOutcome, TaskResult};
pub use pipeline::Orchestrator;
pub use resolver::{condense_result, has_placeholder, needs_resolution, referenced_task_ids};
pub use trace::{build_trace, call_id};
