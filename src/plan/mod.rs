//! Planning - from a free-form planner reply to an ordered task list
//!
//! parse_plan recovers tasks from whatever JSON the model produced, and
//! validate_plan keeps the ones the registry can run, in dependency order.

mod parser;
mod task;
mod validate;

pub use parser::{extract_json_object, parse_plan};
pub use task::{PlanSource, Task, TaskPlan};
pub use validate::{ValidatedPlan, validate_plan};
