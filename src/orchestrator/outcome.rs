//! Results of a processed query

use serde::Serialize;
use serde_json::{Map, Value};

use crate::llm::Usage;
use crate::plan::PlanSource;

/// One executed task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    /// 1-based execution position
    pub task_number: usize,
    /// Planner id the task was created with
    pub task_id: usize,
    pub tool_name: String,
    /// Parameters the tool actually ran with
    pub parameters: Map<String, Value>,
    pub result: Value,
    pub is_error: bool,
    /// Whether the resolver rewrote the planner's parameters
    pub resolved: bool,
}

impl TaskResult {
    /// Result as text: strings verbatim, everything else as JSON
    pub fn result_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Parameters as a JSON object value
    pub fn params_value(&self) -> Value {
        Value::Object(self.parameters.clone())
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub query: String,
    pub plan_source: PlanSource,
    /// Tool names the planner proposed that are not registered
    pub rejected_tools: Vec<String>,
    pub warnings: Vec<String>,
    pub results: Vec<TaskResult>,
    pub final_answer: String,
    pub usage: Usage,
}

impl QueryOutcome {
    pub fn failed_tasks(&self) -> usize {
        self.results.iter().filter(|r| r.is_error).count()
    }
}
