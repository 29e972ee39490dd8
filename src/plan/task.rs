//! Task model - one planned tool invocation
//!
//! Planner replies are loosely shaped, so a task is decoded from a JSON value
//! by hand rather than through a derived Deserialize.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{Result, TaskpilotError};

/// A single tool invocation proposed by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// 1-based position in the planner's output
    pub id: usize,
    pub tool_name: String,
    pub parameters: Map<String, Value>,
    /// Ids of earlier tasks whose results feed this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<usize>,
}

impl Task {
    pub fn new(id: usize, tool_name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            id,
            tool_name: tool_name.into(),
            parameters,
            depends_on: Vec::new(),
        }
    }

    pub fn with_depends_on(mut self, depends_on: Vec<usize>) -> Self {
        self.depends_on = depends_on;
        self
    }

    /// Parameters as a JSON object value
    pub fn params_value(&self) -> Value {
        Value::Object(self.parameters.clone())
    }

    /// Decode a planner element
    ///
    /// Accepts `tool_name`/`tool`/`name`, `parameters`/`params`/`arguments`
    /// and `depends_on`/`dependencies`. Parameters may arrive as a JSON string.
    pub fn from_value(id: usize, value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| TaskpilotError::Plan(format!("task {} is not an object", id)))?;

        let tool_name = first_key(obj, &["tool_name", "tool", "name"])
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TaskpilotError::Plan(format!("task {} has no tool name", id)))?;

        let parameters =
            decode_parameters(id, first_key(obj, &["parameters", "params", "arguments"]))?;
        let depends_on = first_key(obj, &["depends_on", "dependencies"])
            .map(decode_depends_on)
            .unwrap_or_default();

        Ok(Self {
            id,
            tool_name: tool_name.to_string(),
            parameters,
            depends_on,
        })
    }
}

fn first_key<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k))
}

fn decode_parameters(id: usize, value: Option<&Value>) -> Result<Map<String, Value>> {
    match value {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => Ok(map),
            _ => Err(TaskpilotError::Plan(format!(
                "task {} has string parameters that are not a JSON object",
                id
            ))),
        },
        Some(other) => Err(TaskpilotError::Plan(format!(
            "task {} has non-object parameters: {}",
            id, other
        ))),
    }
}

fn decode_depends_on(value: &Value) -> Vec<usize> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        single => std::slice::from_ref(single),
    };

    let mut ids: Vec<usize> = items
        .iter()
        .filter_map(|item| match item {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .filter(|id| *id > 0)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Where a plan's tasks came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    /// Decoded from JSON in the planner reply
    Parsed,
    /// Single default task used because the reply held no usable plan
    Fallback,
}

impl std::fmt::Display for PlanSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanSource::Parsed => write!(f, "parsed"),
            PlanSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Tasks decoded from a planner reply, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPlan {
    pub tasks: Vec<Task>,
    pub source: PlanSource,
}

impl TaskPlan {
    pub fn parsed(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            source: PlanSource::Parsed,
        }
    }

    /// One `fallback_tool` task carrying the raw query
    pub fn fallback(query: &str, fallback_tool: &str) -> Self {
        let mut parameters = Map::new();
        parameters.insert("query".to_string(), json!(query));

        Self {
            tasks: vec![Task::new(1, fallback_tool, parameters)],
            source: PlanSource::Fallback,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
