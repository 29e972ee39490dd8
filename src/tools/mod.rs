//! Tool system - the fixed registry of tools the planner may call
//!
//! Each tool is a thin stateless wrapper around a third-party HTTP or SMTP
//! service. Tools share a ToolContext that carries the HTTP client and the
//! tool configuration.

mod context;
mod datetime;
mod email;
mod geocode;
mod registry;
mod translate;
mod weather;
mod web_search;

pub use context::{ToolContext, ToolError};
pub use datetime::FindDateTimeTool;
pub use email::SendEmailTool;
pub use geocode::{Place, geocode};
pub use registry::ToolRegistry;
pub use translate::TranslateTextTool;
pub use weather::GetWeatherTool;
pub use web_search::WebSearchTool;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::ToolDefinition;

/// A tool the orchestrator can execute
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the planner's tool_name)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Result from tool execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub content: Value,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: Value) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: Value::String(message.into()),
            is_error: true,
        }
    }
}

/// Fetch a required, non-empty string parameter
pub(crate) fn require_str<'a>(params: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing '{}' parameter", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_output_success() {
        let output = ToolOutput::success(json!({"temp": 21.5}));
        assert!(!output.is_error);
        assert_eq!(output.content, json!({"temp": 21.5}));
    }

    #[test]
    fn test_tool_output_error() {
        let output = ToolOutput::error("Location not found: Atlantis");
        assert!(output.is_error);
        assert_eq!(output.content, json!("Location not found: Atlantis"));
    }

    #[test]
    fn test_require_str() {
        let params = json!({"query": "  rust  ", "empty": "", "num": 3});
        assert_eq!(require_str(&params, "query").unwrap(), "rust");
        assert!(require_str(&params, "empty").is_err());
        assert!(require_str(&params, "num").is_err());
        assert!(require_str(&params, "missing").is_err());
    }
}
