//! Tool registry - the fixed set of tools plus name-based dispatch

use serde_json::Value;

use super::{
    FindDateTimeTool, GetWeatherTool, SendEmailTool, Tool, ToolContext, ToolError, ToolOutput,
    TranslateTextTool, WebSearchTool,
};
use crate::llm::ToolDefinition;

/// Holds the tools available to a run, in registration order
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with the built-in tools
    pub fn standard() -> Self {
        let mut registry = Self::new();

        registry.register(Box::new(WebSearchTool));
        registry.register(Box::new(FindDateTimeTool));
        registry.register(Box::new(GetWeatherTool));
        registry.register(Box::new(SendEmailTool));
        registry.register(Box::new(TranslateTextTool));

        registry
    }

    /// Create an empty registry (for custom tool sets)
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Add a tool, replacing any tool registered under the same name
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get the list of tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get tool definitions for the LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// The catalogue shown to the planner, as pretty-printed JSON
    pub fn describe_for_planner(&self) -> String {
        let entries: Vec<Value> = self
            .definitions()
            .iter()
            .map(ToolDefinition::to_planner_entry)
            .collect();
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
    }

    /// Required parameters of `name` that are absent from `params`
    pub fn missing_required(&self, name: &str, params: &Value) -> Vec<String> {
        let Some(tool) = self.get(name) else {
            return Vec::new();
        };

        tool.definition()
            .required_params()
            .into_iter()
            .filter(|p| params.get(*p).is_none_or(|v| v.is_null()))
            .map(str::to_string)
            .collect()
    }

    /// Execute a tool by name; failures come back as error outputs
    pub async fn execute(&self, name: &str, params: Value, ctx: &ToolContext) -> ToolOutput {
        let Some(tool) = self.get(name) else {
            return ToolOutput::error(ToolError::Unknown(name.to_string()).to_string());
        };

        match tool.execute(params, ctx).await {
            Ok(content) => ToolOutput::success(content),
            Err(e) => {
                log::warn!("Tool {} failed: {}", name, e);
                ToolOutput::error(format!("Error running {}: {}", name, e))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
