//! Conversation trace handed to the synthesis call

use super::outcome::TaskResult;
use crate::llm::{Message, ToolCall};

/// Tool-call id for the task at execution position `task_number`
pub fn call_id(task_number: usize) -> String {
    format!("call_{}", task_number)
}

/// System prompt, the user query, then one assistant tool call and one tool
/// reply per executed task
pub fn build_trace(system_prompt: &str, query: &str, results: &[TaskResult]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2 + results.len() * 2);
    messages.push(Message::system(system_prompt));
    messages.push(Message::user(query));

    for result in results {
        let id = call_id(result.task_number);
        messages.push(Message::assistant_tool_call(ToolCall::new(
            id.clone(),
            result.tool_name.clone(),
            result.params_value(),
        )));
        messages.push(Message::tool_result(id, result.result_text()));
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use serde_json::{Map, json};

    fn weather_result() -> TaskResult {
        let mut parameters = Map::new();
        parameters.insert("location".to_string(), json!("Ontario"));
        TaskResult {
            task_number: 1,
            task_id: 2,
            tool_name: "get_weather".to_string(),
            parameters,
            result: json!({"weather": {"condition": "Clear"}}),
            is_error: false,
            resolved: false,
        }
    }

    #[test]
    fn test_empty_trace() {
        let trace = build_trace("system", "hello", &[]);
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].role, Role::System);
        assert_eq!(trace[1].content.as_deref(), Some("hello"));
    }

    #[test]
    fn test_trace_pairs_calls_with_results() {
        let trace = build_trace("system", "weather?", &[weather_result()]);
        assert_eq!(trace.len(), 4);

        let call = &trace[2];
        assert_eq!(call.role, Role::Assistant);
        assert!(call.content.is_none());
        assert_eq!(call.tool_calls[0].id, "call_1");
        assert_eq!(call.tool_calls[0].name, "get_weather");

        let wire = call.to_wire();
        assert_eq!(wire["tool_calls"][0]["function"]["arguments"], r#"{"location":"Ontario"}"#);

        let reply = &trace[3];
        assert_eq!(reply.role, Role::Tool);
        assert_eq!(reply.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(reply.content.as_deref(), Some(r#"{"weather":{"condition":"Clear"}}"#));
    }
}
