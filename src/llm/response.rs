//! Parsing of chat-completion response bodies
//!
//! Pulls the first choice's text, the finish reason and token usage out of an
//! OpenAI-compatible response.

use serde_json::Value;

use crate::error::{Result, TaskpilotError};
use crate::llm::types::{CompletionResponse, FinishReason, Usage};

/// Parse a raw chat-completions response into a CompletionResponse
pub fn parse_response(response: &Value) -> Result<CompletionResponse> {
    let choice = response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| TaskpilotError::Llm("Response has no choices".to_string()))?;

    // A null content is legal (tool-call turns); treat it as empty text
    let content = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string();

    let finish_reason = choice
        .get("finish_reason")
        .and_then(|s| s.as_str())
        .map(parse_finish_reason)
        .unwrap_or_default();

    let usage = response.get("usage").map(parse_usage).unwrap_or_default();

    Ok(CompletionResponse {
        content,
        finish_reason,
        usage,
    })
}

/// Parse finish reason string into FinishReason enum
fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "tool_calls" | "function_call" => FinishReason::ToolCalls,
        "content_filter" => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

/// Parse usage object from response
fn parse_usage(usage: &Value) -> Usage {
    Usage {
        prompt_tokens: usage.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
        completion_tokens: usage.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
    }
}

/// Pull the provider's error message out of an error body, if it has one
pub fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error")?.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_response_text() {
        let response = json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello, world!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });

        let result = parse_response(&response).unwrap();
        assert_eq!(result.content, "Hello, world!");
        assert_eq!(result.finish_reason, FinishReason::Stop);
        assert_eq!(result.usage.prompt_tokens, 10);
        assert_eq!(result.usage.completion_tokens, 5);
    }

    #[test]
    fn test_parse_response_null_content() {
        let response = json!({
            "choices": [{
                "message": {"role": "assistant", "content": null},
                "finish_reason": "tool_calls"
            }]
        });

        let result = parse_response(&response).unwrap();
        assert!(result.content.is_empty());
        assert_eq!(result.finish_reason, FinishReason::ToolCalls);
        assert_eq!(result.usage.total(), 0);
    }

    #[test]
    fn test_parse_response_length_cutoff() {
        let response = json!({
            "choices": [{"message": {"content": "[{\"tool_name\":"}, "finish_reason": "length"}]
        });

        let result = parse_response(&response).unwrap();
        assert!(result.finish_reason.is_truncated());
    }

    #[test]
    fn test_parse_response_without_choices() {
        let response = json!({"object": "chat.completion", "choices": []});
        assert!(parse_response(&response).is_err());
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        assert_eq!(api_error_message(body), "Invalid API Key");
        assert_eq!(api_error_message("gateway timeout"), "gateway timeout");
    }
}
