//! LLM Client Layer - chat completions over an OpenAI-compatible API
//!
//! This module provides:
//! - Message types, including tool-call and tool-result turns
//! - LlmClient trait for API abstraction
//! - ChatClient implementation
//! - MockLlmClient for tests

pub mod chat;
pub mod client;
pub mod response;
pub mod types;

pub use chat::{ChatClient, ChatConfig};
pub use client::{LlmClient, MockLlmClient};
pub use response::parse_response;
pub use types::{
    CompletionRequest, CompletionResponse, FinishReason, Message, Role, ToolCall, ToolDefinition,
    Usage,
};
