/// OpenAI-compatible chat-completion client module.
///
/// This module provides a blocking HTTP client for chat-completion APIs
/// (DeepSeek by default), the wire types for messages and tool calls,
/// and the retry policy shared with the embedding client.
mod client;
mod retry;
mod types;

pub use client::{
    ChatClient, ChatClientBuilder, ChatClientTrait, DEFAULT_BASE_URL, DEFAULT_MODEL, LlmError,
};
pub use retry::{BACKOFF_DELAYS, Transient, retry_with_backoff, retry_with_delays};
pub use types::{
    ChatMessage, ChatRequest, FunctionCall, FunctionDefinition, Role, ToolCall, ToolDefinition,
};
