/// Chat-completion HTTP client implementation.
///
/// This module provides `ChatClient` for making synchronous requests to an
/// OpenAI-compatible `/chat/completions` endpoint, along with error types and
/// the builder used to configure it.
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::retry::{BACKOFF_DELAYS, Transient, retry_with_delays};
use super::types::{ChatMessage, ChatRequest};

/// Default API endpoint (DeepSeek's OpenAI-compatible API).
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Errors that can occur when talking to the chat-completion API.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code; `body` keeps the server's explanation
    #[error("HTTP error: status {status}")]
    Http { status: u16, body: String },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The API answered but the answer was unusable
    #[error("API error: {message}")]
    Api { message: String },

    /// No API key configured
    #[error("Missing API key: set DEEPSEEK_API_KEY")]
    Auth,

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl LlmError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            LlmError::Timeout(error)
        } else {
            LlmError::Network(error)
        }
    }
}

impl Transient for LlmError {
    fn is_transient(&self) -> bool {
        match self {
            LlmError::Network(_) | LlmError::Timeout(_) => true,
            LlmError::Http { status, .. } => *status == 429 || (500..600).contains(status),
            LlmError::Serialization(_)
            | LlmError::Api { .. }
            | LlmError::Auth
            | LlmError::InvalidUrl(_) => false,
        }
    }
}

/// Builder for constructing `ChatClient` instances.
///
/// # Examples
///
/// ```
/// use realtor::llm::ChatClientBuilder;
///
/// let client = ChatClientBuilder::new()
///     .base_url("https://api.deepseek.com/v1")
///     .api_key("sk-test")
///     .model("deepseek-chat")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.model(), "deepseek-chat");
/// ```
#[derive(Debug, Default)]
pub struct ChatClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
    retry_delays: Option<Vec<Duration>>,
}

impl ChatClientBuilder {
    /// Creates a new `ChatClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL (e.g., "https://api.deepseek.com/v1").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the bearer token sent with every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the default model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Overrides the 60 second request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the 1s, 2s, 4s backoff between retries of transient
    /// failures. One retry is made per delay.
    pub fn retry_delays(mut self, delays: impl Into<Vec<Duration>>) -> Self {
        self.retry_delays = Some(delays.into());
        self
    }

    /// Builds the `ChatClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// Values not set on the builder fall back to `DEEPSEEK_BASE_URL`,
    /// `DEEPSEEK_API_KEY` and `DEEPSEEK_MODEL`, then to the defaults.
    /// A missing API key is not an error here; requests fail with
    /// `LlmError::Auth` instead.
    pub fn build(self) -> Result<ChatClient, LlmError> {
        let base_url = self
            .base_url
            .or_else(|| std::env::var("DEEPSEEK_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        let api_key = self
            .api_key
            .or_else(|| std::env::var("DEEPSEEK_API_KEY").ok())
            .filter(|key| !key.trim().is_empty());

        let model = self
            .model
            .or_else(|| std::env::var("DEEPSEEK_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        reqwest::Url::parse(&base_url)
            .map_err(|e| LlmError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(LlmError::Network)?;

        Ok(ChatClient {
            client,
            base_url,
            api_key,
            model,
            retry_delays: self
                .retry_delays
                .unwrap_or_else(|| BACKOFF_DELAYS.to_vec()),
        })
    }
}

/// Synchronous client for an OpenAI-compatible chat-completion API.
///
/// Construct it with `ChatClientBuilder`.
pub struct ChatClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    retry_delays: Vec<Duration>,
}

/// Trait for chat-completion operations.
///
/// Everything that talks to the model goes through this trait so tests can
/// substitute scripted responses.
pub trait ChatClientTrait: Send + Sync {
    /// Sends a chat-completion request and returns the first choice's message.
    fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError>;

    /// Sends `messages` without tools and returns the reply text.
    ///
    /// A reply without content yields an empty string.
    fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let request = ChatRequest::new(model, messages).max_tokens(max_tokens);
        let reply = self.complete(&request)?;
        Ok(reply.content.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

impl ChatClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the default model for this client.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns true if an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends a short greeting to verify the API is reachable and the key works.
    pub fn ping(&self) -> Result<String, LlmError> {
        self.chat(
            &self.model,
            vec![ChatMessage::user("Hello! Can you help with real estate?")],
            50,
        )
    }

    fn complete_internal(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::Auth)?;
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "sending chat completion"
        );

        retry_with_delays(&self.retry_delays, || {
            let response = self
                .client
                .post(&url)
                .bearer_auth(api_key)
                .json(request)
                .send()
                .map_err(LlmError::from_reqwest)?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                return Err(LlmError::Http {
                    status: status.as_u16(),
                    body,
                });
            }

            let body = response.text().map_err(LlmError::from_reqwest)?;
            parse_completion(&body)
        })
    }
}

impl ChatClientTrait for ChatClient {
    fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError> {
        self.complete_internal(request)
    }
}

/// Extracts `choices[0].message` from a completion response body.
fn parse_completion(body: &str) -> Result<ChatMessage, LlmError> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(LlmError::Serialization)?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| LlmError::Api {
            message: "Response contained no choices".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::error::Error;

    fn clear_env() {
        unsafe {
            std::env::remove_var("DEEPSEEK_BASE_URL");
            std::env::remove_var("DEEPSEEK_API_KEY");
            std::env::remove_var("DEEPSEEK_MODEL");
        }
    }

    #[test]
    fn http_error_display_includes_status() {
        let error = LlmError::Http {
            status: 401,
            body: "invalid key".to_string(),
        };
        assert_eq!(error.to_string(), "HTTP error: status 401");
        if let LlmError::Http { body, .. } = error {
            assert_eq!(body, "invalid key");
        }
    }

    #[test]
    fn serialization_error_keeps_source() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = LlmError::Serialization(json_error);
        assert!(error.to_string().contains("Serialization error"));
        assert!(error.source().is_some());
    }

    #[test]
    fn transient_classification() {
        let network = LlmError::Network(
            reqwest::blocking::Client::new()
                .get("not-a-valid-url")
                .build()
                .unwrap_err(),
        );
        assert!(network.is_transient());
        assert!(LlmError::Http { status: 500, body: String::new() }.is_transient());
        assert!(LlmError::Http { status: 429, body: String::new() }.is_transient());
        assert!(!LlmError::Http { status: 400, body: String::new() }.is_transient());
        assert!(!LlmError::Auth.is_transient());
        assert!(!LlmError::Api { message: "x".into() }.is_transient());
    }

    #[test]
    #[serial]
    fn build_uses_defaults_without_environment() {
        clear_env();

        let client = ChatClientBuilder::new().build().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert!(!client.has_api_key());
    }

    #[test]
    #[serial]
    fn build_reads_environment_variables() {
        clear_env();
        unsafe {
            std::env::set_var("DEEPSEEK_BASE_URL", "http://localhost:8080/v1/");
            std::env::set_var("DEEPSEEK_API_KEY", "sk-env");
            std::env::set_var("DEEPSEEK_MODEL", "deepseek-reasoner");
        }

        let client = ChatClientBuilder::new().build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
        assert_eq!(client.model(), "deepseek-reasoner");
        assert!(client.has_api_key());

        clear_env();
    }

    #[test]
    #[serial]
    fn builder_values_take_precedence_over_environment() {
        clear_env();
        unsafe {
            std::env::set_var("DEEPSEEK_MODEL", "env-model");
        }

        let client = ChatClientBuilder::new().model("builder-model").build().unwrap();
        assert_eq!(client.model(), "builder-model");

        clear_env();
    }

    #[test]
    #[serial]
    fn blank_api_key_counts_as_missing() {
        clear_env();
        let client = ChatClientBuilder::new().api_key("   ").build().unwrap();
        assert!(!client.has_api_key());
    }

    #[test]
    fn build_returns_error_for_invalid_url() {
        let result = ChatClientBuilder::new().base_url("not-a-valid-url").build();
        assert!(matches!(result, Err(LlmError::InvalidUrl(_))));
    }

    #[test]
    #[serial]
    fn complete_without_key_fails_fast() {
        clear_env();
        let client = ChatClientBuilder::new()
            .base_url("http://127.0.0.1:65535/v1")
            .build()
            .unwrap();

        let request = ChatRequest::new("deepseek-chat", vec![ChatMessage::user("hi")]);
        let result = client.complete(&request);
        assert!(matches!(result, Err(LlmError::Auth)));
    }

    #[test]
    fn parse_completion_reads_first_choice() {
        let body = r#"{
            "id": "cmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Sure!"}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "Ignored"}}
            ]
        }"#;
        let message = parse_completion(body).unwrap();
        assert_eq!(message.text(), "Sure!");
    }

    #[test]
    fn parse_completion_rejects_empty_choices() {
        let result = parse_completion(r#"{"choices": []}"#);
        assert!(matches!(result, Err(LlmError::Api { .. })));
    }

    #[test]
    fn parse_completion_rejects_garbage() {
        let result = parse_completion("<html>bad gateway</html>");
        assert!(matches!(result, Err(LlmError::Serialization(_))));
    }

    #[test]
    fn default_chat_returns_empty_string_for_missing_content() {
        struct ToolOnly;

        impl ChatClientTrait for ToolOnly {
            fn complete(&self, _request: &ChatRequest) -> Result<ChatMessage, LlmError> {
                Ok(ChatMessage {
                    role: crate::llm::Role::Assistant,
                    content: None,
                    tool_calls: None,
                    tool_call_id: None,
                })
            }
        }

        let reply = ToolOnly.chat("m", vec![ChatMessage::user("hi")], 10).unwrap();
        assert_eq!(reply, "");
    }

    #[test]
    fn trait_object_is_usable() {
        let client = ChatClientBuilder::new()
            .base_url("http://localhost:8080/v1")
            .api_key("sk-test")
            .build()
            .unwrap();
        let _trait_ref: &dyn ChatClientTrait = &client;
    }
}
