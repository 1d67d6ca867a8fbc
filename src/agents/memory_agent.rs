//! Multi-turn agent with conversation memory and property search.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::{Value, json};

use super::tool_agent::run_tool_turn;
use super::{AgentError, AgentReply, validate_message};
use crate::knowledge::KnowledgeBase;
use crate::llm::{ChatClientTrait, ChatMessage, ToolCall};
use crate::rag::RagPipeline;
use crate::tools::{REMEMBER_USER_INFO, SEARCH_PROPERTIES, ToolRegistry, error_value, parse_arguments};

const SYSTEM_TEMPLATE: &str = "You are an expert real estate agent AI assistant with access to:
- Mortgage and affordability calculators
- Property search and market data
- Conversation memory to personalize responses

{context}

Previous conversation: {history}

You help clients by:
1. Remembering their preferences and budget
2. Searching for relevant property information
3. Performing calculations when needed
4. Providing personalized recommendations

Be conversational, helpful, and remember details about the client.";

const MAX_TOKENS: u32 = 600;

/// History entries shown to the model on each turn.
const HISTORY_WINDOW: usize = 5;

/// Durable storage for facts the agent learns about the user.
pub trait FactSink: Send {
    /// Returns every stored fact.
    fn load(&self) -> Result<BTreeMap<String, String>>;

    /// Stores or overwrites one fact.
    fn remember(&mut self, key: &str, value: &str) -> Result<()>;
}

impl FactSink for KnowledgeBase {
    fn load(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.facts()?)
    }

    fn remember(&mut self, key: &str, value: &str) -> Result<()> {
        Ok(self.remember_fact(key, value)?)
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct RememberArgs {
    key: String,
    value: Value,
}

/// Chat agent that remembers the conversation and facts about the user.
///
/// History and user context grow without bound; `reset` clears both.
pub struct MemoryAgent {
    client: Arc<dyn ChatClientTrait>,
    model: String,
    rag: Arc<RagPipeline>,
    tools: ToolRegistry,
    history: Vec<ChatMessage>,
    user_context: BTreeMap<String, String>,
    fact_sink: Option<Box<dyn FactSink>>,
}

impl MemoryAgent {
    pub fn new(
        client: Arc<dyn ChatClientTrait>,
        rag: Arc<RagPipeline>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            rag,
            tools: ToolRegistry::base().with_memory_tools(),
            history: Vec::new(),
            user_context: BTreeMap::new(),
            fact_sink: None,
        }
    }

    /// Persists remembered facts to `sink` and starts from the facts it holds.
    pub fn with_fact_sink(mut self, sink: Box<dyn FactSink>) -> Result<Self> {
        let facts = sink.load()?;
        tracing::debug!(facts = facts.len(), "loaded remembered facts");
        self.user_context.extend(facts);
        self.fact_sink = Some(sink);
        Ok(self)
    }

    /// Handles one user message and returns the agent's reply.
    pub fn chat(&mut self, message: &str) -> Result<AgentReply, AgentError> {
        let message = validate_message(message)?;
        self.history.push(ChatMessage::user(message));

        let messages = vec![
            ChatMessage::system(self.system_message()),
            ChatMessage::user(message),
        ];

        let rag = &self.rag;
        let tools = &self.tools;
        let user_context = &mut self.user_context;
        let fact_sink = &mut self.fact_sink;

        let reply = run_tool_turn(
            self.client.as_ref(),
            &self.model,
            messages,
            tools,
            MAX_TOKENS,
            |call| match call.function.name.as_str() {
                SEARCH_PROPERTIES => search_properties(rag, call),
                REMEMBER_USER_INFO => remember_user_info(user_context, fact_sink, call),
                name => tools.dispatch(name, &call.function.arguments),
            },
        )?;

        self.history.push(ChatMessage::assistant(reply.text.clone()));
        Ok(reply)
    }

    /// Stores a fact as if the model had called `remember_user_info`.
    pub fn remember(&mut self, key: &str, value: &str) {
        store_fact(&mut self.user_context, &mut self.fact_sink, key, value);
    }

    /// Forgets the conversation and the in-memory user context.
    ///
    /// Facts already written to the fact sink are kept.
    pub fn reset(&mut self) {
        self.history.clear();
        self.user_context.clear();
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn user_context(&self) -> &BTreeMap<String, String> {
        &self.user_context
    }

    fn system_message(&self) -> String {
        let context = if self.user_context.is_empty() {
            String::new()
        } else {
            let rendered = serde_json::to_string_pretty(&self.user_context).unwrap_or_default();
            format!("User context: {rendered}\n")
        };

        // The current message is already in the history
        let history = if self.history.len() > 1 {
            let start = self.history.len().saturating_sub(HISTORY_WINDOW);
            let window: Vec<Value> = self.history[start..]
                .iter()
                .map(|m| json!({"role": m.role, "content": m.text()}))
                .collect();
            serde_json::to_string(&window).unwrap_or_default()
        } else {
            "None".to_string()
        };

        SYSTEM_TEMPLATE
            .replace("{context}", &context)
            .replace("{history}", &history)
    }
}

fn search_properties(rag: &RagPipeline, call: &ToolCall) -> Value {
    let args: SearchArgs = match parse_arguments(&call.function.name, &call.function.arguments) {
        Ok(args) => args,
        Err(e) => return error_value(&e),
    };

    match rag.answer(&args.query) {
        Ok(answer) => json!({ "search_results": answer.answer }),
        Err(e) => {
            tracing::warn!(error = %e, "property search failed");
            json!({ "error": format!("Search error: {e}") })
        }
    }
}

fn remember_user_info(
    user_context: &mut BTreeMap<String, String>,
    fact_sink: &mut Option<Box<dyn FactSink>>,
    call: &ToolCall,
) -> Value {
    let args: RememberArgs = match parse_arguments(&call.function.name, &call.function.arguments) {
        Ok(args) => args,
        Err(e) => return error_value(&e),
    };

    let value = match args.value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    store_fact(user_context, fact_sink, &args.key, &value);

    json!({ "message": format!("I'll remember that your {} is {}", args.key, value) })
}

fn store_fact(
    user_context: &mut BTreeMap<String, String>,
    fact_sink: &mut Option<Box<dyn FactSink>>,
    key: &str,
    value: &str,
) {
    user_context.insert(key.to_string(), value.to_string());

    if let Some(sink) = fact_sink
        && let Err(e) = sink.remember(key, value)
    {
        tracing::warn!(key, error = %e, "failed to persist user fact");
    }
}
