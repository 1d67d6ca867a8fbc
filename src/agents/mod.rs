//! Conversational agents built on the chat client.
//!
//! - `RealEstateAgent`: single-turn tool calling over the calculators.
//! - `MemoryAgent`: multi-turn chat with property search and user memory.
//! - `CustomerAgent`: routes a message to research, financial and search
//!   specialists, then synthesizes their answers.

mod coordinator;
mod extract;
mod memory_agent;
mod specialists;
mod tool_agent;

use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;
use crate::rag::RagError;
use crate::tools::ToolError;

pub use coordinator::{AgentResponses, CoordinatedResponse, CustomerAgent, Need};
pub use extract::{PurchaseFigures, extract_json, extract_purchase_figures};
pub use memory_agent::{FactSink, MemoryAgent};
pub use specialists::{FinancialAgent, ResearchAgent};
pub use tool_agent::RealEstateAgent;

/// Errors raised while an agent handles a message.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Rag(#[from] RagError),

    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// A tool call the model made while producing a reply.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: String,
    pub result: serde_json::Value,
}

/// The final text of a turn plus the tools used on the way.
#[derive(Debug, Clone, Serialize)]
pub struct AgentReply {
    pub text: String,
    pub tool_calls: Vec<ToolInvocation>,
}

impl AgentReply {
    /// Returns true if any tool ran during the turn.
    pub fn used_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

fn validate_message(message: &str) -> Result<&str, AgentError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        Err(AgentError::EmptyMessage)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted chat client shared by the agent tests.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use crate::embedding::{Embedder, HashingEmbedder};
    use crate::knowledge::corpus::listing_documents;
    use crate::knowledge::{Retriever, VectorStore};
    use crate::llm::{ChatClientTrait, ChatMessage, ChatRequest, LlmError, ToolCall};
    use crate::rag::RagPipeline;

    /// Replies with queued messages in order and records every request.
    #[derive(Default)]
    pub struct ScriptedClient {
        replies: Mutex<VecDeque<Result<ChatMessage, String>>>,
        pub requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedClient {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn reply(self: &Arc<Self>, text: &str) -> Arc<Self> {
            self.push(ChatMessage::assistant(text));
            Arc::clone(self)
        }

        pub fn tool_calls(self: &Arc<Self>, calls: Vec<ToolCall>) -> Arc<Self> {
            let mut message = ChatMessage::assistant("");
            message.content = None;
            message.tool_calls = Some(calls);
            self.push(message);
            Arc::clone(self)
        }

        /// Queues an API error for the next request.
        pub fn fail(self: &Arc<Self>, message: &str) -> Arc<Self> {
            self.replies.lock().unwrap().push_back(Err(message.to_string()));
            Arc::clone(self)
        }

        fn push(&self, message: ChatMessage) {
            self.replies.lock().unwrap().push_back(Ok(message));
        }

        pub fn request(&self, index: usize) -> ChatRequest {
            self.requests.lock().unwrap()[index].clone()
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl ChatClientTrait for ScriptedClient {
        fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            let next = self.replies.lock().unwrap().pop_front();
            match next {
                Some(Ok(message)) => Ok(message),
                Some(Err(message)) => Err(LlmError::Api { message }),
                None => Err(LlmError::Api {
                    message: "script exhausted".to_string(),
                }),
            }
        }
    }

    pub fn pipeline(client: Arc<ScriptedClient>) -> Arc<RagPipeline> {
        let embedder = HashingEmbedder::default();
        let mut store = VectorStore::new();
        for doc in listing_documents() {
            let embedding = embedder.embed(&doc.content).unwrap();
            store.add(doc.id, doc.content, embedding).unwrap();
        }
        let retriever = Retriever::new(store, Arc::new(embedder));
        Arc::new(RagPipeline::new(Arc::new(retriever), client, "deepseek-chat"))
    }
}
