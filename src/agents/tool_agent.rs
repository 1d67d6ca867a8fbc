//! Single-turn agent that answers with the help of the calculators.

use std::sync::Arc;

use serde_json::Value;

use super::{AgentError, AgentReply, ToolInvocation, validate_message};
use crate::llm::{ChatClientTrait, ChatMessage, ChatRequest, LlmError, ToolCall};
use crate::tools::ToolRegistry;

const SYSTEM_PROMPT: &str = "You are an expert real estate agent AI assistant. You help clients with:
- Mortgage calculations
- Property comparisons  
- Affordability assessments
- General real estate advice

When users ask about calculations, use the provided tools. Always explain your reasoning and provide helpful context from your real estate expertise.";

const MAX_TOKENS: u32 = 500;

/// Sends `messages` with `tools`, runs any requested tool calls through
/// `handle`, and asks once more for the final text.
///
/// Tool results are appended as `tool` messages in call order. Without
/// tool calls the first reply is the answer.
pub(crate) fn run_tool_turn(
    client: &dyn ChatClientTrait,
    model: &str,
    messages: Vec<ChatMessage>,
    tools: &ToolRegistry,
    max_tokens: u32,
    mut handle: impl FnMut(&ToolCall) -> Value,
) -> Result<AgentReply, LlmError> {
    let request = ChatRequest::new(model, messages)
        .with_tools(tools.definitions().to_vec())
        .max_tokens(max_tokens);
    let reply = client.complete(&request)?;

    if !reply.has_tool_calls() {
        return Ok(AgentReply {
            text: reply.content.unwrap_or_default(),
            tool_calls: Vec::new(),
        });
    }

    let calls = reply.requested_tool_calls().to_vec();
    let mut messages = request.messages;
    messages.push(reply);

    let mut invocations = Vec::with_capacity(calls.len());
    for call in &calls {
        let result = handle(call);
        messages.push(ChatMessage::tool_result(&call.id, result.to_string()));
        invocations.push(ToolInvocation {
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
            result,
        });
    }

    tracing::debug!(tools = invocations.len(), "requesting final answer after tool calls");

    let final_request = ChatRequest::new(model, messages).max_tokens(max_tokens);
    let text = client.complete(&final_request)?.content.unwrap_or_default();

    Ok(AgentReply {
        text,
        tool_calls: invocations,
    })
}

/// Answers one message, calling the mortgage, comparison and affordability
/// tools when the model asks for them.
pub struct RealEstateAgent {
    client: Arc<dyn ChatClientTrait>,
    model: String,
    tools: ToolRegistry,
}

impl RealEstateAgent {
    pub fn new(client: Arc<dyn ChatClientTrait>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            tools: ToolRegistry::base(),
        }
    }

    /// Runs a single tool-assisted turn.
    pub fn run(&self, message: &str) -> Result<AgentReply, AgentError> {
        let message = validate_message(message)?;
        let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(message)];

        let reply = run_tool_turn(
            self.client.as_ref(),
            &self.model,
            messages,
            &self.tools,
            MAX_TOKENS,
            |call| self.tools.dispatch(&call.function.name, &call.function.arguments),
        )?;
        Ok(reply)
    }
}
