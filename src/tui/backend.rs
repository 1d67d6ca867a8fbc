//! Agents behind the chat UI.

use anyhow::Result;

use crate::agents::{CustomerAgent, MemoryAgent};

/// What the chat UI needs from the agents.
pub trait ChatBackend {
    /// Multi-agent answer for a message.
    fn coordinate(&mut self, message: &str) -> Result<String>;

    /// Memory agent reply for a message.
    fn enhanced_chat(&mut self, message: &str) -> Result<String>;

    /// Forgets the memory agent's conversation.
    fn reset_enhanced(&mut self);
}

/// The live agents.
pub struct AgentBackend {
    customer: CustomerAgent,
    enhanced: MemoryAgent,
}

impl AgentBackend {
    pub fn new(customer: CustomerAgent, enhanced: MemoryAgent) -> Self {
        Self { customer, enhanced }
    }
}

impl ChatBackend for AgentBackend {
    fn coordinate(&mut self, message: &str) -> Result<String> {
        let response = self.customer.coordinate_response(message)?;
        tracing::info!(needs = ?response.needs, "coordinated response");
        Ok(response.answer)
    }

    fn enhanced_chat(&mut self, message: &str) -> Result<String> {
        let reply = self.enhanced.chat(message)?;
        Ok(reply.text)
    }

    fn reset_enhanced(&mut self) {
        self.enhanced.reset();
    }
}
