//! Routes a message to the specialists it needs and merges their answers.

use std::sync::Arc;

use serde::Serialize;

use super::extract::{extract_json, extract_purchase_figures};
use super::specialists::{FinancialAgent, ResearchAgent};
use super::{AgentError, validate_message};
use crate::llm::{ChatClientTrait, ChatMessage};
use crate::rag::RagPipeline;

const COORDINATOR_SYSTEM: &str =
    "You are a coordinator who determines what type of real estate help is needed.";

const COORDINATOR_TEMPLATE: &str = r#"User message: "{message}"

Determine if this requires:
1. Market research (trends, investment, neighborhoods)
2. Financial analysis (affordability, mortgages, budgets)
3. General real estate advice
4. Property search

Respond with JSON: {"needs": ["research", "financial", "search"], "priority": "primary_need"}"#;

const SYNTHESIS_SYSTEM: &str =
    "You are a helpful real estate assistant providing comprehensive guidance.";

const SYNTHESIS_TEMPLATE: &str = r#"User asked: "{message}"

Agent responses:
{responses}

Provide a comprehensive, helpful response that synthesizes insights from all agents.
Be conversational and focus on what's most important for the user."#;

const CLASSIFY_MAX_TOKENS: u32 = 100;
const SYNTHESIS_MAX_TOKENS: u32 = 500;

/// Text used when the financial specialist cannot produce an analysis.
pub const FINANCIAL_FALLBACK: &str =
    "Financial analysis requires property price and income information.";

/// A specialist the coordinator can consult. Declaration order is
/// consultation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Need {
    Research,
    Financial,
    Search,
}

impl Need {
    /// Parse from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "research" => Some(Self::Research),
            "financial" => Some(Self::Financial),
            "search" => Some(Self::Search),
            _ => None,
        }
    }
}

impl std::fmt::Display for Need {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Research => write!(f, "research"),
            Self::Financial => write!(f, "financial"),
            Self::Search => write!(f, "search"),
        }
    }
}

/// Answers gathered from each consulted specialist.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgentResponses {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Result of a coordinated, multi-specialist answer.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatedResponse {
    pub needs: Vec<Need>,
    pub priority: Option<String>,
    pub agent_responses: AgentResponses,
    pub answer: String,
}

/// Intent classification parsed from the coordinator's reply.
#[derive(Debug, PartialEq)]
struct Routing {
    needs: Vec<Need>,
    priority: Option<String>,
}

impl Routing {
    fn fallback() -> Self {
        Self {
            needs: vec![Need::Search],
            priority: Some("search".to_string()),
        }
    }

    /// Parses `{"needs": [...], "priority": ...}` out of a reply.
    ///
    /// Anything unparsable falls back to a plain property search. Unknown
    /// need names are dropped; the rest are sorted into consultation order.
    fn parse(reply: &str) -> Self {
        let Some(value) = extract_json(reply) else {
            tracing::warn!("coordinator reply was not JSON, defaulting to search");
            return Self::fallback();
        };

        let Some(raw_needs) = value.get("needs").and_then(|v| v.as_array()) else {
            tracing::warn!("coordinator reply had no needs list, defaulting to search");
            return Self::fallback();
        };

        let mut needs: Vec<Need> = raw_needs
            .iter()
            .filter_map(|v| v.as_str())
            .filter_map(Need::parse)
            .collect();
        needs.sort();
        needs.dedup();

        Self {
            needs,
            priority: value
                .get("priority")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        }
    }
}

/// Front-line agent that coordinates the research and financial specialists.
pub struct CustomerAgent {
    client: Arc<dyn ChatClientTrait>,
    model: String,
    rag: Arc<RagPipeline>,
    research: ResearchAgent,
    financial: FinancialAgent,
}

impl CustomerAgent {
    pub fn new(
        client: Arc<dyn ChatClientTrait>,
        rag: Arc<RagPipeline>,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into();
        Self {
            research: ResearchAgent::new(Arc::clone(&client), Arc::clone(&rag), model.clone()),
            financial: FinancialAgent::new(Arc::clone(&client), model.clone()),
            client,
            model,
            rag,
        }
    }

    /// Classifies the message, consults specialists and synthesizes a reply.
    pub fn coordinate_response(&self, message: &str) -> Result<CoordinatedResponse, AgentError> {
        let message = validate_message(message)?;

        let classification = self.client.chat(
            &self.model,
            vec![
                ChatMessage::system(COORDINATOR_SYSTEM),
                ChatMessage::user(COORDINATOR_TEMPLATE.replace("{message}", message)),
            ],
            CLASSIFY_MAX_TOKENS,
        )?;
        let routing = Routing::parse(&classification);
        tracing::debug!(needs = ?routing.needs, "routing message");

        let mut responses = AgentResponses::default();
        for need in &routing.needs {
            match need {
                Need::Research => {
                    responses.research = Some(self.research.analyze_market(message)?);
                }
                Need::Financial => {
                    let figures = extract_purchase_figures(message);
                    let analysis = self
                        .financial
                        .analyze(figures.price, figures.income)
                        .unwrap_or_else(|e| {
                            tracing::warn!(error = %e, "financial analysis failed");
                            FINANCIAL_FALLBACK.to_string()
                        });
                    responses.financial = Some(analysis);
                }
                Need::Search => {
                    responses.search = Some(self.rag.answer(message)?.answer);
                }
            }
        }

        let rendered = serde_json::to_string_pretty(&responses).unwrap_or_default();
        let prompt = SYNTHESIS_TEMPLATE
            .replace("{message}", message)
            .replace("{responses}", &rendered);

        let answer = self.client.chat(
            &self.model,
            vec![ChatMessage::system(SYNTHESIS_SYSTEM), ChatMessage::user(prompt)],
            SYNTHESIS_MAX_TOKENS,
        )?;

        Ok(CoordinatedResponse {
            needs: routing.needs,
            priority: routing.priority,
            agent_responses: responses,
            answer,
        })
    }
}
