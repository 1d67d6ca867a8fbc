//! Research and financial specialists consulted by the coordinator.

use std::sync::Arc;

use super::AgentError;
use crate::llm::{ChatClientTrait, ChatMessage};
use crate::rag::RagPipeline;
use crate::tools::{affordability_check, calculate_mortgage};
use crate::utils::format_thousands;

const RESEARCH_SYSTEM: &str =
    "You are a real estate market research specialist focused on data-driven analysis.";

const RESEARCH_TEMPLATE: &str = "As a real estate market research specialist, analyze this query: {query}

Provide insights on:
- Market trends
- Investment potential
- Risk factors
- Opportunities

Base your analysis on available data.

Available data: {market_data}";

const FINANCIAL_SYSTEM: &str = "You are a financial advisor specializing in real estate purchases.";

const FINANCIAL_TEMPLATE: &str = "As a financial advisor, provide comprehensive analysis for:
- Property price: ${price}
- Buyer income: ${income}
- Mortgage details: {mortgage}
- Affordability check: {affordability}

Provide recommendations on:
1. Monthly budget impact
2. Long-term financial implications
3. Alternative scenarios
4. Financial recommendations";

const SPECIALIST_MAX_TOKENS: u32 = 400;

pub const DEFAULT_DOWN_PAYMENT_PERCENT: f64 = 20.0;
pub const DEFAULT_INTEREST_RATE: f64 = 6.5;
const LOAN_TERM_YEARS: f64 = 30.0;

/// Market analyst grounded on knowledge-base answers.
pub struct ResearchAgent {
    client: Arc<dyn ChatClientTrait>,
    rag: Arc<RagPipeline>,
    model: String,
}

impl ResearchAgent {
    pub fn new(
        client: Arc<dyn ChatClientTrait>,
        rag: Arc<RagPipeline>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            rag,
            model: model.into(),
        }
    }

    /// Analyzes market trends and investment potential for `query`.
    pub fn analyze_market(&self, query: &str) -> Result<String, AgentError> {
        let market_data = self
            .rag
            .answer(&format!("market trends investment {query}"))?;

        let prompt = RESEARCH_TEMPLATE
            .replace("{query}", query)
            .replace("{market_data}", &market_data.answer);

        let analysis = self.client.chat(
            &self.model,
            vec![ChatMessage::system(RESEARCH_SYSTEM), ChatMessage::user(prompt)],
            SPECIALIST_MAX_TOKENS,
        )?;
        Ok(analysis)
    }
}

/// Financial advisor working from the mortgage and affordability tools.
pub struct FinancialAgent {
    client: Arc<dyn ChatClientTrait>,
    model: String,
}

impl FinancialAgent {
    pub fn new(client: Arc<dyn ChatClientTrait>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Analysis with 20% down at 6.5%.
    pub fn analyze(&self, price: f64, income: f64) -> Result<String, AgentError> {
        self.financial_analysis(price, income, DEFAULT_DOWN_PAYMENT_PERCENT, DEFAULT_INTEREST_RATE)
    }

    /// Runs a 30-year mortgage and a debt-free affordability check, then asks
    /// the model to interpret them.
    pub fn financial_analysis(
        &self,
        price: f64,
        income: f64,
        down_payment_percent: f64,
        interest_rate: f64,
    ) -> Result<String, AgentError> {
        let mortgage = calculate_mortgage(price, down_payment_percent, interest_rate, LOAN_TERM_YEARS)?;
        let affordability = affordability_check(income, 0.0, price)?;

        let prompt = FINANCIAL_TEMPLATE
            .replace("{price}", &format_thousands(price))
            .replace("{income}", &format_thousands(income))
            .replace("{mortgage}", &serde_json::to_string(&mortgage).unwrap_or_default())
            .replace(
                "{affordability}",
                &serde_json::to_string(&affordability).unwrap_or_default(),
            );

        let analysis = self.client.chat(
            &self.model,
            vec![ChatMessage::system(FINANCIAL_SYSTEM), ChatMessage::user(prompt)],
            SPECIALIST_MAX_TOKENS,
        )?;
        Ok(analysis)
    }
}
