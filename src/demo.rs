//! Canned questions and offline responses for demonstrations.

use crate::tools::{MortgageBreakdown, ToolError, calculate_mortgage};
use crate::utils::format_money;

/// Questions offered in the chat UI's sample list.
pub const SAMPLE_QUESTIONS: [&str; 6] = [
    "What's the Austin real estate market like?",
    "Can I afford a $500K home with $90K income?",
    "Compare 123 Main St vs 456 Oak Ave",
    "What neighborhoods are good for families?",
    "Should I invest in Austin real estate?",
    "Remember my budget is $400K with 2 kids",
];

/// Questions for the semantic retrieval walkthrough.
pub const RAG_DEMO_QUESTIONS: [&str; 5] = [
    "What's the average home price in Austin?",
    "Tell me about neighborhoods in Austin",
    "What investment opportunities are available?",
    "Which property has a swimming pool?",
    "What's the walk score for downtown Austin?",
];

/// Questions for the keyword retrieval walkthrough.
pub const KEYWORD_DEMO_QUESTIONS: [&str; 3] = [
    "What's the average price of homes in Austin?",
    "Tell me about 123 Main St",
    "What properties have swimming pools?",
];

/// Questions for the tool-calling agent walkthrough.
pub const AGENT_DEMO_QUESTIONS: [&str; 3] = [
    "What would be the monthly payment for a $450,000 home with 20% down, 6.5% interest, 30-year loan?",
    "Compare two properties: one costs $450,000 with 2,000 sqft, another costs $620,000 with 2,800 sqft",
    "Can someone with $80,000 annual income and $500 monthly debt afford a $400,000 home?",
];

/// Which canned walkthrough to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemoSet {
    #[default]
    Rag,
    Keyword,
    Agent,
}

impl DemoSet {
    pub fn questions(self) -> &'static [&'static str] {
        match self {
            DemoSet::Rag => &RAG_DEMO_QUESTIONS,
            DemoSet::Keyword => &KEYWORD_DEMO_QUESTIONS,
            DemoSet::Agent => &AGENT_DEMO_QUESTIONS,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DemoSet::Rag => "Semantic RAG over property listings",
            DemoSet::Keyword => "Keyword RAG over quick facts",
            DemoSet::Agent => "Tool-calling real estate agent",
        }
    }
}

/// Showcase reply used by the chat UI's demo mode. Makes no network calls.
pub fn demo_response(prompt: &str) -> String {
    format!(
        "Demo Response for: \"{prompt}\"

Research Agent Found: Austin market showing 8% growth, tech-driven demand

Financial Agent Calculated: Monthly payment ~$2,247 for $450K home (20% down, 6.5% rate)

Customer Agent Recommends: Based on your query, consider properties in 78704 area - family-friendly with good schools

This is a demo showcasing multi-agent coordination capabilities."
    )
}

/// 30-year payment for the UI's quick calculator.
pub fn quick_mortgage(
    price: f64,
    down_payment_percent: f64,
    interest_rate: f64,
) -> Result<MortgageBreakdown, ToolError> {
    calculate_mortgage(price, down_payment_percent, interest_rate, 30.0)
}

/// Renders a quick-calculator result the way the chat UI shows it.
pub fn format_quick_mortgage(breakdown: &MortgageBreakdown) -> String {
    format!(
        "Monthly Payment: ${}\nLoan Amount: ${}\nTotal Interest: ${}",
        format_money(breakdown.monthly_payment),
        format_money(breakdown.loan_amount),
        format_money(breakdown.total_interest),
    )
}

/// Parses `/mortgage PRICE DOWN% RATE%`.
///
/// Returns `None` when the input is not a mortgage command. A malformed
/// command yields a usage error.
pub fn parse_mortgage_command(input: &str) -> Option<Result<(f64, f64, f64), String>> {
    let mut parts = input.split_whitespace();
    if parts.next()? != "/mortgage" {
        return None;
    }

    let values: Vec<&str> = parts.collect();
    let usage = || "Usage: /mortgage PRICE DOWN% RATE%  (e.g. /mortgage 450000 20 6.5)".to_string();
    if values.len() != 3 {
        return Some(Err(usage()));
    }

    let mut numbers = [0.0f64; 3];
    for (slot, raw) in numbers.iter_mut().zip(&values) {
        let cleaned: String = raw
            .chars()
            .filter(|c| !matches!(c, '$' | ',' | '%'))
            .collect();
        match cleaned.parse::<f64>() {
            Ok(n) if n.is_finite() => *slot = n,
            _ => return Some(Err(usage())),
        }
    }

    Some(Ok((numbers[0], numbers[1], numbers[2])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_response_quotes_the_prompt() {
        let reply = demo_response("Is 78704 safe?");
        assert!(reply.starts_with("Demo Response for: \"Is 78704 safe?\""));
        assert!(reply.contains("Monthly payment ~$2,247"));
    }

    #[test]
    fn quick_mortgage_uses_thirty_years() {
        let breakdown = quick_mortgage(450_000.0, 20.0, 6.5).unwrap();
        assert_eq!(breakdown.loan_amount, 360_000.0);
        assert_eq!(breakdown.monthly_payment, 2275.44);

        let text = format_quick_mortgage(&breakdown);
        assert!(text.starts_with("Monthly Payment: $2,275.44\nLoan Amount: $360,000.00"));
    }

    #[test]
    fn quick_mortgage_zero_rate() {
        let breakdown = quick_mortgage(360_000.0, 0.0, 0.0).unwrap();
        assert_eq!(breakdown.monthly_payment, 1000.0);
        assert_eq!(breakdown.total_interest, 0.0);
    }

    #[test]
    fn mortgage_command_parsing() {
        assert_eq!(parse_mortgage_command("hello"), None);
        assert_eq!(parse_mortgage_command(""), None);
        assert_eq!(
            parse_mortgage_command("/mortgage $450,000 20% 6.5%"),
            Some(Ok((450_000.0, 20.0, 6.5)))
        );
        assert!(matches!(parse_mortgage_command("/mortgage 450000"), Some(Err(_))));
        assert!(matches!(parse_mortgage_command("/mortgage a b c"), Some(Err(_))));
    }

    #[test]
    fn demo_sets_cover_each_walkthrough() {
        assert_eq!(DemoSet::Rag.questions().len(), 5);
        assert_eq!(DemoSet::Keyword.questions().len(), 3);
        assert_eq!(DemoSet::Agent.questions(), &AGENT_DEMO_QUESTIONS);
    }
}
