//! Tool definitions offered to the model and dispatch of its calls.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::ToolError;
use super::calculators::{affordability_check, calculate_mortgage, property_comparison};
use crate::llm::ToolDefinition;

pub const CALCULATE_MORTGAGE: &str = "calculate_mortgage";
pub const PROPERTY_COMPARISON: &str = "property_comparison";
pub const AFFORDABILITY_CHECK: &str = "affordability_check";
pub const SEARCH_PROPERTIES: &str = "search_properties";
pub const REMEMBER_USER_INFO: &str = "remember_user_info";

/// Accepts a JSON number or a numeric string.
fn flexible_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .replace(',', "")
            .parse()
            .map_err(|_| de::Error::custom(format!("'{s}' is not a number"))),
    }
}

#[derive(Debug, Deserialize)]
struct MortgageArgs {
    #[serde(deserialize_with = "flexible_number")]
    price: f64,
    #[serde(deserialize_with = "flexible_number")]
    down_payment_percent: f64,
    #[serde(deserialize_with = "flexible_number")]
    interest_rate: f64,
    #[serde(deserialize_with = "flexible_number")]
    years: f64,
}

#[derive(Debug, Deserialize)]
struct ComparisonArgs {
    #[serde(deserialize_with = "flexible_number")]
    prop1_price: f64,
    #[serde(deserialize_with = "flexible_number")]
    prop2_price: f64,
    #[serde(deserialize_with = "flexible_number")]
    prop1_sqft: f64,
    #[serde(deserialize_with = "flexible_number")]
    prop2_sqft: f64,
}

#[derive(Debug, Deserialize)]
struct AffordabilityArgs {
    #[serde(deserialize_with = "flexible_number")]
    annual_income: f64,
    #[serde(deserialize_with = "flexible_number")]
    monthly_debt: f64,
    #[serde(deserialize_with = "flexible_number")]
    home_price: f64,
}

/// Parses the raw JSON `arguments` string of a tool call.
///
/// An empty string is treated as `{}` so missing fields are reported by name.
pub fn parse_arguments<T: DeserializeOwned>(name: &str, arguments: &str) -> Result<T, ToolError> {
    let raw = if arguments.trim().is_empty() { "{}" } else { arguments };
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
        name: name.to_string(),
        message: e.to_string(),
    })
}

/// Renders an error as the `{"error": ...}` value returned to the model.
pub fn error_value(error: &ToolError) -> Value {
    json!({ "error": error.to_string() })
}

fn to_value<T: Serialize>(result: Result<T, ToolError>) -> Value {
    match result {
        Ok(value) => serde_json::to_value(value).unwrap_or_else(|e| {
            json!({ "error": format!("Serialization error: {e}") })
        }),
        Err(e) => error_value(&e),
    }
}

/// The set of tools offered in a request.
///
/// Only the three calculators are dispatched here; callers that add
/// `search_properties` or `remember_user_info` handle those themselves
/// before falling back to `dispatch`.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    definitions: Vec<ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::base()
    }
}

impl ToolRegistry {
    /// Registry with the mortgage, comparison and affordability tools.
    pub fn base() -> Self {
        Self {
            definitions: Self::base_definitions(),
        }
    }

    /// Adds the property search and user-memory tools.
    #[must_use]
    pub fn with_memory_tools(mut self) -> Self {
        self.definitions.push(search_properties_definition());
        self.definitions.push(remember_user_info_definition());
        self
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn names(&self) -> Vec<&str> {
        self.definitions.iter().map(ToolDefinition::name).collect()
    }

    /// JSON-schema definitions of the three calculators.
    pub fn base_definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::function(
                CALCULATE_MORTGAGE,
                "Calculate monthly mortgage payment and total costs",
                object_schema(&[
                    ("price", "Home price in dollars"),
                    (
                        "down_payment_percent",
                        "Down payment as percentage (e.g., 20 for 20%)",
                    ),
                    (
                        "interest_rate",
                        "Annual interest rate as percentage (e.g., 6.5 for 6.5%)",
                    ),
                    ("years", "Loan term in years (typically 15 or 30)"),
                ]),
            ),
            ToolDefinition::function(
                PROPERTY_COMPARISON,
                "Compare two properties by price per square foot",
                object_schema(&[
                    ("prop1_price", "Price of first property"),
                    ("prop2_price", "Price of second property"),
                    ("prop1_sqft", "Square footage of first property"),
                    ("prop2_sqft", "Square footage of second property"),
                ]),
            ),
            ToolDefinition::function(
                AFFORDABILITY_CHECK,
                "Check if someone can afford a home based on income and debt",
                object_schema(&[
                    ("annual_income", "Annual gross income in dollars"),
                    (
                        "monthly_debt",
                        "Monthly debt payments (credit cards, car loans, etc.)",
                    ),
                    ("home_price", "Target home price in dollars"),
                ]),
            ),
        ]
    }

    /// Runs a calculator call and returns its JSON result.
    ///
    /// Never fails: bad arguments, calculator errors and unknown names all
    /// come back as `{"error": ...}` so the model can react to them.
    pub fn dispatch(&self, name: &str, arguments: &str) -> Value {
        tracing::debug!(tool = name, "dispatching tool call");

        let result = match name {
            CALCULATE_MORTGAGE => to_value(
                parse_arguments::<MortgageArgs>(name, arguments).and_then(|a| {
                    calculate_mortgage(a.price, a.down_payment_percent, a.interest_rate, a.years)
                }),
            ),
            PROPERTY_COMPARISON => to_value(
                parse_arguments::<ComparisonArgs>(name, arguments).and_then(|a| {
                    property_comparison(a.prop1_price, a.prop2_price, a.prop1_sqft, a.prop2_sqft)
                }),
            ),
            AFFORDABILITY_CHECK => to_value(
                parse_arguments::<AffordabilityArgs>(name, arguments).and_then(|a| {
                    affordability_check(a.annual_income, a.monthly_debt, a.home_price)
                }),
            ),
            other => error_value(&ToolError::UnknownFunction(other.to_string())),
        };

        if let Some(error) = result.get("error") {
            tracing::warn!(tool = name, %error, "tool call failed");
        }
        result
    }
}

fn search_properties_definition() -> ToolDefinition {
    ToolDefinition::function(
        SEARCH_PROPERTIES,
        "Search for property information, market data, or neighborhood details",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query about properties, neighborhoods, or market info"
                }
            },
            "required": ["query"]
        }),
    )
}

fn remember_user_info_definition() -> ToolDefinition {
    ToolDefinition::function(
        REMEMBER_USER_INFO,
        "Remember important user information like budget, preferences, family size, etc.",
        json!({
            "type": "object",
            "properties": {
                "key": {
                    "type": "string",
                    "description": "Type of information (budget, family_size, preferred_area, etc.)"
                },
                "value": {"type": "string", "description": "The value to remember"}
            },
            "required": ["key", "value"]
        }),
    )
}

/// Builds an object schema whose properties are all required numbers.
fn object_schema(fields: &[(&str, &str)]) -> Value {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(name, description)| {
            (
                name.to_string(),
                json!({"type": "number", "description": description}),
            )
        })
        .collect();
    let required: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_registry_has_three_calculators() {
        let registry = ToolRegistry::base();
        assert_eq!(
            registry.names(),
            [CALCULATE_MORTGAGE, PROPERTY_COMPARISON, AFFORDABILITY_CHECK]
        );
    }

    #[test]
    fn memory_tools_extend_the_base_set() {
        let registry = ToolRegistry::base().with_memory_tools();
        assert_eq!(registry.definitions().len(), 5);
        assert_eq!(registry.names()[3], SEARCH_PROPERTIES);
        assert_eq!(registry.names()[4], REMEMBER_USER_INFO);
    }

    #[test]
    fn schema_lists_required_fields() {
        let definitions = ToolRegistry::base_definitions();
        let params = &definitions[0].function.parameters;
        assert_eq!(params["type"], "object");
        assert_eq!(
            params["required"],
            json!(["price", "down_payment_percent", "interest_rate", "years"])
        );
        assert_eq!(params["properties"]["years"]["type"], "number");
    }

    #[test]
    fn dispatch_mortgage() {
        let result = ToolRegistry::base().dispatch(
            CALCULATE_MORTGAGE,
            r#"{"price": 450000, "down_payment_percent": 20, "interest_rate": 6.5, "years": 30}"#,
        );
        assert_eq!(result["loan_amount"], 360000.0);
        assert_eq!(result["monthly_payment"], 2275.44);
    }

    #[test]
    fn dispatch_accepts_numeric_strings() {
        let result = ToolRegistry::base().dispatch(
            AFFORDABILITY_CHECK,
            r#"{"annual_income": "80,000", "monthly_debt": "500", "home_price": 400000}"#,
        );
        assert_eq!(result["can_afford"], false);
        assert_eq!(result["monthly_income"], 6666.67);
    }

    #[test]
    fn dispatch_unknown_function() {
        let result = ToolRegistry::base().dispatch("book_viewing", "{}");
        assert_eq!(result, json!({"error": "Unknown function"}));
    }

    #[test]
    fn dispatch_reports_bad_arguments() {
        let result = ToolRegistry::base().dispatch(PROPERTY_COMPARISON, r#"{"prop1_price": 1}"#);
        let error = result["error"].as_str().unwrap();
        assert!(error.starts_with("Invalid arguments for property_comparison:"));

        let result = ToolRegistry::base().dispatch(CALCULATE_MORTGAGE, "not json");
        assert!(result["error"].as_str().unwrap().starts_with("Invalid arguments"));

        let result = ToolRegistry::base().dispatch(CALCULATE_MORTGAGE, r#"{"price": "lots"}"#);
        assert!(result["error"].as_str().unwrap().contains("'lots' is not a number"));
    }

    #[test]
    fn dispatch_reports_calculator_errors() {
        let result = ToolRegistry::base().dispatch(
            PROPERTY_COMPARISON,
            r#"{"prop1_price": 1, "prop2_price": 2, "prop1_sqft": 0, "prop2_sqft": 10}"#,
        );
        assert!(result["error"].as_str().unwrap().starts_with("Comparison error:"));
    }
}
