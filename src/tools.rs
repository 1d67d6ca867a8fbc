//! Closed-form real-estate calculators and the tool registry that exposes
//! them to the model.

mod calculators;
mod registry;

use thiserror::Error;

pub use calculators::{
    Affordability, MortgageBreakdown, PropertyComparison, affordability_check,
    calculate_mortgage, property_comparison,
};
pub use registry::{
    AFFORDABILITY_CHECK, CALCULATE_MORTGAGE, PROPERTY_COMPARISON, REMEMBER_USER_INFO,
    SEARCH_PROPERTIES, ToolRegistry, error_value, parse_arguments,
};

/// Errors raised by calculators and tool dispatch.
///
/// The display text is what the model sees in a `{"error": ...}` result.
#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("Comparison error: {0}")]
    Comparison(String),

    #[error("Affordability error: {0}")]
    Affordability(String),

    #[error("Invalid arguments for {name}: {message}")]
    InvalidArguments { name: String, message: String },

    #[error("Unknown function")]
    UnknownFunction(String),
}
