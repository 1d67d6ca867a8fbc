//! Pulling structured values out of free text.

use serde_json::{Deserializer, Value};

/// Default purchase price when the message names none.
pub const DEFAULT_PRICE: f64 = 500_000.0;
/// Default annual income when the message names none.
pub const DEFAULT_INCOME: f64 = 80_000.0;

/// Extracts the first JSON object from a model response.
///
/// Reads one value starting at each `{` in turn and returns the first that
/// parses as an object, so code fences and prose on either side (braces
/// included) are ignored.
pub fn extract_json(response: &str) -> Option<Value> {
    response.match_indices('{').find_map(|(start, _)| {
        let mut values = Deserializer::from_str(&response[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) if value.is_object() => Some(value),
            _ => None,
        }
    })
}

/// Price and income mentioned in a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurchaseFigures {
    pub price: f64,
    pub income: f64,
}

impl Default for PurchaseFigures {
    fn default() -> Self {
        Self {
            price: DEFAULT_PRICE,
            income: DEFAULT_INCOME,
        }
    }
}

/// Reads a home price and an annual income from whitespace-separated words.
///
/// A word containing `$` or "price" sets the price. A word containing
/// "income" sets the income from the following word, and a `$` amount
/// directly before "income" is the income rather than a price. Later
/// mentions win.
pub fn extract_purchase_figures(message: &str) -> PurchaseFigures {
    let words: Vec<&str> = message.split_whitespace().collect();
    let mut figures = PurchaseFigures::default();

    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        let next = words.get(i + 1);
        let precedes_income = !lower.contains("price")
            && next.is_some_and(|w| w.to_lowercase().contains("income"));

        if (word.contains('$') || lower.contains("price"))
            && let Some(amount) = parse_amount(word)
        {
            if precedes_income {
                figures.income = amount;
            } else {
                figures.price = amount;
            }
        }

        if lower.contains("income")
            && let Some(amount) = next.and_then(|w| parse_amount(w))
        {
            figures.income = amount;
        }
    }

    figures
}

/// Parses the number inside a word such as `$450,000`, `$500K` or `1.2M`.
///
/// Thousands separators are dropped; a trailing `k` or `m` scales the value.
fn parse_amount(word: &str) -> Option<f64> {
    let numeric: String = word
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let numeric = numeric.trim_matches('.');
    if !numeric.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: f64 = numeric.parse().ok()?;

    let suffix = word
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .chars()
        .last()
        .map(|c| c.to_ascii_lowercase());

    let scale = match suffix {
        Some('k') => 1_000.0,
        Some('m') => 1_000_000.0,
        _ => 1.0,
    };
    Some(value * scale)
}
