//! Mortgage, comparison and affordability formulas.

use serde::{Deserialize, Serialize};

use super::ToolError;

/// Result of `calculate_mortgage`. All amounts rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MortgageBreakdown {
    pub monthly_payment: f64,
    pub total_paid: f64,
    pub total_interest: f64,
    pub loan_amount: f64,
}

/// Result of `property_comparison`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyComparison {
    pub property1_price_per_sqft: f64,
    pub property2_price_per_sqft: f64,
    pub better_value: String,
    pub potential_savings: f64,
}

/// Result of `affordability_check` under the 28/36 rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affordability {
    pub can_afford: bool,
    pub recommended_max_payment: f64,
    pub estimated_monthly_payment: f64,
    pub monthly_income: f64,
}

/// Amortized monthly payment for a fixed-rate loan.
///
/// `down_payment_percent` and `interest_rate` are percentages (20 means 20%).
pub fn calculate_mortgage(
    price: f64,
    down_payment_percent: f64,
    interest_rate: f64,
    years: f64,
) -> Result<MortgageBreakdown, ToolError> {
    ensure_finite(
        &[price, down_payment_percent, interest_rate, years],
        ToolError::Calculation,
    )?;

    let loan_amount = price - price * down_payment_percent / 100.0;
    let monthly_rate = interest_rate / 100.0 / 12.0;
    let num_payments = years * 12.0;

    if num_payments == 0.0 {
        return Err(ToolError::Calculation("loan term must be non-zero".to_string()));
    }

    let monthly_payment = if monthly_rate == 0.0 {
        loan_amount / num_payments
    } else {
        let growth = (1.0 + monthly_rate).powf(num_payments);
        loan_amount * (monthly_rate * growth) / (growth - 1.0)
    };

    if !monthly_payment.is_finite() {
        return Err(ToolError::Calculation("payment is not a finite number".to_string()));
    }

    let total_paid = monthly_payment * num_payments;
    Ok(MortgageBreakdown {
        monthly_payment: round2(monthly_payment),
        total_paid: round2(total_paid),
        total_interest: round2(total_paid - loan_amount),
        loan_amount: round2(loan_amount),
    })
}

/// Compares two properties by price per square foot.
///
/// Equal prices per square foot favour "Property 2".
pub fn property_comparison(
    prop1_price: f64,
    prop2_price: f64,
    prop1_sqft: f64,
    prop2_sqft: f64,
) -> Result<PropertyComparison, ToolError> {
    ensure_finite(
        &[prop1_price, prop2_price, prop1_sqft, prop2_sqft],
        ToolError::Comparison,
    )?;
    if prop1_sqft == 0.0 || prop2_sqft == 0.0 {
        return Err(ToolError::Comparison("square footage must be non-zero".to_string()));
    }

    let ppsf1 = prop1_price / prop1_sqft;
    let ppsf2 = prop2_price / prop2_sqft;

    let better_value = if ppsf1 < ppsf2 { "Property 1" } else { "Property 2" };
    let savings = (ppsf1 - ppsf2).abs() * prop1_sqft.min(prop2_sqft);

    Ok(PropertyComparison {
        property1_price_per_sqft: round2(ppsf1),
        property2_price_per_sqft: round2(ppsf2),
        better_value: better_value.to_string(),
        potential_savings: round2(savings),
    })
}

/// Checks a purchase against the 28/36 rule.
///
/// The monthly cost of the home is estimated as 0.5% of its price.
pub fn affordability_check(
    annual_income: f64,
    monthly_debt: f64,
    home_price: f64,
) -> Result<Affordability, ToolError> {
    ensure_finite(&[annual_income, monthly_debt, home_price], ToolError::Affordability)?;

    let monthly_income = annual_income / 12.0;
    let max_housing_payment = monthly_income * 0.28;
    let max_total_debt = monthly_income * 0.36;
    let available_for_housing = max_total_debt - monthly_debt;

    let recommended_max = max_housing_payment.min(available_for_housing);
    let estimated_monthly = home_price * 0.005;

    Ok(Affordability {
        can_afford: estimated_monthly <= recommended_max,
        recommended_max_payment: round2(recommended_max),
        estimated_monthly_payment: round2(estimated_monthly),
        monthly_income: round2(monthly_income),
    })
}

fn ensure_finite(values: &[f64], kind: fn(String) -> ToolError) -> Result<(), ToolError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(kind("inputs must be finite numbers".to_string()))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
