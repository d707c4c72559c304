//! Role dispatch and the older undivided calculation.

use super::breakdown::{CalculationBreakdown, Fees, Taxes};
use super::buyer::calculate_buyer_costs;
use super::plusvalia::PlusvaliaEstimator;
use super::request::{CalculatorRequest, UserRole};
use super::seller::calculate_seller_costs;
use super::warnings::Warning;
use rust_decimal::Decimal;
use serde::Serialize;

/// Taxes and expenses of the whole transaction without role separation.
///
/// Kept for callers that predate the per-role breakdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub property_price: Decimal,
    pub taxes: Taxes,
    pub expenses: Fees,
    pub total_taxes: Decimal,
    pub total_expenses: Decimal,
    pub total_cost: Decimal,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "result", rename_all = "lowercase")]
pub enum Expenses {
    Buyer(CalculationBreakdown),
    Seller(CalculationBreakdown),
    Combined(CalculationResult),
}

/// Dispatch on the request's role; `both` or no role gives the combined result.
pub fn calculate_expenses(
    request: &CalculatorRequest,
    estimator: &dyn PlusvaliaEstimator,
    reference_year: i32,
) -> Expenses {
    match request.user_role {
        Some(UserRole::Buyer) => Expenses::Buyer(calculate_buyer_costs(request)),
        Some(UserRole::Seller) => {
            Expenses::Seller(calculate_seller_costs(request, estimator, reference_year))
        }
        Some(UserRole::Both) | None => Expenses::Combined(calculate_combined(
            request,
            estimator,
            reference_year,
        )),
    }
}

/// Buyer taxes and fees plus the seller's plusvalía and capital gains.
pub fn calculate_combined(
    request: &CalculatorRequest,
    estimator: &dyn PlusvaliaEstimator,
    reference_year: i32,
) -> CalculationResult {
    let buyer = calculate_buyer_costs(request);
    let seller = calculate_seller_costs(request, estimator, reference_year);

    let taxes = Taxes {
        plusvalia: seller.taxes.plusvalia,
        plusvalia_explanation: seller.taxes.plusvalia_explanation,
        capital_gains_tax: seller.taxes.capital_gains_tax,
        capital_gains_explanation: seller.taxes.capital_gains_explanation,
        ..buyer.taxes
    };
    let expenses = buyer.fees;

    let mut warnings = buyer.warnings;
    for warning in seller.warnings {
        if !warnings.contains(&warning) {
            warnings.push(warning);
        }
    }

    let total_taxes = taxes.total();
    let total_expenses = expenses.total();

    CalculationResult {
        property_price: request.property_value,
        taxes,
        expenses,
        total_taxes,
        total_expenses,
        total_cost: request.property_value + total_taxes + total_expenses,
        warnings,
    }
}
