//! Purchase-side costs: taxes and fees a buyer pays on top of the price.

use super::breakdown::{CalculationBreakdown, Fees, Taxes};
use super::itp::{calculate_regional_itp, fallback_itp};
use super::region::{find_region, DEFAULT_AJD_RATE};
use super::request::{CalculatorRequest, PropertyType};
use super::warnings::Warning;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// IVA on new housing
pub const IVA_RATE: Decimal = dec!(0.10);
pub const AGENCY_FEE_RATE: Decimal = dec!(0.03);
pub const LEGAL_FEE_BASE: Decimal = dec!(1000);

const BUYER_LEGAL_FEE_RATE: Decimal = dec!(0.005);
const DEED_FEE_RATE: Decimal = dec!(0.0004);

pub fn notary_fees(price: Decimal) -> Decimal {
    (dec!(500) + price * DEED_FEE_RATE).min(dec!(900)).round_dp(2)
}

pub fn register_fees(price: Decimal) -> Decimal {
    (dec!(400) + price * DEED_FEE_RATE).min(dec!(800)).round_dp(2)
}

pub fn agency_fees(price: Decimal) -> Decimal {
    (price * AGENCY_FEE_RATE).round_dp(2)
}

pub fn calculate_buyer_costs(request: &CalculatorRequest) -> CalculationBreakdown {
    let price = request.property_value;
    let region = request.region.as_deref().map(|r| (r, find_region(r)));
    let mut warnings = Vec::new();

    if let Some((key, None)) = region {
        warnings.push(Warning::UnknownRegion {
            region: key.to_string(),
        });
    }

    let mut taxes = Taxes::default();
    match request.property_type {
        PropertyType::New => {
            let ajd_rate = region
                .and_then(|(_, config)| config)
                .map_or(DEFAULT_AJD_RATE, |config| config.ajd_rate_or_default());
            taxes.iva = Some((price * IVA_RATE).round_dp(2));
            taxes.ajd_tax = Some((price * ajd_rate).round_dp(2));
        }
        PropertyType::Used => {
            // Special conditions only reduce ITP.
            if let Some((_, Some(config))) = region {
                if config.has_special_conditions() {
                    warnings.push(Warning::SpecialConditionsNotApplied {
                        region: config.name.to_string(),
                    });
                }
            }
            let itp = match region {
                Some((key, _)) => calculate_regional_itp(price, key, request.buyer_age),
                None => fallback_itp(
                    price,
                    "Tarifa estándar del 8% (región no especificada)".to_string(),
                ),
            };
            taxes.transfer_tax = Some(itp.amount);
            taxes.itp_explanation = Some(itp.explanation);
        }
    }

    let fees = Fees {
        notary_fees: Some(notary_fees(price)),
        register_fees: Some(register_fees(price)),
        agency_fees: request.include_agency_fees.then(|| agency_fees(price)),
        legal_fees: request
            .include_legal_fees
            .then(|| (LEGAL_FEE_BASE + price * BUYER_LEGAL_FEE_RATE).round_dp(2)),
    };

    let breakdown = CalculationBreakdown::for_buyer(price, taxes, fees, warnings);
    log::info!(
        "Buyer costs for {}: additional {}, total {}",
        price,
        breakdown.total_additional_costs,
        breakdown.total_cost
    );
    breakdown
}
