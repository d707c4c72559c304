//! Sale-side costs: deductions from the seller's proceeds.

use super::breakdown::{CalculationBreakdown, Fees, Taxes};
use super::buyer::{agency_fees, LEGAL_FEE_BASE};
use super::itp::format_percent;
use super::plusvalia::{linear_estimate, PlusvaliaEstimate, PlusvaliaEstimator, PlusvaliaRequest};
use super::request::{CalculatorRequest, PropertyType};
use super::warnings::Warning;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Savings-income rate applied to the taxable gain
pub const CAPITAL_GAINS_RATE: Decimal = dec!(0.19);

const REDUCTION_PER_YEAR: Decimal = dec!(0.11);
const MAX_HOLDING_REDUCTION: Decimal = dec!(0.60);
/// Holding-period reductions only cover purchases before this year
const REDUCTION_CUTOFF_YEAR: i32 = 2015;

/// Estimated IRPF on the gain from the sale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapitalGains {
    pub gain: Decimal,
    pub years_held: i32,
    pub reduction: Decimal,
    pub taxable_gain: Decimal,
    pub tax: Decimal,
}

impl CapitalGains {
    pub fn explanation(&self) -> String {
        let mut explanation = format!(
            "Ganancia patrimonial de {:.2} € tras {} años de tenencia.",
            self.gain, self.years_held
        );
        if self.reduction > Decimal::ZERO {
            explanation.push_str(&format!(
                " Reducción del {} por antigüedad (adquisición anterior a {}).",
                format_percent(self.reduction),
                REDUCTION_CUTOFF_YEAR
            ));
        }
        explanation.push_str(&format!(
            " Base imponible de {:.2} € al {}.",
            self.taxable_gain,
            format_percent(CAPITAL_GAINS_RATE)
        ));
        explanation
    }
}

/// Capital-gains estimate, `None` unless there is a positive gain.
pub fn capital_gains(
    sale_price: Decimal,
    previous_price: Decimal,
    previous_year: i32,
    reference_year: i32,
) -> Option<CapitalGains> {
    let gain = sale_price - previous_price;
    if gain <= Decimal::ZERO {
        return None;
    }

    let years_held = reference_year - previous_year;
    let reduction = if previous_year < REDUCTION_CUTOFF_YEAR && years_held > 1 {
        (Decimal::from(years_held) * REDUCTION_PER_YEAR).min(MAX_HOLDING_REDUCTION)
    } else {
        Decimal::ZERO
    };
    let taxable_gain = (gain * (Decimal::ONE - reduction)).round_dp(2);

    Some(CapitalGains {
        gain,
        years_held,
        reduction,
        taxable_gain,
        tax: (taxable_gain * CAPITAL_GAINS_RATE).round_dp(2),
    })
}

pub fn calculate_seller_costs(
    request: &CalculatorRequest,
    estimator: &dyn PlusvaliaEstimator,
    reference_year: i32,
) -> CalculationBreakdown {
    let price = request.property_value;
    let mut taxes = Taxes::default();
    let mut warnings = Vec::new();

    let municipality = request
        .municipality
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());

    if let (PropertyType::Used, Some(municipality)) = (request.property_type, municipality) {
        let plusvalia_request = PlusvaliaRequest {
            municipality: municipality.to_string(),
            property_value: price,
            previous_purchase_price: request.previous_purchase_price,
            previous_purchase_year: request.previous_purchase_year,
            reference_year,
        };
        let estimate = estimate_plusvalia(estimator, &plusvalia_request, &mut warnings);
        taxes.plusvalia = Some(estimate.amount);
        taxes.plusvalia_explanation = Some(estimate.explanation);
    }

    if let (Some(previous_price), Some(previous_year)) =
        (request.previous_purchase_price, request.previous_purchase_year)
    {
        if let Some(gains) = capital_gains(price, previous_price, previous_year, reference_year) {
            log::debug!("Capital gains: {:?}", gains);
            taxes.capital_gains_explanation = Some(gains.explanation());
            taxes.capital_gains_tax = Some(gains.tax);
        }
    }

    let fees = Fees {
        agency_fees: request.include_agency_fees.then(|| agency_fees(price)),
        legal_fees: request.include_legal_fees.then_some(LEGAL_FEE_BASE),
        ..Default::default()
    };

    let breakdown = CalculationBreakdown::for_seller(price, taxes, fees, warnings);
    log::info!(
        "Seller costs for {}: deductions {}",
        price,
        breakdown.total_cost
    );
    breakdown
}

/// Ask the estimator, substituting the local approximation on failure.
fn estimate_plusvalia(
    estimator: &dyn PlusvaliaEstimator,
    request: &PlusvaliaRequest,
    warnings: &mut Vec<Warning>,
) -> PlusvaliaEstimate {
    match estimator.estimate(request) {
        Ok(estimate) => estimate,
        Err(e) => {
            log::warn!(
                "Plusvalía estimate for {} failed, using approximation: {}",
                request.municipality,
                e
            );
            warnings.push(Warning::PlusvaliaFallback {
                reason: e.to_string(),
            });
            linear_estimate(request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plusvalia::{EstimateError, LinearEstimator};

    struct Failing;

    impl PlusvaliaEstimator for Failing {
        fn estimate(&self, _: &PlusvaliaRequest) -> Result<PlusvaliaEstimate, EstimateError> {
            Err(EstimateError::Service("connection refused".to_string()))
        }
    }

    struct Fixed;

    impl PlusvaliaEstimator for Fixed {
        fn estimate(&self, _: &PlusvaliaRequest) -> Result<PlusvaliaEstimate, EstimateError> {
            Ok(PlusvaliaEstimate {
                amount: dec!(1500),
                explanation: "Método objetivo".to_string(),
            })
        }
    }

    fn sale() -> CalculatorRequest {
        CalculatorRequest {
            property_type: PropertyType::Used,
            property_value: dec!(300000),
            municipality: Some("Sevilla".to_string()),
            previous_purchase_price: Some(dec!(200000)),
            previous_purchase_year: Some(2020),
            ..Default::default()
        }
    }

    #[test]
    fn recent_purchase_has_no_reduction() {
        let gains = capital_gains(dec!(300000), dec!(200000), 2020, 2025).unwrap();
        assert_eq!(gains.years_held, 5);
        assert_eq!(gains.reduction, dec!(0));
        assert_eq!(gains.taxable_gain, dec!(100000));
        assert_eq!(gains.tax, dec!(19000));
    }

    #[test]
    fn old_purchase_reduction() {
        // 2012 -> 2015: 3 years at 11%
        let gains = capital_gains(dec!(300000), dec!(200000), 2012, 2015).unwrap();
        assert_eq!(gains.reduction, dec!(0.33));
        assert_eq!(gains.taxable_gain, dec!(67000));
        assert_eq!(gains.tax, dec!(12730));
    }

    #[test]
    fn reduction_capped_at_sixty_percent() {
        let gains = capital_gains(dec!(300000), dec!(200000), 2000, 2025).unwrap();
        assert_eq!(gains.reduction, dec!(0.60));
        assert_eq!(gains.taxable_gain, dec!(40000));
        assert_eq!(gains.tax, dec!(7600));
        assert!(gains.explanation().contains("60%"));
    }

    #[test]
    fn single_year_before_cutoff_has_no_reduction() {
        let gains = capital_gains(dec!(300000), dec!(200000), 2014, 2015).unwrap();
        assert_eq!(gains.reduction, dec!(0));
    }

    #[test]
    fn no_gain_no_tax() {
        assert!(capital_gains(dec!(200000), dec!(200000), 2010, 2025).is_none());
        assert!(capital_gains(dec!(150000), dec!(200000), 2010, 2025).is_none());
    }

    #[test]
    fn seller_breakdown_uses_estimator() {
        let b = calculate_seller_costs(&sale(), &Fixed, 2025);
        assert_eq!(b.taxes.plusvalia, Some(dec!(1500)));
        assert_eq!(b.taxes.plusvalia_explanation.as_deref(), Some("Método objetivo"));
        assert_eq!(b.taxes.capital_gains_tax, Some(dec!(19000)));
        assert_eq!(b.total_additional_costs, dec!(20500));
        assert!(b.warnings.is_empty());
    }

    #[test]
    fn estimator_failure_degrades_to_approximation() {
        let b = calculate_seller_costs(&sale(), &Failing, 2025);
        assert_eq!(b.taxes.plusvalia, Some(dec!(3000)));
        assert_eq!(b.taxes.capital_gains_tax, Some(dec!(19000)));
        assert!(matches!(
            b.warnings.as_slice(),
            [Warning::PlusvaliaFallback { .. }]
        ));
    }

    #[test]
    fn estimator_failure_without_history_is_zero() {
        let req = CalculatorRequest {
            property_type: PropertyType::Used,
            property_value: dec!(300000),
            municipality: Some("Bilbao".to_string()),
            ..Default::default()
        };
        let b = calculate_seller_costs(&req, &Failing, 2025);
        assert_eq!(b.taxes.plusvalia, Some(dec!(0)));
        assert_eq!(b.total_cost, dec!(0));
    }

    #[test]
    fn no_plusvalia_for_new_property_or_missing_municipality() {
        let mut req = sale();
        req.property_type = PropertyType::New;
        let b = calculate_seller_costs(&req, &Fixed, 2025);
        assert_eq!(b.taxes.plusvalia, None);

        let mut req = sale();
        req.municipality = Some("  ".to_string());
        let b = calculate_seller_costs(&req, &Fixed, 2025);
        assert_eq!(b.taxes.plusvalia, None);
    }

    #[test]
    fn seller_fees_flat_legal() {
        let mut req = sale();
        req.include_agency_fees = true;
        req.include_legal_fees = true;
        let b = calculate_seller_costs(&req, &LinearEstimator, 2025);
        assert_eq!(b.fees.agency_fees, Some(dec!(9000)));
        assert_eq!(b.fees.legal_fees, Some(dec!(1000)));
        assert_eq!(b.fees.notary_fees, None);
        assert_eq!(b.fees.register_fees, None);
    }

    #[test]
    fn seller_total_never_includes_price() {
        for agency in [false, true] {
            for legal in [false, true] {
                let mut req = sale();
                req.include_agency_fees = agency;
                req.include_legal_fees = legal;
                let b = calculate_seller_costs(&req, &LinearEstimator, 2025);
                assert_eq!(b.total_cost, b.total_additional_costs);
                assert_eq!(b.property_price, dec!(300000));
            }
        }
    }
}
