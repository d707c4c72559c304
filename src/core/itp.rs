//! Regional ITP (Impuesto de Transmisiones Patrimoniales) calculation.

use super::region::{find_region, AgeReduction, RegionalTaxConfig, TaxBracket, FALLBACK_ITP_RATE};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Transfer tax due on a resale purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItpResult {
    pub amount: Decimal,
    /// Effective rate after every rule has been applied
    pub rate: Decimal,
    /// Spanish description of each rule that was applied
    pub explanation: String,
}

/// Calculate ITP for a region given by free-form key.
///
/// Unknown regions fall back to the 8% standard rate; this never fails.
pub fn calculate_regional_itp(
    property_value: Decimal,
    region: &str,
    buyer_age: Option<u32>,
) -> ItpResult {
    match find_region(region) {
        Some(config) => itp_for_region(property_value, config, buyer_age),
        None => {
            log::debug!("Unknown region '{}', applying standard ITP rate", region);
            fallback_itp(
                property_value,
                format!(
                    "Región no especificada o desconocida: se aplica la tarifa estándar del {}.",
                    format_percent(FALLBACK_ITP_RATE)
                ),
            )
        }
    }
}

/// Flat standard rate with the caller's explanation
pub fn fallback_itp(property_value: Decimal, explanation: String) -> ItpResult {
    ItpResult {
        amount: (property_value * FALLBACK_ITP_RATE).round_dp(2),
        rate: FALLBACK_ITP_RATE,
        explanation,
    }
}

/// Calculate ITP against a specific regional configuration.
pub fn itp_for_region(
    property_value: Decimal,
    config: &RegionalTaxConfig,
    buyer_age: Option<u32>,
) -> ItpResult {
    let (mut rate, mut explanation) = if let Some(tariff) = config.progressive_tariff {
        let tax = progressive_tax(property_value, tariff);
        let rate = tax.checked_div(property_value).unwrap_or(config.base_itp);
        let explanation = format!(
            "Tarifa progresiva de {}: cuota de {:.2} € (tipo medio del {}).",
            config.name,
            tax,
            format_percent(rate)
        );
        (rate, explanation)
    } else if let Some(high) = config
        .high_value
        .filter(|high| property_value > high.threshold)
    {
        let explanation = format!(
            "Tipo incrementado del {} en {} para inmuebles de más de {:.0} €.",
            format_percent(high.rate),
            config.name,
            high.threshold
        );
        (high.rate, explanation)
    } else {
        let explanation = format!(
            "Tipo general del {} en {}.",
            format_percent(config.base_itp),
            config.name
        );
        (config.base_itp, explanation)
    };

    if let Some(age) = buyer_age {
        if let Some(rule) = matching_age_reduction(config.age_reductions, age, property_value) {
            rate *= Decimal::ONE - rule.reduction;
            explanation.push_str(&format!(
                " Reducción del {} por edad (hasta {} años): tipo efectivo del {}.",
                format_percent(rule.reduction),
                rule.max_age,
                format_percent(rate)
            ));
        }
    }

    log::debug!(
        "ITP {}: value={}, age={:?}, rate={}",
        config.key,
        property_value,
        buyer_age,
        rate
    );

    ItpResult {
        amount: (property_value * rate).round_dp(2),
        rate,
        explanation,
    }
}

/// Tax under a cumulative-quota tariff.
///
/// Brackets are walked in order; the tax inside the bracket where the value
/// runs out is that bracket's accumulated quota plus the marginal part.
pub fn progressive_tax(property_value: Decimal, tariff: &[TaxBracket]) -> Decimal {
    let mut tax = Decimal::ZERO;
    let mut remaining = property_value;
    let mut current_threshold = Decimal::ZERO;

    for bracket in tariff {
        if remaining <= Decimal::ZERO {
            break;
        }
        let taxable = match bracket.threshold {
            Some(threshold) => remaining.min(threshold - current_threshold),
            None => remaining,
        };
        tax = bracket.accumulated_quota + taxable * bracket.rate;
        remaining -= taxable;
        if let Some(threshold) = bracket.threshold {
            current_threshold = threshold;
        }
    }

    tax
}

/// First rule, in list order, covering the buyer's age and the price.
pub fn matching_age_reduction(
    rules: &[AgeReduction],
    buyer_age: u32,
    property_value: Decimal,
) -> Option<&AgeReduction> {
    rules.iter().find(|rule| {
        buyer_age <= rule.max_age && rule.max_value.is_none_or(|max| property_value <= max)
    })
}

/// Format a fraction as a percentage with at most two decimals ("4.02%", "6%").
pub fn format_percent(rate: Decimal) -> String {
    format!("{}%", (rate * dec!(100)).round_dp(2).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::region::regions;

    #[test]
    fn madrid_young_buyer() {
        let itp = calculate_regional_itp(dec!(300000), "madrid", Some(28));
        assert_eq!(itp.rate, dec!(0.0402));
        assert_eq!(itp.amount, dec!(12060));
        assert!(itp.explanation.contains("6%"));
        assert!(itp.explanation.contains("33%"));
        assert!(itp.explanation.contains("4.02%"));
    }

    #[test]
    fn madrid_without_age_uses_base_rate() {
        let itp = calculate_regional_itp(dec!(300000), "madrid", None);
        assert_eq!(itp.rate, dec!(0.06));
        assert_eq!(itp.amount, dec!(18000));
        assert!(!itp.explanation.contains("Reducción"));
    }

    #[test]
    fn madrid_buyer_over_age_limit() {
        let itp = calculate_regional_itp(dec!(300000), "madrid", Some(36));
        assert_eq!(itp.rate, dec!(0.06));
    }

    #[test]
    fn unknown_region_falls_back_to_eight_percent() {
        for price in [dec!(1), dec!(200000), dec!(5000000)] {
            let itp = calculate_regional_itp(price, "nonexistent-region", Some(25));
            assert_eq!(itp.rate, dec!(0.08));
            assert_eq!(itp.amount, (price * dec!(0.08)).round_dp(2));
            assert!(itp.explanation.contains("no especificada"));
        }
    }

    #[test]
    fn progressive_tariff_inside_second_bracket() {
        // 400k at 8% + 20k at 8.5%
        let itp = calculate_regional_itp(dec!(420000), "aragon", None);
        assert_eq!(itp.amount, dec!(33700));
        assert!(itp.explanation.contains("Tarifa progresiva"));
    }

    #[test]
    fn progressive_tariff_in_open_bracket() {
        // Cataluña: 1M at 10% + 500k at 11%
        let itp = calculate_regional_itp(dec!(1500000), "cataluna", None);
        assert_eq!(itp.amount, dec!(155000));
    }

    #[test]
    fn progressive_tariff_is_continuous_at_thresholds() {
        for region in regions() {
            let Some(tariff) = region.progressive_tariff else {
                continue;
            };
            for pair in tariff.windows(2) {
                let threshold = pair[0].threshold.unwrap();
                let itp = itp_for_region(threshold, region, None);
                assert_eq!(
                    itp.amount, pair[1].accumulated_quota,
                    "{} at {}",
                    region.key, threshold
                );
            }
        }
    }

    #[test]
    fn progressive_takes_precedence_over_high_value() {
        let mut config = *crate::core::region::find_region("cataluna").unwrap();
        config.high_value = Some(crate::core::region::HighValueRule {
            threshold: dec!(100000),
            rate: dec!(0.5),
        });
        let itp = itp_for_region(dec!(200000), &config, None);
        assert_eq!(itp.rate, dec!(0.10));
    }

    #[test]
    fn high_value_override() {
        let below = calculate_regional_itp(dec!(250000), "castilla-y-leon", None);
        assert_eq!(below.rate, dec!(0.08));

        let above = calculate_regional_itp(dec!(250001), "castilla-y-leon", None);
        assert_eq!(above.rate, dec!(0.10));
        assert!(above.explanation.contains("Tipo incrementado"));
    }

    #[test]
    fn age_reduction_lowers_rate_in_every_region() {
        for region in regions() {
            let Some(rule) = region.age_reductions.first() else {
                continue;
            };
            let price = rule.max_value.unwrap_or(dec!(200000));
            let base = itp_for_region(price, region, None);
            let reduced = itp_for_region(price, region, Some(rule.max_age));
            assert!(reduced.rate < base.rate, "{}", region.key);
            assert_eq!(
                reduced.rate,
                base.rate * (Decimal::ONE - rule.reduction),
                "{}",
                region.key
            );
        }
    }

    #[test]
    fn age_reduction_respects_price_ceiling() {
        // Andalucía young-buyer rate only up to 150k
        let at_limit = calculate_regional_itp(dec!(150000), "andalucia", Some(30));
        assert_eq!(at_limit.rate, dec!(0.035));

        let above = calculate_regional_itp(dec!(150001), "andalucia", Some(30));
        assert_eq!(above.rate, dec!(0.07));
    }

    #[test]
    fn first_matching_age_rule_wins() {
        const RULES: &[AgeReduction] = &[
            AgeReduction {
                max_age: 30,
                reduction: dec!(0.50),
                max_value: Some(dec!(100000)),
            },
            AgeReduction {
                max_age: 35,
                reduction: dec!(0.25),
                max_value: None,
            },
            AgeReduction {
                max_age: 40,
                reduction: dec!(0.10),
                max_value: None,
            },
        ];

        let rule = matching_age_reduction(RULES, 25, dec!(90000)).unwrap();
        assert_eq!(rule.reduction, dec!(0.50));

        // Price ceiling skips the first rule, the second applies and stops the scan
        let rule = matching_age_reduction(RULES, 25, dec!(200000)).unwrap();
        assert_eq!(rule.reduction, dec!(0.25));

        let rule = matching_age_reduction(RULES, 38, dec!(90000)).unwrap();
        assert_eq!(rule.reduction, dec!(0.10));

        assert!(matching_age_reduction(RULES, 41, dec!(90000)).is_none());
    }

    #[test]
    fn age_reduction_applies_to_progressive_effective_rate() {
        // Cataluña under-33 rate halves the effective rate
        let itp = calculate_regional_itp(dec!(200000), "cataluna", Some(30));
        assert_eq!(itp.rate, dec!(0.05));
        assert_eq!(itp.amount, dec!(10000));
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(dec!(0.06)), "6%");
        assert_eq!(format_percent(dec!(0.0402)), "4.02%");
        assert_eq!(format_percent(dec!(0.085)), "8.5%");
        assert_eq!(format_percent(dec!(0.0775)), "7.75%");
        assert_eq!(format_percent(dec!(0.33)), "33%");
    }
}
