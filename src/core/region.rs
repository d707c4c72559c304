use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// One bracket of a progressive ITP tariff.
///
/// `accumulated_quota` is the tax due on everything below this bracket, so the
/// tax on a value inside the bracket is the quota plus the marginal part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBracket {
    /// Upper bound of the bracket. `None` for the open-ended top bracket.
    pub threshold: Option<Decimal>,
    pub rate: Decimal,
    pub accumulated_quota: Decimal,
}

/// Step override for regions that charge a higher flat rate above a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighValueRule {
    pub threshold: Decimal,
    pub rate: Decimal,
}

/// Reduction for young buyers, as a fraction of the resolved rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeReduction {
    pub max_age: u32,
    pub reduction: Decimal,
    /// Price ceiling above which the reduction does not apply.
    pub max_value: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FamilySituation {
    LargeFamily,
    Disability,
}

impl FamilySituation {
    pub fn display(&self) -> &'static str {
        match self {
            FamilySituation::LargeFamily => "familia numerosa",
            FamilySituation::Disability => "discapacidad",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyRate {
    pub situation: FamilySituation,
    pub rate: Decimal,
}

/// Reduced rates a region publishes for particular buyers or properties.
///
/// These are catalogued but not combined into the ITP calculation: how they
/// stack with the age reduction is not defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialConditions {
    pub vpo_rate: Option<Decimal>,
    pub rural_rate: Option<Decimal>,
    pub family_rates: &'static [FamilyRate],
    pub first_home_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalTaxConfig {
    pub key: &'static str,
    pub name: &'static str,
    pub base_itp: Decimal,
    pub progressive_tariff: Option<&'static [TaxBracket]>,
    pub high_value: Option<HighValueRule>,
    /// Evaluated in order, first match wins.
    pub age_reductions: &'static [AgeReduction],
    pub special_conditions: Option<SpecialConditions>,
    /// AJD on new-build deeds. `None` means the state default applies.
    pub ajd_rate: Option<Decimal>,
}

/// Rate applied when the region is missing or unknown.
pub const FALLBACK_ITP_RATE: Decimal = dec!(0.08);

/// AJD rate used when a region publishes none.
pub const DEFAULT_AJD_RATE: Decimal = dec!(0.015);

const fn bracket(threshold: Option<Decimal>, rate: Decimal, accumulated_quota: Decimal) -> TaxBracket {
    TaxBracket {
        threshold,
        rate,
        accumulated_quota,
    }
}

const fn young(max_age: u32, reduction: Decimal, max_value: Option<Decimal>) -> AgeReduction {
    AgeReduction {
        max_age,
        reduction,
        max_value,
    }
}

const NO_FAMILY_RATES: &[FamilyRate] = &[];

const fn family(situation: FamilySituation, rate: Decimal) -> FamilyRate {
    FamilyRate { situation, rate }
}

const ARAGON_TARIFF: &[TaxBracket] = &[
    bracket(Some(dec!(400000)), dec!(0.08), dec!(0)),
    bracket(Some(dec!(450000)), dec!(0.085), dec!(32000)),
    bracket(Some(dec!(500000)), dec!(0.09), dec!(36250)),
    bracket(Some(dec!(750000)), dec!(0.095), dec!(40750)),
    bracket(None, dec!(0.10), dec!(64500)),
];

const ASTURIAS_TARIFF: &[TaxBracket] = &[
    bracket(Some(dec!(300000)), dec!(0.08), dec!(0)),
    bracket(Some(dec!(500000)), dec!(0.09), dec!(24000)),
    bracket(None, dec!(0.10), dec!(42000)),
];

const BALEARES_TARIFF: &[TaxBracket] = &[
    bracket(Some(dec!(400000)), dec!(0.08), dec!(0)),
    bracket(Some(dec!(600000)), dec!(0.09), dec!(32000)),
    bracket(Some(dec!(1000000)), dec!(0.10), dec!(50000)),
    bracket(Some(dec!(2000000)), dec!(0.12), dec!(90000)),
    bracket(None, dec!(0.13), dec!(210000)),
];

const CATALUNA_TARIFF: &[TaxBracket] = &[
    bracket(Some(dec!(1000000)), dec!(0.10), dec!(0)),
    bracket(None, dec!(0.11), dec!(100000)),
];

const EXTREMADURA_TARIFF: &[TaxBracket] = &[
    bracket(Some(dec!(360000)), dec!(0.08), dec!(0)),
    bracket(Some(dec!(600000)), dec!(0.10), dec!(28800)),
    bracket(None, dec!(0.11), dec!(52800)),
];

const ANDALUCIA_SPECIAL: SpecialConditions = SpecialConditions {
    vpo_rate: Some(dec!(0.035)),
    rural_rate: None,
    family_rates: &[
        family(FamilySituation::LargeFamily, dec!(0.035)),
        family(FamilySituation::Disability, dec!(0.035)),
    ],
    first_home_rate: None,
};

const ASTURIAS_SPECIAL: SpecialConditions = SpecialConditions {
    vpo_rate: None,
    rural_rate: Some(dec!(0.03)),
    family_rates: &[family(FamilySituation::LargeFamily, dec!(0.03))],
    first_home_rate: None,
};

const CANARIAS_SPECIAL: SpecialConditions = SpecialConditions {
    vpo_rate: None,
    rural_rate: None,
    family_rates: NO_FAMILY_RATES,
    first_home_rate: Some(dec!(0.05)),
};

const CANTABRIA_SPECIAL: SpecialConditions = SpecialConditions {
    vpo_rate: Some(dec!(0.05)),
    rural_rate: Some(dec!(0.04)),
    family_rates: &[family(FamilySituation::LargeFamily, dec!(0.05))],
    first_home_rate: None,
};

const CASTILLA_Y_LEON_SPECIAL: SpecialConditions = SpecialConditions {
    vpo_rate: None,
    rural_rate: Some(dec!(0.04)),
    family_rates: &[family(FamilySituation::LargeFamily, dec!(0.04))],
    first_home_rate: None,
};

const CATALUNA_SPECIAL: SpecialConditions = SpecialConditions {
    vpo_rate: Some(dec!(0.07)),
    rural_rate: None,
    family_rates: &[
        family(FamilySituation::LargeFamily, dec!(0.05)),
        family(FamilySituation::Disability, dec!(0.05)),
    ],
    first_home_rate: None,
};

const GALICIA_SPECIAL: SpecialConditions = SpecialConditions {
    vpo_rate: None,
    rural_rate: None,
    family_rates: &[
        family(FamilySituation::LargeFamily, dec!(0.03)),
        family(FamilySituation::Disability, dec!(0.03)),
    ],
    first_home_rate: None,
};

const MADRID_SPECIAL: SpecialConditions = SpecialConditions {
    vpo_rate: None,
    rural_rate: None,
    family_rates: &[family(FamilySituation::LargeFamily, dec!(0.04))],
    first_home_rate: None,
};

const NAVARRA_SPECIAL: SpecialConditions = SpecialConditions {
    vpo_rate: None,
    rural_rate: None,
    family_rates: &[family(FamilySituation::LargeFamily, dec!(0.05))],
    first_home_rate: None,
};

const PAIS_VASCO_SPECIAL: SpecialConditions = SpecialConditions {
    vpo_rate: None,
    rural_rate: None,
    family_rates: NO_FAMILY_RATES,
    first_home_rate: Some(dec!(0.025)),
};

const VALENCIA_SPECIAL: SpecialConditions = SpecialConditions {
    vpo_rate: Some(dec!(0.08)),
    rural_rate: None,
    family_rates: &[family(FamilySituation::LargeFamily, dec!(0.04))],
    first_home_rate: None,
};

const YOUNG_35_HALF_100K: &[AgeReduction] = &[young(35, dec!(0.50), Some(dec!(100000)))];
const YOUNG_35_HALF_150K: &[AgeReduction] = &[young(35, dec!(0.50), Some(dec!(150000)))];
const YOUNG_35_HALF_180K: &[AgeReduction] = &[young(35, dec!(0.50), Some(dec!(180000)))];

static REGIONS: &[RegionalTaxConfig] = &[
    RegionalTaxConfig {
        key: "andalucia",
        name: "Andalucía",
        base_itp: dec!(0.07),
        progressive_tariff: None,
        high_value: None,
        age_reductions: YOUNG_35_HALF_150K,
        special_conditions: Some(ANDALUCIA_SPECIAL),
        ajd_rate: Some(dec!(0.012)),
    },
    RegionalTaxConfig {
        key: "aragon",
        name: "Aragón",
        base_itp: dec!(0.08),
        progressive_tariff: Some(ARAGON_TARIFF),
        high_value: None,
        age_reductions: YOUNG_35_HALF_100K,
        special_conditions: None,
        ajd_rate: Some(dec!(0.015)),
    },
    RegionalTaxConfig {
        key: "asturias",
        name: "Asturias",
        base_itp: dec!(0.08),
        progressive_tariff: Some(ASTURIAS_TARIFF),
        high_value: None,
        age_reductions: YOUNG_35_HALF_150K,
        special_conditions: Some(ASTURIAS_SPECIAL),
        ajd_rate: Some(dec!(0.012)),
    },
    RegionalTaxConfig {
        key: "baleares",
        name: "Illes Balears",
        base_itp: dec!(0.08),
        progressive_tariff: Some(BALEARES_TARIFF),
        high_value: None,
        age_reductions: &[young(35, dec!(0.50), Some(dec!(270151)))],
        special_conditions: None,
        ajd_rate: Some(dec!(0.015)),
    },
    RegionalTaxConfig {
        key: "canarias",
        name: "Canarias",
        base_itp: dec!(0.065),
        progressive_tariff: None,
        high_value: None,
        age_reductions: &[young(35, dec!(0.23), Some(dec!(150000)))],
        special_conditions: Some(CANARIAS_SPECIAL),
        ajd_rate: Some(dec!(0.0075)),
    },
    RegionalTaxConfig {
        key: "cantabria",
        name: "Cantabria",
        base_itp: dec!(0.09),
        progressive_tariff: None,
        high_value: None,
        age_reductions: &[young(35, dec!(0.45), Some(dec!(200000)))],
        special_conditions: Some(CANTABRIA_SPECIAL),
        ajd_rate: Some(dec!(0.015)),
    },
    RegionalTaxConfig {
        key: "castilla-la-mancha",
        name: "Castilla-La Mancha",
        base_itp: dec!(0.09),
        progressive_tariff: None,
        high_value: None,
        age_reductions: &[young(35, dec!(0.33), Some(dec!(180000)))],
        special_conditions: None,
        ajd_rate: Some(dec!(0.015)),
    },
    RegionalTaxConfig {
        key: "castilla-y-leon",
        name: "Castilla y León",
        base_itp: dec!(0.08),
        progressive_tariff: None,
        high_value: Some(HighValueRule {
            threshold: dec!(250000),
            rate: dec!(0.10),
        }),
        age_reductions: &[young(36, dec!(0.50), Some(dec!(135000)))],
        special_conditions: Some(CASTILLA_Y_LEON_SPECIAL),
        ajd_rate: Some(dec!(0.015)),
    },
    RegionalTaxConfig {
        key: "cataluna",
        name: "Cataluña",
        base_itp: dec!(0.10),
        progressive_tariff: Some(CATALUNA_TARIFF),
        high_value: None,
        age_reductions: &[young(32, dec!(0.50), None)],
        special_conditions: Some(CATALUNA_SPECIAL),
        ajd_rate: None,
    },
    RegionalTaxConfig {
        key: "extremadura",
        name: "Extremadura",
        base_itp: dec!(0.08),
        progressive_tariff: Some(EXTREMADURA_TARIFF),
        high_value: None,
        age_reductions: YOUNG_35_HALF_180K,
        special_conditions: None,
        ajd_rate: Some(dec!(0.015)),
    },
    RegionalTaxConfig {
        key: "galicia",
        name: "Galicia",
        base_itp: dec!(0.09),
        progressive_tariff: None,
        high_value: None,
        age_reductions: &[young(36, dec!(0.50), Some(dec!(150000)))],
        special_conditions: Some(GALICIA_SPECIAL),
        ajd_rate: Some(dec!(0.015)),
    },
    RegionalTaxConfig {
        key: "la-rioja",
        name: "La Rioja",
        base_itp: dec!(0.07),
        progressive_tariff: None,
        high_value: None,
        age_reductions: YOUNG_35_HALF_180K,
        special_conditions: None,
        ajd_rate: Some(dec!(0.01)),
    },
    RegionalTaxConfig {
        key: "madrid",
        name: "Madrid",
        base_itp: dec!(0.06),
        progressive_tariff: None,
        high_value: None,
        age_reductions: &[young(35, dec!(0.33), None)],
        special_conditions: Some(MADRID_SPECIAL),
        ajd_rate: Some(dec!(0.0075)),
    },
    RegionalTaxConfig {
        key: "murcia",
        name: "Región de Murcia",
        base_itp: dec!(0.0775),
        progressive_tariff: None,
        high_value: None,
        age_reductions: &[young(35, dec!(0.60), Some(dec!(150000)))],
        special_conditions: None,
        ajd_rate: Some(dec!(0.015)),
    },
    RegionalTaxConfig {
        key: "navarra",
        name: "Navarra",
        base_itp: dec!(0.06),
        progressive_tariff: None,
        high_value: None,
        age_reductions: &[],
        special_conditions: Some(NAVARRA_SPECIAL),
        ajd_rate: Some(dec!(0.005)),
    },
    RegionalTaxConfig {
        key: "pais-vasco",
        name: "País Vasco",
        base_itp: dec!(0.04),
        progressive_tariff: None,
        high_value: None,
        age_reductions: &[],
        special_conditions: Some(PAIS_VASCO_SPECIAL),
        ajd_rate: Some(dec!(0.005)),
    },
    RegionalTaxConfig {
        key: "valencia",
        name: "Comunitat Valenciana",
        base_itp: dec!(0.10),
        progressive_tariff: None,
        high_value: Some(HighValueRule {
            threshold: dec!(1000000),
            rate: dec!(0.11),
        }),
        age_reductions: &[young(35, dec!(0.20), Some(dec!(180000)))],
        special_conditions: Some(VALENCIA_SPECIAL),
        ajd_rate: Some(dec!(0.015)),
    },
];

/// All regional configurations, in alphabetical key order.
pub fn regions() -> &'static [RegionalTaxConfig] {
    REGIONS
}

/// Look up a region by free-form key ("Cataluña", "castilla y león", "madrid").
pub fn find_region(region: &str) -> Option<&'static RegionalTaxConfig> {
    let key = normalize_region_key(region);
    REGIONS.iter().find(|r| r.key == key)
}

/// Normalise a region key: trim, lowercase, fold Spanish accents and turn
/// whitespace and underscores into dashes.
pub fn normalize_region_key(region: &str) -> String {
    let mut key = String::with_capacity(region.len());
    for c in region.trim().chars().flat_map(char::to_lowercase) {
        let folded = match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            ' ' | '_' | '\t' => '-',
            other => other,
        };
        if folded == '-' && key.ends_with('-') {
            continue;
        }
        key.push(folded);
    }
    key
}

impl RegionalTaxConfig {
    pub fn ajd_rate_or_default(&self) -> Decimal {
        self.ajd_rate.unwrap_or(DEFAULT_AJD_RATE)
    }

    pub fn has_special_conditions(&self) -> bool {
        self.special_conditions.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seventeen_regions() {
        assert_eq!(regions().len(), 17);
    }

    #[test]
    fn region_keys_are_unique_and_sorted() {
        let keys: Vec<_> = regions().iter().map(|r| r.key).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn progressive_tariffs_are_ordered_and_end_open() {
        for region in regions() {
            let Some(tariff) = region.progressive_tariff else {
                continue;
            };
            let bounds: Vec<_> = tariff.iter().map(|b| b.threshold).collect();
            assert_eq!(bounds.last(), Some(&None), "{} must end open", region.key);
            let finite: Vec<_> = bounds.iter().flatten().collect();
            assert!(
                finite.windows(2).all(|w| w[0] < w[1]),
                "{} thresholds must ascend",
                region.key
            );
        }
    }

    #[test]
    fn accumulated_quotas_match_lower_brackets() {
        for region in regions() {
            let Some(tariff) = region.progressive_tariff else {
                continue;
            };
            let mut lower = Decimal::ZERO;
            let mut quota = Decimal::ZERO;
            for b in tariff {
                assert_eq!(b.accumulated_quota, quota, "{}", region.key);
                if let Some(upper) = b.threshold {
                    quota += (upper - lower) * b.rate;
                    lower = upper;
                }
            }
        }
    }

    #[test]
    fn age_reductions_ascend_by_max_age() {
        for region in regions() {
            let ages: Vec<_> = region.age_reductions.iter().map(|a| a.max_age).collect();
            assert!(ages.windows(2).all(|w| w[0] <= w[1]), "{}", region.key);
        }
    }

    #[test]
    fn lookup_is_lenient_about_spelling() {
        assert_eq!(find_region("madrid").map(|r| r.key), Some("madrid"));
        assert_eq!(find_region(" Madrid ").map(|r| r.key), Some("madrid"));
        assert_eq!(find_region("Cataluña").map(|r| r.key), Some("cataluna"));
        assert_eq!(
            find_region("Castilla y León").map(|r| r.key),
            Some("castilla-y-leon")
        );
        assert_eq!(find_region("pais_vasco").map(|r| r.key), Some("pais-vasco"));
        assert!(find_region("nonexistent-region").is_none());
        assert!(find_region("").is_none());
    }

    #[test]
    fn catalonia_uses_default_ajd() {
        let cat = find_region("cataluna").unwrap();
        assert_eq!(cat.ajd_rate, None);
        assert_eq!(cat.ajd_rate_or_default(), dec!(0.015));
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(find_region("madrid").unwrap()).unwrap();
        assert!(json.get("baseItp").is_some());
        assert!(json.get("base_itp").is_none());
        assert!(json["progressiveTariff"].is_null());
        assert_eq!(json["ageReductions"][0]["maxAge"], 35);
        assert_eq!(
            json["specialConditions"]["familyRates"][0]["situation"],
            "largeFamily"
        );

        let json = serde_json::to_value(find_region("cataluna").unwrap()).unwrap();
        assert!(json["progressiveTariff"][0].get("accumulatedQuota").is_some());
    }
}
