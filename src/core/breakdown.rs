use super::warnings::Warning;
use rust_decimal::Decimal;
use serde::Serialize;

/// Taxes of one side of the transaction.
///
/// Amounts and explanations are separate fields so only amounts are summed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iva: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_tax: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ajd_tax: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plusvalia: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_gains_tax: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itp_explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plusvalia_explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capital_gains_explanation: Option<String>,
}

impl Taxes {
    /// Present amounts with their display labels
    pub fn amounts(&self) -> Vec<(&'static str, Decimal)> {
        [
            ("IVA", self.iva),
            ("ITP", self.transfer_tax),
            ("AJD", self.ajd_tax),
            ("Plusvalía municipal", self.plusvalia),
            ("IRPF (ganancia patrimonial)", self.capital_gains_tax),
        ]
        .into_iter()
        .filter_map(|(label, amount)| amount.map(|a| (label, a)))
        .collect()
    }

    pub fn total(&self) -> Decimal {
        self.amounts().into_iter().map(|(_, a)| a).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fees {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notary_fees: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub register_fees: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_fees: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_fees: Option<Decimal>,
}

impl Fees {
    pub fn amounts(&self) -> Vec<(&'static str, Decimal)> {
        [
            ("Notaría", self.notary_fees),
            ("Registro", self.register_fees),
            ("Agencia", self.agency_fees),
            ("Abogado", self.legal_fees),
        ]
        .into_iter()
        .filter_map(|(label, amount)| amount.map(|a| (label, a)))
        .collect()
    }

    pub fn total(&self) -> Decimal {
        self.amounts().into_iter().map(|(_, a)| a).sum()
    }
}

/// Cost breakdown for one role.
///
/// For a buyer `total_cost` is the price plus every cost; for a seller it is
/// only the costs, i.e. what is deducted from the sale proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationBreakdown {
    pub property_price: Decimal,
    pub taxes: Taxes,
    pub fees: Fees,
    pub total_additional_costs: Decimal,
    pub total_cost: Decimal,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl CalculationBreakdown {
    pub fn for_buyer(property_price: Decimal, taxes: Taxes, fees: Fees, warnings: Vec<Warning>) -> Self {
        let total_additional_costs = taxes.total() + fees.total();
        CalculationBreakdown {
            property_price,
            taxes,
            fees,
            total_additional_costs,
            total_cost: property_price + total_additional_costs,
            warnings,
        }
    }

    pub fn for_seller(property_price: Decimal, taxes: Taxes, fees: Fees, warnings: Vec<Warning>) -> Self {
        let total_additional_costs = taxes.total() + fees.total();
        CalculationBreakdown {
            property_price,
            taxes,
            fees,
            total_additional_costs,
            total_cost: total_additional_costs,
            warnings,
        }
    }
}
