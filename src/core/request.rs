use casacalc_derive::FieldSchema;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use rust_decimal_macros::dec;
use std::io::Read;

use super::region::find_region;

/// Largest accepted price, in euros.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("property value must be greater than zero, got {0}")]
    NonPositiveValue(Decimal),
    #[error("previous purchase price must be greater than zero, got {0}")]
    NonPositivePreviousPrice(Decimal),
    #[error("{field} of {value} exceeds the maximum of {max}")]
    ValueTooLarge {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },
    #[error("previous purchase year {year} is after the reference year {reference_year}")]
    PurchaseYearInFuture { year: i32, reference_year: i32 },
    #[error("buyer age {0} is out of range")]
    InvalidBuyerAge(u32),
    #[error("unknown region: {0}")]
    UnknownRegion(String),
}

/// New build (IVA + AJD) or resale (ITP)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    New,
    #[default]
    Used,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Buyer,
    Seller,
    Both,
}

/// Documentation for one serialized request field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDoc {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// Input to every calculation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, FieldSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorRequest {
    /// new (IVA + AJD) or used (ITP)
    pub property_type: PropertyType,
    /// Sale price in euros, greater than zero
    #[schemars(with = "f64")]
    pub property_value: Decimal,
    /// buyer, seller or both (both uses the legacy combined calculation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<UserRole>,
    /// Autonomous community, e.g. madrid, cataluna, pais-vasco
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Municipality, needed for the plusvalía estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    /// Buyer age in years, for young-buyer ITP reductions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_age: Option<u32>,
    /// Year the seller bought the property
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_purchase_year: Option<i32>,
    /// Price the seller paid, in euros
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub previous_purchase_price: Option<Decimal>,
    /// Add 3% real-estate agency fees
    #[serde(default)]
    pub include_agency_fees: bool,
    /// Add lawyer fees
    #[serde(default)]
    pub include_legal_fees: bool,
}

impl CalculatorRequest {
    /// Reject input the calculators assume never reaches them.
    ///
    /// `strict_region` turns an unrecognised region into an error instead of
    /// the standard-rate fallback.
    pub fn validate(&self, reference_year: i32, strict_region: bool) -> Result<(), RequestError> {
        if self.property_value <= Decimal::ZERO {
            return Err(RequestError::NonPositiveValue(self.property_value));
        }
        check_max("property value", self.property_value)?;
        if let Some(price) = self.previous_purchase_price {
            if price <= Decimal::ZERO {
                return Err(RequestError::NonPositivePreviousPrice(price));
            }
            check_max("previous purchase price", price)?;
        }
        if let Some(year) = self.previous_purchase_year {
            if year > reference_year {
                return Err(RequestError::PurchaseYearInFuture {
                    year,
                    reference_year,
                });
            }
        }
        if let Some(age) = self.buyer_age {
            if !(18..=120).contains(&age) {
                return Err(RequestError::InvalidBuyerAge(age));
            }
        }
        if strict_region {
            if let Some(region) = &self.region {
                if find_region(region).is_none() {
                    return Err(RequestError::UnknownRegion(region.clone()));
                }
            }
        }
        Ok(())
    }
}

/// Amounts above `MAX_AMOUNT` would overflow the cost totals.
pub fn check_max(field: &'static str, value: Decimal) -> Result<(), RequestError> {
    if value > MAX_AMOUNT {
        return Err(RequestError::ValueTooLarge {
            field,
            value,
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}

/// Read a request from JSON
pub fn read_request_json<R: Read>(reader: R) -> anyhow::Result<CalculatorRequest> {
    let request = serde_json::from_reader(reader)?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CalculatorRequest {
        CalculatorRequest {
            property_type: PropertyType::Used,
            property_value: dec!(300000),
            region: Some("madrid".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn parses_camel_case_json() {
        let json = r#"{
            "propertyType": "used",
            "propertyValue": 300000,
            "userRole": "buyer",
            "region": "madrid",
            "buyerAge": 28,
            "includeAgencyFees": true
        }"#;
        let request = read_request_json(json.as_bytes()).unwrap();
        assert_eq!(request.property_type, PropertyType::Used);
        assert_eq!(request.property_value, dec!(300000));
        assert_eq!(request.user_role, Some(UserRole::Buyer));
        assert_eq!(request.region.as_deref(), Some("madrid"));
        assert_eq!(request.buyer_age, Some(28));
        assert!(request.include_agency_fees);
        assert!(!request.include_legal_fees);
        assert_eq!(request.municipality, None);
    }

    #[test]
    fn unknown_property_type_rejected() {
        let json = r#"{"propertyType": "castle", "propertyValue": 1}"#;
        assert!(read_request_json(json.as_bytes()).is_err());
    }

    #[test]
    fn valid_request_passes() {
        assert_eq!(request().validate(2025, true), Ok(()));
    }

    #[test]
    fn non_positive_value_rejected() {
        let mut req = request();
        req.property_value = dec!(0);
        assert_eq!(
            req.validate(2025, false),
            Err(RequestError::NonPositiveValue(dec!(0)))
        );
    }

    #[test]
    fn oversized_amounts_rejected() {
        let mut req = request();
        req.property_value = Decimal::MAX - Decimal::ONE;
        assert!(matches!(
            req.validate(2025, false),
            Err(RequestError::ValueTooLarge {
                field: "property value",
                ..
            })
        ));

        let mut req = request();
        req.previous_purchase_price = Some(MAX_AMOUNT + Decimal::ONE);
        assert!(matches!(
            req.validate(2025, false),
            Err(RequestError::ValueTooLarge {
                field: "previous purchase price",
                ..
            })
        ));

        let mut req = request();
        req.property_value = MAX_AMOUNT;
        assert_eq!(req.validate(2025, false), Ok(()));
    }

    #[test]
    fn future_purchase_year_rejected() {
        let mut req = request();
        req.previous_purchase_year = Some(2030);
        assert_eq!(
            req.validate(2025, false),
            Err(RequestError::PurchaseYearInFuture {
                year: 2030,
                reference_year: 2025
            })
        );
    }

    #[test]
    fn buyer_age_range() {
        let mut req = request();
        req.buyer_age = Some(12);
        assert_eq!(
            req.validate(2025, false),
            Err(RequestError::InvalidBuyerAge(12))
        );
    }

    #[test]
    fn unknown_region_only_rejected_when_strict() {
        let mut req = request();
        req.region = Some("atlantis".to_string());
        assert_eq!(req.validate(2025, false), Ok(()));
        assert_eq!(
            req.validate(2025, true),
            Err(RequestError::UnknownRegion("atlantis".to_string()))
        );
    }

    #[test]
    fn field_schema_uses_serialized_names() {
        let fields = CalculatorRequest::field_schema();
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names[0], "propertyType");
        assert!(names.contains(&"previousPurchasePrice"));
        assert!(names.contains(&"includeLegalFees"));

        let value = fields.iter().find(|f| f.name == "propertyValue").unwrap();
        assert!(value.required);
        assert!(value.description.contains("euros"));

        let region = fields.iter().find(|f| f.name == "region").unwrap();
        assert!(!region.required);

        let agency = fields.iter().find(|f| f.name == "includeAgencyFees").unwrap();
        assert!(!agency.required);
    }
}
