//! Plusvalía municipal estimation.
//!
//! The tax depends on municipal cadastral data the calculator does not hold,
//! so estimation sits behind [`PlusvaliaEstimator`]. [`CompletionEstimator`]
//! asks a text-completion service for a JSON estimate; [`LinearEstimator`] is
//! the local approximation used when that service is unavailable.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Share of the value increase used by the local approximation
pub const LINEAR_PLUSVALIA_RATE: Decimal = dec!(0.03);

#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error("completion service failed: {0}")]
    Service(String),
    #[error("could not read completion reply: {0}")]
    Io(#[from] std::io::Error),
    #[error("reply contains no JSON object")]
    NoJson,
    #[error("malformed estimate: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("negative plusvalía amount: {0}")]
    NegativeAmount(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlusvaliaRequest {
    pub municipality: String,
    pub property_value: Decimal,
    pub previous_purchase_price: Option<Decimal>,
    pub previous_purchase_year: Option<i32>,
    pub reference_year: i32,
}

impl PlusvaliaRequest {
    /// Positive difference between sale and purchase price, if known
    pub fn value_increase(&self) -> Option<Decimal> {
        self.previous_purchase_price
            .map(|previous| self.property_value - previous)
            .filter(|increase| *increase > Decimal::ZERO)
    }

    pub fn years_held(&self) -> Option<i32> {
        self.previous_purchase_year
            .map(|year| self.reference_year - year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlusvaliaEstimate {
    pub amount: Decimal,
    pub explanation: String,
}

pub trait PlusvaliaEstimator {
    fn estimate(&self, request: &PlusvaliaRequest) -> Result<PlusvaliaEstimate, EstimateError>;
}

/// Source of free-text completions for a prompt
pub trait CompletionClient {
    fn complete(&self, prompt: &str) -> Result<String, EstimateError>;
}

/// Estimator backed by a text-completion service replying with
/// `{"amount": number, "explanation": string}`.
pub struct CompletionEstimator<C> {
    client: C,
}

impl<C: CompletionClient> CompletionEstimator<C> {
    pub fn new(client: C) -> Self {
        CompletionEstimator { client }
    }
}

impl<C: CompletionClient> PlusvaliaEstimator for CompletionEstimator<C> {
    fn estimate(&self, request: &PlusvaliaRequest) -> Result<PlusvaliaEstimate, EstimateError> {
        let prompt = build_prompt(request);
        log::debug!("Plusvalía prompt for {}: {} chars", request.municipality, prompt.len());
        let reply = self.client.complete(&prompt)?;
        parse_estimate(&reply)
    }
}

/// Deterministic approximation: 3% of the value increase
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearEstimator;

impl PlusvaliaEstimator for LinearEstimator {
    fn estimate(&self, request: &PlusvaliaRequest) -> Result<PlusvaliaEstimate, EstimateError> {
        Ok(linear_estimate(request))
    }
}

pub fn linear_estimate(request: &PlusvaliaRequest) -> PlusvaliaEstimate {
    match request.value_increase() {
        Some(increase) => PlusvaliaEstimate {
            amount: (increase * LINEAR_PLUSVALIA_RATE).round_dp(2),
            explanation: format!(
                "Estimación aproximada para {}: 3% del incremento de valor de {:.2} €. \
                 El importe real depende del valor catastral del suelo.",
                request.municipality, increase
            ),
        },
        None => PlusvaliaEstimate {
            amount: Decimal::ZERO,
            explanation: format!(
                "No se puede estimar la plusvalía en {} sin un incremento de valor conocido.",
                request.municipality
            ),
        },
    }
}

/// Completion reply read from a file, e.g. a stored response from the service
pub struct ReplyFile {
    pub path: PathBuf,
}

impl CompletionClient for ReplyFile {
    fn complete(&self, _prompt: &str) -> Result<String, EstimateError> {
        let reply = std::fs::read_to_string(&self.path)?;
        if reply.trim().is_empty() {
            return Err(EstimateError::Service(format!(
                "empty reply in {}",
                self.path.display()
            )));
        }
        Ok(reply)
    }
}

pub fn build_prompt(request: &PlusvaliaRequest) -> String {
    let mut prompt = format!(
        "Estima el impuesto municipal sobre el incremento de valor de los terrenos \
         de naturaleza urbana (plusvalía municipal) para la venta de una vivienda en {}.\n\
         Precio de venta: {:.2} €.\n",
        request.municipality, request.property_value
    );
    if let Some(price) = request.previous_purchase_price {
        prompt.push_str(&format!("Precio de adquisición: {:.2} €.\n", price));
    }
    if let Some(year) = request.previous_purchase_year {
        prompt.push_str(&format!("Año de adquisición: {}.\n", year));
    }
    if let Some(years) = request.years_held() {
        prompt.push_str(&format!("Años de tenencia: {}.\n", years));
    }
    prompt.push_str(&format!("Año de la venta: {}.\n", request.reference_year));
    prompt.push_str(
        "Responde únicamente con un objeto JSON con el formato \
         {\"amount\": número en euros, \"explanation\": \"explicación breve en español\"}.",
    );
    prompt
}

#[derive(Deserialize)]
struct RawEstimate {
    amount: Decimal,
    explanation: String,
}

/// Parse a completion reply, tolerating prose or code fences around the JSON.
pub fn parse_estimate(reply: &str) -> Result<PlusvaliaEstimate, EstimateError> {
    let start = reply.find('{').ok_or(EstimateError::NoJson)?;
    let end = reply.rfind('}').ok_or(EstimateError::NoJson)?;
    if end < start {
        return Err(EstimateError::NoJson);
    }
    let raw: RawEstimate = serde_json::from_str(&reply[start..=end])?;
    if raw.amount < Decimal::ZERO {
        return Err(EstimateError::NegativeAmount(raw.amount));
    }
    Ok(PlusvaliaEstimate {
        amount: raw.amount.round_dp(2),
        explanation: raw.explanation,
    })
}
