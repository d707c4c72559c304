//! Calc command - full cost breakdown for a purchase or a sale

use crate::cmd::display::print_expenses;
use crate::cmd::read_request;
use crate::core::{
    calculate_expenses, CalculationRecord, CalculatorRequest, CompletionEstimator,
    LinearEstimator, PlusvaliaEstimator, PropertyType, RecordStore, ReplyFile, UserRole,
};
use chrono::{Datelike, Utc};
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CalcCommand {
    /// JSON request file ("-" for stdin). Flags override its fields.
    #[arg(short, long)]
    request: Option<PathBuf>,

    #[command(flatten)]
    fields: RequestArgs,

    /// Year of the sale (defaults to the current year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Reject regions that are not in the tax table instead of using 8%
    #[arg(long)]
    strict_region: bool,

    /// Stored completion-service reply to use for the plusvalía estimate
    #[arg(long)]
    plusvalia_reply: Option<PathBuf>,

    /// Append the calculation to this JSON-lines file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Owner of the saved calculation
    #[arg(long, requires = "save")]
    user: Option<String>,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Property type
    #[arg(short = 't', long, value_enum)]
    property_type: Option<PropertyTypeArg>,

    /// Property price in euros
    #[arg(short = 'v', long)]
    value: Option<Decimal>,

    /// Whose costs to calculate; omitted or "both" gives the combined result
    #[arg(long, value_enum)]
    role: Option<RoleArg>,

    /// Autonomous community (e.g. madrid, cataluna, pais-vasco)
    #[arg(short = 'g', long)]
    region: Option<String>,

    /// Municipality, for the plusvalía estimate
    #[arg(short, long)]
    municipality: Option<String>,

    /// Buyer age in years
    #[arg(short, long)]
    age: Option<u32>,

    /// Year the seller bought the property
    #[arg(long)]
    previous_year: Option<i32>,

    /// Price the seller paid, in euros
    #[arg(long)]
    previous_price: Option<Decimal>,

    /// Include real-estate agency fees
    #[arg(long)]
    agency: bool,

    /// Include lawyer fees
    #[arg(long)]
    legal: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PropertyTypeArg {
    New,
    Used,
}

impl From<PropertyTypeArg> for PropertyType {
    fn from(arg: PropertyTypeArg) -> Self {
        match arg {
            PropertyTypeArg::New => PropertyType::New,
            PropertyTypeArg::Used => PropertyType::Used,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Buyer,
    Seller,
    Both,
}

impl From<RoleArg> for UserRole {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Buyer => UserRole::Buyer,
            RoleArg::Seller => UserRole::Seller,
            RoleArg::Both => UserRole::Both,
        }
    }
}

impl RequestArgs {
    /// Overlay the flags that were given onto a request
    fn apply(&self, mut request: CalculatorRequest) -> CalculatorRequest {
        if let Some(property_type) = self.property_type {
            request.property_type = property_type.into();
        }
        if let Some(value) = self.value {
            request.property_value = value;
        }
        if let Some(role) = self.role {
            request.user_role = Some(role.into());
        }
        if let Some(region) = &self.region {
            request.region = Some(region.clone());
        }
        if let Some(municipality) = &self.municipality {
            request.municipality = Some(municipality.clone());
        }
        if let Some(age) = self.age {
            request.buyer_age = Some(age);
        }
        if let Some(year) = self.previous_year {
            request.previous_purchase_year = Some(year);
        }
        if let Some(price) = self.previous_price {
            request.previous_purchase_price = Some(price);
        }
        request.include_agency_fees |= self.agency;
        request.include_legal_fees |= self.legal;
        request
    }
}

impl CalcCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let base = match &self.request {
            Some(path) => read_request(path)?,
            None => {
                if self.fields.value.is_none() {
                    anyhow::bail!("--value is required when no request file is given");
                }
                CalculatorRequest::default()
            }
        };
        let request = self.fields.apply(base);
        let reference_year = self.year.unwrap_or_else(|| Utc::now().year());
        request.validate(reference_year, self.strict_region)?;
        log::debug!("Request: {:?}", request);

        let estimator: Box<dyn PlusvaliaEstimator> = match &self.plusvalia_reply {
            Some(path) => Box::new(CompletionEstimator::new(ReplyFile { path: path.clone() })),
            None => Box::new(LinearEstimator),
        };
        let outcome = calculate_expenses(&request, estimator.as_ref(), reference_year);

        if let Some(path) = &self.save {
            let record =
                CalculationRecord::new(request.clone(), outcome.clone(), self.user.clone(), Utc::now())?;
            RecordStore::new(path).append(&record)?;
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            print_expenses(&outcome);
        }
        Ok(())
    }
}
