//! ITP command - regional transfer tax for a resale purchase

use crate::cmd::display::format_eur;
use crate::core::{calculate_regional_itp, check_max, format_percent};
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct ItpCommand {
    /// Property price in euros
    #[arg(short = 'v', long)]
    value: Decimal,

    /// Autonomous community; unknown regions use the 8% standard rate
    #[arg(short = 'g', long)]
    region: String,

    /// Buyer age in years
    #[arg(short, long)]
    age: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl ItpCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        if self.value <= Decimal::ZERO {
            anyhow::bail!("property value must be greater than zero");
        }
        check_max("property value", self.value)?;
        let itp = calculate_regional_itp(self.value, &self.region, self.age);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&itp)?);
        } else {
            println!();
            println!(
                "ITP: {} (tipo efectivo {})",
                format_eur(itp.amount),
                format_percent(itp.rate)
            );
            println!("  {}", itp.explanation);
            println!();
        }
        Ok(())
    }
}
