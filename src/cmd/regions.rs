//! Regions command - the regional tax table

use crate::core::region::{AgeReduction, RegionalTaxConfig, SpecialConditions};
use crate::core::{format_percent, regions};
use clap::Args;
use std::io;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct RegionsCommand {
    /// Output as JSON (full configuration) instead of a table
    #[arg(long, conflicts_with = "csv")]
    json: bool,

    /// Output as CSV instead of a table
    #[arg(long)]
    csv: bool,
}

#[derive(Debug, Clone, Tabled, serde::Serialize)]
struct RegionRow {
    #[tabled(rename = "Clave")]
    key: &'static str,
    #[tabled(rename = "Comunidad")]
    name: &'static str,
    #[tabled(rename = "ITP")]
    itp: String,
    #[tabled(rename = "Jóvenes")]
    young: String,
    #[tabled(rename = "AJD")]
    ajd: String,
    #[tabled(rename = "Condiciones especiales")]
    special: String,
}

impl RegionsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(regions())?);
            return Ok(());
        }

        let rows: Vec<RegionRow> = regions().iter().map(region_row).collect();
        if self.csv {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        } else {
            let table = Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Rows::new(1..)).with(Alignment::left()))
                .to_string();
            println!("{}", table);
        }
        Ok(())
    }
}

fn region_row(config: &RegionalTaxConfig) -> RegionRow {
    RegionRow {
        key: config.key,
        name: config.name,
        itp: itp_summary(config),
        young: config
            .age_reductions
            .iter()
            .map(age_summary)
            .collect::<Vec<_>>()
            .join("; "),
        ajd: match config.ajd_rate {
            Some(rate) => format_percent(rate),
            None => format!("{} (general)", format_percent(config.ajd_rate_or_default())),
        },
        special: config
            .special_conditions
            .as_ref()
            .map(special_summary)
            .unwrap_or_default(),
    }
}

fn itp_summary(config: &RegionalTaxConfig) -> String {
    if let Some(tariff) = config.progressive_tariff {
        let rates: Vec<_> = tariff.iter().map(|b| format_percent(b.rate)).collect();
        return format!("progresiva {}", rates.join("/"));
    }
    match config.high_value {
        Some(high) => format!(
            "{} ({} > {:.0} €)",
            format_percent(config.base_itp),
            format_percent(high.rate),
            high.threshold
        ),
        None => format_percent(config.base_itp),
    }
}

fn age_summary(rule: &AgeReduction) -> String {
    let mut summary = format!("≤{} años: -{}", rule.max_age, format_percent(rule.reduction));
    if let Some(max) = rule.max_value {
        summary.push_str(&format!(" hasta {:.0} €", max));
    }
    summary
}

fn special_summary(conditions: &SpecialConditions) -> String {
    let mut parts = Vec::new();
    if let Some(rate) = conditions.vpo_rate {
        parts.push(format!("VPO {}", format_percent(rate)));
    }
    if let Some(rate) = conditions.rural_rate {
        parts.push(format!("rural {}", format_percent(rate)));
    }
    for family in conditions.family_rates {
        parts.push(format!(
            "{} {}",
            family.situation.display(),
            format_percent(family.rate)
        ));
    }
    if let Some(rate) = conditions.first_home_rate {
        parts.push(format!("primera vivienda {}", format_percent(rate)));
    }
    parts.join(", ")
}
