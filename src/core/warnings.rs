use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Domain warning types emitted during calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Region was given but is not in the tax table; the standard rate was used.
    UnknownRegion { region: String },
    /// The region publishes reduced rates (VPO, rural, family, first home)
    /// that are not applied by the calculation.
    SpecialConditionsNotApplied { region: String },
    /// The plusvalía estimate could not be obtained and was approximated locally.
    PlusvaliaFallback { reason: String },
}

impl Warning {
    pub fn message(&self) -> String {
        match self {
            Warning::UnknownRegion { region } => {
                format!("Unknown region '{}': standard 8% ITP rate applied", region)
            }
            Warning::SpecialConditionsNotApplied { region } => format!(
                "{} has reduced rates (VPO, rural, family, first home) that were not applied",
                region
            ),
            Warning::PlusvaliaFallback { reason } => {
                format!("Plusvalía estimate unavailable ({}), approximated locally", reason)
            }
        }
    }
}
