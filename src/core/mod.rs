pub mod breakdown;
pub mod buyer;
pub mod itp;
pub mod legacy;
pub mod plusvalia;
pub mod record;
pub mod region;
pub mod request;
pub mod seller;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use breakdown::{CalculationBreakdown, Fees, Taxes};
#[allow(unused_imports)]
pub use buyer::calculate_buyer_costs;
#[allow(unused_imports)]
pub use itp::{calculate_regional_itp, format_percent, ItpResult};
pub use legacy::{calculate_expenses, CalculationResult, Expenses};
pub use plusvalia::{CompletionEstimator, LinearEstimator, PlusvaliaEstimator, ReplyFile};
pub use record::{CalculationRecord, RecordStore};
#[allow(unused_imports)]
pub use region::{find_region, regions, RegionalTaxConfig};
#[allow(unused_imports)]
pub use request::{
    check_max, read_request_json, CalculatorRequest, FieldDoc, PropertyType, RequestError,
    UserRole,
};
#[allow(unused_imports)]
pub use seller::calculate_seller_costs;
pub use warnings::Warning;
