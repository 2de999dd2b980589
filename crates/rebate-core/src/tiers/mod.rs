pub mod calculator;
pub mod resolver;
pub mod table;
pub mod validation;

pub use calculator::{compute_rebate_table, RebateTableOutput, TierResult};
pub use resolver::{resolve, resolve_position};
pub use table::{PercentageTier, TierSpec, TierTable};
pub use validation::{validate_tiers, TierValidationReport, DEFAULT_GRANULARITY};
