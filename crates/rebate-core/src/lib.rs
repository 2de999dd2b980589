pub mod error;
pub mod financials;
pub mod tiers;
pub mod types;

#[cfg(feature = "ingest")]
pub mod ingest;

#[cfg(feature = "summary")]
pub mod summary;

#[cfg(feature = "report")]
pub mod report;

#[cfg(feature = "sessions")]
pub mod session;

pub use error::RebateError;
pub use financials::{GroupFinancials, UnitCounts};
pub use types::*;

/// Standard result type for all rebate-engine operations
pub type RebateResult<T> = Result<T, RebateError>;
