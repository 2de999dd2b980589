pub mod aggregate;
pub mod records;

pub use aggregate::{
    summarize_groups, summarize_raw_records, AggregationConfig, GroupSummary,
    DEFAULT_SERVICED_BRANDS,
};
pub use records::{RawSubscriptionRecord, SubscriptionRecord};
