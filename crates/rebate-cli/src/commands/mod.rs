pub mod aliases;
pub mod calculate;
pub mod summarize;
pub mod tiers;
