use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use rebate_core::tiers::{validate_tiers, PercentageTier, TierValidationReport, DEFAULT_GRANULARITY};
use rebate_core::with_metadata;

use crate::config::EngineConfig;

/// Arguments for inspecting a tier table
#[derive(Args)]
pub struct TiersArgs {
    /// JSON/YAML list of tiers (name, min, max, rebate_pct, baseline)
    #[arg(long)]
    pub tiers: Option<String>,

    /// Path to a JSON/YAML engine config
    #[arg(long)]
    pub config: Option<String>,

    /// Largest spacing between one tier's max and the next tier's min that
    /// still counts as contiguous
    #[arg(long)]
    pub granularity: Option<Decimal>,
}

#[derive(Serialize)]
struct TiersOutput {
    tiers: Vec<PercentageTier>,
    validation: TierValidationReport,
}

pub fn run_tiers(args: TiersArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let config = EngineConfig::load(args.config.as_deref())?;
    let table = config.tier_table(args.tiers.as_deref())?;
    let granularity = args.granularity.unwrap_or(DEFAULT_GRANULARITY);

    let validation = validate_tiers(&table, granularity);
    let warnings = validation.warnings.clone();
    let output = TiersOutput {
        tiers: table.tiers().to_vec(),
        validation,
    };

    let assumptions = serde_json::json!({ "granularity": granularity });
    Ok(serde_json::to_value(with_metadata(
        "Rebate Tier Table Validation",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        output,
    ))?)
}
