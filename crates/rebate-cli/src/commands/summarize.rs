use clap::Args;
use serde_json::Value;

use rebate_core::summary::{self, RawSubscriptionRecord};
use rebate_core::with_metadata;

use crate::config::EngineConfig;
use crate::input;

/// Arguments for dealer-group aggregation
#[derive(Args)]
pub struct SummarizeArgs {
    /// Subscription-history CSV (PARENT_ACCOUNT, EOM_DATE, EOM_VUM, TOTAL_CMRR, PRIMARY_MANUFACTURER)
    #[arg(long)]
    pub input: String,

    /// Keep only records for this month (YYYY-MM)
    #[arg(long)]
    pub month: Option<String>,

    /// Serviced brand counted toward SAM (repeatable; replaces the default list)
    #[arg(long = "brand")]
    pub brands: Vec<String>,

    /// Emit rows with the rebate spreadsheet's column titles
    #[arg(long)]
    pub sheet: bool,

    /// Path to a JSON/YAML engine config
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_summarize(args: SummarizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = EngineConfig::load(args.config.as_deref())?;
    let mut aggregation = config.aggregation();
    if args.month.is_some() {
        aggregation.month_filter = args.month;
    }
    if !args.brands.is_empty() {
        aggregation.serviced_brands = args.brands;
    }

    let records: Vec<RawSubscriptionRecord> = input::table_file::read_csv(&args.input)?;
    let output = summary::summarize_raw_records(&records, &aggregation);

    if args.sheet {
        let rows: Vec<_> = output.result.iter().map(|g| g.to_row()).collect();
        let sheet = with_metadata(
            &output.methodology,
            &output.assumptions,
            output.warnings,
            output.metadata.computation_time_us,
            rows,
        );
        return Ok(serde_json::to_value(sheet)?);
    }
    Ok(serde_json::to_value(output)?)
}
