use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::info;

use rebate_core::ingest::{self, FieldAliases, RawRow};
use rebate_core::report;
use rebate_core::tiers::compute_rebate_table;
use rebate_core::{GroupFinancials, RebateError};

use crate::config::EngineConfig;
use crate::input;

/// Arguments for the rebate tier calculation
#[derive(Args)]
pub struct CalculateArgs {
    /// Summary file (CSV or JSON) with one row per dealer group
    #[arg(long)]
    pub input: Option<String>,

    /// Dealer group to select from the summary
    #[arg(long)]
    pub group: Option<String>,

    /// SAM penetration ratio (e.g. 0.92), used when no summary is supplied
    #[arg(long)]
    pub sam_pen: Option<Decimal>,

    /// Monthly recurring revenue
    #[arg(long)]
    pub mrr: Option<Decimal>,

    /// Annual recurring revenue
    #[arg(long)]
    pub arr: Option<Decimal>,

    /// JSON/YAML list of tiers (name, min, max, rebate_pct, baseline)
    #[arg(long)]
    pub tiers: Option<String>,

    /// Path to a JSON/YAML engine config
    #[arg(long)]
    pub config: Option<String>,

    /// Emit display rows (formatted dollars, current-tier label)
    #[arg(long)]
    pub report: bool,
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = EngineConfig::load(args.config.as_deref())?;
    let aliases = config.aliases();
    let table = config.tier_table(args.tiers.as_deref())?;

    let rows: Option<Vec<RawRow>> = if let Some(ref path) = args.input {
        Some(input::table_file::read_rows(path)?)
    } else {
        input::stdin::read_stdin_rows()?
    };

    let (financials, mut warnings) = match rows {
        Some(rows) => {
            let row = select_row(&rows, args.group.as_deref(), &aliases)?;
            let extracted = ingest::extract_financials(row, &aliases);
            (extracted.result, extracted.warnings)
        }
        None => (financials_from_flags(&args)?, Vec::new()),
    };

    info!(
        group = financials.group_name.as_deref().unwrap_or("-"),
        ratio = %financials.penetration_ratio,
        "calculating rebate table"
    );

    let mut output = compute_rebate_table(&table, &financials);
    warnings.append(&mut output.warnings);
    output.warnings = warnings;

    if args.report {
        let rendered = report::build_report(&financials, &output.result);
        let envelope = rebate_core::with_metadata(
            &output.methodology,
            &output.assumptions,
            output.warnings,
            output.metadata.computation_time_us,
            rendered,
        );
        return Ok(serde_json::to_value(envelope)?);
    }
    Ok(serde_json::to_value(output)?)
}

/// Pick the group's row. A single-row summary needs no `--group`.
fn select_row<'a>(
    rows: &'a [RawRow],
    group: Option<&str>,
    aliases: &FieldAliases,
) -> Result<&'a RawRow, RebateError> {
    match group {
        Some(name) => ingest::find_group(rows, name, aliases),
        None if rows.len() == 1 => Ok(&rows[0]),
        None => Err(RebateError::InvalidInput {
            field: "group".into(),
            reason: format!(
                "{} rows in summary; choose one with --group ({})",
                rows.len(),
                ingest::group_names(rows, aliases).join(", ")
            ),
        }),
    }
}

fn financials_from_flags(args: &CalculateArgs) -> Result<GroupFinancials, Box<dyn std::error::Error>> {
    let ratio = args
        .sam_pen
        .ok_or("--sam-pen is required (or provide --input)")?;
    let financials = match (args.mrr, args.arr) {
        (Some(mrr), Some(arr)) => GroupFinancials::new(ratio, mrr, arr),
        (Some(mrr), None) => GroupFinancials::from_mrr(ratio, mrr),
        (None, Some(arr)) => GroupFinancials::from_arr(ratio, arr),
        (None, None) => return Err("--mrr or --arr is required (or provide --input)".into()),
    };
    Ok(match &args.group {
        Some(name) => financials.with_group_name(name.clone()),
        None => financials,
    })
}
