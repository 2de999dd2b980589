use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use rebate_core::ingest::{FieldAliases, RawRow};
use rebate_core::summary::{AggregationConfig, RawSubscriptionRecord};
use rebate_core::tiers::{TierSpec, TierTable, DEFAULT_GRANULARITY};
use rebate_core::GroupFinancials;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct CalculationRequest {
    tiers: Vec<TierSpec>,
    financials: GroupFinancials,
}

#[derive(Deserialize)]
struct ResolveRequest {
    tiers: Vec<TierSpec>,
    penetration_ratio: Decimal,
}

#[derive(Deserialize)]
struct ValidationRequest {
    tiers: Vec<TierSpec>,
    #[serde(default)]
    granularity: Option<Decimal>,
}

#[derive(Deserialize)]
struct ExtractionRequest {
    row: RawRow,
    #[serde(default)]
    aliases: FieldAliases,
}

#[derive(Deserialize)]
struct AggregationRequest {
    records: Vec<RawSubscriptionRecord>,
    #[serde(default)]
    config: AggregationConfig,
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

#[napi]
pub fn default_tier_table() -> NapiResult<String> {
    serde_json::to_string(&TierTable::default().to_specs()).map_err(to_napi_error)
}

#[napi]
pub fn resolve_tier(input_json: String) -> NapiResult<String> {
    let input: ResolveRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let table = TierTable::from_specs(&input.tiers);
    let tier = rebate_core::tiers::resolve(table.tiers(), input.penetration_ratio);
    serde_json::to_string(&tier).map_err(to_napi_error)
}

#[napi]
pub fn validate_tier_table(input_json: String) -> NapiResult<String> {
    let input: ValidationRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let table = TierTable::from_specs(&input.tiers);
    let report = rebate_core::tiers::validate_tiers(
        &table,
        input.granularity.unwrap_or(DEFAULT_GRANULARITY),
    );
    serde_json::to_string(&report).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rebate calculation
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_rebate_table(input_json: String) -> NapiResult<String> {
    let input: CalculationRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let table = TierTable::from_specs(&input.tiers);
    let output = rebate_core::tiers::compute_rebate_table(&table, &input.financials);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_rebate_report(input_json: String) -> NapiResult<String> {
    let input: CalculationRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let table = TierTable::from_specs(&input.tiers);
    let output = rebate_core::tiers::compute_rebate_table(&table, &input.financials);
    let report = rebate_core::report::build_report(&input.financials, &output.result);
    serde_json::to_string(&report).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Ingestion / aggregation
// ---------------------------------------------------------------------------

#[napi]
pub fn extract_group_financials(input_json: String) -> NapiResult<String> {
    let input: ExtractionRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = rebate_core::ingest::extract_financials(&input.row, &input.aliases);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn summarize_dealer_groups(input_json: String) -> NapiResult<String> {
    let input: AggregationRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = rebate_core::summary::summarize_raw_records(&input.records, &input.config);
    serde_json::to_string(&output).map_err(to_napi_error)
}
