use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::financials::GroupFinancials;
use crate::tiers::calculator::{RebateTableOutput, TierResult};
use crate::types::*;

/// Label shown when the penetration ratio matched no tier.
pub const NO_TIER_LABEL: &str = "N/A";

/// One display row of the rebate calculator table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebateReportRow {
    #[serde(rename = "Tier")]
    pub tier: String,
    #[serde(rename = "DUM")]
    pub dum: String,
    #[serde(rename = "VUM (EoM)")]
    pub vum: String,
    #[serde(rename = "MRR")]
    pub mrr: String,
    #[serde(rename = "ARR")]
    pub arr: String,
    #[serde(rename = "Rebate $ (Mo.)")]
    pub rebate_monthly: String,
    #[serde(rename = "Rebate $ (Yr.)")]
    pub rebate_annual: String,
    #[serde(rename = "MRR Net of Rebate")]
    pub mrr_net: String,
    #[serde(rename = "ARR Net of Rebate")]
    pub arr_net: String,
    #[serde(rename = "MRR Net Gain/Loss")]
    pub mrr_gain_loss: String,
    #[serde(rename = "ARR Net Gain/Loss")]
    pub arr_gain_loss: String,
    #[serde(rename = "Current")]
    pub is_current: bool,
}

/// Everything the presentation layer needs to render one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebateReport {
    pub group_name: Option<String>,
    pub headline: String,
    pub current_tier_label: String,
    pub current_rebate_pct: String,
    pub penetration_pct: String,
    pub rows: Vec<RebateReportRow>,
}

/// Format a currency amount as whole dollars with thousands separators,
/// e.g. `$1,500` and `$-1,500`. Halves round to even.
pub fn format_currency(amount: Money) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("${}{}", sign, group_thousands(&rounded.abs().trunc().to_string()))
}

/// Format a ratio as a percentage with two decimals, e.g. `15.00%`.
pub fn format_percent(rate: Rate) -> String {
    let pct = rate
        .saturating_mul(dec!(100))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    format!("{:.2}%", pct)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn format_count(value: Decimal) -> String {
    value.trunc().to_string()
}

/// Turn a computed rebate table into display rows and a headline.
pub fn build_report(financials: &GroupFinancials, table: &RebateTableOutput) -> RebateReport {
    let label = table
        .current_tier
        .clone()
        .unwrap_or_else(|| NO_TIER_LABEL.to_string());
    let rebate_pct = format_percent(table.current_rebate_rate);
    let group = financials.group_name.as_deref().unwrap_or("selected group");

    let rows = table
        .rows
        .iter()
        .map(|r| report_row(financials, table, r))
        .collect();

    RebateReport {
        group_name: financials.group_name.clone(),
        headline: format!("Calculated Rebate for {}: {} (Tier: {})", group, rebate_pct, label),
        current_tier_label: label,
        current_rebate_pct: rebate_pct,
        penetration_pct: format_percent(table.penetration_ratio),
        rows,
    }
}

fn report_row(
    financials: &GroupFinancials,
    table: &RebateTableOutput,
    result: &TierResult,
) -> RebateReportRow {
    RebateReportRow {
        tier: result.tier_name.clone(),
        dum: format_count(financials.unit_counts.dum),
        vum: format_count(financials.unit_counts.vum),
        mrr: format_currency(table.monthly_recurring_revenue),
        arr: format_currency(table.annual_recurring_revenue),
        rebate_monthly: format_currency(result.rebate_monthly),
        rebate_annual: format_currency(result.rebate_annual),
        mrr_net: format_currency(result.net_monthly),
        arr_net: format_currency(result.net_annual),
        mrr_gain_loss: format_currency(result.gain_loss_monthly),
        arr_gain_loss: format_currency(result.gain_loss_annual),
        is_current: result.is_current,
    }
}
