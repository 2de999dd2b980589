use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use super::resolver::resolve_position;
use super::table::TierTable;
use crate::error::RebateError;
use crate::financials::GroupFinancials;
use crate::types::*;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Rebate figures for one tier, as if the group qualified for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierResult {
    pub tier_name: String,
    pub rebate_rate: Rate,
    /// The group's penetration ratio resolves to this tier
    pub is_current: bool,
    /// Net figures of this tier were used as the gain/loss reference
    pub is_baseline: bool,
    pub rebate_monthly: Money,
    pub rebate_annual: Money,
    pub net_monthly: Money,
    pub net_annual: Money,
    /// Net monthly minus the baseline tier's net monthly
    pub gain_loss_monthly: Money,
    /// Net annual minus the baseline tier's net annual
    pub gain_loss_annual: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebateTableOutput {
    pub penetration_ratio: Rate,
    pub monthly_recurring_revenue: Money,
    pub annual_recurring_revenue: Money,
    /// Name of the matched tier; `None` when no tier covers the ratio
    pub current_tier: Option<String>,
    /// Zero when no tier matched
    pub current_rebate_rate: Rate,
    pub current_rebate_monthly: Money,
    pub current_rebate_annual: Money,
    /// Tier whose net values the gain/loss columns are measured against
    pub baseline_tier: Option<String>,
    /// One row per tier, in table order
    pub rows: Vec<TierResult>,
}

// ---------------------------------------------------------------------------
// Main calculation
// ---------------------------------------------------------------------------

/// Compute rebate, net, and gain/loss figures for every tier in `table`
/// and mark the tier the group currently qualifies for.
///
/// Baseline: the first tier is the running baseline until the first tier
/// flagged `is_baseline` is reached, which then replaces it. Each row's
/// gain/loss is measured against the baseline held at the time the row is
/// processed. No rounding is applied; formatting belongs to the report.
pub fn compute_rebate_table(
    table: &TierTable,
    financials: &GroupFinancials,
) -> ComputationOutput<RebateTableOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mrr = financials.monthly_recurring_revenue;
    let arr = financials.annual_recurring_revenue;
    let ratio = financials.penetration_ratio;

    if table.is_empty() {
        warnings.push("Tier table is empty; no rebate can apply.".into());
    }
    if mrr < Decimal::ZERO || arr < Decimal::ZERO {
        warnings.push(format!(
            "Negative revenue supplied (MRR {}, ARR {}); figures computed as given.",
            mrr, arr
        ));
    }

    let current = resolve_position(table.tiers(), ratio);
    if current.is_none() && !table.is_empty() {
        warn!(ratio = %ratio, "penetration ratio matched no rebate tier");
        warnings.push(format!(
            "Penetration ratio {} falls outside every tier; no rebate applies.",
            ratio
        ));
    }

    // (tier index, net monthly, net annual)
    let mut baseline: Option<(usize, Money, Money)> = None;
    let mut explicit_baseline_seen = false;
    let mut rows: Vec<TierResult> = Vec::with_capacity(table.len());

    for (idx, tier) in table.tiers().iter().enumerate() {
        let (rebate_monthly, net_monthly) =
            split_revenue(mrr, tier.rebate_rate, &tier.name, "monthly", &mut warnings);
        let (rebate_annual, net_annual) =
            split_revenue(arr, tier.rebate_rate, &tier.name, "annual", &mut warnings);

        if baseline.is_none() || (tier.is_baseline && !explicit_baseline_seen) {
            baseline = Some((idx, net_monthly, net_annual));
            explicit_baseline_seen |= tier.is_baseline;
        }
        let (_, base_monthly, base_annual) = baseline.unwrap_or((idx, net_monthly, net_annual));
        let gain_loss_monthly =
            gain_loss(net_monthly, base_monthly, &tier.name, "monthly", &mut warnings);
        let gain_loss_annual =
            gain_loss(net_annual, base_annual, &tier.name, "annual", &mut warnings);

        rows.push(TierResult {
            tier_name: tier.name.clone(),
            rebate_rate: tier.rebate_rate,
            is_current: current == Some(idx),
            is_baseline: false,
            rebate_monthly,
            rebate_annual,
            net_monthly,
            net_annual,
            gain_loss_monthly,
            gain_loss_annual,
        });
    }

    // The final baseline is the one reported; earlier rows may have been
    // measured against the running first-tier baseline.
    let baseline_tier = baseline.map(|(idx, _, _)| {
        rows[idx].is_baseline = true;
        rows[idx].tier_name.clone()
    });

    let (current_rebate_rate, current_rebate_monthly, current_rebate_annual) = current
        .map(|idx| &rows[idx])
        .map(|r| (r.rebate_rate, r.rebate_monthly, r.rebate_annual))
        .unwrap_or((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO));

    let output = RebateTableOutput {
        penetration_ratio: ratio,
        monthly_recurring_revenue: mrr,
        annual_recurring_revenue: arr,
        current_tier: current.map(|idx| rows[idx].tier_name.clone()),
        current_rebate_rate,
        current_rebate_monthly,
        current_rebate_annual,
        baseline_tier,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "tier_count": table.len(),
        "resolution": "first tier in table order with min <= ratio <= max",
        "gain_loss_reference": output.baseline_tier,
    });

    with_metadata(
        "Penetration-Tier Rebate Calculation",
        &assumptions,
        warnings,
        elapsed,
        output,
    )
}

/// Rebate and net for one revenue figure. When the product leaves the
/// decimal range the rebate is 0 and the net is the full revenue, so
/// net + rebate still equals revenue.
fn split_revenue(
    revenue: Money,
    rate: Rate,
    tier: &str,
    period: &str,
    warnings: &mut Vec<String>,
) -> (Money, Money) {
    let split = revenue
        .checked_mul(rate)
        .and_then(|rebate| revenue.checked_sub(rebate).map(|net| (rebate, net)));
    split.unwrap_or_else(|| {
        overflow_warning(format!("{} rebate ({})", tier, period), warnings);
        (Decimal::ZERO, revenue)
    })
}

fn gain_loss(
    net: Money,
    base: Money,
    tier: &str,
    period: &str,
    warnings: &mut Vec<String>,
) -> Money {
    net.checked_sub(base).unwrap_or_else(|| {
        overflow_warning(format!("{} gain/loss ({})", tier, period), warnings);
        Decimal::ZERO
    })
}

fn overflow_warning(field: String, warnings: &mut Vec<String>) {
    let err = RebateError::Overflow { field };
    warn!(%err, "rebate figure overflowed");
    warnings.push(err.to_string());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::table::PercentageTier;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_financials() -> GroupFinancials {
        GroupFinancials::new(dec!(0.92), dec!(10_000), dec!(120_000))
    }

    #[test]
    fn test_default_table_tier2_scenario() {
        let out = compute_rebate_table(&TierTable::default(), &sample_financials()).result;

        assert_eq!(out.current_tier.as_deref(), Some("Tier 2"));
        assert_eq!(out.current_rebate_rate, dec!(0.15));
        assert_eq!(out.current_rebate_monthly, dec!(1500));
        assert_eq!(out.current_rebate_annual, dec!(18000));

        let tier2 = &out.rows[2];
        assert!(tier2.is_current);
        assert_eq!(tier2.net_monthly, dec!(8500));
        assert_eq!(tier2.net_annual, dec!(102000));
        assert_eq!(tier2.gain_loss_monthly, dec!(-1500));
        assert_eq!(tier2.gain_loss_annual, dec!(-18000));
    }

    #[test]
    fn test_default_table_every_row() {
        let out = compute_rebate_table(&TierTable::default(), &sample_financials()).result;
        let below = &out.rows[0];
        assert!(below.is_baseline);
        assert_eq!(below.rebate_monthly, dec!(0));
        assert_eq!(below.net_monthly, dec!(10000));
        assert_eq!(below.gain_loss_monthly, dec!(0));

        let tier1 = &out.rows[1];
        assert!(!tier1.is_current);
        assert_eq!(tier1.rebate_monthly, dec!(1000));
        assert_eq!(tier1.rebate_annual, dec!(12000));
        assert_eq!(tier1.gain_loss_monthly, dec!(-1000));
        assert_eq!(tier1.gain_loss_annual, dec!(-12000));
        assert_eq!(out.baseline_tier.as_deref(), Some("Below 75%"));
    }

    #[test]
    fn test_no_match_defaults_rebate_to_zero() {
        let table = TierTable::from_tiers(vec![PercentageTier::new(
            "Low",
            dec!(0),
            dec!(0.5),
            dec!(0.05),
        )]);
        let output = compute_rebate_table(&table, &sample_financials());
        let out = &output.result;
        assert!(out.current_tier.is_none());
        assert_eq!(out.current_rebate_rate, Decimal::ZERO);
        assert_eq!(out.current_rebate_monthly, Decimal::ZERO);
        assert!(out.rows.iter().all(|r| !r.is_current));
        // The row itself still shows what the tier would pay
        assert_eq!(out.rows[0].rebate_monthly, dec!(500));
        assert!(output.warnings.iter().any(|w| w.contains("outside every tier")));
    }

    #[test]
    fn test_zero_revenue_is_all_zero() {
        let financials = GroupFinancials::new(dec!(0.8), Decimal::ZERO, Decimal::ZERO);
        let out = compute_rebate_table(&TierTable::default(), &financials).result;
        for row in &out.rows {
            assert_eq!(row.rebate_monthly, Decimal::ZERO);
            assert_eq!(row.rebate_annual, Decimal::ZERO);
            assert_eq!(row.net_monthly, Decimal::ZERO);
            assert_eq!(row.net_annual, Decimal::ZERO);
            assert_eq!(row.gain_loss_monthly, Decimal::ZERO);
            assert_eq!(row.gain_loss_annual, Decimal::ZERO);
        }
        assert_eq!(out.current_tier.as_deref(), Some("Tier 1"));
    }

    #[test]
    fn test_first_tier_is_baseline_without_flag() {
        let table = TierTable::from_tiers(vec![
            PercentageTier::new("Entry", dec!(0), dec!(0.5), dec!(0.02)),
            PercentageTier::new("Top", dec!(0.51), dec!(1), dec!(0.10)),
        ]);
        let out = compute_rebate_table(&table, &sample_financials()).result;
        assert_eq!(out.baseline_tier.as_deref(), Some("Entry"));
        assert_eq!(out.rows[0].gain_loss_monthly, dec!(0));
        // 9000 - 9800
        assert_eq!(out.rows[1].gain_loss_monthly, dec!(-800));
    }

    #[test]
    fn test_flagged_baseline_later_in_table() {
        let table = TierTable::from_tiers(vec![
            PercentageTier::new("Promo", dec!(0), dec!(0.3), dec!(0.05)),
            PercentageTier::new("Floor", dec!(0.31), dec!(0.6), dec!(0)).baseline(),
            PercentageTier::new("Top", dec!(0.61), dec!(1), dec!(0.10)),
        ]);
        let out = compute_rebate_table(&table, &sample_financials()).result;

        // Promo is measured against itself (running baseline)
        assert_eq!(out.rows[0].gain_loss_monthly, dec!(0));
        // Floor replaces the running baseline
        assert_eq!(out.rows[1].gain_loss_monthly, dec!(0));
        // Top: 9000 - 10000
        assert_eq!(out.rows[2].gain_loss_monthly, dec!(-1000));
        assert_eq!(out.rows[2].gain_loss_annual, dec!(-12000));

        assert_eq!(out.baseline_tier.as_deref(), Some("Floor"));
        let flags: Vec<bool> = out.rows.iter().map(|r| r.is_baseline).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn test_renamed_floor_tier_still_baseline() {
        let mut table = TierTable::default();
        let mut floor = table.remove_tier("Below 75%").unwrap();
        floor.name = "Under target".into();
        let mut tiers = vec![floor];
        tiers.extend(table.tiers().iter().cloned());
        let table = TierTable::from_tiers(tiers);

        let out = compute_rebate_table(&table, &sample_financials()).result;
        assert_eq!(out.baseline_tier.as_deref(), Some("Under target"));
        assert_eq!(out.rows[2].gain_loss_monthly, dec!(-1500));
    }

    #[test]
    fn test_empty_table_warns() {
        let output = compute_rebate_table(&TierTable::empty(), &sample_financials());
        assert!(output.result.rows.is_empty());
        assert!(output.result.baseline_tier.is_none());
        assert!(output.warnings.iter().any(|w| w.contains("empty")));
    }

    #[test]
    fn test_oversized_rate_does_not_overflow() {
        let mut table = TierTable::default();
        table.set_tier("Tier 2", dec!(0.90), dec!(1.00), dec!(1000));
        let half_max = Decimal::MAX / dec!(2);
        let financials = GroupFinancials::new(dec!(0.95), half_max, half_max);

        let output = compute_rebate_table(&table, &financials);
        let out = &output.result;
        assert_eq!(out.current_tier.as_deref(), Some("Tier 2"));

        let tier2 = &out.rows[2];
        assert_eq!(tier2.rebate_rate, dec!(10));
        assert_eq!(tier2.rebate_monthly, Decimal::ZERO);
        assert_eq!(tier2.net_monthly, half_max);
        assert_eq!(tier2.rebate_annual, Decimal::ZERO);
        assert_eq!(tier2.net_annual, half_max);
        assert_eq!(out.current_rebate_monthly, Decimal::ZERO);
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("overflow") && w.contains("Tier 2 rebate (monthly)")));

        // Tiers that fit in range are still computed exactly
        assert_eq!(out.rows[1].rebate_monthly, half_max * dec!(0.10));
    }

    #[test]
    fn test_duplicate_names_mark_one_current_row() {
        let table: TierTable = serde_json::from_value(serde_json::json!([
            {"name": "A", "min": "0", "max": "0.5", "rebate_rate": "0.05"},
            {"name": "A", "min": "0.5", "max": "1", "rebate_rate": "0.10"}
        ]))
        .unwrap();
        let financials = GroupFinancials::new(dec!(0.5), dec!(1000), dec!(12000));
        let out = compute_rebate_table(&table, &financials).result;

        assert_eq!(out.rows.iter().filter(|r| r.is_current).count(), 1);
        assert_eq!(out.current_tier.as_deref(), Some("A"));
    }

    #[test]
    fn test_envelope_metadata() {
        let output = compute_rebate_table(&TierTable::default(), &sample_financials());
        assert_eq!(output.methodology, "Penetration-Tier Rebate Calculation");
        assert_eq!(output.assumptions["tier_count"], 3);
        assert!(output.warnings.is_empty());
    }
}
