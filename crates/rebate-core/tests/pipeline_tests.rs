#![cfg(all(feature = "ingest", feature = "summary", feature = "report"))]

use pretty_assertions::assert_eq;
use rebate_core::ingest::{extract_financials, find_group, FieldAliases, RawRow};
use rebate_core::report::build_report;
use rebate_core::summary::{summarize_raw_records, AggregationConfig, RawSubscriptionRecord};
use rebate_core::tiers::{compute_rebate_table, TierTable};
use rust_decimal_macros::dec;

fn raw(parent: &str, date: &str, brand: &str, vum: &str, cmrr: &str) -> RawSubscriptionRecord {
    RawSubscriptionRecord {
        parent_account: Some(parent.into()),
        eom_date: Some(date.into()),
        eom_vum: Some(vum.into()),
        total_cmrr: Some(cmrr.into()),
        primary_manufacturer: Some(brand.into()),
    }
}

#[test]
fn test_records_to_report() {
    let records = vec![
        raw("Acme Auto", "45808", "Ford", "460", "4000"),
        raw("Acme Auto", "2025-05-31", "Toyota", "460", "4000"),
        raw("Acme Auto", "2025-05-31", "Kia", "80", "2000"),
        raw("Acme Auto", "2025-04-30", "Kia", "5000", "1"),
        raw("Other", "2025-05-31", "Kia", "10", "10"),
    ];
    let config = AggregationConfig {
        month_filter: Some("2025-05".into()),
        ..Default::default()
    };
    let summary = summarize_raw_records(&records, &config);
    assert!(summary.warnings.is_empty(), "{:?}", summary.warnings);

    // Round-trip through the spreadsheet layout, as the dashboard does
    let rows: Vec<RawRow> = summary.result.iter().map(|g| g.to_row()).collect();
    let aliases = FieldAliases::default();
    let row = find_group(&rows, "Acme Auto", &aliases).unwrap();
    let financials = extract_financials(row, &aliases);
    assert!(financials.warnings.is_empty(), "{:?}", financials.warnings);
    let financials = financials.result;

    assert_eq!(financials.penetration_ratio, dec!(0.92));
    assert_eq!(financials.monthly_recurring_revenue, dec!(10000));
    assert_eq!(financials.annual_recurring_revenue, dec!(120000));

    let table = compute_rebate_table(&TierTable::default(), &financials).result;
    let report = build_report(&financials, &table);
    assert_eq!(
        report.headline,
        "Calculated Rebate for Acme Auto: 15.00% (Tier: Tier 2)"
    );
    assert_eq!(report.rows[2].arr_gain_loss, "$-18,000");
    assert_eq!(report.rows[2].dum, "3");
    assert_eq!(report.rows[2].vum, "1000");
}

#[test]
fn test_row_without_revenue_still_renders() {
    let row: RawRow = serde_json::from_value(serde_json::json!({
        "Group Name | Website": "Sparse Motors",
        "SAM PEN": "0.8",
        "Revenue": "n/a"
    }))
    .unwrap();
    let extracted = extract_financials(&row, &FieldAliases::default());
    assert_eq!(extracted.warnings.len(), 1);

    let table = compute_rebate_table(&TierTable::default(), &extracted.result).result;
    let report = build_report(&extracted.result, &table);
    assert_eq!(report.current_tier_label, "Tier 1");
    assert!(report.rows.iter().all(|r| r.rebate_monthly == "$0"));
}
