use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Instant;
use tracing::warn;

use super::aliases::{CanonicalField, FieldAliases};
use crate::error::RebateError;
use crate::financials::{GroupFinancials, UnitCounts, MONTHS_PER_YEAR};
use crate::types::*;
use crate::RebateResult;

/// One summary row as handed over by a spreadsheet reader: column name to
/// cell value (number or string).
pub type RawRow = BTreeMap<String, Value>;

/// Outcome of reading one canonical field from a row.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    /// No column matched any alias
    Absent,
    Number(Decimal),
    /// Column present but the cell could not be read as a number
    Malformed(String),
}

/// Parse a spreadsheet cell into a decimal.
///
/// Accepts JSON numbers and strings with optional `$`, thousands
/// separators, surrounding whitespace, and a trailing `%` (divided by 100).
/// Null and blank cells read as zero. Returns `None` for anything else.
pub fn parse_cell(value: &Value) -> Option<Decimal> {
    match value {
        Value::Null => Some(Decimal::ZERO),
        Value::Number(n) => parse_decimal_str(&n.to_string()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
                return Some(Decimal::ZERO);
            }
            let (body, percent) = match trimmed.strip_suffix('%') {
                Some(rest) => (rest.trim(), true),
                None => (trimmed, false),
            };
            let cleaned: String = body.chars().filter(|c| *c != '$' && *c != ',').collect();
            let parsed = parse_decimal_str(cleaned.trim())?;
            Some(if percent { parsed / dec!(100) } else { parsed })
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_decimal_str(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn read_cell(row: &RawRow, aliases: &FieldAliases, field: CanonicalField) -> Cell {
    let Some(column) = aliases.resolve_column(field, row.keys().map(String::as_str)) else {
        return Cell::Absent;
    };
    let value = &row[column];
    match parse_cell(value) {
        Some(n) => Cell::Number(n),
        None => Cell::Malformed(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
    }
}

/// Read a group's display name, if the row carries one.
pub fn group_name(row: &RawRow, aliases: &FieldAliases) -> Option<String> {
    let column = aliases.resolve_column(
        CanonicalField::GroupName,
        row.keys().map(String::as_str),
    )?;
    match &row[column] {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Build [`GroupFinancials`] from a raw summary row.
///
/// Never fails: a missing penetration or revenue field, or a cell that is
/// not a number, becomes zero and is reported in `warnings`. When only one
/// of ARR / MRR is present the other is derived (x12 or /12).
pub fn extract_financials(
    row: &RawRow,
    aliases: &FieldAliases,
) -> ComputationOutput<GroupFinancials> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut number = |field: CanonicalField, required: bool| -> Option<Decimal> {
        match read_cell(row, aliases, field) {
            Cell::Number(n) => Some(n),
            Cell::Malformed(raw) => {
                let err = RebateError::MalformedNumber {
                    field: field.to_string(),
                    value: raw,
                };
                warn!(%err, "malformed numeric cell");
                warnings.push(err.to_string());
                Some(Decimal::ZERO)
            }
            Cell::Absent => {
                if required {
                    let err = RebateError::MissingField {
                        field: field.to_string(),
                        aliases: aliases.aliases(field),
                    };
                    warn!(%err, "required field missing");
                    warnings.push(err.to_string());
                }
                None
            }
        }
    };

    let penetration_ratio = number(CanonicalField::Penetration, true).unwrap_or(Decimal::ZERO);

    let arr = number(CanonicalField::Arr, false);
    let mrr = number(CanonicalField::Mrr, false);
    let mut arr_overflowed = false;
    let (mrr, arr) = match (mrr, arr) {
        (Some(m), Some(a)) => (m, a),
        (None, Some(a)) => (a / MONTHS_PER_YEAR, a),
        (Some(m), None) => match m.checked_mul(MONTHS_PER_YEAR) {
            Some(a) => (m, a),
            None => {
                arr_overflowed = true;
                (m, Decimal::ZERO)
            }
        },
        (None, None) => {
            // Report the missing revenue under the ARR aliases.
            number(CanonicalField::Arr, true);
            (Decimal::ZERO, Decimal::ZERO)
        }
    };

    let unit_counts = UnitCounts {
        dum: number(CanonicalField::Dum, false).unwrap_or_default(),
        vum: number(CanonicalField::Vum, false).unwrap_or_default(),
        tam: number(CanonicalField::Tam, false).unwrap_or_default(),
        sam: number(CanonicalField::Sam, false).unwrap_or_default(),
    };

    if arr_overflowed {
        let err = RebateError::Overflow {
            field: CanonicalField::Arr.to_string(),
        };
        warn!(%err, "ARR derived from MRR overflowed");
        warnings.push(err.to_string());
    }

    let financials = GroupFinancials {
        group_name: group_name(row, aliases),
        penetration_ratio,
        monthly_recurring_revenue: mrr,
        annual_recurring_revenue: arr,
        unit_counts,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "columns": row.keys().collect::<Vec<_>>(),
        "mrr_arr_conversion": "ARR = MRR x 12 when only one is present",
    });

    with_metadata(
        "Summary Row Field Extraction",
        &assumptions,
        warnings,
        elapsed,
        financials,
    )
}

// ---------------------------------------------------------------------------
// Group selection
// ---------------------------------------------------------------------------

/// Distinct group names in first-seen order. Rows without a name are skipped.
pub fn group_names(rows: &[RawRow], aliases: &FieldAliases) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in rows.iter().filter_map(|r| group_name(r, aliases)) {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// First row whose group name equals `name` (after trimming).
pub fn find_group<'a>(
    rows: &'a [RawRow],
    name: &str,
    aliases: &FieldAliases,
) -> RebateResult<&'a RawRow> {
    if rows.is_empty() {
        return Err(RebateError::InsufficientData(
            "Summary contains no rows.".into(),
        ));
    }
    let wanted = name.trim();
    rows.iter()
        .find(|r| group_name(r, aliases).as_deref() == Some(wanted))
        .ok_or_else(|| RebateError::InvalidInput {
            field: "group".into(),
            reason: format!("no row for dealer group '{}'", wanted),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_cell_variants() {
        assert_eq!(parse_cell(&json!(1500)), Some(dec!(1500)));
        assert_eq!(parse_cell(&json!(0.923456)), Some(dec!(0.923456)));
        assert_eq!(parse_cell(&json!("$12,000")), Some(dec!(12000)));
        assert_eq!(parse_cell(&json!(" 92% ")), Some(dec!(0.92)));
        assert_eq!(parse_cell(&json!("1.5e3")), Some(dec!(1500)));
        assert_eq!(parse_cell(&json!(null)), Some(Decimal::ZERO));
        assert_eq!(parse_cell(&json!("")), Some(Decimal::ZERO));
        assert_eq!(parse_cell(&json!("n/a")), None);
        assert_eq!(parse_cell(&json!(true)), None);
    }

    #[test]
    fn test_extract_full_row() {
        let r = row(json!({
            "Group Name | Website": "Acme Auto",
            "TAM": 1200,
            "SAM": 1104,
            "DUM": 14,
            "SAM PEN": 0.92,
            "MRR": 10000,
            "Net New ARR": 120000
        }));
        let out = extract_financials(&r, &FieldAliases::default());
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
        let f = out.result;
        assert_eq!(f.group_name.as_deref(), Some("Acme Auto"));
        assert_eq!(f.penetration_ratio, dec!(0.92));
        assert_eq!(f.monthly_recurring_revenue, dec!(10000));
        assert_eq!(f.annual_recurring_revenue, dec!(120000));
        assert_eq!(f.unit_counts.dum, dec!(14));
        assert_eq!(f.unit_counts.vum, dec!(1200));
        assert_eq!(f.unit_counts.sam, dec!(1104));
    }

    #[test]
    fn test_mrr_derived_from_arr() {
        let r = row(json!({ "sam pen": "0.8", "arr": "$60,000" }));
        let f = extract_financials(&r, &FieldAliases::default()).result;
        assert_eq!(f.annual_recurring_revenue, dec!(60000));
        assert_eq!(f.monthly_recurring_revenue, dec!(5000));
    }

    #[test]
    fn test_arr_derived_from_mrr() {
        let r = row(json!({ "SAM PEN": 0.8, "MRR": 5000 }));
        let out = extract_financials(&r, &FieldAliases::default());
        assert!(out.warnings.is_empty());
        assert_eq!(out.result.annual_recurring_revenue, dec!(60000));
    }

    #[test]
    fn test_arr_overflow_from_huge_mrr_warns() {
        let r = row(json!({ "SAM PEN": 0.5, "MRR": "10000000000000000000000000000" }));
        let out = extract_financials(&r, &FieldAliases::default());
        assert_eq!(
            out.result.monthly_recurring_revenue,
            dec!(10000000000000000000000000000)
        );
        assert_eq!(out.result.annual_recurring_revenue, Decimal::ZERO);
        assert_eq!(
            out.warnings,
            vec!["Arithmetic overflow computing arr; treated as 0".to_string()]
        );
    }

    #[test]
    fn test_missing_revenue_warns_and_zeroes() {
        let r = row(json!({ "SAM PEN": 0.8, "Revenue": 5000 }));
        let out = extract_financials(&r, &FieldAliases::default());
        assert_eq!(out.result.monthly_recurring_revenue, Decimal::ZERO);
        assert_eq!(out.result.annual_recurring_revenue, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].starts_with("Missing field: arr"));
        assert!(out.warnings[0].contains("Net New ARR"));
    }

    #[test]
    fn test_missing_penetration_warns() {
        let r = row(json!({ "ARR": 12000 }));
        let out = extract_financials(&r, &FieldAliases::default());
        assert_eq!(out.result.penetration_ratio, Decimal::ZERO);
        assert!(out.warnings[0].starts_with("Missing field: penetration"));
    }

    #[test]
    fn test_malformed_revenue_is_zero() {
        let r = row(json!({ "SAM PEN": 0.95, "ARR": "TBD" }));
        let out = extract_financials(&r, &FieldAliases::default());
        assert_eq!(out.result.annual_recurring_revenue, Decimal::ZERO);
        assert_eq!(
            out.warnings,
            vec!["Malformed number in arr: 'TBD' treated as 0".to_string()]
        );
    }

    #[test]
    fn test_custom_aliases() {
        let mut aliases = FieldAliases::default();
        aliases.set(CanonicalField::Arr, vec!["Annual Revenue".into()]);
        let r = row(json!({ "SAM PEN": 0.5, "Annual Revenue": 24000, "ARR": 1 }));
        let f = extract_financials(&r, &aliases).result;
        assert_eq!(f.annual_recurring_revenue, dec!(24000));
    }

    #[test]
    fn test_find_group_and_names() {
        let rows = vec![
            row(json!({ "Group Name | Website": "Beta", "SAM PEN": 0.1 })),
            row(json!({ "Group Name | Website": "Acme", "SAM PEN": 0.2 })),
            row(json!({ "Group Name | Website": "Beta", "SAM PEN": 0.3 })),
            row(json!({ "Group Name | Website": null, "SAM PEN": 0.4 })),
        ];
        let aliases = FieldAliases::default();
        assert_eq!(group_names(&rows, &aliases), vec!["Beta", "Acme"]);

        let found = find_group(&rows, " Beta ", &aliases).unwrap();
        assert_eq!(found["SAM PEN"], json!(0.1));

        let err = find_group(&rows, "Gamma", &aliases).unwrap_err();
        assert!(matches!(err, RebateError::InvalidInput { .. }));
        assert!(matches!(
            find_group(&[], "Acme", &aliases),
            Err(RebateError::InsufficientData(_))
        ));
    }
}
