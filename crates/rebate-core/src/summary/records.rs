use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::*;

/// Parent account used for records that carry none.
pub const UNASSIGNED_PARENT: &str = "0";

/// Excel serials in this open range are read as dates (roughly 1982-2036).
const EXCEL_SERIAL_RANGE: (i64, i64) = (30_000, 50_000);

/// One subscription-history row exactly as read from the KPI export. Every
/// cell is text; nothing is interpreted yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSubscriptionRecord {
    #[serde(rename = "PARENT_ACCOUNT", default)]
    pub parent_account: Option<String>,
    #[serde(rename = "EOM_DATE", default)]
    pub eom_date: Option<String>,
    #[serde(rename = "EOM_VUM", default)]
    pub eom_vum: Option<String>,
    #[serde(rename = "TOTAL_CMRR", default)]
    pub total_cmrr: Option<String>,
    #[serde(rename = "PRIMARY_MANUFACTURER", default)]
    pub primary_manufacturer: Option<String>,
}

/// A store's end-of-month subscription snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub parent_account: String,
    /// `YYYY-MM-DD` when the export held an Excel serial, otherwise as given
    pub eom_date: String,
    /// Vehicle units at end of month
    pub eom_vum: Decimal,
    /// Contracted MRR across all products
    pub total_cmrr: Money,
    pub primary_manufacturer: Option<String>,
}

impl SubscriptionRecord {
    /// Interpret a raw row. Returns the record and the number of numeric
    /// cells that were not numbers and were read as zero.
    pub fn from_raw(raw: &RawSubscriptionRecord) -> (Self, usize) {
        let mut coerced = 0;
        let mut numeric = |cell: &Option<String>| match coerce_number(cell) {
            Some(n) => n,
            None => {
                coerced += 1;
                Decimal::ZERO
            }
        };
        let eom_vum = numeric(&raw.eom_vum);
        let total_cmrr = numeric(&raw.total_cmrr);

        let record = SubscriptionRecord {
            parent_account: normalize_parent(raw.parent_account.as_deref()),
            eom_date: raw
                .eom_date
                .as_deref()
                .map(normalize_eom_date)
                .unwrap_or_default(),
            eom_vum,
            total_cmrr,
            primary_manufacturer: raw
                .primary_manufacturer
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        };
        (record, coerced)
    }
}

/// Blank and `nan` cells read as zero; `None` means the text is not a number.
fn coerce_number(cell: &Option<String>) -> Option<Decimal> {
    let text = match cell.as_deref().map(str::trim) {
        None | Some("") => return Some(Decimal::ZERO),
        Some(t) if t.eq_ignore_ascii_case("nan") => return Some(Decimal::ZERO),
        Some(t) => t,
    };
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn normalize_parent(parent: Option<&str>) -> String {
    match parent.map(str::trim) {
        None | Some("") => UNASSIGNED_PARENT.to_string(),
        Some(p) if p.eq_ignore_ascii_case("nan") => UNASSIGNED_PARENT.to_string(),
        Some(p) => p.to_string(),
    }
}

/// Convert an Excel serial day number to `YYYY-MM-DD`; other text is
/// returned trimmed but otherwise unchanged.
pub fn normalize_eom_date(value: &str) -> String {
    let trimmed = value.trim();
    let Ok(serial) = trimmed.parse::<i64>() else {
        return trimmed.to_string();
    };
    if serial <= EXCEL_SERIAL_RANGE.0 || serial >= EXCEL_SERIAL_RANGE.1 {
        return trimmed.to_string();
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_days(Days::new(serial as u64)))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Whether `eom_date` falls in `month` (`YYYY-MM`). Matches ISO dates and
/// `M/YYYY` text; a filter not in `YYYY-MM` form is a plain substring test.
pub fn month_matches(eom_date: &str, month: &str) -> bool {
    let month = month.trim();
    if eom_date.contains(month) {
        return true;
    }
    let Some((year, mon)) = month.split_once('-') else {
        return false;
    };
    match mon.parse::<u32>() {
        Ok(m) if year.len() == 4 => eom_date.contains(&format!("{}/{}", m, year)),
        _ => false,
    }
}
