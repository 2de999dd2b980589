use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

use super::records::{month_matches, RawSubscriptionRecord, SubscriptionRecord};
use crate::error::RebateError;
use crate::financials::{GroupFinancials, UnitCounts, MONTHS_PER_YEAR};
use crate::types::*;

/// Decimal places kept on SAM penetration.
const SAM_PEN_DP: u32 = 6;

/// Manufacturers whose stores count toward SAM unless configured otherwise.
pub const DEFAULT_SERVICED_BRANDS: [&str; 15] = [
    "Audi",
    "Ford",
    "Lamborghini",
    "Jaguar",
    "Landrover",
    "Land Rover",
    "Lexus",
    "Lincoln",
    "Toyota",
    "Volkswagen",
    "Volvo",
    "Nissan",
    "Infiniti",
    "Acura",
    "Mercedes",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// `YYYY-MM`; `None` keeps every record
    #[serde(default)]
    pub month_filter: Option<String>,
    #[serde(default = "default_serviced_brands")]
    pub serviced_brands: Vec<String>,
}

fn default_serviced_brands() -> Vec<String> {
    DEFAULT_SERVICED_BRANDS.iter().map(|b| b.to_string()).collect()
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            month_filter: None,
            serviced_brands: default_serviced_brands(),
        }
    }
}

impl AggregationConfig {
    /// Brand names are compared trimmed and case-insensitively, so "lexus"
    /// counts as "Lexus". The spreadsheet export this replaces matched
    /// brand strings exactly.
    fn is_serviced(&self, manufacturer: Option<&str>) -> bool {
        let Some(m) = manufacturer.map(str::trim) else {
            return false;
        };
        self.serviced_brands
            .iter()
            .any(|b| b.trim().eq_ignore_ascii_case(m))
    }
}

/// Penetration summary for one dealer group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group_name: String,
    /// Total addressable market: vehicle units across all stores
    pub tam: Decimal,
    /// Serviceable addressable market: vehicle units at serviced-brand stores
    pub sam: Decimal,
    /// Store count
    pub dum: u64,
    /// Serviced-brand store count
    pub num_sam: u64,
    /// SAM / TAM
    pub sam_pen: Rate,
    pub mrr: Money,
    pub arr: Money,
}

impl GroupSummary {
    /// Financials for the rebate calculator. VUM is reported as TAM.
    pub fn to_financials(&self) -> GroupFinancials {
        GroupFinancials::new(self.sam_pen, self.mrr, self.arr)
            .with_group_name(self.group_name.clone())
            .with_unit_counts(UnitCounts {
                dum: Decimal::from(self.dum),
                vum: self.tam,
                tam: self.tam,
                sam: self.sam,
            })
    }

    /// The row as the rebate spreadsheet lays it out, keyed by column title.
    pub fn to_row(&self) -> BTreeMap<String, Value> {
        let mut row = BTreeMap::new();
        row.insert("Group Name | Website".into(), Value::String(self.group_name.clone()));
        row.insert("TAM".into(), Value::String(self.tam.to_string()));
        row.insert("SAM".into(), Value::String(self.sam.to_string()));
        row.insert("DUM".into(), Value::from(self.dum));
        row.insert("NUM_SAM".into(), Value::from(self.num_sam));
        row.insert("SAM PEN".into(), Value::String(self.sam_pen.to_string()));
        row.insert("MRR".into(), Value::String(self.mrr.to_string()));
        row.insert("Net New ARR".into(), Value::String(self.arr.to_string()));
        row
    }
}

#[derive(Default)]
struct GroupAccumulator {
    tam: Decimal,
    sam: Decimal,
    dum: u64,
    num_sam: u64,
    mrr: Decimal,
    overflowed: bool,
}

impl GroupAccumulator {
    fn add(total: &mut Decimal, value: Decimal, overflowed: &mut bool) {
        match total.checked_add(value) {
            Some(sum) => *total = sum,
            None => *overflowed = true,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Roll store-level subscription records up to one summary per parent
/// account, sorted by group name.
///
/// TAM sums EOM VUM over all stores, SAM over serviced-brand stores.
/// MRR and ARR (MRR x 12) are truncated to whole currency units. SAM
/// penetration is rounded to six places and is zero when TAM is zero.
pub fn summarize_groups(
    records: &[SubscriptionRecord],
    config: &AggregationConfig,
) -> ComputationOutput<Vec<GroupSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut groups: BTreeMap<&str, GroupAccumulator> = BTreeMap::new();
    let mut kept = 0usize;
    for record in records {
        if let Some(month) = &config.month_filter {
            if !month_matches(&record.eom_date, month) {
                continue;
            }
        }
        kept += 1;
        let acc = groups.entry(record.parent_account.as_str()).or_default();
        GroupAccumulator::add(&mut acc.tam, record.eom_vum, &mut acc.overflowed);
        GroupAccumulator::add(&mut acc.mrr, record.total_cmrr, &mut acc.overflowed);
        acc.dum += 1;
        if config.is_serviced(record.primary_manufacturer.as_deref()) {
            GroupAccumulator::add(&mut acc.sam, record.eom_vum, &mut acc.overflowed);
            acc.num_sam += 1;
        }
    }

    if kept == 0 {
        warnings.push(match &config.month_filter {
            Some(m) => format!("No records fall in month {}.", m),
            None => "No subscription records supplied.".to_string(),
        });
    }

    let mut summaries: Vec<GroupSummary> = Vec::with_capacity(groups.len());
    for (name, acc) in groups {
        if acc.overflowed {
            let err = RebateError::Overflow {
                field: format!("totals for group '{}'", name),
            };
            warn!(group = name, %err, "group totals overflowed");
            warnings.push(err.to_string());
            summaries.push(GroupSummary {
                group_name: name.to_string(),
                tam: Decimal::ZERO,
                sam: Decimal::ZERO,
                dum: acc.dum,
                num_sam: acc.num_sam,
                sam_pen: Decimal::ZERO,
                mrr: Decimal::ZERO,
                arr: Decimal::ZERO,
            });
            continue;
        }

        let sam_pen = if acc.tam.is_zero() {
            warn!(group = name, "TAM is zero; SAM penetration set to 0");
            warnings.push(format!("Group '{}' has zero TAM; SAM PEN set to 0.", name));
            Decimal::ZERO
        } else {
            acc.sam
                .checked_div(acc.tam)
                .map(|pen| pen.round_dp(SAM_PEN_DP))
                .unwrap_or_else(|| {
                    let err = RebateError::Overflow {
                        field: format!("SAM PEN for group '{}'", name),
                    };
                    warnings.push(err.to_string());
                    Decimal::ZERO
                })
        };
        let arr = acc.mrr.checked_mul(MONTHS_PER_YEAR).unwrap_or_else(|| {
            let err = RebateError::Overflow {
                field: format!("ARR for group '{}'", name),
            };
            warn!(group = name, %err, "ARR overflowed");
            warnings.push(err.to_string());
            Decimal::ZERO
        });
        summaries.push(GroupSummary {
            group_name: name.to_string(),
            tam: acc.tam.trunc(),
            sam: acc.sam.trunc(),
            dum: acc.dum,
            num_sam: acc.num_sam,
            sam_pen,
            mrr: acc.mrr.trunc(),
            arr: arr.trunc(),
        });
    }

    info!(
        records = records.len(),
        kept,
        groups = summaries.len(),
        "summarized dealer groups"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "month_filter": config.month_filter,
        "serviced_brands": config.serviced_brands,
        "records_in": records.len(),
        "records_kept": kept,
        "arr_convention": "ARR = MRR x 12",
    });

    with_metadata(
        "Dealer Group TAM/SAM/DUM Aggregation",
        &assumptions,
        warnings,
        elapsed,
        summaries,
    )
}

/// Interpret raw export rows, then [`summarize_groups`]. Cells that were
/// not numbers are counted in a warning.
pub fn summarize_raw_records(
    raw: &[RawSubscriptionRecord],
    config: &AggregationConfig,
) -> ComputationOutput<Vec<GroupSummary>> {
    let mut coerced_total = 0usize;
    let records: Vec<SubscriptionRecord> = raw
        .iter()
        .map(|r| {
            let (record, coerced) = SubscriptionRecord::from_raw(r);
            coerced_total += coerced;
            record
        })
        .collect();

    let mut output = summarize_groups(&records, config);
    if coerced_total > 0 {
        output.warnings.insert(
            0,
            format!(
                "{} EOM_VUM/TOTAL_CMRR cells were not numbers and were read as 0.",
                coerced_total
            ),
        );
    }
    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
