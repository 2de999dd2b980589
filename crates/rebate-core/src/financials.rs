use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Months per year used to convert between MRR and ARR.
pub const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Unit counts carried through to output rows for display. Never used in
/// rebate math.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitCounts {
    /// Dealer Unit Metric (count of customer stores)
    #[serde(default)]
    pub dum: Decimal,
    /// Vehicle units at end of month
    #[serde(default)]
    pub vum: Decimal,
    #[serde(default)]
    pub tam: Decimal,
    #[serde(default)]
    pub sam: Decimal,
}

/// Per-group figures consumed by the rebate calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupFinancials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// SAM / TAM. May fall outside every configured tier.
    pub penetration_ratio: Rate,
    pub monthly_recurring_revenue: Money,
    pub annual_recurring_revenue: Money,
    #[serde(default)]
    pub unit_counts: UnitCounts,
}

impl GroupFinancials {
    pub fn new(penetration_ratio: Rate, mrr: Money, arr: Money) -> Self {
        GroupFinancials {
            group_name: None,
            penetration_ratio,
            monthly_recurring_revenue: mrr,
            annual_recurring_revenue: arr,
            unit_counts: UnitCounts::default(),
        }
    }

    /// Build from MRR alone; ARR = MRR x 12, saturating at the decimal range.
    pub fn from_mrr(penetration_ratio: Rate, mrr: Money) -> Self {
        Self::new(penetration_ratio, mrr, mrr.saturating_mul(MONTHS_PER_YEAR))
    }

    /// Build from ARR alone; MRR = ARR / 12.
    pub fn from_arr(penetration_ratio: Rate, arr: Money) -> Self {
        Self::new(penetration_ratio, arr / MONTHS_PER_YEAR, arr)
    }

    pub fn with_group_name(mut self, name: impl Into<String>) -> Self {
        self.group_name = Some(name.into());
        self
    }

    pub fn with_unit_counts(mut self, unit_counts: UnitCounts) -> Self {
        self.unit_counts = unit_counts;
        self
    }
}
