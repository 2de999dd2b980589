use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RebateError;
use crate::types::*;
use crate::RebateResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A penetration-ratio bracket mapped to a rebate rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentageTier {
    pub name: String,
    /// Inclusive lower bound (ratio)
    pub min: Rate,
    /// Inclusive upper bound (ratio)
    pub max: Rate,
    /// Rebate as a fraction of revenue (0.10 = 10%)
    pub rebate_rate: Rate,
    /// Floor tier that gain/loss is measured against
    #[serde(default)]
    pub is_baseline: bool,
}

impl PercentageTier {
    pub fn new(name: impl Into<String>, min: Rate, max: Rate, rebate_rate: Rate) -> Self {
        PercentageTier {
            name: name.into(),
            min,
            max,
            rebate_rate,
            is_baseline: false,
        }
    }

    pub fn baseline(mut self) -> Self {
        self.is_baseline = true;
        self
    }

    /// Inclusive on both ends.
    pub fn contains(&self, ratio: Rate) -> bool {
        self.min <= ratio && ratio <= self.max
    }
}

/// Tier entry as written in a config file or entered in a form. The rebate
/// is a human percentage (10.0 = 10%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSpec {
    pub name: String,
    pub min: Rate,
    pub max: Rate,
    pub rebate_pct: Decimal,
    #[serde(default)]
    pub baseline: bool,
}

/// Ordered, user-editable set of rebate tiers. Insertion order drives
/// resolution and baseline detection. Names are unique; a deserialized list
/// with a repeated name keeps the later entry at the earlier position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PercentageTier>", into = "Vec<PercentageTier>")]
pub struct TierTable {
    tiers: Vec<PercentageTier>,
}

// ---------------------------------------------------------------------------
// Construction / editing
// ---------------------------------------------------------------------------

impl Default for TierTable {
    /// `Below 75%` 0%, `Tier 1` 10%, `Tier 2` 15%.
    fn default() -> Self {
        TierTable {
            tiers: vec![
                PercentageTier::new("Below 75%", dec!(0.00), dec!(0.74), dec!(0.00)).baseline(),
                PercentageTier::new("Tier 1", dec!(0.75), dec!(0.89), dec!(0.10)),
                PercentageTier::new("Tier 2", dec!(0.90), dec!(1.00), dec!(0.15)),
            ],
        }
    }
}

impl From<Vec<PercentageTier>> for TierTable {
    fn from(tiers: Vec<PercentageTier>) -> Self {
        TierTable::from_tiers(tiers)
    }
}

impl From<TierTable> for Vec<PercentageTier> {
    fn from(table: TierTable) -> Self {
        table.tiers
    }
}

impl TierTable {
    /// An empty table. Every ratio resolves to no tier.
    pub fn empty() -> Self {
        TierTable { tiers: Vec::new() }
    }

    pub fn from_tiers(tiers: Vec<PercentageTier>) -> Self {
        let mut table = TierTable::empty();
        for tier in tiers {
            table.upsert(tier);
        }
        table
    }

    /// Build from config entries. Later entries with a repeated name replace
    /// earlier ones in place.
    pub fn from_specs(specs: &[TierSpec]) -> Self {
        let mut table = TierTable::empty();
        for spec in specs {
            table.set_tier(&spec.name, spec.min, spec.max, spec.rebate_pct);
            if spec.baseline {
                if let Some(t) = table.tiers.iter_mut().find(|t| t.name == spec.name) {
                    t.is_baseline = true;
                }
            }
        }
        table
    }

    /// Insert or replace a tier by name. `rebate_pct` is a percentage
    /// (10.0 = 10%) and is stored as a ratio. Bounds are not checked here;
    /// see [`super::validation::validate_tiers`].
    pub fn set_tier(&mut self, name: &str, min: Rate, max: Rate, rebate_pct: Decimal) {
        let rebate_rate = rebate_pct / dec!(100);
        match self.tiers.iter_mut().find(|t| t.name == name) {
            Some(existing) => {
                existing.min = min;
                existing.max = max;
                existing.rebate_rate = rebate_rate;
            }
            None => self
                .tiers
                .push(PercentageTier::new(name, min, max, rebate_rate)),
        }
    }

    /// Mark `name` as the only baseline tier.
    pub fn set_baseline(&mut self, name: &str) -> RebateResult<()> {
        if !self.tiers.iter().any(|t| t.name == name) {
            return Err(RebateError::UnknownTier(name.to_string()));
        }
        for tier in &mut self.tiers {
            tier.is_baseline = tier.name == name;
        }
        Ok(())
    }

    pub fn remove_tier(&mut self, name: &str) -> Option<PercentageTier> {
        let idx = self.tiers.iter().position(|t| t.name == name)?;
        Some(self.tiers.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&PercentageTier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    pub fn tiers(&self) -> &[PercentageTier] {
        &self.tiers
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Specs that rebuild this table via [`TierTable::from_specs`].
    pub fn to_specs(&self) -> Vec<TierSpec> {
        self.tiers
            .iter()
            .map(|t| TierSpec {
                name: t.name.clone(),
                min: t.min,
                max: t.max,
                rebate_pct: t.rebate_rate.saturating_mul(dec!(100)),
                baseline: t.is_baseline,
            })
            .collect()
    }

    fn upsert(&mut self, tier: PercentageTier) {
        match self.tiers.iter_mut().find(|t| t.name == tier.name) {
            Some(existing) => *existing = tier,
            None => self.tiers.push(tier),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
