use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::table::{PercentageTier, TierTable};
use crate::types::*;

/// Default spacing treated as contiguous between one tier's `max` and the
/// next tier's `min` (one percentage point, the editable form's resolution).
pub const DEFAULT_GRANULARITY: Rate = dec!(0.01);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An interval of [0, 1] that no tier covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub from: Rate,
    pub to: Rate,
}

/// Two tiers whose inclusive ranges intersect. `winner` is the earlier tier,
/// which the resolver picks for ratios in the shared range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierOverlap {
    pub winner: String,
    pub shadowed: String,
    pub from: Rate,
    pub to: Rate,
}

/// Findings about a tier table. Nothing here blocks a calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierValidationReport {
    pub inverted: Vec<String>,
    pub out_of_range: Vec<String>,
    pub overlaps: Vec<TierOverlap>,
    pub gaps: Vec<CoverageGap>,
    pub baseline_count: usize,
    pub warnings: Vec<String>,
}

impl TierValidationReport {
    pub fn is_clean(&self) -> bool {
        self.inverted.is_empty()
            && self.out_of_range.is_empty()
            && self.overlaps.is_empty()
            && self.gaps.is_empty()
            && self.baseline_count <= 1
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check a tier table for coverage of [0, 1] and for non-overlap.
///
/// Ranges are contiguous when the next `min` is no more than `granularity`
/// above the highest `max` seen so far, so `[0.00, 0.74]` followed by
/// `[0.75, 0.89]` is not reported at the default granularity.
pub fn validate_tiers(table: &TierTable, granularity: Rate) -> TierValidationReport {
    let tiers = table.tiers();
    let mut report = TierValidationReport {
        baseline_count: tiers.iter().filter(|t| t.is_baseline).count(),
        ..Default::default()
    };

    for tier in tiers {
        if tier.min > tier.max {
            report.inverted.push(tier.name.clone());
            report.warnings.push(format!(
                "Tier '{}' has min {} above max {}; it can never match.",
                tier.name, tier.min, tier.max
            ));
        }
        if !within_unit(tier.min) || !within_unit(tier.max) || !within_unit(tier.rebate_rate) {
            report.out_of_range.push(tier.name.clone());
            report.warnings.push(format!(
                "Tier '{}' has a bound or rebate rate outside 0-100%.",
                tier.name
            ));
        }
    }

    let usable: Vec<&PercentageTier> = tiers.iter().filter(|t| t.min <= t.max).collect();

    for (i, a) in usable.iter().enumerate() {
        for b in usable.iter().skip(i + 1) {
            let from = a.min.max(b.min);
            let to = a.max.min(b.max);
            if from <= to {
                report.warnings.push(format!(
                    "Tiers '{}' and '{}' overlap on [{}, {}]; '{}' wins.",
                    a.name, b.name, from, to, a.name
                ));
                report.overlaps.push(TierOverlap {
                    winner: a.name.clone(),
                    shadowed: b.name.clone(),
                    from,
                    to,
                });
            }
        }
    }

    report.gaps = coverage_gaps(&usable, granularity);
    for gap in &report.gaps {
        report.warnings.push(format!(
            "No tier covers penetration between {} and {}.",
            gap.from, gap.to
        ));
    }

    if report.baseline_count > 1 {
        report.warnings.push(format!(
            "{} tiers are flagged as baseline; only the first is used.",
            report.baseline_count
        ));
    }

    report
}

fn within_unit(value: Decimal) -> bool {
    value >= Decimal::ZERO && value <= Decimal::ONE
}

fn coverage_gaps(tiers: &[&PercentageTier], granularity: Rate) -> Vec<CoverageGap> {
    let mut ranges: Vec<(Decimal, Decimal)> = tiers
        .iter()
        .filter(|t| t.max >= Decimal::ZERO && t.min <= Decimal::ONE)
        .map(|t| (t.min.max(Decimal::ZERO), t.max.min(Decimal::ONE)))
        .collect();
    ranges.sort_by(|a, b| a.0.cmp(&b.0));

    let mut gaps = Vec::new();
    let Some(first) = ranges.first() else {
        gaps.push(CoverageGap {
            from: Decimal::ZERO,
            to: Decimal::ONE,
        });
        return gaps;
    };

    if first.0 > Decimal::ZERO {
        gaps.push(CoverageGap {
            from: Decimal::ZERO,
            to: first.0,
        });
    }

    let mut reached = first.1;
    for &(min, max) in ranges.iter().skip(1) {
        // A difference beyond the decimal range is a gap by any measure.
        let spacing = min.checked_sub(reached);
        if spacing.map_or(true, |d| d > granularity) {
            gaps.push(CoverageGap {
                from: reached,
                to: min,
            });
        }
        reached = reached.max(max);
    }

    if reached < Decimal::ONE {
        gaps.push(CoverageGap {
            from: reached,
            to: Decimal::ONE,
        });
    }
    gaps
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
