use tracing::debug;

use super::table::PercentageTier;
use crate::types::*;

/// Return the first tier, in stored order, whose inclusive `[min, max]`
/// range contains `penetration_ratio`.
///
/// `None` is an expected outcome: ratios above 1.0 from data anomalies, or a
/// gap the user left in the table. Overlapping tiers are not corrected; the
/// earlier one wins.
pub fn resolve(tiers: &[PercentageTier], penetration_ratio: Rate) -> Option<&PercentageTier> {
    resolve_position(tiers, penetration_ratio).map(|idx| &tiers[idx])
}

/// Index of the tier [`resolve`] would return.
pub fn resolve_position(tiers: &[PercentageTier], penetration_ratio: Rate) -> Option<usize> {
    let matched = tiers.iter().position(|t| t.contains(penetration_ratio));
    debug!(
        ratio = %penetration_ratio,
        tier = matched.map(|i| tiers[i].name.as_str()).unwrap_or("none"),
        "resolved rebate tier"
    );
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::table::TierTable;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_table_resolution() {
        let table = TierTable::default();
        let name = |r| resolve(table.tiers(), r).map(|t| t.name.clone());
        assert_eq!(name(dec!(0.00)).as_deref(), Some("Below 75%"));
        assert_eq!(name(dec!(0.74)).as_deref(), Some("Below 75%"));
        assert_eq!(name(dec!(0.75)).as_deref(), Some("Tier 1"));
        assert_eq!(name(dec!(0.89)).as_deref(), Some("Tier 1"));
        assert_eq!(name(dec!(0.92)).as_deref(), Some("Tier 2"));
        assert_eq!(name(dec!(1.00)).as_deref(), Some("Tier 2"));
    }

    #[test]
    fn test_first_match_wins_on_overlap() {
        let tiers = vec![
            PercentageTier::new("A", dec!(0.5), dec!(0.8), dec!(0.05)),
            PercentageTier::new("B", dec!(0.7), dec!(0.9), dec!(0.10)),
        ];
        assert_eq!(resolve(&tiers, dec!(0.75)).unwrap().name, "A");
        assert_eq!(resolve(&tiers, dec!(0.85)).unwrap().name, "B");
    }

    #[test]
    fn test_no_match_outside_coverage() {
        let tiers = vec![PercentageTier::new("Low", dec!(0), dec!(0.5), dec!(0))];
        assert!(resolve(&tiers, dec!(0.9)).is_none());
    }

    #[test]
    fn test_ratio_above_one_matches_nothing_by_default() {
        let table = TierTable::default();
        assert!(resolve(table.tiers(), dec!(1.02)).is_none());
    }

    #[test]
    fn test_gap_between_default_tiers() {
        // 0.745 sits between "Below 75%" (max 0.74) and "Tier 1" (min 0.75)
        let table = TierTable::default();
        assert!(resolve(table.tiers(), dec!(0.745)).is_none());
    }

    #[test]
    fn test_position_points_at_first_match() {
        let tiers = vec![
            PercentageTier::new("A", dec!(0.5), dec!(0.8), dec!(0.05)),
            PercentageTier::new("B", dec!(0.7), dec!(0.9), dec!(0.10)),
        ];
        assert_eq!(resolve_position(&tiers, dec!(0.75)), Some(0));
        assert_eq!(resolve_position(&tiers, dec!(0.9)), Some(1));
        assert_eq!(resolve_position(&tiers, dec!(0.95)), None);
    }

    #[test]
    fn test_empty_table() {
        assert!(resolve(&[], dec!(0.5)).is_none());
    }
}
