use proptest::prelude::*;
use rebate_core::tiers::{compute_rebate_table, resolve, PercentageTier, TierTable};
use rebate_core::GroupFinancials;
use rust_decimal::Decimal;

fn money() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn ratio() -> impl Strategy<Value = Decimal> {
    (0i64..=12_000).prop_map(|bps| Decimal::new(bps, 4))
}

fn tier_table() -> impl Strategy<Value = TierTable> {
    prop::collection::vec((0i64..=100, 0i64..=100, 0i64..=10_000), 0..6).prop_map(|specs| {
        let tiers = specs
            .into_iter()
            .enumerate()
            .map(|(i, (a, b, bps))| {
                PercentageTier::new(
                    format!("T{}", i),
                    Decimal::new(a.min(b), 2),
                    Decimal::new(a.max(b), 2),
                    Decimal::new(bps, 4),
                )
            })
            .collect();
        TierTable::from_tiers(tiers)
    })
}

proptest! {
    #[test]
    fn rebate_is_revenue_times_rate(table in tier_table(), mrr in money(), arr in money(), r in ratio()) {
        let out = compute_rebate_table(&table, &GroupFinancials::new(r, mrr, arr)).result;
        for (row, tier) in out.rows.iter().zip(table.tiers()) {
            prop_assert_eq!(row.rebate_monthly, mrr * tier.rebate_rate);
            prop_assert_eq!(row.rebate_annual, arr * tier.rebate_rate);
        }
    }

    #[test]
    fn net_plus_rebate_conserves_revenue(table in tier_table(), mrr in money(), arr in money(), r in ratio()) {
        let out = compute_rebate_table(&table, &GroupFinancials::new(r, mrr, arr)).result;
        for row in &out.rows {
            prop_assert_eq!(row.net_monthly + row.rebate_monthly, mrr);
            prop_assert_eq!(row.net_annual + row.rebate_annual, arr);
        }
    }

    #[test]
    fn resolve_is_first_containing_tier(table in tier_table(), r in ratio()) {
        let expected = table.tiers().iter().position(|t| t.min <= r && r <= t.max);
        let got = resolve(table.tiers(), r)
            .and_then(|t| table.tiers().iter().position(|x| x.name == t.name));
        prop_assert_eq!(got, expected);
        prop_assert_eq!(resolve(table.tiers(), r), resolve(table.tiers(), r));
    }

    #[test]
    fn exactly_one_current_row_when_matched(table in tier_table(), r in ratio()) {
        let out = compute_rebate_table(&table, &GroupFinancials::new(r, Decimal::ONE_HUNDRED, Decimal::ONE_THOUSAND)).result;
        let current = out.rows.iter().filter(|row| row.is_current).count();
        prop_assert_eq!(current, usize::from(out.current_tier.is_some()));
    }
}
