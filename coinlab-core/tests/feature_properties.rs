//! Property tests for feature-engine invariants.
//!
//! Uses proptest to verify:
//! 1. Purity: computing twice on canonical input gives identical tables
//! 2. Per-asset independence: dropping asset B leaves asset A untouched
//! 3. Global order: output dates are non-decreasing
//! 4. Key uniqueness: no `(date, asset_id)` appears twice in the output
//! 5. Shrinking windows: ma_7 equals the mean of up to 7 trailing prices
//! 6. Parallel engine: rayon partitions give the serial result

use chrono::DateTime;
use coinlab_core::domain::{FeatureRow, NormalizedRow};
use coinlab_core::features::{compute_features, FeatureEngine};
use proptest::prelude::*;
use std::collections::HashSet;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_asset() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["bitcoin", "ethereum", "solana"]).prop_map(String::from)
}

fn arb_row() -> impl Strategy<Value = NormalizedRow> {
    (arb_asset(), 0i64..60, 1.0..1000.0_f64).prop_map(|(asset_id, day, price)| NormalizedRow {
        date: DateTime::from_timestamp_millis(day * 86_400_000).unwrap(),
        asset_id,
        price: (price * 100.0).round() / 100.0,
        volume: 1.0,
        market_cap: 1.0,
    })
}

fn arb_rows() -> impl Strategy<Value = Vec<NormalizedRow>> {
    prop::collection::vec(arb_row(), 0..120)
}

fn to_normalized(rows: &[FeatureRow]) -> Vec<NormalizedRow> {
    rows.iter()
        .map(|r| NormalizedRow {
            date: r.date,
            asset_id: r.asset_id.clone(),
            price: r.price,
            volume: r.volume,
            market_cap: r.market_cap,
        })
        .collect()
}

proptest! {
    #[test]
    fn recomputing_canonical_input_is_identity(rows in arb_rows()) {
        let first = compute_features(rows);
        let second = compute_features(to_normalized(&first.rows));
        prop_assert_eq!(second.duplicates_dropped, 0);
        prop_assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn removing_an_asset_leaves_others_unchanged(rows in arb_rows()) {
        let full = compute_features(rows.clone());
        let without_eth: Vec<NormalizedRow> =
            rows.into_iter().filter(|r| r.asset_id != "ethereum").collect();
        let partial = compute_features(without_eth);

        let expected: Vec<&FeatureRow> =
            full.rows.iter().filter(|r| r.asset_id != "ethereum").collect();
        let actual: Vec<&FeatureRow> = partial.rows.iter().collect();
        prop_assert_eq!(expected, actual);
    }

    #[test]
    fn output_dates_are_non_decreasing(rows in arb_rows()) {
        let table = compute_features(rows);
        for pair in table.rows.windows(2) {
            prop_assert!(pair[0].date <= pair[1].date);
        }
    }

    #[test]
    fn output_keys_are_unique(rows in arb_rows()) {
        let input_len = rows.len();
        let table = compute_features(rows);
        let keys: HashSet<_> = table.rows.iter().map(|r| (r.date, r.asset_id.clone())).collect();
        prop_assert_eq!(keys.len(), table.len());
        prop_assert_eq!(table.len() + table.duplicates_dropped, input_len);
    }

    #[test]
    fn ma_7_is_mean_of_trailing_prices(rows in arb_rows()) {
        let table = compute_features(rows);
        for asset in table.assets() {
            let prices: Vec<f64> = table.rows_for(asset).map(|r| r.price).collect();
            for (i, row) in table.rows_for(asset).enumerate() {
                let start = i.saturating_sub(6);
                let window = &prices[start..=i];
                let mean = window.iter().sum::<f64>() / window.len() as f64;
                let ma = row.ma_7.finite().unwrap();
                prop_assert!((ma - mean).abs() < 1e-9 * mean.abs().max(1.0));
            }
        }
    }

    #[test]
    fn parallel_engine_matches_serial(rows in arb_rows()) {
        let serial = FeatureEngine::new().compute(rows.clone());
        let parallel = FeatureEngine::new().with_parallel(true).compute(rows);
        prop_assert_eq!(serial, parallel);
    }
}
