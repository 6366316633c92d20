//! Dedupe and sort: the first two steps of the feature engine.

use crate::domain::NormalizedRow;
use std::collections::HashSet;

/// Rows after deduplication and sorting.
#[derive(Debug, Clone)]
pub struct Canonicalized {
    pub rows: Vec<NormalizedRow>,
    pub duplicates_dropped: usize,
}

/// Drop repeated `(date, asset_id)` keys. The first occurrence in input
/// order survives; relative order of survivors is unchanged.
pub fn dedupe_keep_first(rows: &mut Vec<NormalizedRow>) -> usize {
    let before = rows.len();
    let mut seen = HashSet::with_capacity(before);
    rows.retain(|r| seen.insert((r.date, r.asset_id.clone())));
    before - rows.len()
}

/// Stable sort by date; equal dates keep their input order.
pub fn sort_by_date(rows: &mut [NormalizedRow]) {
    rows.sort_by_key(|r| r.date);
}

/// Dedupe first, then sort.
pub fn canonicalize(mut rows: Vec<NormalizedRow>) -> Canonicalized {
    let duplicates_dropped = dedupe_keep_first(&mut rows);
    sort_by_date(&mut rows);
    Canonicalized {
        rows,
        duplicates_dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn row(asset: &str, ms: i64, price: f64) -> NormalizedRow {
        NormalizedRow {
            date: DateTime::from_timestamp_millis(ms).unwrap(),
            asset_id: asset.into(),
            price,
            volume: 1.0,
            market_cap: 1.0,
        }
    }

    #[test]
    fn sorts_by_date() {
        let out = canonicalize(vec![row("btc", 3, 3.0), row("btc", 1, 1.0), row("btc", 2, 2.0)]);
        let prices: Vec<f64> = out.rows.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0]);
        assert_eq!(out.duplicates_dropped, 0);
    }

    #[test]
    fn first_duplicate_in_input_order_wins() {
        let out = canonicalize(vec![
            row("btc", 2, 200.0),
            row("btc", 1, 100.0),
            row("btc", 2, 999.0),
        ]);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.duplicates_dropped, 1);
        assert_eq!(out.rows[1].price, 200.0);
    }

    #[test]
    fn same_date_different_assets_are_not_duplicates() {
        let out = canonicalize(vec![row("eth", 1, 1.0), row("btc", 1, 2.0)]);
        assert_eq!(out.rows.len(), 2);
        // ties keep merged order
        assert_eq!(out.rows[0].asset_id, "eth");
        assert_eq!(out.rows[1].asset_id, "btc");
    }
}
