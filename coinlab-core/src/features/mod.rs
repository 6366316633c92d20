//! Feature engine — turns merged normalized rows into the feature table.
//!
//! Steps, in order:
//! 1. Dedupe on `(date, asset_id)`, first occurrence in merged order wins
//! 2. Stable sort on `date`
//! 3. Partition row indices by asset, preserving the global order
//! 4. Walk each partition with trailing windows to derive return, MA-7,
//!    MA-30, 30-row volatility and cumulative return
//! 5. Write the derived values back at their global positions
//!
//! The output stays in global date order, interleaving assets. Non-finite
//! values (a zero previous price, for instance) are not sanitized; they flow
//! through the downstream columns as IEEE arithmetic dictates.

pub mod canonicalize;
pub mod window;

use crate::domain::{DerivedFeatures, FeatureRow, FeatureValue, NormalizedRow};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

pub use canonicalize::{canonicalize, Canonicalized};
pub use window::{RollingWindow, SampleWindow};

pub const MA_SHORT_WINDOW: usize = 7;
pub const MA_LONG_WINDOW: usize = 30;
pub const VOLATILITY_WINDOW: usize = 30;
pub const MIN_VOLATILITY_SAMPLES: usize = 2;

/// Row indices belonging to one asset, in global sorted order.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPartition {
    pub asset_id: String,
    pub indices: Vec<usize>,
}

/// Group row indices by asset. Partitions appear in order of each asset's
/// first row; indices within a partition are ascending.
pub fn partition_by_asset(rows: &[NormalizedRow]) -> Vec<AssetPartition> {
    let mut slot: HashMap<&str, usize> = HashMap::new();
    let mut partitions: Vec<AssetPartition> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let idx = *slot.entry(row.asset_id.as_str()).or_insert_with(|| {
            partitions.push(AssetPartition {
                asset_id: row.asset_id.clone(),
                indices: Vec::new(),
            });
            partitions.len() - 1
        });
        partitions[idx].indices.push(i);
    }

    partitions
}

/// Derive all feature columns for one asset's price series, in order.
pub fn derive_series(prices: &[f64]) -> Vec<DerivedFeatures> {
    let mut ma_short = RollingWindow::new(MA_SHORT_WINDOW);
    let mut ma_long = RollingWindow::new(MA_LONG_WINDOW);
    let mut returns = SampleWindow::new(VOLATILITY_WINDOW, MIN_VOLATILITY_SAMPLES);
    let mut growth = 1.0_f64;
    let mut prev: Option<f64> = None;

    prices
        .iter()
        .map(|&price| {
            let daily_return = match prev {
                Some(p) => FeatureValue::from_f64(price / p - 1.0),
                None => FeatureValue::Null,
            };
            prev = Some(price);

            ma_short.push(price);
            ma_long.push(price);
            returns.push(daily_return);

            // A null return contributes a factor of one.
            if let Some(r) = daily_return.as_f64() {
                growth *= 1.0 + r;
            }

            DerivedFeatures {
                daily_return,
                ma_7: ma_short.mean(),
                ma_30: ma_long.mean(),
                volatility_30d: returns.sample_std(),
                cumulative_return: FeatureValue::from_f64(growth),
            }
        })
        .collect()
}

/// The engine's output: feature rows in global date order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
    /// How many input rows were discarded as duplicate keys.
    pub duplicates_dropped: usize,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct assets in order of first appearance.
    pub fn assets(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.asset_id.as_str()) {
                seen.push(row.asset_id.as_str());
            }
        }
        seen
    }

    /// Earliest and latest `date`.
    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.rows.iter().map(|r| r.date).min()?;
        let last = self.rows.iter().map(|r| r.date).max()?;
        Some((first, last))
    }

    /// One asset's rows, in date order.
    pub fn rows_for<'a>(&'a self, asset_id: &'a str) -> impl Iterator<Item = &'a FeatureRow> + 'a {
        self.rows.iter().filter(move |r| r.asset_id == asset_id)
    }

    pub fn head(&self, n: usize) -> &[FeatureRow] {
        &self.rows[..n.min(self.rows.len())]
    }
}

/// Stateless feature engine. Optionally computes asset partitions on the
/// rayon pool; the result is identical either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEngine {
    parallel: bool,
}

impl FeatureEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn compute(&self, rows: Vec<NormalizedRow>) -> FeatureTable {
        let Canonicalized {
            rows,
            duplicates_dropped,
        } = canonicalize(rows);

        let partitions = partition_by_asset(&rows);
        debug!(
            rows = rows.len(),
            assets = partitions.len(),
            duplicates_dropped,
            parallel = self.parallel,
            "computing features"
        );

        let derive = |part: &AssetPartition| {
            let prices: Vec<f64> = part.indices.iter().map(|&i| rows[i].price).collect();
            derive_series(&prices)
        };
        let derived: Vec<Vec<DerivedFeatures>> = if self.parallel {
            partitions.par_iter().map(derive).collect()
        } else {
            partitions.iter().map(derive).collect()
        };

        let mut slots: Vec<Option<DerivedFeatures>> = vec![None; rows.len()];
        for (part, features) in partitions.iter().zip(derived) {
            for (&i, f) in part.indices.iter().zip(features) {
                slots[i] = Some(f);
            }
        }

        let rows = rows
            .into_iter()
            .zip(slots)
            .filter_map(|(row, derived)| derived.map(|d| FeatureRow::from_parts(row, d)))
            .collect();

        FeatureTable {
            rows,
            duplicates_dropped,
        }
    }
}

/// Run the default (serial) engine.
pub fn compute_features(rows: Vec<NormalizedRow>) -> FeatureTable {
    FeatureEngine::new().compute(rows)
}
