//! Table rows: normalized input and feature-enriched output.

use super::value::FeatureValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One asset at one instant, with an explicit calendar timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    /// Millisecond precision, not truncated to the day.
    pub date: DateTime<Utc>,
    pub asset_id: String,
    pub price: f64,
    pub volume: f64,
    pub market_cap: f64,
}

impl NormalizedRow {
    /// The deduplication key.
    pub fn key(&self) -> (DateTime<Utc>, &str) {
        (self.date, self.asset_id.as_str())
    }
}

/// A normalized row plus the derived columns.
///
/// Only the feature engine constructs these; everything downstream reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: DateTime<Utc>,
    pub asset_id: String,
    pub price: f64,
    pub volume: f64,
    pub market_cap: f64,
    pub daily_return: FeatureValue,
    pub ma_7: FeatureValue,
    pub ma_30: FeatureValue,
    pub volatility_30d: FeatureValue,
    pub cumulative_return: FeatureValue,
}

impl FeatureRow {
    pub(crate) fn from_parts(row: NormalizedRow, derived: DerivedFeatures) -> Self {
        Self {
            date: row.date,
            asset_id: row.asset_id,
            price: row.price,
            volume: row.volume,
            market_cap: row.market_cap,
            daily_return: derived.daily_return,
            ma_7: derived.ma_7,
            ma_30: derived.ma_30,
            volatility_30d: derived.volatility_30d,
            cumulative_return: derived.cumulative_return,
        }
    }
}

/// The derived half of a [`FeatureRow`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFeatures {
    pub daily_return: FeatureValue,
    pub ma_7: FeatureValue,
    pub ma_30: FeatureValue,
    pub volatility_30d: FeatureValue,
    pub cumulative_return: FeatureValue,
}
