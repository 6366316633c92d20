//! Raw observations as the market-data source supplies them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One `(timestamp_ms, value)` sample. On the wire this is a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(i64, f64)", into = "(i64, f64)")]
pub struct SeriesPoint {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

impl From<(i64, f64)> for SeriesPoint {
    fn from((timestamp_ms, value): (i64, f64)) -> Self {
        Self::new(timestamp_ms, value)
    }
}

impl From<SeriesPoint> for (i64, f64) {
    fn from(point: SeriesPoint) -> Self {
        (point.timestamp_ms, point.value)
    }
}

/// The three index-aligned historical series for one asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketChart {
    pub prices: Vec<SeriesPoint>,
    pub total_volumes: Vec<SeriesPoint>,
    pub market_caps: Vec<SeriesPoint>,
}

impl MarketChart {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// A single raw observation after zipping the three series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub timestamp_ms: i64,
    pub price: f64,
    pub volume: f64,
    pub market_cap: f64,
}

/// Current market state for one asset, captured at `captured_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub captured_at: DateTime<Utc>,
    pub asset_id: String,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    /// Percentage, e.g. `-2.5` for a 2.5% drop.
    pub price_change_24h: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_parses_from_array_pairs() {
        let json = r#"{
            "prices": [[1704067200000, 42000.5], [1704153600000, 43000.0]],
            "market_caps": [[1704067200000, 8.2e11], [1704153600000, 8.4e11]],
            "total_volumes": [[1704067200000, 1.5e10], [1704153600000, 1.7e10]]
        }"#;
        let chart: MarketChart = serde_json::from_str(json).unwrap();
        assert_eq!(chart.len(), 2);
        assert_eq!(chart.prices[1], SeriesPoint::new(1_704_153_600_000, 43000.0));
        assert_eq!(chart.total_volumes[0].value, 1.5e10);
    }

    #[test]
    fn chart_missing_series_is_rejected() {
        let json = r#"{"prices": [[1, 2.0]], "market_caps": [[1, 3.0]]}"#;
        assert!(serde_json::from_str::<MarketChart>(json).is_err());
    }
}
