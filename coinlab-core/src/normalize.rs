//! Raw record normalizer.
//!
//! Zips the three index-aligned series of a [`MarketChart`] into observations
//! and turns each into a [`NormalizedRow`] carrying a UTC calendar timestamp
//! and the asset id. Misaligned input is reported, never repaired.

use crate::domain::{MarketChart, NormalizedRow, Observation};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error(
        "series length mismatch for '{asset_id}': prices={prices}, volumes={volumes}, market_caps={market_caps}"
    )]
    LengthMismatch {
        asset_id: String,
        prices: usize,
        volumes: usize,
        market_caps: usize,
    },

    #[error("series timestamps diverge for '{asset_id}' at index {index}")]
    Misaligned { asset_id: String, index: usize },

    #[error("timestamp {timestamp_ms}ms out of range for '{asset_id}'")]
    InvalidTimestamp { asset_id: String, timestamp_ms: i64 },
}

/// Zip the three series into observations, checking index alignment.
pub fn zip_chart(asset_id: &str, chart: &MarketChart) -> Result<Vec<Observation>, NormalizeError> {
    let (prices, volumes, caps) = (&chart.prices, &chart.total_volumes, &chart.market_caps);

    if prices.len() != volumes.len() || prices.len() != caps.len() {
        return Err(NormalizeError::LengthMismatch {
            asset_id: asset_id.to_string(),
            prices: prices.len(),
            volumes: volumes.len(),
            market_caps: caps.len(),
        });
    }

    prices
        .iter()
        .zip(volumes)
        .zip(caps)
        .enumerate()
        .map(|(index, ((p, v), m))| {
            if p.timestamp_ms != v.timestamp_ms || p.timestamp_ms != m.timestamp_ms {
                return Err(NormalizeError::Misaligned {
                    asset_id: asset_id.to_string(),
                    index,
                });
            }
            Ok(Observation {
                timestamp_ms: p.timestamp_ms,
                price: p.value,
                volume: v.value,
                market_cap: m.value,
            })
        })
        .collect()
}

/// Convert epoch milliseconds to a UTC timestamp, keeping sub-second precision.
pub fn timestamp_to_date(timestamp_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(timestamp_ms)
}

/// Normalize one asset's chart. Output length equals input length.
pub fn normalize(asset_id: &str, chart: &MarketChart) -> Result<Vec<NormalizedRow>, NormalizeError> {
    zip_chart(asset_id, chart)?
        .into_iter()
        .map(|obs| {
            let date = timestamp_to_date(obs.timestamp_ms).ok_or_else(|| {
                NormalizeError::InvalidTimestamp {
                    asset_id: asset_id.to_string(),
                    timestamp_ms: obs.timestamp_ms,
                }
            })?;
            Ok(NormalizedRow {
                date,
                asset_id: asset_id.to_string(),
                price: obs.price,
                volume: obs.volume,
                market_cap: obs.market_cap,
            })
        })
        .collect()
}
