//! Market-data provider trait and structured error types.
//!
//! The trait abstracts over data sources (CoinGecko, the synthetic generator)
//! so the pipeline can be driven without network access in tests.

use crate::domain::{MarketChart, MarketSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for fetch operations.
///
/// Every variant means "skip this asset for this run"; none is fatal to the
/// pipeline as a whole.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} for '{asset_id}'")]
    HttpStatus { status: u16, asset_id: String },

    #[error("asset not found: {asset_id}")]
    AssetNotFound { asset_id: String },

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("hard stop: provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("provider setup failed: {0}")]
    Setup(String),
}

/// Where a run's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    CoinGecko,
    Synthetic,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::CoinGecko => "coingecko",
            DataSource::Synthetic => "synthetic",
        }
    }
}

/// A source of historical charts and current snapshots.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Historical price / volume / market-cap series for the last `days` days.
    fn market_chart(
        &self,
        asset_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<MarketChart, DataError>;

    /// The asset's current market state.
    fn snapshot(&self, asset_id: &str, vs_currency: &str) -> Result<MarketSnapshot, DataError>;

    /// False once the provider refuses further requests (e.g. breaker open).
    fn is_available(&self) -> bool;
}
