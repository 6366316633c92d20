//! Market-data acquisition: provider trait, CoinGecko client, synthetic source.

pub mod circuit_breaker;
pub mod coingecko;
pub mod provider;
pub mod synthetic;

pub use circuit_breaker::CircuitBreaker;
pub use coingecko::{CoinGeckoConfig, CoinGeckoProvider, DEFAULT_BASE_URL, MAX_FREE_TIER_DAYS};
pub use provider::{DataError, DataSource, MarketDataProvider};
pub use synthetic::SyntheticProvider;
