//! CoinLab Core — normalize, merge, and derive features from market series.
//!
//! This crate contains the feature-derivation pipeline and its collaborators:
//! - Domain types (observations, normalized rows, feature rows, tri-state values)
//! - Raw record normalizer (three aligned series → calendar-stamped rows)
//! - Multi-asset merger
//! - Feature engine (dedupe, sort, per-asset trailing windows)
//! - Market-data providers (CoinGecko, synthetic) with a circuit breaker
//! - Feature-table persistence (CSV, Parquet, metadata sidecar)

pub mod data;
pub mod domain;
pub mod features;
pub mod merge;
pub mod normalize;
pub mod store;

pub use domain::{FeatureRow, FeatureValue, MarketChart, MarketSnapshot, NormalizedRow};
pub use features::{compute_features, FeatureEngine, FeatureTable};
pub use merge::{merge_assets, AssetBatch};
pub use normalize::{normalize, NormalizeError};
