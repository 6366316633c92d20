//! CoinLab Runner — pipeline orchestration on top of `coinlab-core`.
//!
//! - TOML pipeline configuration with validation
//! - Per-asset fetch loop with rate limiting and skip reporting
//! - Feature computation and optional persistence
//! - Snapshot collection

pub mod config;
pub mod pipeline;
pub mod progress;

pub use config::{ConfigError, PipelineConfig, ProviderSettings};
pub use pipeline::{
    Pipeline, PipelineError, PipelineOutcome, PipelineReport, SkipReason, SnapshotReport,
};
pub use progress::{FetchProgress, SilentProgress, TracingProgress};
