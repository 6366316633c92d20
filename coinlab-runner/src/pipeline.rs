//! Pipeline orchestrator: fetch each asset, normalize, merge, derive
//! features, and optionally persist.
//!
//! A failed asset is skipped and recorded, never fatal. The run only ends
//! without a table when every asset was skipped.

use chrono::{DateTime, Utc};
use std::thread;
use thiserror::Error;
use tracing::{info, warn};

use coinlab_core::data::{DataError, MarketDataProvider};
use coinlab_core::domain::{MarketSnapshot, NormalizedRow};
use coinlab_core::features::{FeatureEngine, FeatureTable};
use coinlab_core::merge::{merge_assets, AssetBatch};
use coinlab_core::normalize::{normalize, NormalizeError};
use coinlab_core::store::{FeatureStore, Provenance, SavedTable, StoreError};

use crate::config::{ConfigError, PipelineConfig};
use crate::progress::{FetchProgress, TracingProgress};

/// Why an asset contributed no rows to this run.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    Fetch(#[from] DataError),

    #[error("unusable chart: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("provider returned an empty series")]
    EmptySeries,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("persistence error: {0}")]
    Store(#[from] StoreError),
}

/// Summary of a run that produced a table.
#[derive(Debug)]
pub struct PipelineReport {
    pub table: FeatureTable,
    /// Rows fetched per asset, in configured order (before dedup).
    pub fetched: Vec<(String, usize)>,
    pub skipped: Vec<(String, SkipReason)>,
    pub saved: Option<SavedTable>,
}

impl PipelineReport {
    pub fn total_records(&self) -> usize {
        self.table.len()
    }

    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.table.date_range()
    }
}

#[derive(Debug)]
pub enum PipelineOutcome {
    /// At least one asset produced rows.
    Completed(PipelineReport),
    /// Every asset was skipped; nothing was computed or saved.
    NoData { skipped: Vec<(String, SkipReason)> },
}

/// Current snapshots plus the assets that could not be fetched.
#[derive(Debug, Default)]
pub struct SnapshotReport {
    pub snapshots: Vec<MarketSnapshot>,
    pub skipped: Vec<(String, DataError)>,
}

pub struct Pipeline<'a> {
    config: PipelineConfig,
    provider: &'a dyn MarketDataProvider,
    progress: &'a dyn FetchProgress,
    engine: FeatureEngine,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: PipelineConfig, provider: &'a dyn MarketDataProvider) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            provider,
            progress: &TracingProgress,
            engine: FeatureEngine::new(),
        })
    }

    pub fn with_progress(mut self, progress: &'a dyn FetchProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_engine(mut self, engine: FeatureEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<PipelineOutcome, PipelineError> {
        let assets = &self.config.assets;
        let total = assets.len();
        let mut batches = Vec::with_capacity(total);
        let mut fetched = Vec::with_capacity(total);
        let mut skipped: Vec<(String, SkipReason)> = Vec::new();

        for (i, asset) in assets.iter().enumerate() {
            self.progress.on_start(asset, i, total);

            let result = self.fetch_asset(asset);
            self.progress
                .on_complete(asset, i, total, result.as_ref().map(Vec::len));

            match result {
                Ok(rows) => {
                    fetched.push((asset.clone(), rows.len()));
                    batches.push(AssetBatch::new(asset.clone(), rows));
                }
                Err(reason) => {
                    warn!(asset = asset.as_str(), %reason, "skipping asset");
                    skipped.push((asset.clone(), reason));
                }
            }

            // Bail out early if the provider stopped accepting requests
            if !self.provider.is_available() {
                for rest in &assets[(i + 1)..] {
                    warn!(asset = rest.as_str(), "skipping asset: provider unavailable");
                    skipped.push((rest.clone(), DataError::CircuitBreakerTripped.into()));
                }
                break;
            }

            if i + 1 < total {
                self.pause();
            }
        }

        self.progress.on_batch_complete(batches.len(), skipped.len(), total);

        if batches.is_empty() {
            warn!(skipped = skipped.len(), "no data fetched successfully");
            return Ok(PipelineOutcome::NoData { skipped });
        }

        let table = self.engine.compute(merge_assets(batches));

        let saved = if self.config.save {
            Some(self.persist(&table, &skipped)?)
        } else {
            None
        };

        if let Some((start, end)) = table.date_range() {
            info!(records = table.len(), %start, %end, "pipeline completed");
        }

        Ok(PipelineOutcome::Completed(PipelineReport {
            table,
            fetched,
            skipped,
            saved,
        }))
    }

    /// Current snapshot for every configured asset.
    pub fn snapshots(&self) -> SnapshotReport {
        let assets = &self.config.assets;
        let mut report = SnapshotReport::default();

        for (i, asset) in assets.iter().enumerate() {
            match self.provider.snapshot(asset, &self.config.vs_currency) {
                Ok(snapshot) => report.snapshots.push(snapshot),
                Err(e) => {
                    warn!(asset = asset.as_str(), error = %e, "snapshot unavailable");
                    report.skipped.push((asset.clone(), e));
                }
            }

            if !self.provider.is_available() {
                for rest in &assets[(i + 1)..] {
                    report
                        .skipped
                        .push((rest.clone(), DataError::CircuitBreakerTripped));
                }
                break;
            }

            if i + 1 < assets.len() {
                self.pause();
            }
        }

        report
    }

    fn fetch_asset(&self, asset_id: &str) -> Result<Vec<NormalizedRow>, SkipReason> {
        let chart = self
            .provider
            .market_chart(asset_id, &self.config.vs_currency, self.config.days)?;
        let rows = normalize(asset_id, &chart)?;
        if rows.is_empty() {
            return Err(SkipReason::EmptySeries);
        }
        Ok(rows)
    }

    fn persist(
        &self,
        table: &FeatureTable,
        skipped: &[(String, SkipReason)],
    ) -> Result<SavedTable, StoreError> {
        let store = FeatureStore::new(&self.config.output_dir);
        let name = FeatureStore::timestamped_name(Utc::now(), self.config.format);
        let provenance = Provenance {
            source: self.provider.source().as_str().to_string(),
            vs_currency: self.config.vs_currency.clone(),
            skipped_assets: skipped.iter().map(|(a, _)| a.clone()).collect(),
        };
        store.save(table, &name, &provenance)
    }

    fn pause(&self) {
        let delay = self.config.rate_limit();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}
