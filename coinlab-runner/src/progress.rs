//! Progress callbacks for the per-asset fetch loop.

use crate::pipeline::SkipReason;
use tracing::{debug, info};

/// Progress callback for multi-asset fetches.
pub trait FetchProgress: Send {
    /// Called before an asset is requested.
    fn on_start(&self, asset_id: &str, index: usize, total: usize);

    /// Called when an asset finishes, with the row count on success.
    fn on_complete(&self, asset_id: &str, index: usize, total: usize, result: Result<usize, &SkipReason>);

    /// Called once every asset has been attempted.
    fn on_batch_complete(&self, succeeded: usize, skipped: usize, total: usize);
}

/// Reports progress through `tracing` events.
pub struct TracingProgress;

impl FetchProgress for TracingProgress {
    fn on_start(&self, asset_id: &str, index: usize, total: usize) {
        info!(asset = asset_id, "[{}/{}] fetching", index + 1, total);
    }

    fn on_complete(&self, asset_id: &str, _index: usize, _total: usize, result: Result<usize, &SkipReason>) {
        match result {
            Ok(rows) => info!(asset = asset_id, rows, "fetched"),
            // the pipeline already warns with the reason
            Err(_) => debug!(asset = asset_id, "skipped"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, skipped: usize, total: usize) {
        info!(succeeded, skipped, total, "fetch complete");
    }
}

/// Discards every callback.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_start(&self, _asset_id: &str, _index: usize, _total: usize) {}

    fn on_complete(&self, _asset_id: &str, _index: usize, _total: usize, _result: Result<usize, &SkipReason>) {}

    fn on_batch_complete(&self, _succeeded: usize, _skipped: usize, _total: usize) {}
}
