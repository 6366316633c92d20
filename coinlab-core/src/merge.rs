//! Multi-asset merger.

use crate::domain::NormalizedRow;

/// One asset's normalized rows, as produced by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetBatch {
    pub asset_id: String,
    pub rows: Vec<NormalizedRow>,
}

impl AssetBatch {
    pub fn new(asset_id: impl Into<String>, rows: Vec<NormalizedRow>) -> Self {
        Self {
            asset_id: asset_id.into(),
            rows,
        }
    }
}

/// Concatenate batches in the order supplied.
///
/// Rows within a batch are neither reordered nor filtered. An empty result
/// means no asset produced data.
pub fn merge_assets(batches: Vec<AssetBatch>) -> Vec<NormalizedRow> {
    let total = batches.iter().map(|b| b.rows.len()).sum();
    let mut combined = Vec::with_capacity(total);
    for batch in batches {
        combined.extend(batch.rows);
    }
    combined
}
