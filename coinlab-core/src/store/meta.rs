//! Metadata sidecar written next to each saved table.

use crate::domain::FeatureRow;
use crate::features::FeatureTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    pub file: String,
    pub assets: Vec<String>,
    pub row_count: usize,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub data_hash: String,
    pub source: String,
    pub vs_currency: String,
    pub skipped_assets: Vec<String>,
    pub duplicates_dropped: usize,
    pub created_at: DateTime<Utc>,
}

/// Run context the table itself does not carry.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    pub source: String,
    pub vs_currency: String,
    pub skipped_assets: Vec<String>,
}

impl TableMeta {
    pub fn describe(file: &str, table: &FeatureTable, provenance: &Provenance) -> Self {
        let range = table.date_range();
        Self {
            file: file.to_string(),
            assets: table.assets().into_iter().map(String::from).collect(),
            row_count: table.len(),
            start_date: range.map(|r| r.0),
            end_date: range.map(|r| r.1),
            data_hash: table_hash(&table.rows),
            source: provenance.source.clone(),
            vs_currency: provenance.vs_currency.clone(),
            skipped_assets: provenance.skipped_assets.clone(),
            duplicates_dropped: table.duplicates_dropped,
            created_at: Utc::now(),
        }
    }
}

/// Deterministic BLAKE3 hash over every cell, in row order.
pub fn table_hash(rows: &[FeatureRow]) -> String {
    let mut hasher = blake3::Hasher::new();
    for r in rows {
        hasher.update(&r.date.timestamp_millis().to_le_bytes());
        hasher.update(r.asset_id.as_bytes());
        hasher.update(&[0]);
        for v in [r.price, r.volume, r.market_cap] {
            hasher.update(&v.to_le_bytes());
        }
        for v in [
            r.daily_return,
            r.ma_7,
            r.ma_30,
            r.volatility_30d,
            r.cumulative_return,
        ] {
            match v.as_f64() {
                Some(x) => hasher.update(&[1]).update(&x.to_le_bytes()),
                None => hasher.update(&[0]),
            };
        }
    }
    hasher.finalize().to_hex().to_string()
}
