//! Pipeline configuration loaded from TOML.
//!
//! Every field has a default except `assets`, which must be non-empty after
//! loading. CLI flags override file values before validation.

use coinlab_core::data::{CoinGeckoConfig, DEFAULT_BASE_URL};
use coinlab_core::store::TableFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no assets configured")]
    NoAssets,

    #[error("asset id at position {0} is blank")]
    BlankAsset(usize),

    #[error("days must be at least 1")]
    ZeroDays,

    #[error("vs_currency must not be empty")]
    EmptyCurrency,

    #[error("provider timeout must be at least 1 second")]
    ZeroTimeout,
}

/// HTTP client knobs for the CoinGecko provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub assets: Vec<String>,
    pub vs_currency: String,
    pub days: u32,
    pub save: bool,
    pub output_dir: PathBuf,
    pub format: TableFormat,
    /// Pause between consecutive provider calls.
    pub rate_limit_ms: u64,
    pub provider: ProviderSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            assets: vec!["bitcoin".to_string(), "ethereum".to_string()],
            vs_currency: "usd".to_string(),
            days: 365,
            save: true,
            output_dir: PathBuf::from("crypto_data"),
            format: TableFormat::Csv,
            rate_limit_ms: 1000,
            provider: ProviderSettings::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets.is_empty() {
            return Err(ConfigError::NoAssets);
        }
        if let Some(pos) = self.assets.iter().position(|a| a.trim().is_empty()) {
            return Err(ConfigError::BlankAsset(pos));
        }
        if self.days == 0 {
            return Err(ConfigError::ZeroDays);
        }
        if self.vs_currency.trim().is_empty() {
            return Err(ConfigError::EmptyCurrency);
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn coingecko_config(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            base_url: self.provider.base_url.clone(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
            max_retries: self.provider.max_retries,
            ..CoinGeckoConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.assets, vec!["bitcoin", "ethereum"]);
        assert_eq!(config.rate_limit(), Duration::from_secs(1));
    }

    #[test]
    fn full_file_parses() {
        let config = PipelineConfig::from_toml(
            r#"
            assets = ["solana", "cardano"]
            vs_currency = "eur"
            days = 90
            save = false
            output_dir = "out"
            format = "parquet"
            rate_limit_ms = 250

            [provider]
            base_url = "http://localhost:8080"
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.assets, vec!["solana", "cardano"]);
        assert_eq!(config.vs_currency, "eur");
        assert_eq!(config.days, 90);
        assert!(!config.save);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.format, TableFormat::Parquet);
        assert_eq!(config.provider.base_url, "http://localhost:8080");
        assert_eq!(config.provider.max_retries, 3);

        let cg = config.coingecko_config();
        assert_eq!(cg.timeout, Duration::from_secs(5));
        assert_eq!(cg.base_url, "http://localhost:8080");
    }

    #[test]
    fn empty_asset_list_rejected() {
        let err = PipelineConfig::from_toml("assets = []").unwrap_err();
        assert!(matches!(err, ConfigError::NoAssets));
    }

    #[test]
    fn blank_asset_rejected() {
        let err = PipelineConfig::from_toml(r#"assets = ["bitcoin", " "]"#).unwrap_err();
        assert!(matches!(err, ConfigError::BlankAsset(1)));
    }

    #[test]
    fn zero_days_rejected() {
        let err = PipelineConfig::from_toml("days = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroDays));
    }

    #[test]
    fn unknown_format_is_parse_error() {
        let err = PipelineConfig::from_toml(r#"format = "xlsx""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = PipelineConfig::from_file(Path::new("/nonexistent/coinlab.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/coinlab.toml"));
    }
}
