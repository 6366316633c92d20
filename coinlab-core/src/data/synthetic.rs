//! Synthetic data provider for offline runs and tests.
//!
//! Produces a daily random walk per asset, seeded from the asset id so the
//! same id always yields the same series. Results built on it are tagged as
//! synthetic in the run metadata.

use super::provider::{DataError, DataSource, MarketDataProvider};
use crate::domain::{MarketChart, MarketSnapshot, SeriesPoint};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct SyntheticProvider {
    /// Last day of every generated series (midnight UTC).
    end: NaiveDate,
}

impl SyntheticProvider {
    pub fn new(end: NaiveDate) -> Self {
        Self { end }
    }

    pub fn ending_today() -> Self {
        Self::new(Utc::now().date_naive())
    }

    fn rng_for(asset_id: &str, vs_currency: &str) -> StdRng {
        let seed = blake3::hash(format!("{asset_id}/{vs_currency}").as_bytes());
        StdRng::from_seed(*seed.as_bytes())
    }

    /// `days + 1` daily points, oldest first, mirroring how the upstream
    /// daily chart includes both endpoints.
    pub fn generate(&self, asset_id: &str, vs_currency: &str, days: u32) -> MarketChart {
        let mut rng = Self::rng_for(asset_id, vs_currency);
        let supply: f64 = rng.gen_range(1.0e6..1.0e9);
        let mut price: f64 = rng.gen_range(1.0..50_000.0);

        let end = self.end.and_time(chrono::NaiveTime::MIN).and_utc();
        let start = end - Duration::days(i64::from(days));

        let mut chart = MarketChart::default();
        for day in 0..=i64::from(days) {
            let ts = (start + Duration::days(day)).timestamp_millis();
            let volume = price * supply * rng.gen_range(0.01..0.2);

            chart.prices.push(SeriesPoint::new(ts, price));
            chart.total_volumes.push(SeriesPoint::new(ts, volume));
            chart.market_caps.push(SeriesPoint::new(ts, price * supply));

            price *= 1.0 + rng.gen_range(-0.05..0.05);
        }
        chart
    }
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn market_chart(
        &self,
        asset_id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<MarketChart, DataError> {
        Ok(self.generate(asset_id, vs_currency, days))
    }

    fn snapshot(&self, asset_id: &str, vs_currency: &str) -> Result<MarketSnapshot, DataError> {
        let chart = self.generate(asset_id, vs_currency, 1);
        let (prev, last, last_ms) = match chart.prices.as_slice() {
            [.., prev, last] => (prev.value, last.value, last.timestamp_ms),
            _ => return Err(DataError::AssetNotFound { asset_id: asset_id.to_string() }),
        };

        Ok(MarketSnapshot {
            captured_at: DateTime::from_timestamp_millis(last_ms).unwrap_or_else(Utc::now),
            asset_id: asset_id.to_string(),
            price: Some(last),
            volume: chart.total_volumes.last().map(|p| p.value),
            market_cap: chart.market_caps.last().map(|p| p.value),
            price_change_24h: Some((last / prev - 1.0) * 100.0),
            high_24h: Some(prev.max(last)),
            low_24h: Some(prev.min(last)),
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn provider() -> SyntheticProvider {
        SyntheticProvider::new(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
    }

    #[test]
    fn same_asset_same_series() {
        let a = provider().generate("bitcoin", "usd", 30);
        let b = provider().generate("bitcoin", "usd", 30);
        assert_eq!(a, b);
        assert_ne!(a, provider().generate("ethereum", "usd", 30));
    }

    #[test]
    fn series_are_aligned_and_daily() {
        let chart = provider().generate("bitcoin", "usd", 10);
        assert_eq!(chart.len(), 11);
        let rows = normalize("bitcoin", &chart).unwrap();
        assert_eq!(rows.len(), 11);
        assert_eq!(rows.last().unwrap().date.to_rfc3339(), "2024-06-30T00:00:00+00:00");
        for pair in rows.windows(2) {
            assert_eq!((pair[1].date - pair[0].date).num_days(), 1);
        }
        assert!(rows.iter().all(|r| r.price > 0.0));
    }

    #[test]
    fn snapshot_is_consistent_with_series() {
        let snap = provider().snapshot("bitcoin", "usd").unwrap();
        let high = snap.high_24h.unwrap();
        let low = snap.low_24h.unwrap();
        let price = snap.price.unwrap();
        assert!(low <= price && price <= high);
    }
}
