//! Fixed-capacity trailing windows.
//!
//! A window holds at most `capacity` of the most recent entries and shrinks
//! at the start of a series instead of padding. Aggregates are recomputed
//! from the held entries so a NaN or ∞ only affects the windows it is in.

use crate::domain::FeatureValue;
use std::collections::VecDeque;

/// Trailing window over plain floats (prices).
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be >= 1");
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean of whatever is held; `Null` when empty.
    pub fn mean(&self) -> FeatureValue {
        if self.values.is_empty() {
            return FeatureValue::Null;
        }
        let sum: f64 = self.values.iter().sum();
        FeatureValue::from_f64(sum / self.values.len() as f64)
    }
}

/// Trailing window over optional values (returns). Null entries occupy a
/// slot but are excluded from the statistics.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    values: VecDeque<FeatureValue>,
    capacity: usize,
    min_samples: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize, min_samples: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be >= 1");
        assert!(min_samples >= 2, "sample std needs at least 2 samples");
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
            min_samples,
        }
    }

    pub fn push(&mut self, value: FeatureValue) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Number of non-null entries currently held.
    pub fn sample_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_null()).count()
    }

    /// Sample standard deviation (N−1 denominator) of the non-null entries.
    ///
    /// `Null` below `min_samples`; non-finite if any held sample is.
    pub fn sample_std(&self) -> FeatureValue {
        let samples: Vec<f64> = self.values.iter().filter_map(|v| v.as_f64()).collect();
        let n = samples.len();
        if n < self.min_samples {
            return FeatureValue::Null;
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let sum_sq: f64 = samples.iter().map(|x| (x - mean).powi(2)).sum();
        FeatureValue::from_f64((sum_sq / (n - 1) as f64).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_shrinks_at_series_start() {
        let mut w = RollingWindow::new(7);
        assert_eq!(w.mean(), FeatureValue::Null);
        for p in [10.0, 20.0, 30.0] {
            w.push(p);
        }
        assert_eq!(w.len(), 3);
        assert_eq!(w.mean(), FeatureValue::Finite(20.0));
    }

    #[test]
    fn mean_evicts_oldest() {
        let mut w = RollingWindow::new(2);
        for p in [1.0, 2.0, 6.0] {
            w.push(p);
        }
        assert_eq!(w.mean(), FeatureValue::Finite(4.0));
    }

    #[test]
    fn nan_leaves_the_window_after_capacity_pushes() {
        let mut w = RollingWindow::new(2);
        w.push(f64::NAN);
        w.push(1.0);
        assert!(w.mean().is_non_finite());
        w.push(3.0);
        assert_eq!(w.mean(), FeatureValue::Finite(2.0));
    }

    #[test]
    fn std_requires_two_samples() {
        let mut w = SampleWindow::new(30, 2);
        w.push(FeatureValue::Null);
        w.push(FeatureValue::Finite(0.1));
        assert_eq!(w.sample_count(), 1);
        assert_eq!(w.sample_std(), FeatureValue::Null);

        w.push(FeatureValue::Finite(0.3));
        // mean 0.2, deviations ±0.1, sum_sq 0.02, / (2-1), sqrt
        let std = w.sample_std().finite().unwrap();
        assert!((std - 0.02_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn std_uses_bessel_correction() {
        let mut w = SampleWindow::new(30, 2);
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            w.push(FeatureValue::Finite(v));
        }
        // population std is 2.0; sample variance = 32 / 7
        let std = w.sample_std().finite().unwrap();
        assert!((std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn std_propagates_infinity() {
        let mut w = SampleWindow::new(30, 2);
        w.push(FeatureValue::NonFinite(f64::INFINITY));
        w.push(FeatureValue::Finite(0.5));
        assert!(w.sample_std().is_non_finite());
    }

    #[test]
    fn null_slots_count_against_capacity() {
        let mut w = SampleWindow::new(2, 2);
        w.push(FeatureValue::Finite(1.0));
        w.push(FeatureValue::Finite(3.0));
        w.push(FeatureValue::Null);
        assert_eq!(w.sample_count(), 1);
        assert_eq!(w.sample_std(), FeatureValue::Null);
    }
}
