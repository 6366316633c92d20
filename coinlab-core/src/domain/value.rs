//! FeatureValue — an optional numeric that keeps "undefined" apart from "non-finite".
//!
//! Derived columns can be missing (an asset's first return) or non-finite
//! (a return computed against a zero price). Collapsing both into `f64::NAN`
//! makes persistence and comparisons ambiguous, so the two are kept distinct.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A derived numeric cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum FeatureValue {
    /// No value is defined at this position.
    Null,
    /// An ordinary finite number.
    Finite(f64),
    /// NaN or ±∞, carried through unchanged.
    NonFinite(f64),
}

impl FeatureValue {
    /// Classify a raw float.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            FeatureValue::Finite(value)
        } else {
            FeatureValue::NonFinite(value)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FeatureValue::Null)
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, FeatureValue::Finite(_))
    }

    pub fn is_non_finite(&self) -> bool {
        matches!(self, FeatureValue::NonFinite(_))
    }

    /// The carried float, or `None` for `Null`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FeatureValue::Null => None,
            FeatureValue::Finite(v) | FeatureValue::NonFinite(v) => Some(v),
        }
    }

    /// The value only if it is finite.
    pub fn finite(&self) -> Option<f64> {
        match *self {
            FeatureValue::Finite(v) => Some(v),
            _ => None,
        }
    }

    /// Parse a persisted cell: empty → Null, `NaN`/`inf`/`-inf` → NonFinite.
    pub fn parse_cell(cell: &str) -> Result<Self, std::num::ParseFloatError> {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return Ok(FeatureValue::Null);
        }
        trimmed.parse::<f64>().map(FeatureValue::from_f64)
    }

    /// Render as a persisted cell. Inverse of [`FeatureValue::parse_cell`].
    pub fn to_cell(&self) -> String {
        match *self {
            FeatureValue::Null => String::new(),
            FeatureValue::Finite(v) => v.to_string(),
            FeatureValue::NonFinite(v) => {
                if v.is_nan() {
                    "NaN".to_string()
                } else if v > 0.0 {
                    "inf".to_string()
                } else {
                    "-inf".to_string()
                }
            }
        }
    }
}

impl From<Option<f64>> for FeatureValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(FeatureValue::Null, FeatureValue::from_f64)
    }
}

/// NaN equals NaN here; otherwise tables containing a zero-price return
/// could never compare equal to themselves.
impl PartialEq for FeatureValue {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (FeatureValue::Null, FeatureValue::Null) => true,
            (FeatureValue::Finite(a), FeatureValue::Finite(b)) => a == b,
            (FeatureValue::NonFinite(a), FeatureValue::NonFinite(b)) => {
                (a.is_nan() && b.is_nan()) || a == b
            }
            _ => false,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FeatureValue::Null => write!(f, "null"),
            FeatureValue::Finite(v) => match f.precision() {
                Some(p) => write!(f, "{v:.p$}"),
                None => write!(f, "{v}"),
            },
            FeatureValue::NonFinite(_) => write!(f, "{}", self.to_cell()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_floats() {
        assert_eq!(FeatureValue::from_f64(1.5), FeatureValue::Finite(1.5));
        assert!(FeatureValue::from_f64(f64::NAN).is_non_finite());
        assert!(FeatureValue::from_f64(f64::INFINITY).is_non_finite());
        assert!(FeatureValue::from(None).is_null());
    }

    #[test]
    fn nan_compares_equal_to_nan() {
        assert_eq!(
            FeatureValue::NonFinite(f64::NAN),
            FeatureValue::NonFinite(f64::NAN)
        );
        assert_ne!(
            FeatureValue::NonFinite(f64::INFINITY),
            FeatureValue::NonFinite(f64::NEG_INFINITY)
        );
        assert_ne!(FeatureValue::Null, FeatureValue::Finite(0.0));
    }

    #[test]
    fn cells_keep_null_apart_from_zero_and_nan() {
        assert_eq!(FeatureValue::Null.to_cell(), "");
        assert_eq!(FeatureValue::NonFinite(f64::NAN).to_cell(), "NaN");
        assert_eq!(FeatureValue::NonFinite(f64::NEG_INFINITY).to_cell(), "-inf");

        assert_eq!(FeatureValue::parse_cell("").unwrap(), FeatureValue::Null);
        assert_eq!(FeatureValue::parse_cell("0").unwrap(), FeatureValue::Finite(0.0));
        assert_eq!(
            FeatureValue::parse_cell("inf").unwrap(),
            FeatureValue::NonFinite(f64::INFINITY)
        );
        assert!(FeatureValue::parse_cell("NaN").unwrap().is_non_finite());
        assert!(FeatureValue::parse_cell("null").is_err());
    }

    #[test]
    fn finite_cells_survive_text() {
        let v = FeatureValue::Finite(0.1 + 0.2);
        assert_eq!(FeatureValue::parse_cell(&v.to_cell()).unwrap(), v);
    }
}
