//! Domain types shared by every stage of the pipeline.

pub mod observation;
pub mod row;
pub mod value;

pub use observation::{MarketChart, MarketSnapshot, Observation, SeriesPoint};
pub use row::{DerivedFeatures, FeatureRow, NormalizedRow};
pub use value::FeatureValue;
