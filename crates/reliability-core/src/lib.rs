//! Shared vocabulary for the prediction-reliability engine.
//!
//! Defines the feature vector and ensemble-model abstractions consumed by
//! the confidence, attribution, calibration and comparison crates, plus
//! the typed error enum, injectable threshold tables, and the stable
//! serializable records handed back to external stores.

pub mod config;
pub mod error;
pub mod model;
pub mod record;
pub mod synthetic;

pub use config::{
    AssessmentBands, AttributionBuckets, ComparatorLimits, EceBands, EffectSizeBands,
    IntervalWidthBands, ScoreBands,
};
pub use error::ReliabilityError;
pub use model::{EnsembleModel, FeatureVector};
pub use record::{
    round_to, AnalyticsSummaryRow, FeatureImportanceRow, PredictionRecord, ResponseRow,
};
pub use synthetic::SyntheticEnsemble;
