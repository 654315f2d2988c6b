//! Stable, serializable records handed to external stores and exporters.
//!
//! The engine never writes files itself; it produces plain records with a
//! fixed field order and fixed numeric precision so downstream tabular
//! exports can be compared against golden files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Round to a fixed number of decimal places (half-up on the scaled value).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Per-prediction record as persisted by the external store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Aggregate model probability in [0, 1].
    pub raw_score: f64,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    /// Quality label of the confidence interval ("High"/"Medium"/"Low").
    pub confidence_quality: String,
    /// Signed per-feature contributions, ordered to match the feature count.
    pub attribution_values: Vec<f64>,
    /// Version identifier of the calibration map applied, if any.
    pub calibration_version: String,
    pub recorded_at: DateTime<Utc>,
}

impl PredictionRecord {
    /// Copy with scores rounded to 2 decimals and attributions to 4, the
    /// precision contract of the tabular exports.
    pub fn rounded(&self) -> Self {
        Self {
            raw_score: round_to(self.raw_score, 2),
            ci_lower: self.ci_lower.map(|v| round_to(v, 2)),
            ci_upper: self.ci_upper.map(|v| round_to(v, 2)),
            confidence_quality: self.confidence_quality.clone(),
            attribution_values: self
                .attribution_values
                .iter()
                .map(|v| round_to(*v, 4))
                .collect(),
            calibration_version: self.calibration_version.clone(),
            recorded_at: self.recorded_at,
        }
    }
}

/// One row of the per-response export.
///
/// Column order is fixed: id, timestamp, score, ci_lower, ci_upper,
/// quality, then one column per feature value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRow {
    pub response_id: i64,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    pub score: f64,
    pub ci_lower: Option<f64>,
    pub ci_upper: Option<f64>,
    pub confidence_quality: String,
    pub feature_values: Vec<f64>,
}

impl ResponseRow {
    pub fn new(
        response_id: i64,
        recorded_at: DateTime<Utc>,
        score: f64,
        ci_lower: Option<f64>,
        ci_upper: Option<f64>,
        confidence_quality: &str,
        feature_values: &[f64],
    ) -> Self {
        Self {
            response_id,
            timestamp: recorded_at.to_rfc3339(),
            score: round_to(score, 2),
            ci_lower: ci_lower.map(|v| round_to(v, 2)),
            ci_upper: ci_upper.map(|v| round_to(v, 2)),
            confidence_quality: confidence_quality.to_string(),
            feature_values: feature_values.iter().map(|v| round_to(*v, 2)).collect(),
        }
    }
}

/// One metric/value pair of the analytics-summary export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummaryRow {
    pub metric: String,
    pub value: f64,
}

impl AnalyticsSummaryRow {
    pub fn new(metric: &str, value: f64) -> Self {
        Self {
            metric: metric.to_string(),
            value: round_to(value, 2),
        }
    }
}

/// One row of the feature-importance export: a response's attribution
/// values at 4-decimal precision, column order matching feature order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportanceRow {
    pub response_id: i64,
    pub timestamp: String,
    pub contributions: Vec<f64>,
}

impl FeatureImportanceRow {
    pub fn new(response_id: i64, recorded_at: DateTime<Utc>, contributions: &[f64]) -> Self {
        Self {
            response_id,
            timestamp: recorded_at.to_rfc3339(),
            contributions: contributions.iter().map(|v| round_to(*v, 4)).collect(),
        }
    }
}
