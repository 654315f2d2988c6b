use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use reliability_core::{
    AssessmentBands, EnsembleModel, FeatureVector, IntervalWidthBands, ReliabilityError, ScoreBands,
};

/// Supported confidence levels and their normal critical values.
const CRITICAL_VALUES: [(f64, f64); 3] = [(0.90, 1.645), (0.95, 1.96), (0.99, 2.576)];

fn critical_value(level: f64) -> Result<f64, ReliabilityError> {
    CRITICAL_VALUES
        .iter()
        .find(|(l, _)| (level - l).abs() < 1e-9)
        .map(|(_, z)| *z)
        .ok_or_else(|| {
            ReliabilityError::InvalidParameter(format!(
                "unsupported confidence level {level}; use 0.90, 0.95 or 0.99"
            ))
        })
}

/// How an interval was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceMethod {
    /// Explicit sample of every member prediction.
    Bootstrap,
    /// Analytic variance over member predictions, no sample retained.
    TreeVariance,
}

/// Quality label derived from interval width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceQuality {
    High,
    Medium,
    Low,
}

impl ConfidenceQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceQuality::High => "High",
            ConfidenceQuality::Medium => "Medium",
            ConfidenceQuality::Low => "Low",
        }
    }
}

/// Bounded confidence interval around a point prediction.
///
/// Invariant: `0 <= lower <= point <= upper <= 1`. When the members are
/// unanimous the interval collapses to the point estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
    pub std_error: f64,
    pub width: f64,
    pub quality: ConfidenceQuality,
    pub level: f64,
    pub method: ConfidenceMethod,
}

/// Interval estimator over per-member ensemble predictions.
pub struct ConfidenceEstimator {
    widths: IntervalWidthBands,
    pub(crate) scores: ScoreBands,
    pub(crate) assessments: AssessmentBands,
}

impl Default for ConfidenceEstimator {
    fn default() -> Self {
        Self::new(
            IntervalWidthBands::default(),
            ScoreBands::default(),
            AssessmentBands::default(),
        )
    }
}

impl ConfidenceEstimator {
    pub fn new(widths: IntervalWidthBands, scores: ScoreBands, assessments: AssessmentBands) -> Self {
        Self {
            widths,
            scores,
            assessments,
        }
    }

    /// Interval from an explicit bootstrap sample: every member is queried
    /// on the same features, the interval is the critical value times the
    /// sample standard deviation, clamped to [0, 1].
    pub fn bootstrap_confidence(
        &self,
        model: &dyn EnsembleModel,
        features: &FeatureVector,
        level: f64,
    ) -> Result<ConfidenceResult, ReliabilityError> {
        let z = critical_value(level)?;
        model.check_features(features)?;
        let n = self.require_members(model)?;

        let predictions: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|m| model.predict_member(m, features))
            .collect::<Result<Vec<_>, _>>()?;

        let mean = predictions.iter().sum::<f64>() / n as f64;
        let std = if n > 1 {
            let var = predictions.iter().map(|p| (p - mean).powi(2)).sum::<f64>()
                / (n as f64 - 1.0);
            var.sqrt()
        } else {
            0.0
        };

        Ok(self.build_result(mean, std, z, level, ConfidenceMethod::Bootstrap))
    }

    /// Same contract as [`Self::bootstrap_confidence`] but derives the
    /// standard deviation in a single streaming pass (Welford), without
    /// materializing the member sample. Cheaper, less accurate for small
    /// ensembles.
    pub fn tree_variance_confidence(
        &self,
        model: &dyn EnsembleModel,
        features: &FeatureVector,
        level: f64,
    ) -> Result<ConfidenceResult, ReliabilityError> {
        let z = critical_value(level)?;
        model.check_features(features)?;
        let n = self.require_members(model)?;

        let mut mean = 0.0;
        let mut m2 = 0.0;
        for m in 0..n {
            let x = model.predict_member(m, features)?;
            let delta = x - mean;
            mean += delta / (m as f64 + 1.0);
            m2 += delta * (x - mean);
        }
        let std = if n > 1 {
            (m2.max(0.0) / (n as f64 - 1.0)).sqrt()
        } else {
            0.0
        };

        Ok(self.build_result(mean, std, z, level, ConfidenceMethod::TreeVariance))
    }

    /// Independent per-item intervals, order preserved. Any item failure
    /// fails the whole batch.
    pub fn batch_confidence(
        &self,
        model: &dyn EnsembleModel,
        vectors: &[FeatureVector],
        level: f64,
    ) -> Result<Vec<ConfidenceResult>, ReliabilityError> {
        critical_value(level)?;
        vectors
            .par_iter()
            .map(|v| self.bootstrap_confidence(model, v, level))
            .collect()
    }

    /// Best-effort variant: one result-or-error per input item.
    pub fn batch_confidence_best_effort(
        &self,
        model: &dyn EnsembleModel,
        vectors: &[FeatureVector],
        level: f64,
    ) -> Vec<Result<ConfidenceResult, ReliabilityError>> {
        let results: Vec<_> = vectors
            .par_iter()
            .map(|v| self.bootstrap_confidence(model, v, level))
            .collect();
        let failures = results.iter().filter(|r| r.is_err()).count();
        if failures > 0 {
            tracing::warn!(failures, total = vectors.len(), "batch confidence ran best-effort");
        }
        results
    }

    /// Quality label from interval width.
    pub fn quality(&self, width: f64) -> ConfidenceQuality {
        if width < self.widths.high_below {
            ConfidenceQuality::High
        } else if width <= self.widths.medium_below_or_equal {
            ConfidenceQuality::Medium
        } else {
            ConfidenceQuality::Low
        }
    }

    fn require_members(&self, model: &dyn EnsembleModel) -> Result<usize, ReliabilityError> {
        let n = model.member_count();
        if n == 0 {
            return Err(ReliabilityError::UnsupportedModel(
                "confidence estimation requires per-member introspection".to_string(),
            ));
        }
        Ok(n)
    }

    fn build_result(
        &self,
        mean: f64,
        std: f64,
        z: f64,
        level: f64,
        method: ConfidenceMethod,
    ) -> ConfidenceResult {
        let point = mean.clamp(0.0, 1.0);
        let margin = z * std;
        let lower = (point - margin).clamp(0.0, 1.0);
        let upper = (point + margin).clamp(0.0, 1.0);
        let width = upper - lower;
        ConfidenceResult {
            point,
            lower,
            upper,
            std_error: std,
            width,
            quality: self.quality(width),
            level,
            method,
        }
    }
}
