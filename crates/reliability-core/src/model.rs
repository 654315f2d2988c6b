use serde::{Deserialize, Serialize};

use crate::ReliabilityError;

/// Fixed-length ordered sequence of numeric feature values.
///
/// Values are binary or normalized to [0, 1]. Immutable once constructed;
/// length must match the consuming model's `feature_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// All-zero vector of the same length, used as attribution baseline.
    pub fn zero_like(&self) -> Self {
        Self(vec![0.0; self.0.len()])
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// Read-only handle to a trained ensemble classifier.
///
/// The model is loaded once by an external collaborator and shared across
/// unlimited concurrent callers; implementations must be immutable after
/// construction. Per-member introspection (`member_count > 0`) is what the
/// bootstrap/tree-variance estimators and Shapley attribution require;
/// models without it still serve aggregate predictions.
pub trait EnsembleModel: Send + Sync {
    /// Expected feature vector length.
    fn feature_count(&self) -> usize;

    /// Number of independent sub-predictors. Zero means the model exposes
    /// no per-member introspection.
    fn member_count(&self) -> usize;

    /// Probability of the positive class from one ensemble member.
    fn predict_member(
        &self,
        member: usize,
        features: &FeatureVector,
    ) -> Result<f64, ReliabilityError>;

    /// Aggregate probability of the positive class. Defaults to the mean
    /// of all member predictions.
    fn predict(&self, features: &FeatureVector) -> Result<f64, ReliabilityError> {
        let n = self.member_count();
        if n == 0 {
            return Err(ReliabilityError::UnsupportedModel(
                "model has no members and no aggregate predictor".to_string(),
            ));
        }
        let mut sum = 0.0;
        for m in 0..n {
            sum += self.predict_member(m, features)?;
        }
        Ok(sum / n as f64)
    }

    /// Static per-feature global importance weighting. Defaults to uniform
    /// weights for models that do not expose one.
    fn feature_importance(&self) -> Vec<f64> {
        let k = self.feature_count();
        if k == 0 {
            return Vec::new();
        }
        vec![1.0 / k as f64; k]
    }

    /// Validate a feature vector against the model's expected length.
    fn check_features(&self, features: &FeatureVector) -> Result<(), ReliabilityError> {
        if features.len() != self.feature_count() {
            return Err(ReliabilityError::ShapeMismatch {
                expected: self.feature_count(),
                actual: features.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TwoMember;

    impl EnsembleModel for TwoMember {
        fn feature_count(&self) -> usize {
            3
        }

        fn member_count(&self) -> usize {
            2
        }

        fn predict_member(
            &self,
            member: usize,
            features: &FeatureVector,
        ) -> Result<f64, ReliabilityError> {
            self.check_features(features)?;
            Ok(if member == 0 { 0.2 } else { 0.6 })
        }
    }

    #[test]
    fn aggregate_is_mean_of_members() {
        let model = TwoMember;
        let v = FeatureVector::new(vec![1.0, 0.0, 1.0]);
        let p = model.predict(&v).unwrap();
        assert!((p - 0.4).abs() < 1e-12);
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let model = TwoMember;
        let v = FeatureVector::new(vec![1.0, 0.0]);
        match model.predict(&v) {
            Err(ReliabilityError::ShapeMismatch { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected shape mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn default_importance_is_uniform() {
        let imp = TwoMember.feature_importance();
        assert_eq!(imp.len(), 3);
        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
