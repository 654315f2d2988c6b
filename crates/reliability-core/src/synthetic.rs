//! Deterministic reference ensemble.
//!
//! A small weighted-vote model whose members are the base linear score
//! plus a fixed seeded offset. It stands in for the externally loaded
//! production model in tests and in the comparator's fallback dataset
//! path; anything implementing [`EnsembleModel`] is substitutable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{EnsembleModel, FeatureVector, ReliabilityError};

#[derive(Debug, Clone)]
pub struct SyntheticEnsemble {
    weights: Vec<f64>,
    member_offsets: Vec<f64>,
}

impl SyntheticEnsemble {
    /// Build an ensemble with explicit feature weights. `spread` controls
    /// how far member predictions scatter around the base score; zero
    /// spread gives unanimous members.
    pub fn new(member_count: usize, weights: Vec<f64>, spread: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let member_offsets = (0..member_count)
            .map(|_| {
                if spread > 0.0 {
                    rng.gen_range(-spread..=spread)
                } else {
                    0.0
                }
            })
            .collect();
        Self {
            weights,
            member_offsets,
        }
    }

    /// Uniform-weight ensemble with a mild default scatter.
    pub fn balanced(member_count: usize, feature_count: usize, seed: u64) -> Self {
        Self::new(member_count, vec![1.0; feature_count], 0.05, seed)
    }

    fn base_score(&self, features: &FeatureVector) -> f64 {
        let total: f64 = self.weights.iter().sum();
        if total <= 0.0 {
            return 0.5;
        }
        let weighted: f64 = self
            .weights
            .iter()
            .zip(features.values())
            .map(|(w, x)| w * x)
            .sum();
        (weighted / total).clamp(0.0, 1.0)
    }
}

impl EnsembleModel for SyntheticEnsemble {
    fn feature_count(&self) -> usize {
        self.weights.len()
    }

    fn member_count(&self) -> usize {
        self.member_offsets.len()
    }

    fn predict_member(
        &self,
        member: usize,
        features: &FeatureVector,
    ) -> Result<f64, ReliabilityError> {
        self.check_features(features)?;
        let offset = self.member_offsets.get(member).ok_or_else(|| {
            ReliabilityError::InvalidParameter(format!(
                "member index {} out of range ({} members)",
                member,
                self.member_offsets.len()
            ))
        })?;
        Ok((self.base_score(features) + offset).clamp(0.0, 1.0))
    }

    fn feature_importance(&self) -> Vec<f64> {
        let total: f64 = self.weights.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.weights.len()];
        }
        self.weights.iter().map(|w| w / total).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_identical_members() {
        let a = SyntheticEnsemble::balanced(20, 5, 42);
        let b = SyntheticEnsemble::balanced(20, 5, 42);
        let v = FeatureVector::new(vec![1.0, 0.0, 1.0, 0.0, 1.0]);
        for m in 0..20 {
            assert_eq!(a.predict_member(m, &v).unwrap(), b.predict_member(m, &v).unwrap());
        }
    }

    #[test]
    fn zero_spread_members_are_unanimous() {
        let model = SyntheticEnsemble::new(10, vec![1.0; 5], 0.0, 7);
        let v = FeatureVector::new(vec![1.0, 1.0, 0.0, 0.0, 0.0]);
        let first = model.predict_member(0, &v).unwrap();
        for m in 1..10 {
            assert_eq!(model.predict_member(m, &v).unwrap(), first);
        }
        assert!((first - 0.4).abs() < 1e-12);
    }

    #[test]
    fn predictions_stay_in_unit_interval() {
        let model = SyntheticEnsemble::new(50, vec![2.0, 1.0, 1.0], 0.3, 99);
        let v = FeatureVector::new(vec![1.0, 1.0, 1.0]);
        for m in 0..50 {
            let p = model.predict_member(m, &v).unwrap();
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn importance_is_normalized_weights() {
        let model = SyntheticEnsemble::new(5, vec![3.0, 1.0], 0.05, 1);
        let imp = model.feature_importance();
        assert!((imp[0] - 0.75).abs() < 1e-12);
        assert!((imp[1] - 0.25).abs() < 1e-12);
    }
}
