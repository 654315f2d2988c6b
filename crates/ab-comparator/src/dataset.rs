//! Evaluation datasets and ordered prediction sweeps.
//!
//! The generated dataset is a fallback for when no real evaluation set is
//! supplied; every comparison entry point takes a plain `&[FeatureVector]`
//! so real datasets substitute without code changes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use reliability_core::{ComparatorLimits, EnsembleModel, FeatureVector, ReliabilityError};

/// Deterministic, class-balanced synthetic feature vectors.
///
/// The requested size is clamped into the configured range, never
/// rejected. The first half leans positive (features mostly on), the
/// second half leans negative, giving a balanced score spread.
pub fn generate_dataset(
    requested: usize,
    feature_count: usize,
    seed: u64,
    limits: &ComparatorLimits,
) -> Vec<FeatureVector> {
    let n = limits.clamp(requested);
    if n != requested {
        tracing::debug!(requested, clamped = n, "comparison sample size clamped");
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let half = n / 2;

    (0..n)
        .map(|i| {
            let on_probability = if i < half { 0.7 } else { 0.3 };
            let values = (0..feature_count)
                .map(|_| if rng.gen_bool(on_probability) { 1.0 } else { 0.0 })
                .collect();
            FeatureVector::new(values)
        })
        .collect()
}

/// Aggregate scores for every vector, order matching the dataset.
pub fn run_predictions(
    model: &dyn EnsembleModel,
    dataset: &[FeatureVector],
) -> Result<Vec<f64>, ReliabilityError> {
    dataset.par_iter().map(|v| model.predict(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reliability_core::SyntheticEnsemble;

    #[test]
    fn sample_size_is_clamped_not_rejected() {
        let limits = ComparatorLimits::default();
        assert_eq!(generate_dataset(10, 5, 1, &limits).len(), 50);
        assert_eq!(generate_dataset(5000, 5, 1, &limits).len(), 1000);
        assert_eq!(generate_dataset(200, 5, 1, &limits).len(), 200);
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let limits = ComparatorLimits::default();
        let a = generate_dataset(100, 5, 42, &limits);
        let b = generate_dataset(100, 5, 42, &limits);
        assert_eq!(a, b);
        let c = generate_dataset(100, 5, 43, &limits);
        assert_ne!(a, c);
    }

    #[test]
    fn halves_are_class_imbalanced_in_opposite_directions() {
        let limits = ComparatorLimits::default();
        let data = generate_dataset(1000, 5, 7, &limits);
        let on_rate = |vs: &[FeatureVector]| -> f64 {
            let total: f64 = vs.iter().flat_map(|v| v.values()).sum();
            total / (vs.len() * 5) as f64
        };
        assert!(on_rate(&data[..500]) > 0.6);
        assert!(on_rate(&data[500..]) < 0.4);
    }

    #[test]
    fn predictions_preserve_dataset_order() {
        let limits = ComparatorLimits::default();
        let model = SyntheticEnsemble::balanced(20, 5, 3);
        let data = generate_dataset(100, 5, 9, &limits);
        let scores = run_predictions(&model, &data).unwrap();
        assert_eq!(scores.len(), data.len());
        for (v, s) in data.iter().zip(&scores) {
            assert_eq!(model.predict(v).unwrap(), *s);
        }
    }
}
