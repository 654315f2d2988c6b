use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use reliability_core::{EnsembleModel, FeatureVector, ReliabilityError};

/// Attribution variant used to produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributionMethod {
    /// Global importance weighted by observed values, rescaled to the
    /// baseline score delta. O(feature_count) model queries.
    FastImportance,
    /// Monte Carlo Shapley estimate over random feature coalitions.
    MonteCarloShapley,
}

/// Signed per-feature contributions for one prediction.
///
/// Contributions are ordered by feature index and sum approximately to
/// `prediction - baseline` (exactly for the fast variant outside the
/// degenerate all-zero case; within sampling error for Monte Carlo).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionResult {
    pub contributions: Vec<f64>,
    pub baseline: f64,
    pub prediction: f64,
    pub method: AttributionMethod,
}

/// One entry of a ranked attribution view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RankedContribution {
    pub feature_index: usize,
    pub contribution: f64,
}

/// Fast importance-based attribution.
///
/// `w[i] = global_importance[i] * |value[i]| * sign[i]` where the sign
/// comes from the score delta between the observed vector and the vector
/// with feature i zeroed. Raw weights are rescaled so they sum to
/// `score(v) - score(zero)`; if the weights cancel out entirely the
/// contributions are reported as zero.
pub fn fast_attribution(
    model: &dyn EnsembleModel,
    features: &FeatureVector,
) -> Result<AttributionResult, ReliabilityError> {
    model.check_features(features)?;

    let prediction = model.predict(features)?;
    let zero = features.zero_like();
    let baseline = model.predict(&zero)?;

    let importance = model.feature_importance();
    if importance.len() != features.len() {
        return Err(ReliabilityError::UnsupportedModel(format!(
            "model reports {} importance weights for {} features",
            importance.len(),
            features.len()
        )));
    }

    let mut weights = Vec::with_capacity(features.len());
    for (i, value) in features.values().iter().enumerate() {
        if *value == 0.0 {
            weights.push(0.0);
            continue;
        }
        let mut ablated = features.values().to_vec();
        ablated[i] = 0.0;
        let without = model.predict(&FeatureVector::new(ablated))?;
        let sign = (prediction - without).signum();
        weights.push(importance[i] * value.abs() * sign);
    }

    let total: f64 = weights.iter().sum();
    let target = prediction - baseline;
    let contributions = if total.abs() > 1e-9 {
        let scale = target / total;
        weights.iter().map(|w| w * scale).collect()
    } else {
        vec![0.0; weights.len()]
    };

    Ok(AttributionResult {
        contributions,
        baseline,
        prediction,
        method: AttributionMethod::FastImportance,
    })
}

/// Monte Carlo Shapley-style attribution.
///
/// For each feature, samples `n_samples` random inclusion subsets of the
/// other features and averages the marginal score change from adding the
/// feature. Deterministic for a given seed and independent of evaluation
/// order: each feature derives its own RNG stream from the caller seed.
pub fn exact_attribution(
    model: &dyn EnsembleModel,
    features: &FeatureVector,
    n_samples: usize,
    seed: u64,
) -> Result<AttributionResult, ReliabilityError> {
    if n_samples == 0 {
        return Err(ReliabilityError::InvalidParameter(
            "n_samples must be positive".to_string(),
        ));
    }
    model.check_features(features)?;

    let prediction = model.predict(features)?;
    let baseline = model.predict(&features.zero_like())?;
    let k = features.len();

    let contributions: Vec<f64> = (0..k)
        .into_par_iter()
        .map(|i| {
            // Distinct stream per feature keeps parallel runs reproducible.
            let stream = seed ^ (i as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            let mut rng = StdRng::seed_from_u64(stream);
            let mut total = 0.0;
            for _ in 0..n_samples {
                let mut with_i = vec![0.0; k];
                for (j, value) in features.values().iter().enumerate() {
                    if j == i || rng.gen_bool(0.5) {
                        with_i[j] = *value;
                    }
                }
                let mut without_i = with_i.clone();
                without_i[i] = 0.0;
                let p_with = model.predict(&FeatureVector::new(with_i))?;
                let p_without = model.predict(&FeatureVector::new(without_i))?;
                total += p_with - p_without;
            }
            Ok(total / n_samples as f64)
        })
        .collect::<Result<Vec<_>, ReliabilityError>>()?;

    tracing::debug!(n_samples, features = k, "monte carlo attribution complete");

    Ok(AttributionResult {
        contributions,
        baseline,
        prediction,
        method: AttributionMethod::MonteCarloShapley,
    })
}

/// Top-k contributions by absolute magnitude, ties broken by ascending
/// feature index.
pub fn top_k(result: &AttributionResult, k: usize) -> Vec<RankedContribution> {
    let mut ranked: Vec<RankedContribution> = result
        .contributions
        .iter()
        .enumerate()
        .map(|(feature_index, c)| RankedContribution {
            feature_index,
            contribution: *c,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.contribution
            .abs()
            .partial_cmp(&a.contribution.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.feature_index.cmp(&b.feature_index))
    });
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use reliability_core::SyntheticEnsemble;

    fn model() -> SyntheticEnsemble {
        SyntheticEnsemble::new(40, vec![2.0, 1.0, 1.5, 0.5, 1.0], 0.05, 11)
    }

    #[test]
    fn fast_contributions_sum_to_score_delta() {
        let m = model();
        let mut rng = StdRng::seed_from_u64(3);
        let mut ok = 0;
        let trials = 100;
        for _ in 0..trials {
            let v = FeatureVector::new((0..5).map(|_| f64::from(rng.gen_range(0..2u8))).collect());
            let r = fast_attribution(&m, &v).unwrap();
            let sum: f64 = r.contributions.iter().sum();
            if (sum - (r.prediction - r.baseline)).abs() < 1e-2 {
                ok += 1;
            }
        }
        assert!(ok as f64 / trials as f64 >= 0.95, "only {ok}/{trials} within tolerance");
    }

    #[test]
    fn fast_zero_vector_attributes_nothing() {
        let m = model();
        let r = fast_attribution(&m, &FeatureVector::new(vec![0.0; 5])).unwrap();
        assert!(r.contributions.iter().all(|c| *c == 0.0));
    }

    #[test]
    fn exact_is_deterministic_for_a_seed() {
        let m = model();
        let v = FeatureVector::new(vec![1.0, 0.0, 1.0, 1.0, 0.0]);
        let a = exact_attribution(&m, &v, 64, 42).unwrap();
        let b = exact_attribution(&m, &v, 64, 42).unwrap();
        assert_eq!(a.contributions, b.contributions);

        let c = exact_attribution(&m, &v, 64, 43).unwrap();
        assert_ne!(a.contributions, c.contributions);
    }

    #[test]
    fn exact_rejects_zero_samples() {
        let m = model();
        let v = FeatureVector::new(vec![1.0; 5]);
        let err = exact_attribution(&m, &v, 0, 1).unwrap_err();
        assert!(matches!(err, ReliabilityError::InvalidParameter(_)));
    }

    #[test]
    fn exact_active_features_get_positive_credit() {
        // All weights positive, so present features can only push the
        // linear score up.
        let m = model();
        let v = FeatureVector::new(vec![1.0, 0.0, 1.0, 0.0, 0.0]);
        let r = exact_attribution(&m, &v, 200, 9).unwrap();
        assert!(r.contributions[0] > 0.0);
        assert!(r.contributions[2] > 0.0);
        assert!(r.contributions[1].abs() < 1e-9);
    }

    #[test]
    fn top_k_ranks_by_magnitude_then_index() {
        let result = AttributionResult {
            contributions: vec![0.1, -0.3, 0.3, 0.05],
            baseline: 0.0,
            prediction: 0.15,
            method: AttributionMethod::FastImportance,
        };
        let ranked = top_k(&result, 3);
        assert_eq!(ranked.len(), 3);
        // |-0.3| == |0.3|: lower index wins the tie.
        assert_eq!(ranked[0].feature_index, 1);
        assert_eq!(ranked[1].feature_index, 2);
        assert_eq!(ranked[2].feature_index, 0);
    }

    #[test]
    fn wrong_length_vector_is_rejected() {
        let m = model();
        let v = FeatureVector::new(vec![1.0, 0.0]);
        assert!(matches!(
            fast_attribution(&m, &v),
            Err(ReliabilityError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            exact_attribution(&m, &v, 16, 0),
            Err(ReliabilityError::ShapeMismatch { .. })
        ));
    }
}
