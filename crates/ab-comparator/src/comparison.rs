//! Hypothesis tests and the full A/B comparison report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use reliability_core::{
    ComparatorLimits, EffectSizeBands, EnsembleModel, FeatureVector, ReliabilityError,
};

use crate::dataset::{generate_dataset, run_predictions};
use crate::stats::{
    confidence_interval, descriptive_stats, intervals_overlap, mean, sample_std,
    ConfidenceInterval, DescriptiveStats,
};

const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Independent two-sample t-test with pooled variance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TTestResult {
    pub statistic: f64,
    pub p_value: f64,
    /// Cohen's d, normalized by the pooled standard deviation.
    pub cohens_d: f64,
    pub significant: bool,
}

/// Mann-Whitney U, the distribution-free cross-check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MannWhitneyResult {
    pub u_statistic: f64,
    pub p_value: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
    Tie,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::A => "A",
            Winner::B => "B",
            Winner::Tie => "tie",
        }
    }
}

/// Full result of one comparison run. Ephemeral: generated on demand and
/// handed to the caller for optional export, never persisted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub sample_size: usize,
    pub stats_a: DescriptiveStats,
    pub stats_b: DescriptiveStats,
    pub t_test: TTestResult,
    pub mann_whitney: MannWhitneyResult,
    pub ci_a: ConfidenceInterval,
    pub ci_b: ConfidenceInterval,
    pub ci_overlap: bool,
    pub winner: Winner,
    pub effect_size_label: String,
    pub confidence_label: String,
    pub recommendation: String,
    pub generated_at: DateTime<Utc>,
}

fn require_samples(scores: &[f64], side: &str) -> Result<(), ReliabilityError> {
    if scores.len() < 2 {
        return Err(ReliabilityError::InsufficientData(format!(
            "sample {side} needs at least 2 scores, got {}",
            scores.len()
        )));
    }
    Ok(())
}

/// Pooled-variance two-sample t-test.
///
/// Symmetric: swapping the samples flips the statistic's sign and keeps
/// the p-value. Two identical samples report statistic 0 and p-value 1.
pub fn t_test(a: &[f64], b: &[f64]) -> Result<TTestResult, ReliabilityError> {
    require_samples(a, "A")?;
    require_samples(b, "B")?;

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (mean_a, mean_b) = (mean(a), mean(b));
    let (std_a, std_b) = (sample_std(a), sample_std(b));

    let df = na + nb - 2.0;
    let pooled_var = ((na - 1.0) * std_a.powi(2) + (nb - 1.0) * std_b.powi(2)) / df;
    let standard_error = (pooled_var * (1.0 / na + 1.0 / nb)).sqrt();

    let pooled_std = ((std_a.powi(2) + std_b.powi(2)) / 2.0).sqrt();
    let cohens_d = if pooled_std > 1e-12 {
        (mean_a - mean_b) / pooled_std
    } else {
        0.0
    };

    if standard_error <= 1e-12 {
        // Zero spread in both samples: no evidence of any difference.
        return Ok(TTestResult {
            statistic: 0.0,
            p_value: 1.0,
            cohens_d,
            significant: false,
        });
    }

    let statistic = (mean_a - mean_b) / standard_error;
    let t_dist = StudentsT::new(0.0, 1.0, df).map_err(|e| {
        ReliabilityError::InvalidParameter(format!("bad t-distribution parameters: {e}"))
    })?;
    let p_value = (2.0 * (1.0 - t_dist.cdf(statistic.abs()))).clamp(0.0, 1.0);

    Ok(TTestResult {
        statistic,
        p_value,
        cohens_d,
        significant: p_value < SIGNIFICANCE_LEVEL,
    })
}

/// Average ranks of the pooled sample, ties shared.
fn average_ranks(pooled: &[(f64, usize)]) -> Vec<f64> {
    let mut ranks = vec![0.0; pooled.len()];
    let mut i = 0;
    while i < pooled.len() {
        let mut j = i;
        while j + 1 < pooled.len() && pooled[j + 1].0 == pooled[i].0 {
            j += 1;
        }
        let shared = (i + j + 2) as f64 / 2.0; // 1-based average rank
        for entry in pooled.iter().take(j + 1).skip(i) {
            ranks[entry.1] = shared;
        }
        i = j + 1;
    }
    ranks
}

/// Mann-Whitney U test, two-sided, tie-corrected normal approximation with
/// continuity correction. Reports U of sample A.
pub fn mann_whitney(a: &[f64], b: &[f64]) -> Result<MannWhitneyResult, ReliabilityError> {
    require_samples(a, "A")?;
    require_samples(b, "B")?;

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let n = na + nb;

    let mut pooled: Vec<(f64, usize)> = a
        .iter()
        .chain(b.iter())
        .copied()
        .enumerate()
        .map(|(i, v)| (v, i))
        .collect();
    pooled.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(std::cmp::Ordering::Equal));
    let ranks = average_ranks(&pooled);

    let rank_sum_a: f64 = ranks[..a.len()].iter().sum();
    let u_statistic = rank_sum_a - na * (na + 1.0) / 2.0;

    // Tie correction over the pooled sample.
    let mut tie_term = 0.0;
    let mut i = 0;
    while i < pooled.len() {
        let mut j = i;
        while j + 1 < pooled.len() && pooled[j + 1].0 == pooled[i].0 {
            j += 1;
        }
        let t = (j - i + 1) as f64;
        tie_term += t.powi(3) - t;
        i = j + 1;
    }

    let mu = na * nb / 2.0;
    let variance = na * nb / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

    if variance <= 1e-12 {
        // Every pooled value identical: distributions cannot differ.
        return Ok(MannWhitneyResult {
            u_statistic,
            p_value: 1.0,
            significant: false,
        });
    }

    let adjusted = ((u_statistic - mu).abs() - 0.5).max(0.0);
    let z = adjusted / variance.sqrt();
    let normal = Normal::new(0.0, 1.0).map_err(|e| {
        ReliabilityError::InvalidParameter(format!("bad normal parameters: {e}"))
    })?;
    let p_value = (2.0 * (1.0 - normal.cdf(z))).clamp(0.0, 1.0);

    Ok(MannWhitneyResult {
        u_statistic,
        p_value,
        significant: p_value < SIGNIFICANCE_LEVEL,
    })
}

/// A/B comparison engine with injectable effect-size bands and sample
/// clamp limits.
pub struct Comparator {
    limits: ComparatorLimits,
    effect_bands: EffectSizeBands,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(ComparatorLimits::default(), EffectSizeBands::default())
    }
}

impl Comparator {
    pub fn new(limits: ComparatorLimits, effect_bands: EffectSizeBands) -> Self {
        Self {
            limits,
            effect_bands,
        }
    }

    /// Compare two models over a shared evaluation set.
    pub fn compare(
        &self,
        model_a: &dyn EnsembleModel,
        model_b: &dyn EnsembleModel,
        dataset: &[FeatureVector],
    ) -> Result<ComparisonReport, ReliabilityError> {
        let scores_a = run_predictions(model_a, dataset)?;
        let scores_b = run_predictions(model_b, dataset)?;
        self.summarize(&scores_a, &scores_b)
    }

    /// Compare using the synthetic fallback dataset; `requested` is
    /// clamped into the configured range.
    pub fn compare_generated(
        &self,
        model_a: &dyn EnsembleModel,
        model_b: &dyn EnsembleModel,
        requested: usize,
        seed: u64,
    ) -> Result<ComparisonReport, ReliabilityError> {
        let dataset = generate_dataset(requested, model_a.feature_count(), seed, &self.limits);
        self.compare(model_a, model_b, &dataset)
    }

    /// Build the full report from two already-generated score sequences.
    pub fn summarize(
        &self,
        scores_a: &[f64],
        scores_b: &[f64],
    ) -> Result<ComparisonReport, ReliabilityError> {
        let stats_a = descriptive_stats(scores_a)?;
        let stats_b = descriptive_stats(scores_b)?;
        let t = t_test(scores_a, scores_b)?;
        let mw = mann_whitney(scores_a, scores_b)?;
        let ci_a = confidence_interval(scores_a, 0.95)?;
        let ci_b = confidence_interval(scores_b, 0.95)?;

        let winner = if t.significant {
            if stats_a.mean > stats_b.mean {
                Winner::A
            } else {
                Winner::B
            }
        } else {
            Winner::Tie
        };

        let effect_size_label = self.effect_label(t.cohens_d);
        let confidence_label = if t.significant {
            "High (p < 0.05)".to_string()
        } else {
            "Low (p >= 0.05)".to_string()
        };
        let recommendation = match winner {
            Winner::B => format!(
                "Candidate model B shows a {effect_size_label} improvement; promote it."
            ),
            Winner::A => format!(
                "Baseline model A remains preferred ({effect_size_label} difference)."
            ),
            Winner::Tie => {
                "Models perform equivalently; decide on other criteria.".to_string()
            }
        };

        tracing::info!(
            winner = winner.as_str(),
            p_value = t.p_value,
            cohens_d = t.cohens_d,
            "comparison complete"
        );

        Ok(ComparisonReport {
            sample_size: scores_a.len(),
            ci_overlap: intervals_overlap(&ci_a, &ci_b),
            stats_a,
            stats_b,
            t_test: t,
            mann_whitney: mw,
            ci_a,
            ci_b,
            winner,
            effect_size_label,
            confidence_label,
            recommendation,
            generated_at: Utc::now(),
        })
    }

    /// Fixed Cohen's-d bands: below 0.2 negligible, then small, medium,
    /// large.
    pub fn effect_label(&self, cohens_d: f64) -> String {
        let magnitude = cohens_d.abs();
        let label = if magnitude < self.effect_bands.small_at {
            "negligible"
        } else if magnitude < self.effect_bands.medium_at {
            "small"
        } else if magnitude < self.effect_bands.large_at {
            "medium"
        } else {
            "large"
        };
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reliability_core::SyntheticEnsemble;

    fn shifted_samples() -> (Vec<f64>, Vec<f64>) {
        let a: Vec<f64> = (0..200).map(|i| 0.40 + (i % 20) as f64 * 0.005).collect();
        let b: Vec<f64> = (0..200).map(|i| 0.55 + (i % 20) as f64 * 0.005).collect();
        (a, b)
    }

    #[test]
    fn t_test_is_antisymmetric() {
        let (a, b) = shifted_samples();
        let ab = t_test(&a, &b).unwrap();
        let ba = t_test(&b, &a).unwrap();
        assert!((ab.statistic + ba.statistic).abs() < 1e-9);
        assert!((ab.p_value - ba.p_value).abs() < 1e-12);
        assert!((ab.cohens_d + ba.cohens_d).abs() < 1e-12);
    }

    #[test]
    fn clear_shift_is_significant() {
        let (a, b) = shifted_samples();
        let t = t_test(&a, &b).unwrap();
        assert!(t.significant);
        assert!(t.p_value < 0.001);
        assert!(t.cohens_d < 0.0);

        let mw = mann_whitney(&a, &b).unwrap();
        assert!(mw.significant);
    }

    #[test]
    fn identical_samples_are_a_tie() {
        let scores: Vec<f64> = (0..100).map(|i| 0.3 + (i % 10) as f64 * 0.02).collect();
        let t = t_test(&scores, &scores).unwrap();
        assert_eq!(t.statistic, 0.0);
        assert!((t.p_value - 1.0).abs() < 1e-9);
        assert!(!t.significant);
        assert_eq!(t.cohens_d, 0.0);

        let mw = mann_whitney(&scores, &scores).unwrap();
        assert!(!mw.significant);
        assert!((mw.p_value - 1.0).abs() < 1e-9);

        let report = Comparator::default().summarize(&scores, &scores).unwrap();
        assert_eq!(report.winner, Winner::Tie);
        assert!(report.ci_overlap);
    }

    #[test]
    fn constant_samples_do_not_produce_nan() {
        let a = vec![0.5; 50];
        let b = vec![0.5; 50];
        let t = t_test(&a, &b).unwrap();
        assert_eq!(t.statistic, 0.0);
        assert_eq!(t.p_value, 1.0);

        let mw = mann_whitney(&a, &b).unwrap();
        assert_eq!(mw.p_value, 1.0);
    }

    #[test]
    fn effect_labels_follow_cohen_bands() {
        let c = Comparator::default();
        assert_eq!(c.effect_label(0.1), "negligible");
        assert_eq!(c.effect_label(-0.3), "small");
        assert_eq!(c.effect_label(0.6), "medium");
        assert_eq!(c.effect_label(-1.2), "large");
    }

    #[test]
    fn mann_whitney_u_of_fully_separated_samples() {
        let a = vec![0.1, 0.2, 0.3];
        let b = vec![0.7, 0.8, 0.9];
        let mw = mann_whitney(&a, &b).unwrap();
        // Every A score ranks below every B score.
        assert_eq!(mw.u_statistic, 0.0);
    }

    #[test]
    fn generated_comparison_of_distinct_models_runs_end_to_end() {
        let baseline = SyntheticEnsemble::new(30, vec![1.0; 5], 0.05, 1);
        let candidate = SyntheticEnsemble::new(30, vec![2.0, 1.0, 1.0, 1.0, 0.5], 0.05, 2);
        let report = Comparator::default()
            .compare_generated(&baseline, &candidate, 10, 42)
            .unwrap();
        assert_eq!(report.sample_size, 50); // clamped up from 10
        assert!(!report.recommendation.is_empty());
        assert_eq!(
            report.effect_size_label,
            Comparator::default().effect_label(report.t_test.cohens_d)
        );
    }

    #[test]
    fn same_model_twice_is_a_tie() {
        let model = SyntheticEnsemble::balanced(30, 5, 9);
        let report = Comparator::default()
            .compare_generated(&model, &model, 200, 7)
            .unwrap();
        assert_eq!(report.winner, Winner::Tie);
        assert!((report.t_test.p_value - 1.0).abs() < 1e-9);
    }
}
