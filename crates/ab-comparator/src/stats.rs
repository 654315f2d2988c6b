//! Descriptive statistics and t-based confidence intervals.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use reliability_core::ReliabilityError;

/// Summary statistics of one score distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
}

/// t-distribution interval around a sample mean.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    var.sqrt()
}

/// Linear-interpolated percentile of an ascending-sorted slice.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// Mean, median, spread and quartiles of a score sequence.
pub fn descriptive_stats(scores: &[f64]) -> Result<DescriptiveStats, ReliabilityError> {
    if scores.is_empty() {
        return Err(ReliabilityError::InsufficientData(
            "cannot summarize an empty score sequence".to_string(),
        ));
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Ok(DescriptiveStats {
        mean: mean(scores),
        median: percentile_sorted(&sorted, 50.0),
        std: sample_std(scores),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        q25: percentile_sorted(&sorted, 25.0),
        q75: percentile_sorted(&sorted, 75.0),
    })
}

/// t-distribution confidence interval with n - 1 degrees of freedom.
pub fn confidence_interval(
    scores: &[f64],
    level: f64,
) -> Result<ConfidenceInterval, ReliabilityError> {
    if level <= 0.0 || level >= 1.0 {
        return Err(ReliabilityError::InvalidParameter(format!(
            "confidence level must be in (0, 1), got {level}"
        )));
    }
    if scores.len() < 2 {
        return Err(ReliabilityError::InsufficientData(
            "confidence interval requires at least 2 scores".to_string(),
        ));
    }

    let n = scores.len() as f64;
    let m = mean(scores);
    let sem = sample_std(scores) / n.sqrt();
    let df = n - 1.0;

    let margin = if sem > 0.0 {
        let t_dist = StudentsT::new(0.0, 1.0, df).map_err(|e| {
            ReliabilityError::InvalidParameter(format!("bad t-distribution parameters: {e}"))
        })?;
        let t_crit = t_dist.inverse_cdf(1.0 - (1.0 - level) / 2.0);
        t_crit * sem
    } else {
        0.0
    };

    Ok(ConfidenceInterval {
        mean: m,
        lower: m - margin,
        upper: m + margin,
        level,
    })
}

/// Whether two intervals share any mass.
pub fn intervals_overlap(a: &ConfidenceInterval, b: &ConfidenceInterval) -> bool {
    a.upper >= b.lower && b.upper >= a.lower
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptive_stats_of_known_sequence() {
        let scores = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let s = descriptive_stats(&scores).unwrap();
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 5.0);
        assert_eq!(s.q25, 2.0);
        assert_eq!(s.q75, 4.0);
        assert!((s.std - 1.5811388).abs() < 1e-6);
    }

    #[test]
    fn empty_sequence_is_insufficient() {
        assert!(matches!(
            descriptive_stats(&[]),
            Err(ReliabilityError::InsufficientData(_))
        ));
    }

    #[test]
    fn interval_brackets_the_mean() {
        let scores: Vec<f64> = (0..100).map(|i| 0.4 + (i % 10) as f64 * 0.01).collect();
        let ci = confidence_interval(&scores, 0.95).unwrap();
        assert!(ci.lower < ci.mean && ci.mean < ci.upper);
        assert_eq!(ci.level, 0.95);

        let wider = confidence_interval(&scores, 0.99).unwrap();
        assert!(wider.upper - wider.lower > ci.upper - ci.lower);
    }

    #[test]
    fn constant_scores_collapse_the_interval() {
        let scores = vec![0.5; 30];
        let ci = confidence_interval(&scores, 0.95).unwrap();
        assert_eq!(ci.lower, 0.5);
        assert_eq!(ci.upper, 0.5);
    }

    #[test]
    fn overlap_detection() {
        let a = ConfidenceInterval {
            mean: 0.5,
            lower: 0.4,
            upper: 0.6,
            level: 0.95,
        };
        let b = ConfidenceInterval {
            mean: 0.55,
            lower: 0.5,
            upper: 0.65,
            level: 0.95,
        };
        let c = ConfidenceInterval {
            mean: 0.8,
            lower: 0.7,
            upper: 0.9,
            level: 0.95,
        };
        assert!(intervals_overlap(&a, &b));
        assert!(intervals_overlap(&b, &a));
        assert!(!intervals_overlap(&a, &c));
    }

    #[test]
    fn bad_level_is_rejected() {
        let scores = vec![0.1, 0.2, 0.3];
        assert!(matches!(
            confidence_interval(&scores, 1.5),
            Err(ReliabilityError::InvalidParameter(_))
        ));
    }
}
