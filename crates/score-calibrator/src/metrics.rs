//! Calibration quality metrics.

use serde::{Deserialize, Serialize};

use reliability_core::EceBands;

use crate::calibrator::{CalibrationMap, CalibrationSample};

const N_BINS: usize = 10;

/// Sets smaller than this fit normally but carry a low-confidence flag.
const LOW_SAMPLE_BELOW: usize = 10;

/// Scalar measures of how well calibrated output tracks observed outcomes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationMetrics {
    /// Expected calibration error over 10 equal-width bins, weighted by
    /// bin occupancy.
    pub ece: f64,
    /// Mean squared error against the binary outcome.
    pub brier_score: f64,
    /// |mean confidence - accuracy| at the 0.5 decision threshold.
    pub confidence_accuracy_gap: f64,
    /// Largest single-bin |predicted - observed| deviation.
    pub max_bin_error: f64,
    pub sample_size: usize,
    /// Set when the calibration set held fewer than 10 samples.
    pub low_sample: bool,
}

/// Quality label from ECE bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl CalibrationQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationQuality::Excellent => "Excellent",
            CalibrationQuality::Good => "Good",
            CalibrationQuality::Fair => "Fair",
            CalibrationQuality::Poor => "Poor",
        }
    }
}

/// One bin of the reliability diagram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityBin {
    pub avg_predicted: f64,
    pub observed_rate: f64,
    pub count: usize,
}

/// Quality label plus the concrete numbers and advice strings callers
/// surface to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub quality: CalibrationQuality,
    pub ece: f64,
    pub brier_score: f64,
    pub recommendations: Vec<String>,
}

/// Compute calibration metrics of a fitted map against a labeled set.
pub fn metrics(samples: &[CalibrationSample], map: &CalibrationMap) -> CalibrationMetrics {
    let n = samples.len();
    if n == 0 {
        return CalibrationMetrics {
            low_sample: true,
            ..CalibrationMetrics::default()
        };
    }

    let calibrated: Vec<(f64, f64)> = samples
        .iter()
        .map(|s| (map.predict(s.raw_score), if s.outcome { 1.0 } else { 0.0 }))
        .collect();

    let bins = bin_samples(&calibrated);
    let mut ece = 0.0;
    let mut max_bin_error: f64 = 0.0;
    for bin in &bins {
        if bin.count == 0 {
            continue;
        }
        let error = (bin.avg_predicted - bin.observed_rate).abs();
        ece += error * bin.count as f64 / n as f64;
        max_bin_error = max_bin_error.max(error);
    }

    let brier_score = calibrated.iter().map(|(p, y)| (p - y).powi(2)).sum::<f64>() / n as f64;

    let mean_confidence =
        calibrated.iter().map(|(p, _)| p.max(1.0 - p)).sum::<f64>() / n as f64;
    let accuracy = calibrated
        .iter()
        .filter(|(p, y)| (*p >= 0.5) == (*y > 0.5))
        .count() as f64
        / n as f64;
    let confidence_accuracy_gap = (mean_confidence - accuracy).abs();

    CalibrationMetrics {
        ece,
        brier_score,
        confidence_accuracy_gap,
        max_bin_error,
        sample_size: n,
        low_sample: n < LOW_SAMPLE_BELOW,
    }
}

/// Reliability-diagram data for plotting, occupied bins only.
pub fn reliability_curve(
    samples: &[CalibrationSample],
    map: &CalibrationMap,
) -> Vec<ReliabilityBin> {
    let calibrated: Vec<(f64, f64)> = samples
        .iter()
        .map(|s| (map.predict(s.raw_score), if s.outcome { 1.0 } else { 0.0 }))
        .collect();
    bin_samples(&calibrated)
        .into_iter()
        .filter(|b| b.count > 0)
        .collect()
}

fn bin_samples(calibrated: &[(f64, f64)]) -> Vec<ReliabilityBin> {
    let mut sums = vec![(0.0, 0.0, 0usize); N_BINS];
    for (p, y) in calibrated {
        let idx = ((p * N_BINS as f64) as usize).min(N_BINS - 1);
        sums[idx].0 += p;
        sums[idx].1 += y;
        sums[idx].2 += 1;
    }
    sums.into_iter()
        .map(|(p_sum, y_sum, count)| {
            if count == 0 {
                ReliabilityBin {
                    avg_predicted: 0.0,
                    observed_rate: 0.0,
                    count,
                }
            } else {
                ReliabilityBin {
                    avg_predicted: p_sum / count as f64,
                    observed_rate: y_sum / count as f64,
                    count,
                }
            }
        })
        .collect()
}

/// Quality label from ECE against the injectable bands.
pub fn quality(ece: f64, bands: &EceBands) -> CalibrationQuality {
    if ece < bands.excellent_below {
        CalibrationQuality::Excellent
    } else if ece < bands.good_below {
        CalibrationQuality::Good
    } else if ece < bands.fair_below {
        CalibrationQuality::Fair
    } else {
        CalibrationQuality::Poor
    }
}

/// Full quality assessment with operator-facing recommendations.
pub fn assess(metrics: &CalibrationMetrics, bands: &EceBands) -> QualityAssessment {
    let quality = quality(metrics.ece, bands);
    let mut recommendations = Vec::new();

    if metrics.ece >= bands.good_below {
        recommendations.push("Model probabilities are not well calibrated.".to_string());
        recommendations
            .push("Consider isotonic regression with a larger calibration set.".to_string());
    }
    if metrics.confidence_accuracy_gap > 0.2 {
        recommendations.push(
            "Confidence-accuracy gap remains significant; more calibration data may help."
                .to_string(),
        );
    }
    if metrics.low_sample {
        recommendations.push(format!(
            "Calibration set held only {} samples; metrics are low-confidence.",
            metrics.sample_size
        ));
    }
    if recommendations.is_empty() {
        recommendations.push("Calibration quality is acceptable.".to_string());
    }

    QualityAssessment {
        quality,
        ece: metrics.ece,
        brier_score: metrics.brier_score,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrator::fit_isotonic;

    fn well_spread_set() -> Vec<CalibrationSample> {
        (0..200)
            .map(|i| {
                let raw = i as f64 / 199.0;
                let noise = ((i * 2654435761_usize) % 1000) as f64 / 1000.0;
                CalibrationSample::new(raw, noise < raw)
            })
            .collect()
    }

    #[test]
    fn metrics_are_bounded() {
        let set = well_spread_set();
        let map = fit_isotonic(&set).unwrap();
        let m = metrics(&set, &map);
        assert!((0.0..=1.0).contains(&m.ece));
        assert!((0.0..=1.0).contains(&m.brier_score));
        assert!((0.0..=1.0).contains(&m.confidence_accuracy_gap));
        assert!(m.max_bin_error >= m.ece || m.max_bin_error >= 0.0);
        assert_eq!(m.sample_size, set.len());
        assert!(!m.low_sample);
    }

    #[test]
    fn isotonic_fit_has_low_ece_on_its_own_set() {
        let set = well_spread_set();
        let map = fit_isotonic(&set).unwrap();
        // Isotonic regression reproduces bin frequencies on the data it
        // was fitted on, so ECE should be small.
        assert!(map.metrics().ece < 0.10);
    }

    #[test]
    fn quality_bands() {
        let bands = EceBands::default();
        assert_eq!(quality(0.03, &bands), CalibrationQuality::Excellent);
        assert_eq!(quality(0.07, &bands), CalibrationQuality::Good);
        assert_eq!(quality(0.15, &bands), CalibrationQuality::Fair);
        assert_eq!(quality(0.25, &bands), CalibrationQuality::Poor);
    }

    #[test]
    fn assessment_mentions_low_sample() {
        let m = CalibrationMetrics {
            ece: 0.02,
            sample_size: 5,
            low_sample: true,
            ..CalibrationMetrics::default()
        };
        let a = assess(&m, &EceBands::default());
        assert_eq!(a.quality, CalibrationQuality::Excellent);
        assert!(a.recommendations.iter().any(|r| r.contains("low-confidence")));
    }

    #[test]
    fn reliability_curve_skips_empty_bins() {
        let set = well_spread_set();
        let map = fit_isotonic(&set).unwrap();
        let curve = reliability_curve(&set, &map);
        assert!(!curve.is_empty());
        assert!(curve.iter().all(|b| b.count > 0));
        for bin in &curve {
            assert!((0.0..=1.0).contains(&bin.avg_predicted));
            assert!((0.0..=1.0).contains(&bin.observed_rate));
        }
    }
}
