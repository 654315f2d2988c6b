//! Injectable threshold tables.
//!
//! Every quality/ECE/effect-size cutoff lives here with documented
//! defaults so policy changes never require touching engine code.

use serde::{Deserialize, Serialize};

/// Width cutoffs for confidence-interval quality labels.
///
/// Defaults: High below 0.15, Medium up to 0.30, Low above.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntervalWidthBands {
    pub high_below: f64,
    pub medium_below_or_equal: f64,
}

impl Default for IntervalWidthBands {
    fn default() -> Self {
        Self {
            high_below: 0.15,
            medium_below_or_equal: 0.30,
        }
    }
}

/// Width cutoffs for the five-way assessment used in human-readable
/// summaries.
///
/// Defaults: Very High below 0.10, High below 0.20, Medium below 0.35,
/// Low below 0.50, Very Low otherwise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssessmentBands {
    pub very_high_below: f64,
    pub high_below: f64,
    pub medium_below: f64,
    pub low_below: f64,
}

impl Default for AssessmentBands {
    fn default() -> Self {
        Self {
            very_high_below: 0.10,
            high_below: 0.20,
            medium_below: 0.35,
            low_below: 0.50,
        }
    }
}

/// Score cutoffs used when interpreting a prediction alongside its
/// confidence interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBands {
    pub unlikely_below: f64,
    pub borderline_low_below: f64,
    pub borderline_high_below: f64,
}

impl Default for ScoreBands {
    fn default() -> Self {
        Self {
            unlikely_below: 0.25,
            borderline_low_below: 0.50,
            borderline_high_below: 0.75,
        }
    }
}

/// ECE cutoffs for calibration quality labels.
///
/// Defaults: Excellent below 0.05, Good below 0.10, Fair below 0.20,
/// Poor otherwise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EceBands {
    pub excellent_below: f64,
    pub good_below: f64,
    pub fair_below: f64,
}

impl Default for EceBands {
    fn default() -> Self {
        Self {
            excellent_below: 0.05,
            good_below: 0.10,
            fair_below: 0.20,
        }
    }
}

/// Cohen's-d cutoffs for effect-size labels (0.2 / 0.5 / 0.8).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EffectSizeBands {
    pub small_at: f64,
    pub medium_at: f64,
    pub large_at: f64,
}

impl Default for EffectSizeBands {
    fn default() -> Self {
        Self {
            small_at: 0.2,
            medium_at: 0.5,
            large_at: 0.8,
        }
    }
}

/// Contribution-magnitude cutoffs for attribution explanation buckets.
///
/// Defaults: below 5% negligible, 5-15% minor, 15-30% moderate,
/// above 30% strong.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttributionBuckets {
    pub negligible_below: f64,
    pub minor_below: f64,
    pub moderate_below: f64,
}

impl Default for AttributionBuckets {
    fn default() -> Self {
        Self {
            negligible_below: 0.05,
            minor_below: 0.15,
            moderate_below: 0.30,
        }
    }
}

/// Comparator sample-size clamp. Requests outside the range are clamped,
/// not rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ComparatorLimits {
    pub min_samples: usize,
    pub max_samples: usize,
}

impl Default for ComparatorLimits {
    fn default() -> Self {
        Self {
            min_samples: 50,
            max_samples: 1000,
        }
    }
}

impl ComparatorLimits {
    pub fn clamp(&self, requested: usize) -> usize {
        requested.clamp(self.min_samples, self.max_samples)
    }
}
