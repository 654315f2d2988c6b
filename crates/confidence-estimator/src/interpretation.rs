//! Joint interpretation of a prediction and its confidence interval.

use reliability_core::AssessmentBands;
use serde::{Deserialize, Serialize};

use crate::estimator::{ConfidenceEstimator, ConfidenceResult};

/// Finer-grained assessment of interval width than the three-way quality
/// label, used for the human-readable summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceAssessment {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceAssessment {
    pub fn from_width(width: f64, bands: &AssessmentBands) -> Self {
        match width {
            w if w < bands.very_high_below => ConfidenceAssessment::VeryHigh,
            w if w < bands.high_below => ConfidenceAssessment::High,
            w if w < bands.medium_below => ConfidenceAssessment::Medium,
            w if w < bands.low_below => ConfidenceAssessment::Low,
            _ => ConfidenceAssessment::VeryLow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceAssessment::VeryHigh => "Very High",
            ConfidenceAssessment::High => "High",
            ConfidenceAssessment::Medium => "Medium",
            ConfidenceAssessment::Low => "Low",
            ConfidenceAssessment::VeryLow => "Very Low",
        }
    }

    fn is_strong(&self) -> bool {
        matches!(self, ConfidenceAssessment::VeryHigh | ConfidenceAssessment::High)
    }
}

/// Human-readable reading of `(score band, confidence quality)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interpretation {
    pub assessment: ConfidenceAssessment,
    pub interpretation: String,
    pub recommendation: String,
}

impl ConfidenceEstimator {
    /// Map a result onto the fixed set of recommendation strings.
    pub fn interpret(&self, result: &ConfidenceResult) -> Interpretation {
        let assessment = ConfidenceAssessment::from_width(result.width, &self.assessments);
        let score = result.point;

        let score_assessment = if score < self.scores.unlikely_below {
            "Unlikely positive"
        } else if score < self.scores.borderline_low_below {
            "Borderline, below average"
        } else if score < self.scores.borderline_high_below {
            "Borderline, above average"
        } else {
            "Likely positive"
        };

        let consistency = match assessment {
            ConfidenceAssessment::VeryHigh | ConfidenceAssessment::High => {
                "The model is consistent across estimates."
            }
            ConfidenceAssessment::Medium => "Moderate uncertainty in prediction.",
            _ => "Significant uncertainty in prediction.",
        };

        let interpretation = format!(
            "Score assessment: {}. Confidence: {}. {} Likely range: {:.1}% - {:.1}%",
            score_assessment,
            assessment.as_str(),
            consistency,
            result.lower * 100.0,
            result.upper * 100.0,
        );

        let recommendation = if score < self.scores.unlikely_below {
            if assessment.is_strong() {
                "Low likelihood indicated. No further screening recommended at this time."
            } else {
                "Low likelihood indicated, but with some uncertainty. Monitor for changes."
            }
        } else if score < self.scores.borderline_low_below {
            "Borderline result. Follow-up screening recommended for confirmation."
        } else if score < self.scores.borderline_high_below {
            "Result suggests elevated likelihood. Professional evaluation recommended."
        } else if assessment.is_strong() {
            "High likelihood indicated. Professional evaluation strongly recommended."
        } else {
            "Possible elevated likelihood, uncertain. Professional evaluation recommended."
        };

        Interpretation {
            assessment,
            interpretation,
            recommendation: recommendation.to_string(),
        }
    }
}
