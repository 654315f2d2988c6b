//! Human-readable rendering of attribution results.

use serde::{Deserialize, Serialize};

use reliability_core::AttributionBuckets;

use crate::attribution::AttributionResult;

/// Magnitude bucket for a single contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionStrength {
    Negligible,
    Minor,
    Moderate,
    Strong,
}

impl ContributionStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionStrength::Negligible => "negligible",
            ContributionStrength::Minor => "minor",
            ContributionStrength::Moderate => "moderate",
            ContributionStrength::Strong => "strong",
        }
    }
}

/// Templated explanation for one feature's contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureExplanation {
    pub feature: String,
    pub value: f64,
    pub contribution: f64,
    pub strength: ContributionStrength,
    pub text: String,
}

/// Renders contributions into fixed-bucket explanation sentences.
pub struct Explainer {
    buckets: AttributionBuckets,
}

impl Default for Explainer {
    fn default() -> Self {
        Self::new(AttributionBuckets::default())
    }
}

impl Explainer {
    pub fn new(buckets: AttributionBuckets) -> Self {
        Self { buckets }
    }

    pub fn strength(&self, contribution: f64) -> ContributionStrength {
        let magnitude = contribution.abs();
        if magnitude < self.buckets.negligible_below {
            ContributionStrength::Negligible
        } else if magnitude < self.buckets.minor_below {
            ContributionStrength::Minor
        } else if magnitude < self.buckets.moderate_below {
            ContributionStrength::Moderate
        } else {
            ContributionStrength::Strong
        }
    }

    /// One sentence describing how a feature moved the score.
    pub fn explain(&self, feature_name: &str, value: f64, contribution: f64) -> FeatureExplanation {
        let strength = self.strength(contribution);

        let state = if value == 1.0 {
            "was positive (Yes)".to_string()
        } else if value == 0.0 {
            "was negative (No)".to_string()
        } else {
            format!("was {value:.1}")
        };

        let impact = match strength {
            ContributionStrength::Negligible => "had negligible impact on the score".to_string(),
            _ => {
                let direction = if contribution > 0.0 { "raised" } else { "lowered" };
                format!(
                    "{} the score by {:.1}% ({} impact)",
                    direction,
                    contribution.abs() * 100.0,
                    strength.as_str()
                )
            }
        };

        FeatureExplanation {
            feature: feature_name.to_string(),
            value,
            contribution,
            strength,
            text: format!("{feature_name} {state} and {impact}."),
        }
    }

    /// Explanations for every feature of a result, in feature order.
    pub fn explain_all(
        &self,
        result: &AttributionResult,
        feature_names: &[&str],
        feature_values: &[f64],
    ) -> Vec<FeatureExplanation> {
        result
            .contributions
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let name = feature_names.get(i).copied().unwrap_or("feature");
                let value = feature_values.get(i).copied().unwrap_or(0.0);
                self.explain(name, value, *c)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::AttributionMethod;

    #[test]
    fn strength_buckets() {
        let e = Explainer::default();
        assert_eq!(e.strength(0.03), ContributionStrength::Negligible);
        assert_eq!(e.strength(-0.08), ContributionStrength::Minor);
        assert_eq!(e.strength(0.20), ContributionStrength::Moderate);
        assert_eq!(e.strength(-0.40), ContributionStrength::Strong);
    }

    #[test]
    fn explanation_contains_direction_and_magnitude() {
        let e = Explainer::default();
        let out = e.explain("Social Interaction", 1.0, 0.22);
        assert!(out.text.contains("Social Interaction"));
        assert!(out.text.contains("was positive (Yes)"));
        assert!(out.text.contains("raised the score by 22.0%"));
        assert!(out.text.contains("moderate"));

        let down = e.explain("Sensory Sensitivities", 0.0, -0.07);
        assert!(down.text.contains("was negative (No)"));
        assert!(down.text.contains("lowered the score by 7.0%"));
    }

    #[test]
    fn negligible_contributions_say_so() {
        let e = Explainer::default();
        let out = e.explain("Solitude Preference", 0.5, 0.01);
        assert_eq!(out.strength, ContributionStrength::Negligible);
        assert!(out.text.contains("was 0.5"));
        assert!(out.text.contains("negligible impact"));
    }

    #[test]
    fn explain_all_preserves_feature_order() {
        let e = Explainer::default();
        let result = AttributionResult {
            contributions: vec![0.2, -0.1],
            baseline: 0.1,
            prediction: 0.2,
            method: AttributionMethod::MonteCarloShapley,
        };
        let out = e.explain_all(&result, &["a", "b"], &[1.0, 0.0]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].feature, "a");
        assert_eq!(out[1].feature, "b");
    }
}
