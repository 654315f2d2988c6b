//! Attribution Engine
//!
//! Decomposes a single ensemble prediction into signed per-feature
//! contributions. The fast variant weights static global importance by the
//! observed feature values; the exact variant runs a seeded Monte Carlo
//! Shapley estimate over random feature coalitions.

pub mod attribution;
pub mod explain;

pub use attribution::{
    exact_attribution, fast_attribution, top_k, AttributionMethod, AttributionResult,
    RankedContribution,
};
pub use explain::{ContributionStrength, Explainer, FeatureExplanation};
