//! Confidence Estimator
//!
//! Turns a single raw model probability into a bounded, quality-labeled
//! confidence interval by querying every member of the ensemble, either
//! as an explicit bootstrap sample or through an analytic variance pass.

pub mod estimator;
pub mod interpretation;

pub use estimator::{
    ConfidenceEstimator, ConfidenceMethod, ConfidenceQuality, ConfidenceResult,
};
pub use interpretation::{ConfidenceAssessment, Interpretation};
