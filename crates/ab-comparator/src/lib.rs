//! A/B Comparator
//!
//! Statistically compares two score distributions, typically two model
//! versions run over the same evaluation set: descriptive statistics,
//! pooled t-test with Cohen's d, Mann-Whitney U cross-check, per-model
//! t-based confidence intervals, and a winner/recommendation summary.

pub mod comparison;
pub mod dataset;
pub mod stats;

pub use comparison::{
    mann_whitney, t_test, Comparator, ComparisonReport, MannWhitneyResult, TTestResult, Winner,
};
pub use dataset::{generate_dataset, run_predictions};
pub use stats::{
    confidence_interval, descriptive_stats, intervals_overlap, ConfidenceInterval,
    DescriptiveStats,
};
