//! Score Calibrator
//!
//! Fits a raw-score to calibrated-probability mapping against observed
//! outcome frequencies. Implements isotonic regression (pool adjacent
//! violators) and Platt scaling, a best-of-both selector, calibration
//! quality metrics, and a versioned swap-point handle so concurrent
//! readers never observe a partially fitted map.

pub mod calibrator;
pub mod metrics;

pub use calibrator::{
    fit_both, fit_isotonic, fit_platt, CalibrationMap, CalibrationMethod, CalibrationSample,
    CalibratorHandle, FitComparison,
};
pub use metrics::{
    assess, metrics, quality, reliability_curve, CalibrationMetrics, CalibrationQuality,
    QualityAssessment, ReliabilityBin,
};
