use thiserror::Error;

/// Typed failures raised by the reliability engine.
///
/// The engine never silently substitutes values except for the two
/// documented cases: comparator sample-size clamping and zero-variance
/// interval collapse. Everything else surfaces as one of these variants;
/// user-facing messaging belongs to the serving layer.
#[derive(Error, Debug)]
pub enum ReliabilityError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Calibrator not fitted: {0}")]
    NotFit(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Feature vector length mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}
