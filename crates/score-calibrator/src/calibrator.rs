use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reliability_core::ReliabilityError;

use crate::metrics::{metrics, CalibrationMetrics};

/// One labeled observation of the held-out calibration set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalibrationSample {
    /// Raw model probability in [0, 1].
    pub raw_score: f64,
    /// Observed binary outcome.
    pub outcome: bool,
}

impl CalibrationSample {
    pub fn new(raw_score: f64, outcome: bool) -> Self {
        Self { raw_score, outcome }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationMethod {
    /// Non-parametric monotonic step fit (pool adjacent violators).
    Isotonic,
    /// Sigmoid fit `1 / (1 + exp(-(a*raw + b)))`.
    Platt,
}

impl CalibrationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationMethod::Isotonic => "isotonic",
            CalibrationMethod::Platt => "platt",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Curve {
    /// Step table of (raw threshold, calibrated value), thresholds and
    /// values both non-decreasing. Out-of-range inputs clip to the ends.
    Isotonic(Vec<(f64, f64)>),
    Platt { a: f64, b: f64 },
}

/// A fitted raw-score to calibrated-probability mapping.
///
/// Immutable once published; monotonic non-decreasing; deterministic.
/// Re-fitting produces a new instance, it never mutates an existing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationMap {
    version: u64,
    method: CalibrationMethod,
    curve: Curve,
    fitted_at: DateTime<Utc>,
    metrics: CalibrationMetrics,
}

impl CalibrationMap {
    /// Apply the mapping. Output is clamped to [0, 1].
    pub fn predict(&self, raw_score: f64) -> f64 {
        let calibrated = match &self.curve {
            Curve::Isotonic(steps) => {
                if steps.is_empty() {
                    raw_score
                } else {
                    // Last step at or below the raw score; clip below range.
                    match steps
                        .iter()
                        .rposition(|(threshold, _)| *threshold <= raw_score)
                    {
                        Some(idx) => steps[idx].1,
                        None => steps[0].1,
                    }
                }
            }
            Curve::Platt { a, b } => 1.0 / (1.0 + (-(a * raw_score + b)).exp()),
        };
        calibrated.clamp(0.0, 1.0)
    }

    /// Version assigned at publish time; 0 for maps not yet published.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Version identifier for persisted prediction records.
    pub fn version_label(&self) -> String {
        format!("{}-{}", self.method.as_str(), self.version)
    }

    pub fn method(&self) -> CalibrationMethod {
        self.method
    }

    pub fn fitted_at(&self) -> DateTime<Utc> {
        self.fitted_at
    }

    pub fn metrics(&self) -> &CalibrationMetrics {
        &self.metrics
    }
}

/// Outcome of fitting both methods on the same calibration set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitComparison {
    pub selected: CalibrationMap,
    pub isotonic_metrics: CalibrationMetrics,
    pub platt_metrics: CalibrationMetrics,
}

fn validate(samples: &[CalibrationSample]) -> Result<(), ReliabilityError> {
    if samples.is_empty() {
        return Err(ReliabilityError::InsufficientData(
            "calibration set is empty".to_string(),
        ));
    }
    let positives = samples.iter().filter(|s| s.outcome).count();
    if positives == 0 || positives == samples.len() {
        return Err(ReliabilityError::InsufficientData(
            "calibration set contains a single outcome class".to_string(),
        ));
    }
    Ok(())
}

/// Isotonic regression via pool adjacent violators over `(raw, outcome)`.
pub fn fit_isotonic(samples: &[CalibrationSample]) -> Result<CalibrationMap, ReliabilityError> {
    validate(samples)?;

    let mut sorted: Vec<(f64, f64)> = samples
        .iter()
        .map(|s| (s.raw_score, if s.outcome { 1.0 } else { 0.0 }))
        .collect();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    // Each block: (fitted value, weight, raw threshold of its first sample).
    let mut blocks: Vec<(f64, f64, f64)> = Vec::with_capacity(sorted.len());
    for (raw, y) in sorted {
        blocks.push((y, 1.0, raw));
        while blocks.len() >= 2 {
            let last = blocks[blocks.len() - 1];
            let prev = blocks[blocks.len() - 2];
            if prev.0 <= last.0 {
                break;
            }
            let weight = prev.1 + last.1;
            let value = (prev.0 * prev.1 + last.0 * last.1) / weight;
            blocks.pop();
            let merged = blocks.last_mut().expect("at least one block remains");
            *merged = (value, weight, prev.2);
        }
    }

    let steps: Vec<(f64, f64)> = blocks.into_iter().map(|(v, _, raw)| (raw, v)).collect();

    let map = CalibrationMap {
        version: 0,
        method: CalibrationMethod::Isotonic,
        curve: Curve::Isotonic(steps),
        fitted_at: Utc::now(),
        metrics: CalibrationMetrics::default(),
    };
    let fitted = with_metrics(map, samples);
    tracing::debug!(
        samples = samples.len(),
        ece = fitted.metrics.ece,
        "fitted isotonic calibration"
    );
    Ok(fitted)
}

/// Platt scaling by gradient-descent maximum likelihood.
pub fn fit_platt(samples: &[CalibrationSample]) -> Result<CalibrationMap, ReliabilityError> {
    validate(samples)?;

    let n = samples.len() as f64;
    let mut a = 0.0;
    let mut b = 0.0;
    let learning_rate = 0.1;
    let iterations = 2000;

    for _ in 0..iterations {
        let mut grad_a = 0.0;
        let mut grad_b = 0.0;
        for sample in samples {
            let y = if sample.outcome { 1.0 } else { 0.0 };
            let p = 1.0 / (1.0 + (-(a * sample.raw_score + b)).exp());
            let error = p - y;
            grad_a += error * sample.raw_score;
            grad_b += error;
        }
        a -= learning_rate * grad_a / n;
        b -= learning_rate * grad_b / n;
    }

    // A published map must be non-decreasing; a negative slope only arises
    // when scores anti-correlate with outcomes, which reduces to a flat map.
    if a < 0.0 {
        tracing::warn!(a, "platt fit produced a negative slope; flattening");
        let base_rate = samples.iter().filter(|s| s.outcome).count() as f64 / n;
        a = 0.0;
        b = (base_rate / (1.0 - base_rate).max(1e-10)).ln();
    }

    let map = CalibrationMap {
        version: 0,
        method: CalibrationMethod::Platt,
        curve: Curve::Platt { a, b },
        fitted_at: Utc::now(),
        metrics: CalibrationMetrics::default(),
    };
    let fitted = with_metrics(map, samples);
    tracing::debug!(
        samples = samples.len(),
        ece = fitted.metrics.ece,
        "fitted platt calibration"
    );
    Ok(fitted)
}

/// Fit both methods and keep the one with the lower ECE on the same set.
/// Ties resolve to isotonic.
pub fn fit_both(samples: &[CalibrationSample]) -> Result<FitComparison, ReliabilityError> {
    let isotonic = fit_isotonic(samples)?;
    let platt = fit_platt(samples)?;

    let isotonic_metrics = isotonic.metrics().clone();
    let platt_metrics = platt.metrics().clone();

    let selected = if platt_metrics.ece < isotonic_metrics.ece {
        platt
    } else {
        isotonic
    };
    tracing::info!(
        method = selected.method().as_str(),
        isotonic_ece = isotonic_metrics.ece,
        platt_ece = platt_metrics.ece,
        "selected calibration method"
    );

    Ok(FitComparison {
        selected,
        isotonic_metrics,
        platt_metrics,
    })
}

fn with_metrics(mut map: CalibrationMap, samples: &[CalibrationSample]) -> CalibrationMap {
    map.metrics = metrics(samples, &map);
    map
}

/// Caller-owned swap point for the current calibration map.
///
/// `publish` assigns the next version and swaps in the new immutable map
/// atomically; concurrent `predict` calls see either the previous map or
/// the new one, never a partial fit.
#[derive(Default)]
pub struct CalibratorHandle {
    next_version: AtomicU64,
    current: RwLock<Option<Arc<CalibrationMap>>>,
}

impl CalibratorHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a freshly fitted map, assigning it the next version.
    /// The fit timestamp carried by the map is left untouched.
    pub fn publish(&self, mut map: CalibrationMap) -> Arc<CalibrationMap> {
        map.version = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::new(map);
        let mut guard = self.current.write().expect("calibrator lock poisoned");
        *guard = Some(Arc::clone(&shared));
        tracing::info!(
            version = shared.version(),
            method = shared.method().as_str(),
            "published calibration map"
        );
        shared
    }

    /// Current published map, if any.
    pub fn current(&self) -> Option<Arc<CalibrationMap>> {
        self.current
            .read()
            .expect("calibrator lock poisoned")
            .clone()
    }

    /// Calibrate a raw score with the current map.
    pub fn predict(&self, raw_score: f64) -> Result<f64, ReliabilityError> {
        match self.current() {
            Some(map) => Ok(map.predict(raw_score)),
            None => Err(ReliabilityError::NotFit(
                "no calibration map has been published".to_string(),
            )),
        }
    }
}
