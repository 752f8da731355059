use crate::constants::{
    DEFAULT_CONFIDENCE_LEVEL, DEFAULT_LOG_POSTERIOR_TOLERANCE, DEFAULT_MAX_ITERATIONS,
    DEFAULT_PRIOR_VARIANCE, DEFAULT_TOLERANCE,
};
use crate::error::ValidationError;

/// One match outcome, stored by player slot (index into the match log's player list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchRecord {
    pub winner: usize,
    pub loser: usize,
}

/// One solver step in the convergence trace.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceEntry {
    /// 1-based step number.
    pub iteration: usize,
    /// Log-posterior after the step.
    pub log_posterior: f64,
    /// Largest absolute per-player rating change in the step.
    pub max_delta: f64,
}

/// Options for `analyze()` and the estimator it drives.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EstimatorOptions {
    /// Variance τ² of the N(0, τ²) prior on each rating (e.g. 100.0).
    pub prior_variance: f64,
    /// Stop when the largest rating change in a step is below this...
    pub tolerance: f64,
    /// ...and the log-posterior improved by less than this.
    pub log_posterior_tolerance: f64,
    /// Iteration cap. Reaching it yields `converged = false`, not an error.
    pub max_iterations: usize,
    /// Credible interval level, strictly between 0 and 1 (e.g. 0.95).
    pub confidence_level: f64,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            prior_variance: DEFAULT_PRIOR_VARIANCE,
            tolerance: DEFAULT_TOLERANCE,
            log_posterior_tolerance: DEFAULT_LOG_POSTERIOR_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
        }
    }
}

impl EstimatorOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.prior_variance.is_finite() && self.prior_variance > 0.0) {
            return Err(invalid(
                "prior_variance",
                format!("must be a positive finite number, got {}", self.prior_variance),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(invalid(
                "tolerance",
                format!("must be a positive finite number, got {}", self.tolerance),
            ));
        }
        if !(self.log_posterior_tolerance.is_finite() && self.log_posterior_tolerance > 0.0) {
            return Err(invalid(
                "log_posterior_tolerance",
                format!("must be a positive finite number, got {}", self.log_posterior_tolerance),
            ));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1".to_string()));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(invalid(
                "confidence_level",
                format!("must be strictly between 0 and 1, got {}", self.confidence_level),
            ));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: String) -> ValidationError {
    ValidationError::InvalidOption { name, reason }
}
