/// Error types for btrate-core.
///
/// Validation problems are reported before any estimation starts. Numerical
/// failures carry the last finite solver state so callers can inspect it.
use thiserror::Error;

use crate::types::TraceEntry;

/// Malformed input or options. The analysis never starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// No matches were supplied
    #[error("no matches supplied")]
    EmptyInput,

    /// A match lists the same player as winner and loser
    #[error("match {index}: player \"{player}\" cannot play against themselves")]
    SelfMatch { index: usize, player: String },

    /// A match has an empty winner or loser name
    #[error("match {index}: player name is empty")]
    EmptyPlayerName { index: usize },

    /// An estimator option is out of range
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

/// Solver state at the last iteration whose values were all finite.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingSnapshot {
    /// Number of completed solver steps when the snapshot was taken.
    pub iteration: usize,
    /// Player names in canonical (first-seen) order.
    pub players: Vec<String>,
    /// Ratings in the same order as `players`.
    pub ratings: Vec<f64>,
    /// Convergence trace up to and including `iteration`.
    pub trace: Vec<TraceEntry>,
}

/// A non-finite log-posterior, gradient or curvature showed up while iterating.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("numerical instability at iteration {iteration}: {reason}")]
pub struct NumericalInstabilityError {
    pub iteration: usize,
    pub reason: String,
    pub last_stable: RatingSnapshot,
}

/// Any failure of a rating analysis.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RatingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NumericalInstability(#[from] NumericalInstabilityError),
}

/// Result alias for rating analyses
pub type Result<T> = std::result::Result<T, RatingError>;
