/// btrate-core: Bayesian Bradley-Terry rating engine.
///
/// (winner, loser) outcomes → MAP log-strength ratings under a Gaussian prior,
/// Laplace-approximation credible intervals, a full pairwise win-probability
/// table and a convergence trace. A seeded posterior sampler gives percentile
/// intervals as an alternative. No IO, no global state: every analysis is a
/// pure function of its input and options.
///
/// Players are identified by caller-provided names. The crate maps them to
/// array slots in first-seen order; that order is the canonical order of
/// every table in the report.
///
/// # Quick start
///
/// ```rust
/// use btrate_core::{analyze, EstimatorOptions};
///
/// let matches = vec![
///     ("Alice", "Bob"),
///     ("Alice", "Carol"),
///     ("Bob", "Carol"),
///     ("Carol", "Alice"),
/// ];
///
/// let report = analyze(&matches, &EstimatorOptions::default()).unwrap();
///
/// for p in &report.players {
///     println!("{}: {:.4} [{:.4}, {:.4}]", p.name, p.rating, p.lower, p.upper);
/// }
/// let p = report.win_probabilities.get("Alice", "Bob").unwrap();
/// assert!(p > 0.5);
/// ```

pub mod analysis;
pub mod constants;
pub mod error;
pub mod estimator;
pub mod evolution;
pub mod likelihood;
pub mod match_log;
pub mod posterior;
pub mod report;
pub mod types;
pub mod uncertainty;
pub mod win_probability;

// Re-export primary public API at crate root.
pub use analysis::{analyze, analyze_log, analyze_posterior};
pub use error::{NumericalInstabilityError, RatingError, RatingSnapshot, Result, ValidationError};
pub use estimator::{estimate, BayesianEstimator, MapEstimate, SolverState};
pub use evolution::{default_step_size, rating_evolution, threshold_crossings, EvolutionPoint};
pub use likelihood::{sigmoid, BradleyTerryLikelihood};
pub use match_log::MatchLog;
pub use posterior::{sample_posterior, PosteriorSummary, SampledPlayer, SamplerOptions};
pub use report::{to_elo, DisconnectedComponent, RatedPlayer, RatingReport};
pub use types::{EstimatorOptions, MatchRecord, TraceEntry};
pub use uncertainty::{credible_intervals, CredibleInterval};
pub use win_probability::WinProbabilityMatrix;
