/// Initial rating assigned to every player before the first solver step.
/// Zero log-strength means every player starts with equal prior strength.
pub const INITIAL_RATING: f64 = 0.0;

/// Default variance τ² of the zero-mean Gaussian prior on each rating.
///
/// Large enough that a handful of matches outweighs it, small enough to pin
/// down the additive indeterminacy of log-strength and keep unbeaten or
/// winless players finite.
pub const DEFAULT_PRIOR_VARIANCE: f64 = 100.0;

/// Default stopping threshold on the largest per-player rating change in one step.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Default stopping threshold on the log-posterior improvement in one step.
/// Both this and `DEFAULT_TOLERANCE` must be met before the solver stops.
pub const DEFAULT_LOG_POSTERIOR_TOLERANCE: f64 = 1e-6;

/// Default cap on solver iterations. Hitting it is not an error: the report
/// carries the best-so-far ratings with `converged = false`.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default credible interval level.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Maximum number of step halvings in the Newton line search. After this many
/// rejected candidates the step is abandoned and the ratings stay put.
pub const MAX_LINE_SEARCH_HALVINGS: usize = 40;

/// Elo conversion: `elo = rating * ELO_SCALE / ln(ELO_BASE)`.
/// With the classic 400/10 pair one unit of log-strength is ~173.7 Elo points.
pub const DEFAULT_ELO_SCALE: f64 = 400.0;
pub const DEFAULT_ELO_BASE: f64 = 10.0;

/// Target number of points in a rating-evolution series when the caller
/// doesn't pick a step size.
pub const EVOLUTION_TARGET_POINTS: usize = 20;

/// Posterior sampler defaults: kept samples, discarded warm-up sweeps,
/// sweeps per kept sample and the random-walk proposal half-width.
pub const DEFAULT_POSTERIOR_SAMPLES: usize = 10_000;
pub const DEFAULT_BURN_IN: usize = 2_000;
pub const DEFAULT_THIN: usize = 5;
pub const DEFAULT_PROPOSAL_STD: f64 = 0.5;

/// Fixed default seed so repeated runs agree unless the caller asks otherwise.
pub const DEFAULT_SAMPLER_SEED: u64 = 0;
