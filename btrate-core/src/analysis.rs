/// One-call rating analysis.
///
/// Pure function of (match list, options) → report. No IO, no shared state:
/// concurrent analyses only need their own inputs.
use log::info;

use crate::error::Result;
use crate::estimator::estimate;
use crate::match_log::MatchLog;
use crate::posterior::{sample_posterior, PosteriorSummary, SamplerOptions};
use crate::report::RatingReport;
use crate::types::EstimatorOptions;
use crate::uncertainty::credible_intervals;

/// Rate every player appearing in `pairs` (each a `(winner, loser)` name pair).
///
/// Fails with a validation error on empty input, self-matches or bad
/// options, and with a numerical-instability error if the solver produces
/// non-finite values. Hitting the iteration cap is reported through
/// `RatingReport::converged`.
pub fn analyze<S: AsRef<str>>(pairs: &[(S, S)], options: &EstimatorOptions) -> Result<RatingReport> {
    options.validate()?;
    let log = MatchLog::build(pairs)?;
    analyze_log(&log, options)
}

/// Same as `analyze()` for an already validated match log.
pub fn analyze_log(log: &MatchLog, options: &EstimatorOptions) -> Result<RatingReport> {
    options.validate()?;
    info!(
        "rating {} players from {} matches",
        log.num_players(),
        log.num_matches()
    );

    let estimate = estimate(log, options)?;
    let intervals = credible_intervals(
        &estimate.ratings,
        &estimate.hessian,
        &estimate.components,
        options.confidence_level,
    );

    Ok(RatingReport::assemble(log, estimate, intervals, options.confidence_level))
}

/// Sample the full posterior instead of taking the MAP + Laplace route.
///
/// Slower, but the percentile intervals follow any skew in the posterior.
pub fn analyze_posterior<S: AsRef<str>>(
    pairs: &[(S, S)],
    options: &EstimatorOptions,
    sampler: &SamplerOptions,
) -> Result<PosteriorSummary> {
    let log = MatchLog::build(pairs)?;
    info!(
        "sampling posterior for {} players from {} matches",
        log.num_players(),
        log.num_matches()
    );
    Ok(sample_posterior(&log, options, sampler)?)
}
