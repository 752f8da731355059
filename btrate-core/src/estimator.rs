/// MAP estimation of Bradley-Terry ratings under a Gaussian prior.
///
/// Damped Newton: each step solves (−H)·δ = g, backtracks along δ until the
/// log-posterior does not decrease, then re-centers every connected component
/// to zero mean. Re-centering never lowers the log-posterior: the likelihood
/// is shift-invariant within a component and the prior is maximised by the
/// zero-mean shift.
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};

use crate::constants::{INITIAL_RATING, MAX_LINE_SEARCH_HALVINGS};
use crate::error::{NumericalInstabilityError, RatingSnapshot};
use crate::likelihood::BradleyTerryLikelihood;
use crate::match_log::MatchLog;
use crate::types::{EstimatorOptions, TraceEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverState {
    Initialized,
    Iterating,
    Converged,
    MaxIterationsReached,
    Failed,
}

impl SolverState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SolverState::Converged | SolverState::MaxIterationsReached | SolverState::Failed
        )
    }
}

/// Frozen output of a finished estimation run.
#[derive(Debug, Clone)]
pub struct MapEstimate {
    /// Ratings by match-log slot.
    pub ratings: Vec<f64>,
    /// Hessian of the log-posterior at `ratings`.
    pub hessian: DMatrix<f64>,
    /// Connected components the ratings were centred over.
    pub components: Vec<Vec<usize>>,
    pub log_posterior: f64,
    pub trace: Vec<TraceEntry>,
    pub iterations: usize,
    pub state: SolverState,
}

impl MapEstimate {
    pub fn converged(&self) -> bool {
        self.state == SolverState::Converged
    }
}

pub struct BayesianEstimator<'a> {
    likelihood: BradleyTerryLikelihood<'a>,
    components: Vec<Vec<usize>>,
    tolerance: f64,
    log_posterior_tolerance: f64,
    max_iterations: usize,

    ratings: DVector<f64>,
    log_posterior: f64,
    trace: Vec<TraceEntry>,
    iteration: usize,
    state: SolverState,
}

impl<'a> BayesianEstimator<'a> {
    /// Options are assumed validated (`EstimatorOptions::validate`).
    pub fn new(log: &'a MatchLog, options: &EstimatorOptions) -> Self {
        let components = log.components();
        if components.len() > 1 {
            warn!(
                "match graph has {} disconnected components; ratings are only comparable within a component",
                components.len()
            );
        }

        BayesianEstimator {
            likelihood: BradleyTerryLikelihood::new(log, options.prior_variance),
            components,
            tolerance: options.tolerance,
            log_posterior_tolerance: options.log_posterior_tolerance,
            max_iterations: options.max_iterations,
            ratings: DVector::from_element(log.num_players(), INITIAL_RATING),
            log_posterior: f64::NAN,
            trace: Vec::with_capacity(options.max_iterations),
            iteration: 0,
            state: SolverState::Initialized,
        }
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Current ratings by match-log slot.
    pub fn ratings(&self) -> &[f64] {
        self.ratings.as_slice()
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Advance the state machine by one Newton step.
    ///
    /// Terminal states are sticky: stepping a finished estimator returns its
    /// state unchanged.
    pub fn step(&mut self) -> Result<SolverState, NumericalInstabilityError> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        if self.state == SolverState::Initialized {
            self.log_posterior = self.likelihood.log_posterior(&self.ratings);
            if !self.log_posterior.is_finite() {
                return Err(self.fail("initial log-posterior is not finite"));
            }
            self.state = SolverState::Iterating;
        }

        let gradient = self.likelihood.gradient(&self.ratings);
        if gradient.iter().any(|g| !g.is_finite()) {
            return Err(self.fail("gradient is not finite"));
        }
        let hessian = self.likelihood.hessian(&self.ratings);
        if hessian.iter().any(|h| !h.is_finite()) {
            return Err(self.fail("Hessian is not finite"));
        }

        let direction = newton_direction(-hessian, &gradient);
        let (candidate, candidate_log_posterior) = match self.line_search(&direction) {
            Some(accepted) => accepted,
            None => {
                // A rejected step says nothing about optimality unless the gradient agrees.
                let gradient_norm = gradient.amax();
                if gradient_norm >= self.tolerance {
                    debug!(
                        "iteration {}: line search exhausted with gradient norm {:.3e}",
                        self.iteration + 1,
                        gradient_norm
                    );
                    return Ok(self.record_stalled_step());
                }
                (self.ratings.clone(), self.log_posterior)
            }
        };

        let max_delta = candidate
            .iter()
            .zip(self.ratings.iter())
            .map(|(new, old)| (new - old).abs())
            .fold(0.0_f64, f64::max);
        let improvement = candidate_log_posterior - self.log_posterior;

        self.ratings = candidate;
        self.log_posterior = candidate_log_posterior;
        self.iteration += 1;
        self.trace.push(TraceEntry {
            iteration: self.iteration,
            log_posterior: self.log_posterior,
            max_delta,
        });

        debug!(
            "iteration {}: log-posterior {:.10}, max delta {:.3e}",
            self.iteration, self.log_posterior, max_delta
        );

        self.state = if max_delta < self.tolerance && improvement.abs() < self.log_posterior_tolerance {
            info!("converged after {} iterations", self.iteration);
            SolverState::Converged
        } else if self.iteration >= self.max_iterations {
            info!(
                "stopped at iteration cap {} without converging (max delta {:.3e})",
                self.max_iterations, max_delta
            );
            SolverState::MaxIterationsReached
        } else {
            SolverState::Iterating
        };

        Ok(self.state)
    }

    /// Iterate to a terminal state and freeze the result.
    pub fn run(mut self) -> Result<MapEstimate, NumericalInstabilityError> {
        while !self.step()?.is_terminal() {}

        let hessian = self.likelihood.hessian(&self.ratings);
        Ok(MapEstimate {
            ratings: self.ratings.as_slice().to_vec(),
            hessian,
            components: self.components,
            log_posterior: self.log_posterior,
            trace: self.trace,
            iterations: self.iteration,
            state: self.state,
        })
    }

    /// Halve the step until the (re-centered) candidate does not lower the
    /// log-posterior. `None` once every halving has been rejected.
    fn line_search(&self, direction: &DVector<f64>) -> Option<(DVector<f64>, f64)> {
        let mut step_size = 1.0;

        for _ in 0..MAX_LINE_SEARCH_HALVINGS {
            let mut candidate = &self.ratings + direction * step_size;
            self.recenter(&mut candidate);
            let value = self.likelihood.log_posterior(&candidate);

            if value.is_finite() && value >= self.log_posterior {
                return Some((candidate, value));
            }
            step_size *= 0.5;
        }

        None
    }

    /// Count a step that could not move away from a non-stationary point.
    /// Never converges; runs out the iteration cap instead.
    fn record_stalled_step(&mut self) -> SolverState {
        self.iteration += 1;
        self.trace.push(TraceEntry {
            iteration: self.iteration,
            log_posterior: self.log_posterior,
            max_delta: 0.0,
        });

        self.state = if self.iteration >= self.max_iterations {
            warn!(
                "stopped at iteration cap {} with the line search stalled",
                self.max_iterations
            );
            SolverState::MaxIterationsReached
        } else {
            SolverState::Iterating
        };
        self.state
    }

    /// Shift each connected component to zero mean.
    fn recenter(&self, ratings: &mut DVector<f64>) {
        for component in &self.components {
            let mean = component.iter().map(|&slot| ratings[slot]).sum::<f64>() / component.len() as f64;
            for &slot in component {
                ratings[slot] -= mean;
            }
        }
    }

    fn fail(&mut self, reason: &str) -> NumericalInstabilityError {
        self.state = SolverState::Failed;
        warn!("numerical failure at iteration {}: {}", self.iteration, reason);

        let log = self.likelihood.match_log();
        NumericalInstabilityError {
            iteration: self.iteration,
            reason: reason.to_string(),
            last_stable: RatingSnapshot {
                iteration: self.iteration,
                players: log.players().to_vec(),
                ratings: self.ratings.as_slice().to_vec(),
                trace: self.trace.clone(),
            },
        }
    }
}

/// Solve (−H)·δ = g. Cholesky first (−H is positive definite with a proper
/// prior), LU if that fails, plain gradient ascent as a last resort.
fn newton_direction(neg_hessian: DMatrix<f64>, gradient: &DVector<f64>) -> DVector<f64> {
    if let Some(cholesky) = neg_hessian.clone().cholesky() {
        return cholesky.solve(gradient);
    }
    match neg_hessian.lu().solve(gradient) {
        Some(direction) => direction,
        None => {
            warn!("curvature matrix is singular; taking a gradient step");
            gradient.clone()
        }
    }
}

/// Run the estimator on a match log to completion.
pub fn estimate(log: &MatchLog, options: &EstimatorOptions) -> Result<MapEstimate, NumericalInstabilityError> {
    BayesianEstimator::new(log, options).run()
}
