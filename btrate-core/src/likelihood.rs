/// Bradley-Terry log-posterior with a Gaussian prior, and its derivatives.
///
/// P(i beats j) = σ(r_i − r_j). The prior is N(0, τ²) on every rating.
/// Internal module: ratings are indexed by match-log slot.
use nalgebra::{DMatrix, DVector};

use crate::match_log::MatchLog;

/// Logistic sigmoid, evaluated so that neither branch can overflow.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let ex = x.exp();
        ex / (1.0 + ex)
    }
}

/// log σ(x) = −log(1 + e^{−x}), via ln_1p of e^{−|x|}.
pub fn log_sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        -(-x).exp().ln_1p()
    } else {
        x - x.exp().ln_1p()
    }
}

pub struct BradleyTerryLikelihood<'a> {
    log: &'a MatchLog,
    /// 1/τ².
    prior_precision: f64,
}

impl<'a> BradleyTerryLikelihood<'a> {
    pub fn new(log: &'a MatchLog, prior_variance: f64) -> Self {
        BradleyTerryLikelihood {
            log,
            prior_precision: 1.0 / prior_variance,
        }
    }

    pub fn num_players(&self) -> usize {
        self.log.num_players()
    }

    pub fn match_log(&self) -> &'a MatchLog {
        self.log
    }

    /// Σ log σ(r_winner − r_loser) over all matches.
    pub fn log_likelihood(&self, ratings: &DVector<f64>) -> f64 {
        self.log
            .matches()
            .iter()
            .map(|m| log_sigmoid(ratings[m.winner] - ratings[m.loser]))
            .sum()
    }

    /// −½ Σ r_k² / τ²
    pub fn log_prior(&self, ratings: &DVector<f64>) -> f64 {
        -0.5 * self.prior_precision * ratings.norm_squared()
    }

    pub fn log_posterior(&self, ratings: &DVector<f64>) -> f64 {
        self.log_likelihood(ratings) + self.log_prior(ratings)
    }

    /// ∂ log-posterior / ∂ r_k.
    ///
    /// A win by k over j contributes 1 − σ(r_k − r_j), a loss of k to i
    /// contributes −σ(r_i − r_k), and the prior contributes −r_k/τ².
    pub fn gradient(&self, ratings: &DVector<f64>) -> DVector<f64> {
        let mut gradient = -ratings * self.prior_precision;

        for m in self.log.matches() {
            // 1 − σ(d) == σ(−d), without the cancellation.
            let q = sigmoid(ratings[m.loser] - ratings[m.winner]);
            gradient[m.winner] += q;
            gradient[m.loser] -= q;
        }

        gradient
    }

    /// Second derivatives of the log-posterior.
    ///
    /// Each match adds −p(1−p) to both players' diagonal entries and +p(1−p)
    /// to the two off-diagonal entries for the pair; the prior adds −1/τ² on
    /// the diagonal. The result is negative definite for any finite τ².
    pub fn hessian(&self, ratings: &DVector<f64>) -> DMatrix<f64> {
        let n = self.num_players();
        let mut hessian = DMatrix::from_diagonal_element(n, n, -self.prior_precision);

        for m in self.log.matches() {
            let (i, j) = (m.winner, m.loser);
            let p = sigmoid(ratings[i] - ratings[j]);
            let h = p * (1.0 - p);

            hessian[(i, i)] -= h;
            hessian[(j, j)] -= h;
            hessian[(i, j)] += h;
            hessian[(j, i)] += h;
        }

        hessian
    }

    /// Fisher information (negative Hessian) at `ratings`.
    pub fn fisher_information(&self, ratings: &DVector<f64>) -> DMatrix<f64> {
        -self.hessian(ratings)
    }
}
