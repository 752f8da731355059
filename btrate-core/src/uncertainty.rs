/// Laplace-approximation credible intervals.
///
/// The posterior is approximated by a Gaussian centred at the MAP ratings
/// with covariance (−H)⁻¹. Ratings are reported zero-mean within each
/// connected component, so the covariance is projected onto that subspace
/// before reading off se. Each player's interval is r ± z·se.
use log::warn;
use nalgebra::DMatrix;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CredibleInterval {
    pub lower: f64,
    pub upper: f64,
    /// Posterior standard deviation. Infinite when under-determined.
    pub std_error: f64,
    /// The curvature gave no usable variance; the interval is unbounded.
    pub under_determined: bool,
}

impl CredibleInterval {
    pub fn unbounded() -> Self {
        CredibleInterval {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            std_error: f64::INFINITY,
            under_determined: true,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Approximate standard-normal quantile (Abramowitz & Stegun 26.2.23).
///
/// Absolute error below 4.5e-4, which is plenty for interval half-widths.
pub fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let t = if p < 0.5 {
        (-2.0 * p.ln()).sqrt()
    } else {
        (-2.0 * (1.0 - p).ln()).sqrt()
    };

    let c0 = 2.515517;
    let c1 = 0.802853;
    let c2 = 0.010328;
    let d1 = 1.432788;
    let d2 = 0.189269;
    let d3 = 0.001308;

    let q = t - (c0 + c1 * t + c2 * t * t) / (1.0 + d1 * t + d2 * t * t + d3 * t * t * t);

    if p < 0.5 { -q } else { q }
}

/// Two-sided critical value for a central interval at `confidence_level`.
///
/// Clamped at zero: near 0.5 the approximation can dip just below it, which
/// would invert very low-confidence intervals.
pub fn z_score(confidence_level: f64) -> f64 {
    normal_quantile((1.0 + confidence_level) / 2.0).max(0.0)
}

/// Credible intervals for every player from the log-posterior Hessian at the MAP point.
///
/// `hessian` must be square with one row per rating. `components` lists the
/// slots of each connected component; a player alone in a component keeps its
/// unprojected (prior-dominated) variance. Players whose curvature is
/// non-positive, or whose variance comes out non-finite, get an unbounded
/// interval flagged `under_determined` instead of NaN bounds.
pub fn credible_intervals(
    ratings: &[f64],
    hessian: &DMatrix<f64>,
    components: &[Vec<usize>],
    confidence_level: f64,
) -> Vec<CredibleInterval> {
    let n = ratings.len();
    debug_assert_eq!(hessian.shape(), (n, n));

    let z = z_score(confidence_level);
    let fisher = -hessian;
    let variances = match invert_information(&fisher) {
        Some(covariance) => centred_variances(&covariance, components),
        None => vec![f64::NAN; n],
    };

    (0..n)
        .map(|k| {
            let curvature = fisher[(k, k)];
            let variance = variances[k];

            if !(curvature > 0.0 && variance > 0.0 && variance.is_finite()) {
                warn!("player slot {k} is under-determined (curvature {curvature}, variance {variance})");
                return CredibleInterval::unbounded();
            }

            let std_error = variance.sqrt();
            CredibleInterval {
                lower: ratings[k] - z * std_error,
                upper: ratings[k] + z * std_error,
                std_error,
                under_determined: false,
            }
        })
        .collect()
}

/// Diagonal of P·Σ·P, where P subtracts the component mean.
///
/// For k in component C: Σ_kk − 2·mean_j Σ_kj + mean_ij Σ_ij over j, i ∈ C.
fn centred_variances(covariance: &DMatrix<f64>, components: &[Vec<usize>]) -> Vec<f64> {
    let mut variances: Vec<f64> = covariance.diagonal().iter().copied().collect();

    for component in components.iter().filter(|c| c.len() > 1) {
        let size = component.len() as f64;
        let row_means: Vec<f64> = component
            .iter()
            .map(|&k| component.iter().map(|&j| covariance[(k, j)]).sum::<f64>() / size)
            .collect();
        let grand_mean = row_means.iter().sum::<f64>() / size;

        for (&k, row_mean) in component.iter().zip(&row_means) {
            variances[k] = covariance[(k, k)] - 2.0 * row_mean + grand_mean;
        }
    }

    variances
}

/// (−H)⁻¹ via Cholesky, falling back to a general inverse.
fn invert_information(fisher: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    if let Some(cholesky) = fisher.clone().cholesky() {
        return Some(cholesky.inverse());
    }
    fisher.clone().try_inverse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_quantile_known_values() {
        assert!((z_score(0.95) - 1.959964).abs() < 1e-3);
        assert!((z_score(0.90) - 1.644854).abs() < 1e-3);
        assert!((z_score(0.99) - 2.575829).abs() < 1e-3);
        assert!(normal_quantile(0.5).abs() < 1e-3);
        assert!((normal_quantile(0.025) + normal_quantile(0.975)).abs() < 1e-12);
        assert!(z_score(1e-6) >= 0.0);
    }

    #[test]
    fn test_intervals_symmetric_around_estimate() {
        // Diagonal curvature: variances are exactly 1/4 and 1/16.
        let hessian = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![-4.0, -16.0]));
        let ratings = [0.7, -0.7];
        let intervals = credible_intervals(&ratings, &hessian, &[vec![0], vec![1]], 0.95);

        let z = z_score(0.95);
        assert!((intervals[0].std_error - 0.5).abs() < 1e-12);
        assert!((intervals[1].std_error - 0.25).abs() < 1e-12);
        for (interval, &r) in intervals.iter().zip(ratings.iter()) {
            assert!(interval.contains(r));
            assert!(((r - interval.lower) - (interval.upper - r)).abs() < 1e-12);
            assert!((interval.width() - 2.0 * z * interval.std_error).abs() < 1e-12);
            assert!(!interval.under_determined);
        }
    }

    #[test]
    fn test_higher_confidence_is_wider() {
        let hessian = DMatrix::from_row_slice(2, 2, &[-1.2, 0.2, 0.2, -1.2]);
        let ratings = [0.1, -0.1];
        let components = [vec![0, 1]];
        let narrow = credible_intervals(&ratings, &hessian, &components, 0.5);
        let wide = credible_intervals(&ratings, &hessian, &components, 0.99);
        assert!(wide[0].width() > narrow[0].width());
    }

    #[test]
    fn test_non_positive_curvature_is_unbounded() {
        let hessian = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, -2.0]);
        let intervals = credible_intervals(&[0.3, -0.3], &hessian, &[vec![0], vec![1]], 0.95);

        assert!(intervals[0].under_determined);
        assert_eq!(intervals[0].lower, f64::NEG_INFINITY);
        assert_eq!(intervals[0].upper, f64::INFINITY);
        assert!(intervals[0].contains(0.3));
        assert!(!intervals[0].lower.is_nan() && !intervals[0].upper.is_nan());
    }

    #[test]
    fn test_singular_curvature_is_unbounded() {
        // Pure likelihood curvature without a prior is singular along (1, 1).
        let hessian = DMatrix::from_row_slice(2, 2, &[-0.25, 0.25, 0.25, -0.25]);
        let intervals = credible_intervals(&[0.0, 0.0], &hessian, &[vec![0, 1]], 0.95);
        assert!(intervals.iter().all(|i| i.under_determined));
    }

    #[test]
    fn test_shift_direction_removed_from_variance() {
        // Two players, 100 games at p = 0.5 each way, prior τ² = 100.
        // −H = [[h + 0.01, −h], [−h, h + 0.01]] with h = 50.
        let h = 50.0;
        let hessian = DMatrix::from_row_slice(2, 2, &[-(h + 0.01), h, h, -(h + 0.01)]);

        let raw = credible_intervals(&[0.0, 0.0], &hessian, &[vec![0], vec![1]], 0.95);
        let centred = credible_intervals(&[0.0, 0.0], &hessian, &[vec![0, 1]], 0.95);

        // Unprojected variance is dominated by τ²/2 along (1, 1).
        assert!(raw[0].std_error > 7.0);
        // Along (1, −1)/√2 the variance is 1/(2h + 0.01); r_0 carries half of it.
        let expected = (0.5 / (2.0 * h + 0.01)).sqrt();
        assert!((centred[0].std_error - expected).abs() < 1e-9, "{}", centred[0].std_error);
        assert!((centred[1].std_error - expected).abs() < 1e-9);
    }

    #[test]
    fn test_components_projected_separately() {
        let block = [-5.01, 5.0, 5.0, -5.01];
        let mut hessian = DMatrix::zeros(4, 4);
        for (k, &v) in block.iter().enumerate() {
            hessian[(k / 2, k % 2)] = v;
            hessian[(2 + k / 2, 2 + k % 2)] = v;
        }
        let ratings = [0.0; 4];
        let joint = credible_intervals(&ratings, &hessian, &[vec![0, 1], vec![2, 3]], 0.95);

        let expected = (0.5 / 10.01_f64).sqrt();
        for interval in &joint {
            assert!((interval.std_error - expected).abs() < 1e-9);
        }
    }
}
