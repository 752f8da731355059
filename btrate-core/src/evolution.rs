/// How ratings settle as matches accumulate.
///
/// Refits MAP ratings on growing prefixes of the match list and tracks the
/// largest rating change between consecutive prefixes. Useful for judging
/// whether a data set is large enough for its ratings to be stable.
use log::debug;

use crate::constants::EVOLUTION_TARGET_POINTS;
use crate::error::{Result, ValidationError};
use crate::estimator::estimate;
use crate::match_log::MatchLog;
use crate::types::EstimatorOptions;

/// Ratings after the first `num_matches` matches.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolutionPoint {
    pub num_matches: usize,
    /// (player, rating) in first-seen order of this prefix.
    pub ratings: Vec<(String, f64)>,
    /// Largest |Δrating| versus the previous point over players present in
    /// both. `None` for the first point.
    pub max_rating_change: Option<f64>,
    pub converged: bool,
}

impl EvolutionPoint {
    pub fn rating_of(&self, player: &str) -> Option<f64> {
        self.ratings.iter().find(|(name, _)| name == player).map(|&(_, r)| r)
    }
}

/// Step size giving roughly twenty points for `num_matches` matches.
pub fn default_step_size(num_matches: usize) -> usize {
    (num_matches / EVOLUTION_TARGET_POINTS).max(1)
}

/// Fit every `step_size`-th prefix of `pairs`, plus the full list if its
/// length is not a multiple of `step_size`.
pub fn rating_evolution<S: AsRef<str>>(
    pairs: &[(S, S)],
    step_size: usize,
    options: &EstimatorOptions,
) -> Result<Vec<EvolutionPoint>> {
    options.validate()?;
    if step_size == 0 {
        return Err(ValidationError::InvalidOption {
            name: "step_size",
            reason: "must be at least 1".to_string(),
        }
        .into());
    }
    // Validate the whole list up front so a bad record fails before any fitting.
    MatchLog::build(pairs)?;

    let mut prefix_lengths: Vec<usize> = (step_size..=pairs.len()).step_by(step_size).collect();
    if pairs.len() % step_size != 0 {
        prefix_lengths.push(pairs.len());
    }

    let mut points: Vec<EvolutionPoint> = Vec::with_capacity(prefix_lengths.len());

    for num_matches in prefix_lengths {
        let log = MatchLog::build(&pairs[..num_matches])?;
        let fit = estimate(&log, options)?;

        let ratings: Vec<(String, f64)> = log
            .players()
            .iter()
            .cloned()
            .zip(fit.ratings.iter().copied())
            .collect();

        let max_rating_change = points.last().and_then(|previous| max_change(previous, &ratings));
        debug!("{num_matches} matches: max rating change {max_rating_change:?}");

        points.push(EvolutionPoint {
            num_matches,
            ratings,
            max_rating_change,
            converged: fit.converged(),
        });
    }

    Ok(points)
}

fn max_change(previous: &EvolutionPoint, current: &[(String, f64)]) -> Option<f64> {
    current
        .iter()
        .filter_map(|(name, rating)| previous.rating_of(name).map(|old| (rating - old).abs()))
        .reduce(f64::max)
}

/// For each threshold, the first match count at which the rating change fell below it.
pub fn threshold_crossings(points: &[EvolutionPoint], thresholds: &[f64]) -> Vec<(f64, Option<usize>)> {
    thresholds
        .iter()
        .map(|&threshold| {
            let reached = points
                .iter()
                .find(|p| p.max_rating_change.is_some_and(|change| change < threshold))
                .map(|p| p.num_matches);
            (threshold, reached)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn league() -> Vec<(&'static str, &'static str)> {
        let games = [("A", "B"), ("B", "C"), ("A", "C"), ("C", "D"), ("B", "D"), ("A", "D"), ("D", "A")];
        games.iter().cycle().take(35).copied().collect()
    }

    #[test]
    fn test_default_step_size() {
        assert_eq!(default_step_size(0), 1);
        assert_eq!(default_step_size(19), 1);
        assert_eq!(default_step_size(100), 5);
    }

    #[test]
    fn test_prefix_lengths_include_remainder() {
        let pairs = league();
        let points = rating_evolution(&pairs, 10, &EstimatorOptions::default()).unwrap();
        let lengths: Vec<usize> = points.iter().map(|p| p.num_matches).collect();
        assert_eq!(lengths, vec![10, 20, 30, 35]);

        assert!(points[0].max_rating_change.is_none());
        assert!(points[1..].iter().all(|p| p.max_rating_change.is_some()));
    }

    #[test]
    fn test_exact_multiple_has_no_extra_point() {
        let all = league();
        let points = rating_evolution(&all[..30], 10, &EstimatorOptions::default()).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points.last().unwrap().num_matches, 30);
    }

    #[test]
    fn test_final_point_matches_full_fit() {
        let pairs = league();
        let options = EstimatorOptions::default();
        let points = rating_evolution(&pairs, 7, &options).unwrap();
        let full = crate::analyze(&pairs, &options).unwrap();

        let last = points.last().unwrap();
        for p in &full.players {
            assert_eq!(last.rating_of(&p.name), Some(p.rating));
        }
    }

    #[test]
    fn test_new_players_are_not_compared() {
        let pairs = [("A", "B"), ("C", "D")];
        let points = rating_evolution(&pairs, 1, &EstimatorOptions::default()).unwrap();
        assert_eq!(points[0].ratings.len(), 2);
        assert_eq!(points[1].ratings.len(), 4);
        // A and B are unaffected by a disconnected C-D match.
        assert!(points[1].max_rating_change.unwrap() < 1e-9);
    }

    #[test]
    fn test_zero_step_rejected() {
        assert!(rating_evolution(&[("A", "B")], 0, &EstimatorOptions::default()).is_err());
    }

    #[test]
    fn test_threshold_crossings() {
        let point = |n: usize, change: Option<f64>| EvolutionPoint {
            num_matches: n,
            ratings: Vec::new(),
            max_rating_change: change,
            converged: true,
        };
        let points = vec![point(5, None), point(10, Some(0.8)), point(15, Some(0.07)), point(20, Some(0.2))];
        let crossings = threshold_crossings(&points, &[0.5, 0.1, 0.01]);
        assert_eq!(crossings, vec![(0.5, Some(15)), (0.1, Some(15)), (0.01, None)]);
    }
}
