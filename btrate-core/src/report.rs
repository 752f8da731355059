/// The engine's single output object.
///
/// Players are listed by descending rating for display; each keeps its
/// first-seen `input_index` for cross-referencing the match log.
use crate::constants::{DEFAULT_ELO_BASE, DEFAULT_ELO_SCALE};
use crate::estimator::MapEstimate;
use crate::match_log::MatchLog;
use crate::types::TraceEntry;
use crate::uncertainty::CredibleInterval;
use crate::win_probability::WinProbabilityMatrix;

/// One player's line in the report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatedPlayer {
    pub name: String,
    /// Position in first-seen order.
    pub input_index: usize,
    /// MAP log-strength.
    pub rating: f64,
    pub lower: f64,
    pub upper: f64,
    pub std_error: f64,
    pub under_determined: bool,
    pub wins: usize,
    pub losses: usize,
}

impl RatedPlayer {
    pub fn matches_played(&self) -> usize {
        self.wins + self.losses
    }
}

/// A group of players with no matches against anyone outside it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisconnectedComponent {
    /// Names in canonical order.
    pub players: Vec<String>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingReport {
    /// Sorted by rating, highest first.
    pub players: Vec<RatedPlayer>,
    pub win_probabilities: WinProbabilityMatrix,
    pub trace: Vec<TraceEntry>,
    pub converged: bool,
    pub iterations: usize,
    pub log_posterior: f64,
    pub confidence_level: f64,
    pub num_matches: usize,
    /// Empty when every player is connected to every other. Otherwise one
    /// entry per component: cross-component rating comparisons are meaningless.
    pub disconnected_components: Vec<DisconnectedComponent>,
}

impl RatingReport {
    pub(crate) fn assemble(
        log: &MatchLog,
        estimate: MapEstimate,
        intervals: Vec<CredibleInterval>,
        confidence_level: f64,
    ) -> Self {
        let wins = log.wins();
        let losses = log.losses();

        let mut players: Vec<RatedPlayer> = log
            .players()
            .iter()
            .enumerate()
            .map(|(slot, name)| RatedPlayer {
                name: name.clone(),
                input_index: slot,
                rating: estimate.ratings[slot],
                lower: intervals[slot].lower,
                upper: intervals[slot].upper,
                std_error: intervals[slot].std_error,
                under_determined: intervals[slot].under_determined,
                wins: wins[slot],
                losses: losses[slot],
            })
            .collect();

        // Stable sort keeps first-seen order among ties.
        players.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal));

        let components = log.components();
        let disconnected_components = if components.len() > 1 {
            components
                .into_iter()
                .map(|component| DisconnectedComponent {
                    players: component.into_iter().map(|slot| log.player_name(slot).to_string()).collect(),
                })
                .collect()
        } else {
            Vec::new()
        };

        RatingReport {
            players,
            win_probabilities: WinProbabilityMatrix::from_ratings(log.players(), &estimate.ratings),
            converged: estimate.converged(),
            iterations: estimate.iterations,
            log_posterior: estimate.log_posterior,
            trace: estimate.trace,
            confidence_level,
            num_matches: log.num_matches(),
            disconnected_components,
        }
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, name: &str) -> Option<&RatedPlayer> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Players in first-seen order rather than rank order.
    pub fn players_in_input_order(&self) -> Vec<&RatedPlayer> {
        let mut players: Vec<&RatedPlayer> = self.players.iter().collect();
        players.sort_by_key(|p| p.input_index);
        players
    }

    pub fn is_connected(&self) -> bool {
        self.disconnected_components.is_empty()
    }

    /// Ratings on the Elo scale (400 points per factor of 10 in odds), rank order.
    pub fn elo_ratings(&self) -> Vec<(&str, f64)> {
        self.players
            .iter()
            .map(|p| (p.name.as_str(), to_elo(p.rating, DEFAULT_ELO_SCALE, DEFAULT_ELO_BASE)))
            .collect()
    }
}

/// Convert a log-strength rating to an Elo-like scale: `rating * scale / ln(base)`.
pub fn to_elo(rating: f64, scale: f64, base: f64) -> f64 {
    rating * scale / base.ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::estimate;
    use crate::types::EstimatorOptions;
    use crate::uncertainty::credible_intervals;

    fn report_for(pairs: &[(&str, &str)]) -> RatingReport {
        let log = MatchLog::build(pairs).unwrap();
        let options = EstimatorOptions::default();
        let estimate = estimate(&log, &options).unwrap();
        let intervals = credible_intervals(
            &estimate.ratings,
            &estimate.hessian,
            &estimate.components,
            options.confidence_level,
        );
        RatingReport::assemble(&log, estimate, intervals, options.confidence_level)
    }

    #[test]
    fn test_players_sorted_by_rating_with_input_index() {
        let report = report_for(&[("B", "A"), ("C", "B"), ("C", "A"), ("C", "B")]);
        let names: Vec<&str> = report.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);

        let c = report.player("C").unwrap();
        assert_eq!(c.input_index, 2);
        assert_eq!((c.wins, c.losses), (3, 0));
        assert_eq!(report.player("A").unwrap().matches_played(), 2);

        let input_order: Vec<&str> = report.players_in_input_order().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(input_order, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_connected_report_has_no_warnings() {
        let report = report_for(&[("A", "B"), ("B", "C")]);
        assert!(report.is_connected());
        assert_eq!(report.num_players(), 3);
        assert_eq!(report.num_matches, 2);
        assert_eq!(report.win_probabilities.players(), &["A", "B", "C"]);
    }

    #[test]
    fn test_elo_conversion() {
        assert!((to_elo(1.0, 400.0, 10.0) - 173.717_792_761_300_7).abs() < 1e-9);
        assert_eq!(to_elo(0.0, 400.0, 10.0), 0.0);

        let report = report_for(&[("A", "B"), ("A", "B"), ("B", "A")]);
        let elo = report.elo_ratings();
        assert_eq!(elo[0].0, "A");
        assert!((elo[0].1 + elo[1].1).abs() < 1e-9);
    }
}
