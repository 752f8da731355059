/// Fully materialised pairwise win-probability table.
///
/// Entry (i, j) is σ(r_i − r_j); the diagonal is `None`. Every off-diagonal
/// pair sums to exactly 1.0: the favourite's probability is computed and the
/// underdog gets 1 − p, which is exact for p ≥ 0.5.
use crate::likelihood::sigmoid;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WinProbabilityMatrix {
    /// Player names in canonical (first-seen) order; rows and columns follow it.
    players: Vec<String>,
    probabilities: Vec<Vec<Option<f64>>>,
}

impl WinProbabilityMatrix {
    /// `players` and `ratings` are parallel, in canonical order.
    pub fn from_ratings(players: &[String], ratings: &[f64]) -> Self {
        assert_eq!(players.len(), ratings.len(), "one rating per player");
        let n = ratings.len();
        let mut probabilities = vec![vec![None; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let diff = ratings[i] - ratings[j];
                let favourite = sigmoid(diff.abs());
                let underdog = 1.0 - favourite;
                let (p_ij, p_ji) = if diff >= 0.0 {
                    (favourite, underdog)
                } else {
                    (underdog, favourite)
                };
                probabilities[i][j] = Some(p_ij);
                probabilities[j][i] = Some(p_ji);
            }
        }

        WinProbabilityMatrix {
            players: players.to_vec(),
            probabilities,
        }
    }

    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// P(row beats column) by slot. `None` on the diagonal or out of range.
    pub fn get_by_slot(&self, i: usize, j: usize) -> Option<f64> {
        self.probabilities.get(i)?.get(j).copied().flatten()
    }

    /// P(`a` beats `b`) by name.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.get_by_slot(self.slot(a)?, self.slot(b)?)
    }

    /// All of `player`'s win probabilities against everyone else, in canonical order.
    pub fn row(&self, player: &str) -> Option<Vec<(&str, f64)>> {
        let i = self.slot(player)?;
        Some(
            self.players
                .iter()
                .enumerate()
                .filter_map(|(j, name)| self.probabilities[i][j].map(|p| (name.as_str(), p)))
                .collect(),
        )
    }

    /// The raw table, rows and columns in canonical order.
    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.probabilities
    }

    fn slot(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_equal_ratings_are_coin_flips() {
        let m = WinProbabilityMatrix::from_ratings(&names(&["A", "B"]), &[0.0, 0.0]);
        assert_eq!(m.get("A", "B"), Some(0.5));
        assert_eq!(m.get("B", "A"), Some(0.5));
    }

    #[test]
    fn test_diagonal_is_omitted() {
        let m = WinProbabilityMatrix::from_ratings(&names(&["A", "B", "C"]), &[1.0, 0.0, -1.0]);
        for i in 0..3 {
            assert_eq!(m.get_by_slot(i, i), None);
        }
        assert_eq!(m.get("A", "A"), None);
        assert_eq!(m.get("A", "Zed"), None);
    }

    #[test]
    fn test_pairs_sum_to_exactly_one() {
        let ratings = [3.7, -0.0001, 12.5, -8.25, 0.3333, 40.0];
        let players = names(&["a", "b", "c", "d", "e", "f"]);
        let m = WinProbabilityMatrix::from_ratings(&players, &ratings);

        for i in 0..ratings.len() {
            for j in 0..ratings.len() {
                if i != j {
                    let sum = m.get_by_slot(i, j).unwrap() + m.get_by_slot(j, i).unwrap();
                    assert_eq!(sum, 1.0, "pair ({i}, {j})");
                }
            }
        }
    }

    #[test]
    fn test_stronger_player_favoured() {
        let m = WinProbabilityMatrix::from_ratings(&names(&["A", "B"]), &[1.0, -1.0]);
        let p = m.get("A", "B").unwrap();
        assert!((p - 1.0 / (1.0 + (-2.0_f64).exp())).abs() < 1e-15);
    }

    #[test]
    fn test_row_lists_every_opponent() {
        let m = WinProbabilityMatrix::from_ratings(&names(&["A", "B", "C"]), &[0.5, 0.0, -0.5]);
        let row = m.row("B").unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row[0].0, "A");
        assert_eq!(row[1].0, "C");
        assert!(row[0].1 < 0.5 && row[1].1 > 0.5);
        assert!(m.row("nobody").is_none());
    }
}
