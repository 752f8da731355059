/// Validated match outcomes plus the player universe.
///
/// Players are identified by name at the API boundary and by slot (0..N, in
/// first-seen order) everywhere inside the engine. The slot order is the
/// canonical iteration order for every output, so it only depends on input order.
use std::collections::HashMap;

use crate::error::ValidationError;
use crate::types::MatchRecord;

#[derive(Debug, Clone)]
pub struct MatchLog {
    /// Player names by slot, in first-seen order.
    players: Vec<String>,
    name_to_slot: HashMap<String, usize>,
    matches: Vec<MatchRecord>,
}

impl MatchLog {
    /// Build a match log from `(winner, loser)` name pairs.
    ///
    /// Repeated pairs are kept: every record counts as a separate game.
    pub fn build<S: AsRef<str>>(pairs: &[(S, S)]) -> Result<Self, ValidationError> {
        if pairs.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        let mut log = MatchLog {
            players: Vec::new(),
            name_to_slot: HashMap::new(),
            matches: Vec::with_capacity(pairs.len()),
        };

        for (index, (winner, loser)) in pairs.iter().enumerate() {
            let (winner, loser) = (winner.as_ref(), loser.as_ref());
            if winner.is_empty() || loser.is_empty() {
                return Err(ValidationError::EmptyPlayerName { index });
            }
            if winner == loser {
                return Err(ValidationError::SelfMatch { index, player: winner.to_string() });
            }
            let winner = log.slot_or_insert(winner);
            let loser = log.slot_or_insert(loser);
            log.matches.push(MatchRecord { winner, loser });
        }

        Ok(log)
    }

    fn slot_or_insert(&mut self, name: &str) -> usize {
        if let Some(&slot) = self.name_to_slot.get(name) {
            return slot;
        }
        let slot = self.players.len();
        self.players.push(name.to_string());
        self.name_to_slot.insert(name.to_string(), slot);
        slot
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn num_matches(&self) -> usize {
        self.matches.len()
    }

    /// Player names in canonical order.
    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn player_name(&self, slot: usize) -> &str {
        &self.players[slot]
    }

    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.name_to_slot.get(name).copied()
    }

    /// Wins per player slot.
    pub fn wins(&self) -> Vec<usize> {
        let mut wins = vec![0; self.players.len()];
        for m in &self.matches {
            wins[m.winner] += 1;
        }
        wins
    }

    /// Losses per player slot.
    pub fn losses(&self) -> Vec<usize> {
        let mut losses = vec![0; self.players.len()];
        for m in &self.matches {
            losses[m.loser] += 1;
        }
        losses
    }

    /// Connected components of the "played against" graph.
    ///
    /// Each component lists its slots in ascending order; components are
    /// ordered by their lowest slot. A connected log yields exactly one component.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let n = self.players.len();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for m in &self.matches {
            adjacency[m.winner].push(m.loser);
            adjacency[m.loser].push(m.winner);
        }

        let mut visited = vec![false; n];
        let mut components = Vec::new();
        let mut stack = Vec::new();

        for start in 0..n {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            stack.push(start);
            let mut component = Vec::new();

            while let Some(slot) = stack.pop() {
                component.push(slot);
                for &next in &adjacency[slot] {
                    if !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }

            component.sort_unstable();
            components.push(component);
        }

        components
    }

    pub fn is_connected(&self) -> bool {
        self.components().len() <= 1
    }
}
