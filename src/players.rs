//! Hot-seat player bookkeeping
//!
//! Turn rotation, per-player scores, elimination and winner detection. Scores are
//! keyed by player name in a `BTreeMap` so iteration order is stable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A seat at the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// Eliminated players are skipped by the rotation
    #[serde(default)]
    pub eliminated: bool,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            eliminated: false,
        }
    }
}

/// Where the rotation lands next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextSeat {
    pub index: usize,
    /// The rotation passes seat 0, starting a new round
    pub wraps: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerManager {
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub current_player_index: usize,
    /// 1-based round number
    #[serde(default)]
    pub round: u32,
    #[serde(default)]
    pub scores: BTreeMap<String, i64>,
}

impl Default for PlayerManager {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            current_player_index: 0,
            round: 1,
            scores: BTreeMap::new(),
        }
    }
}

impl PlayerManager {
    /// Register players in seating order
    pub fn new<I, S>(names: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manager = Self::default();
        for name in names {
            let name = name.into();
            if manager.scores.contains_key(&name) {
                return Err(ValidationError::DuplicatePlayer(name));
            }
            manager.scores.insert(name.clone(), 0);
            manager.players.push(Player::new(name));
        }
        if manager.players.is_empty() {
            return Err(ValidationError::NoPlayers);
        }
        Ok(manager)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    pub fn score_of(&self, name: &str) -> Option<i64> {
        self.scores.get(name).copied()
    }

    /// Add `points` to the current player; returns the new total
    pub fn record_score(&mut self, points: i64) -> Option<i64> {
        let name = self.current_player()?.name.clone();
        let total = self.scores.entry(name).or_insert(0);
        *total = total.saturating_add(points);
        Some(*total)
    }

    pub fn eliminate_current(&mut self) {
        if let Some(player) = self.players.get_mut(self.current_player_index) {
            log::info!("{} eliminated", player.name);
            player.eliminated = true;
        }
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| !p.eliminated).count()
    }

    /// Next un-eliminated seat after the current one (may be the current seat)
    pub fn peek_next(&self) -> Option<NextSeat> {
        let len = self.players.len();
        if len == 0 {
            return None;
        }
        let start = self.current_player_index.min(len - 1);
        (1..=len)
            .map(|step| (start + step) % len)
            .find(|&i| !self.players[i].eliminated)
            .map(|index| NextSeat {
                index,
                wraps: index <= start,
            })
    }

    /// Move to the next seat, bumping the round on wraparound
    pub fn advance(&mut self) -> Option<NextSeat> {
        let next = self.peek_next()?;
        self.current_player_index = next.index;
        if next.wraps {
            self.round += 1;
            log::info!("Round {} begins", self.round);
        }
        Some(next)
    }

    pub fn max_score(&self) -> Option<i64> {
        self.contenders().filter_map(|p| self.score_of(&p.name)).max()
    }

    /// All contenders tied at the maximum score
    ///
    /// Contenders are the un-eliminated players, or everyone once all are out.
    pub fn winners(&self) -> Vec<String> {
        let Some(best) = self.max_score() else {
            return Vec::new();
        };
        self.contenders()
            .filter(|p| self.score_of(&p.name) == Some(best))
            .map(|p| p.name.clone())
            .collect()
    }

    fn contenders(&self) -> impl Iterator<Item = &Player> {
        let any_active = self.players.iter().any(|p| !p.eliminated);
        self.players.iter().filter(move |p| !any_active || !p.eliminated)
    }

    /// Zero scores, revive everyone, back to seat 0 in round 1
    pub fn reset(&mut self) {
        for player in &mut self.players {
            player.eliminated = false;
        }
        self.scores = self.players.iter().map(|p| (p.name.clone(), 0)).collect();
        self.current_player_index = 0;
        self.round = 1;
    }

    /// Repair invariants in place; returns a description of each fix
    pub fn repair(&mut self) -> Vec<String> {
        let mut fixes = Vec::new();

        if !self.players.is_empty() && self.current_player_index >= self.players.len() {
            fixes.push(format!(
                "current player index {} out of range for {} players, reset to 0",
                self.current_player_index,
                self.players.len()
            ));
            self.current_player_index = 0;
        }

        if self.round == 0 {
            fixes.push("round 0 reset to 1".to_string());
            self.round = 1;
        }

        let missing: Vec<String> = self
            .players
            .iter()
            .filter(|p| !self.scores.contains_key(&p.name))
            .map(|p| p.name.clone())
            .collect();
        if !missing.is_empty() {
            fixes.push(format!("missing scores for {} restored to 0", missing.join(", ")));
            for name in missing {
                self.scores.insert(name, 0);
            }
        }

        let before = self.scores.len();
        let players = &self.players;
        self.scores.retain(|name, _| players.iter().any(|p| &p.name == name));
        if self.scores.len() != before {
            fixes.push(format!("dropped {} scores for unknown players", before - self.scores.len()));
        }

        fixes
    }
}
