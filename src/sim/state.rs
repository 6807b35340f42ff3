//! Game state and turn records
//!
//! Everything a host needs to persist to resume a game lives in `GameState`.
//! Wheels are configuration and travel separately.

use serde::{Deserialize, Serialize};

use crate::error::RecoveredError;
use crate::players::PlayerManager;
use crate::rules::TurnScore;
use crate::wheel::Wedge;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Wheels and players registered, no turn active
    #[default]
    Setup,
    /// Waiting for the current player to start a spin
    Playing,
    /// Power meter sweeping
    PowerSelection,
    /// Physics running until both wheels settle
    Spinning,
    /// Wedges resolved, waiting for the turn to be completed
    Result,
    /// Game over
    Finished,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Setup => "setup",
            GamePhase::Playing => "playing",
            GamePhase::PowerSelection => "power-selection",
            GamePhase::Spinning => "spinning",
            GamePhase::Result => "result",
            GamePhase::Finished => "finished",
        }
    }

    /// Phases that cannot survive a save/restore (no simulation state persists)
    pub fn is_transient(&self) -> bool {
        matches!(self, GamePhase::PowerSelection | GamePhase::Spinning)
    }
}

/// Wedges under the needle once both wheels came to rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    pub outer_wedge: Wedge,
    pub inner_wedge: Wedge,
    pub outer_index: usize,
    pub inner_index: usize,
    /// Rest angles in degrees
    pub outer_angle: f64,
    pub inner_angle: f64,
}

/// One completed turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub player: String,
    pub round: u32,
    pub power: f64,
    pub result: SpinResult,
    pub score: TurnScore,
    /// Player total after this turn
    pub total: i64,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameState {
    /// Seed the game's RNG started from
    #[serde(default)]
    pub seed: u32,
    #[serde(default)]
    pub phase: GamePhase,
    #[serde(default)]
    pub players: PlayerManager,
    /// Completed turns
    #[serde(default)]
    pub turn_count: u64,
    /// Power level of the spin in progress or last resolved
    #[serde(default)]
    pub power_level: Option<f64>,
    #[serde(default)]
    pub last_result: Option<SpinResult>,
    /// Score of `last_result`, pending until the turn completes
    #[serde(default)]
    pub pending_score: Option<TurnScore>,
    #[serde(default)]
    pub history: Vec<TurnRecord>,
    /// Non-fatal errors recovered during play
    #[serde(default)]
    pub errors: Vec<RecoveredError>,
}

impl GameState {
    pub fn new(seed: u32, players: PlayerManager) -> Self {
        Self {
            seed,
            players,
            ..Self::default()
        }
    }

    /// Repair state invariants in place; returns a description of each fix
    pub fn repair(&mut self) -> Vec<String> {
        let mut fixes = self.players.repair();

        if self.phase == GamePhase::Result && self.last_result.is_none() {
            fixes.push("result phase without a result, back to playing".to_string());
            self.phase = GamePhase::Playing;
            self.pending_score = None;
        }

        if let Some(power) = self.power_level {
            if !power.is_finite() || !(0.0..=1.0).contains(&power) {
                fixes.push(format!("power level {} cleared", power));
                self.power_level = None;
            }
        }

        fixes
    }
}
