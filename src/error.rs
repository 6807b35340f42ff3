//! Error taxonomy
//!
//! Configuration mistakes are returned as `Err` and never auto-recovered.
//! Runtime anomalies during a turn are repaired in place and recorded as
//! [`RecoveredError`] entries on the game state instead.

use serde::{Deserialize, Serialize};

use crate::sim::GamePhase;

/// Bad input handed to the core by its caller
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("items and weights differ in length ({items} items, {weights} weights)")]
    MismatchedLengths { items: usize, weights: usize },
    #[error("weight list is empty")]
    EmptyWeights,
    #[error("weight at index {index} is negative ({weight})")]
    NegativeWeight { index: usize, weight: f64 },
    #[error("weight at index {index} is not finite")]
    NonFiniteWeight { index: usize },
    #[error("total weight must be greater than zero")]
    ZeroTotalWeight,
    #[error("invalid range: min {min} must be less than max {max}")]
    InvalidRange { min: f64, max: f64 },
    #[error("wheel '{wheel_id}' has no wedges")]
    EmptyWedgeSet { wheel_id: String },
    #[error("wheel '{wheel_id}' friction coefficient must be finite and >= 0 (got {value})")]
    InvalidFriction { wheel_id: String, value: f64 },
    #[error("wheel '{wheel_id}' clutch ratio must be within 0..=1 (got {value})")]
    InvalidClutchRatio { wheel_id: String, value: f64 },
    #[error("wheel '{wheel_id}' radius must be finite and > 0 (got {value})")]
    InvalidRadius { wheel_id: String, value: f64 },
    #[error("wedge '{wedge_id}' on wheel '{wheel_id}': {source}")]
    InvalidWedge {
        wheel_id: String,
        wedge_id: String,
        source: Box<ValidationError>,
    },
    #[error("exactly two wheels are required for coupled play (got {0})")]
    WheelCount(usize),
    #[error("wheel role '{0}' is assigned twice")]
    DuplicateRole(&'static str),
    #[error("at least one player is required")]
    NoPlayers,
    #[error("player name '{0}' is used twice")]
    DuplicatePlayer(String),
    #[error("power level must be within 0..=1 or 0..=100 (got {0})")]
    InvalidPowerLevel(f64),
}

/// Wedge lookup failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WedgeError {
    #[error("cannot resolve a wedge on an empty wedge set")]
    EmptyWedgeSet,
    #[error("wedge index {index} out of range for {count} wedges")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Errors surfaced by the game controller's command surface
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Wedge(#[from] WedgeError),
    #[error("command requires phase {expected:?}, game is in {actual:?}")]
    InvalidPhase {
        expected: GamePhase,
        actual: GamePhase,
    },
    #[error("game has not been initialized with wheels and players")]
    NotInitialized,
    #[error("failed to read persisted state: {0}")]
    Persistence(#[from] serde_json::Error),
}

/// Kind of runtime anomaly that was repaired during play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyKind {
    /// Non-finite angle or velocity coming out of the physics step
    PhysicsAnomaly,
    /// Invalid player index, missing score entries or similar
    StateCorruption,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::PhysicsAnomaly => "PhysicsAnomaly",
            AnomalyKind::StateCorruption => "StateCorruption",
        }
    }
}

/// Non-fatal error entry attached to the game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveredError {
    pub kind: AnomalyKind,
    pub detail: String,
    pub recovered: bool,
    /// Turn counter when the anomaly was seen
    #[serde(default)]
    pub turn: u64,
}

/// Receives a notification for every runtime recovery
pub trait RecoveryObserver {
    fn on_recovered(&mut self, kind: AnomalyKind, detail: &str);
}
