//! Wheel Within - a two-wheel spinning game core
//!
//! Core modules:
//! - `rng`: Deterministic seeded RNG (plus a process-wide default)
//! - `selection`: Weighted inverse-CDF selection
//! - `wheel`: Wheel and wedge configuration
//! - `sim`: Deterministic simulation (coupled physics, wedge resolution, game state)
//! - `players`: Turn rotation, scores, winners
//! - `rules`: Scoring rules
//! - `game`: Turn orchestration state machine
//! - `settings`: Data-driven game configuration

pub mod error;
pub mod game;
pub mod players;
pub mod rng;
pub mod rules;
pub mod selection;
pub mod settings;
pub mod sim;
pub mod wheel;

pub use error::{AnomalyKind, GameError, RecoveredError, RecoveryObserver, ValidationError, WedgeError};
pub use game::GameController;
pub use players::{Player, PlayerManager};
pub use rng::LcgRandom;
pub use rules::{RuleCondition, RuleEffect, ScoringRule};
pub use selection::WeightedSelector;
pub use settings::{GameSettings, OutcomeMode, SpinFeel};
pub use sim::{GamePhase, GameState, PhysicsEngine, SpinResult, determine_wedge_result};
pub use wheel::{Wedge, Wheel, WheelPair, WheelRole};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the accumulator accepts (seconds)
    pub const MAX_FRAME_DT: f64 = 0.1;

    /// Both wheels below this angular speed (deg/s) means the spin is over
    pub const STABILITY_EPSILON: f64 = 0.01;
    /// Angular velocity at full power (deg/s)
    pub const DEFAULT_MAX_ANGULAR_VELOCITY: f64 = 1080.0;
    /// Steps before a spin is forcibly resolved (60 s at 60 Hz)
    pub const DEFAULT_MAX_SPIN_STEPS: u32 = 3600;

    /// Power meter sweep speed (units of 0..100 per second)
    pub const DEFAULT_POWER_METER_SPEED: f64 = 120.0;
    /// Inner wheel impulse relative to the outer (negative = counter-rotation)
    pub const DEFAULT_INNER_IMPULSE_RATIO: f64 = -0.5;
    /// Fractional jitter applied to each impulse
    pub const DEFAULT_POWER_JITTER: f64 = 0.05;

    /// Seed used when none is given
    pub const DEFAULT_SEED: u32 = 12345;
    /// Number of rounds in a default game
    pub const DEFAULT_MAX_ROUNDS: u32 = 3;

    /// Wheel defaults
    pub const DEFAULT_OUTER_RADIUS: f64 = 200.0;
    pub const DEFAULT_INNER_RADIUS: f64 = 110.0;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(450.0), 90.0);
        assert_eq!(normalize_degrees(-720.0), 0.0);
        let tiny = normalize_degrees(-1e-20);
        assert!((0.0..360.0).contains(&tiny));
    }
}
