//! Game settings
//!
//! Plain serializable configuration handed over by the preset layer.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ValidationError;
use crate::rules::ScoringRule;

/// Spin feel presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpinFeel {
    Gentle,
    #[default]
    Standard,
    Wild,
}

impl SpinFeel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinFeel::Gentle => "Gentle",
            SpinFeel::Standard => "Standard",
            SpinFeel::Wild => "Wild",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gentle" | "slow" => Some(SpinFeel::Gentle),
            "standard" | "std" => Some(SpinFeel::Standard),
            "wild" | "fast" => Some(SpinFeel::Wild),
            _ => None,
        }
    }

    /// Angular velocity at full power (deg/s)
    pub fn max_angular_velocity(&self) -> f64 {
        match self {
            SpinFeel::Gentle => 720.0,
            SpinFeel::Standard => DEFAULT_MAX_ANGULAR_VELOCITY,
            SpinFeel::Wild => 1800.0,
        }
    }

    /// Power meter sweep speed
    pub fn power_meter_speed(&self) -> f64 {
        match self {
            SpinFeel::Gentle => 80.0,
            SpinFeel::Standard => DEFAULT_POWER_METER_SPEED,
            SpinFeel::Wild => 200.0,
        }
    }
}

/// How the landed wedges are decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutcomeMode {
    /// Whatever sits under the needle when the wheels come to rest
    #[default]
    Physical,
    /// Wedges drawn by weight; the spin is aimed to come to rest on them
    Weighted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub feel: SpinFeel,
    /// Seed for the game's RNG
    pub seed: u32,

    // === Spin ===
    /// Angular velocity at full power (deg/s)
    pub max_angular_velocity: f64,
    /// Inner wheel impulse relative to the outer (negative = counter-rotation)
    pub inner_impulse_ratio: f64,
    /// Fractional random spread applied to the impulse (0 = exact)
    pub power_jitter: f64,
    /// Power meter sweep speed (units of 0..100 per second)
    pub power_meter_speed: f64,
    /// Steps before a spin is forcibly resolved
    pub max_spin_steps: u32,
    pub outcome_mode: OutcomeMode,

    // === Match ===
    pub max_rounds: u32,
    /// First player to reach this total ends the game
    pub target_score: Option<i64>,
    pub rules: Vec<ScoringRule>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            feel: SpinFeel::Standard,
            seed: DEFAULT_SEED,

            max_angular_velocity: DEFAULT_MAX_ANGULAR_VELOCITY,
            inner_impulse_ratio: DEFAULT_INNER_IMPULSE_RATIO,
            power_jitter: DEFAULT_POWER_JITTER,
            power_meter_speed: DEFAULT_POWER_METER_SPEED,
            max_spin_steps: DEFAULT_MAX_SPIN_STEPS,
            outcome_mode: OutcomeMode::Physical,

            max_rounds: DEFAULT_MAX_ROUNDS,
            target_score: None,
            rules: Vec::new(),
        }
    }
}

impl GameSettings {
    /// Create settings from a feel preset
    pub fn from_preset(feel: SpinFeel) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(feel);
        settings
    }

    /// Apply a feel preset (updates feel-dependent settings)
    pub fn apply_preset(&mut self, feel: SpinFeel) {
        self.feel = feel;
        self.max_angular_velocity = feel.max_angular_velocity();
        self.power_meter_speed = feel.power_meter_speed();
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Check numeric settings
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.max_angular_velocity.is_finite() || self.max_angular_velocity <= 0.0 {
            return Err(ValidationError::InvalidRange {
                min: 0.0,
                max: self.max_angular_velocity,
            });
        }
        if !self.inner_impulse_ratio.is_finite() {
            return Err(ValidationError::InvalidRange {
                min: f64::NEG_INFINITY,
                max: self.inner_impulse_ratio,
            });
        }
        if !(0.0..1.0).contains(&self.power_jitter) {
            return Err(ValidationError::InvalidRange {
                min: self.power_jitter,
                max: 1.0,
            });
        }
        if !self.power_meter_speed.is_finite() || self.power_meter_speed <= 0.0 {
            return Err(ValidationError::InvalidRange {
                min: 0.0,
                max: self.power_meter_speed,
            });
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let settings: Self = serde_json::from_str(json)?;
        log::info!("Loaded settings ({} feel, seed {})", settings.feel.as_str(), settings.seed);
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
