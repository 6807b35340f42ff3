//! Power meter
//!
//! Sweeps 0 → 100 → 0 as a triangle wave until the player stops it.

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_POWER_METER_SPEED;
use crate::error::ValidationError;

/// Length of one full sweep up and back down
const SWEEP_PERIOD: f64 = 200.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerMeter {
    /// Position along the sweep, [0, 200)
    phase: f64,
    /// Units of 0..100 per second
    speed: f64,
    active: bool,
}

impl Default for PowerMeter {
    fn default() -> Self {
        Self::new(DEFAULT_POWER_METER_SPEED)
    }
}

impl PowerMeter {
    pub fn new(speed: f64) -> Self {
        Self {
            phase: 0.0,
            speed,
            active: false,
        }
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// Start sweeping from zero
    pub fn start(&mut self) {
        self.phase = 0.0;
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance the sweep by `dt` seconds
    pub fn update(&mut self, dt: f64) {
        if !self.active || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.phase = (self.phase + self.speed * dt).rem_euclid(SWEEP_PERIOD);
    }

    /// Current meter reading, 0..=100
    pub fn value(&self) -> f64 {
        if self.phase <= 100.0 {
            self.phase
        } else {
            SWEEP_PERIOD - self.phase
        }
    }

    /// Freeze the meter and return the power level in [0, 1]
    pub fn stop(&mut self) -> f64 {
        self.active = false;
        self.value() / 100.0
    }
}

/// Accept a power level as a fraction (0..=1) or a percentage (0..=100)
pub fn normalize_power_level(level: f64) -> Result<f64, ValidationError> {
    if !level.is_finite() || !(0.0..=100.0).contains(&level) {
        return Err(ValidationError::InvalidPowerLevel(level));
    }
    Ok(if level > 1.0 { level / 100.0 } else { level })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_up_and_down() {
        let mut meter = PowerMeter::new(100.0);
        meter.start();
        meter.update(0.5);
        assert!((meter.value() - 50.0).abs() < 1e-9);
        meter.update(0.5);
        assert!((meter.value() - 100.0).abs() < 1e-9);
        meter.update(0.25);
        assert!((meter.value() - 75.0).abs() < 1e-9);
        meter.update(1.0);
        assert!((meter.value() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_freezes() {
        let mut meter = PowerMeter::new(100.0);
        meter.start();
        meter.update(0.6);
        let level = meter.stop();
        assert!((level - 0.6).abs() < 1e-9);
        meter.update(1.0);
        assert!((meter.value() - 60.0).abs() < 1e-9);
        assert!(!meter.is_active());
    }

    #[test]
    fn test_inactive_meter_ignores_updates() {
        let mut meter = PowerMeter::default();
        meter.update(1.0);
        assert_eq!(meter.value(), 0.0);
    }

    #[test]
    fn test_normalize_power_level() {
        assert_eq!(normalize_power_level(0.6), Ok(0.6));
        assert_eq!(normalize_power_level(1.0), Ok(1.0));
        assert_eq!(normalize_power_level(60.0), Ok(0.6));
        assert_eq!(normalize_power_level(0.0), Ok(0.0));
        assert!(normalize_power_level(-0.1).is_err());
        assert!(normalize_power_level(100.5).is_err());
        assert!(normalize_power_level(f64::NAN).is_err());
    }
}
