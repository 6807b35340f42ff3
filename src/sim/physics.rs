//! Coupled two-wheel physics
//!
//! The outer wheel is the driver: it receives the power impulse and loses speed
//! to friction. The inner wheel is the follower: each step its velocity is pulled
//! toward the outer wheel's by the clutch ratio, then its own friction applies.
//!
//! Non-finite velocities or angles are a precondition violation. The engine does
//! not detect them; the game controller checks every step and recovers.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::consts::STABILITY_EPSILON;
use crate::rng::next_float;
use crate::settings::GameSettings;
use crate::wheel::{Wheel, WheelPair};
use crate::normalize_degrees;

/// Kinematic state of one wheel during a spin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    /// Degrees, [0, 360)
    pub angle: f64,
    /// Degrees per second, signed
    pub velocity: f64,
    /// Fraction of speed lost per step
    pub friction: f64,
    /// Moment of inertia (unit-mass disk)
    pub inertia: f64,
}

impl BodyState {
    pub fn from_wheel(wheel: &Wheel) -> Self {
        Self {
            angle: wheel.current_angle,
            velocity: wheel.angular_velocity,
            friction: wheel.friction_coefficient,
            inertia: wheel.inertia(),
        }
    }

    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        let omega = self.velocity.to_radians();
        0.5 * self.inertia * omega * omega
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.angle.is_finite() && self.velocity.is_finite()
    }

    #[inline]
    fn integrate(&mut self, dt: f64) {
        self.angle = normalize_degrees(self.angle + self.velocity * dt);
    }

    fn write_to(&self, wheel: &mut Wheel) {
        wheel.current_angle = self.angle;
        wheel.angular_velocity = self.velocity;
    }
}

/// Reduce `velocity` by `friction * |velocity|`, keeping its sign and never
/// crossing zero
#[inline]
pub fn apply_friction(velocity: f64, friction: f64) -> f64 {
    let speed = velocity.abs();
    let decel = (friction * speed).min(speed);
    (speed - decel).copysign(velocity)
}

/// Initial angular velocities for a spin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinImpulse {
    pub outer: f64,
    pub inner: f64,
}

impl SpinImpulse {
    /// Scale a power level in [0, 1] into angular velocities
    ///
    /// When `settings.power_jitter` is non-zero one draw is taken from `rng`.
    pub fn from_power<R: RngCore + ?Sized>(power: f64, settings: &GameSettings, rng: &mut R) -> Self {
        let jitter = if settings.power_jitter > 0.0 {
            next_float(rng, -settings.power_jitter, settings.power_jitter).unwrap_or(0.0)
        } else {
            0.0
        };
        let outer = power * settings.max_angular_velocity * (1.0 + jitter);
        Self {
            outer,
            inner: outer * settings.inner_impulse_ratio,
        }
    }
}

/// Per-spin state owned by the engine between `begin_spin` and `finish`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub outer: BodyState,
    pub inner: BodyState,
    /// Coupling of inner to outer (0 = free, 1 = locked)
    pub clutch_ratio: f64,
    /// Steps taken so far
    pub steps: u32,
}

impl SimulationState {
    pub fn from_wheels(wheels: &WheelPair) -> Self {
        Self {
            outer: BodyState::from_wheel(&wheels.outer),
            inner: BodyState::from_wheel(&wheels.inner),
            clutch_ratio: wheels.inner.clutch().clamp(0.0, 1.0),
            steps: 0,
        }
    }

    /// Advance one fixed timestep
    pub fn step(&mut self, dt: f64) {
        self.outer.velocity = apply_friction(self.outer.velocity, self.outer.friction);

        let pull = (self.outer.velocity - self.inner.velocity) * self.clutch_ratio;
        self.inner.velocity = apply_friction(self.inner.velocity + pull, self.inner.friction);

        self.outer.integrate(dt);
        self.inner.integrate(dt);
        self.steps += 1;
    }

    pub fn is_stable_within(&self, epsilon: f64) -> bool {
        self.outer.velocity.abs() < epsilon && self.inner.velocity.abs() < epsilon
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.outer.kinetic_energy() + self.inner.kinetic_energy()
    }

    pub fn is_finite(&self) -> bool {
        self.outer.is_finite() && self.inner.is_finite()
    }

    /// Run until stable or `max_steps`, returning the steps taken
    pub fn run_to_rest(&mut self, dt: f64, epsilon: f64, max_steps: u32) -> u32 {
        let start = self.steps;
        while !self.is_stable_within(epsilon) && self.steps - start < max_steps {
            self.step(dt);
        }
        self.steps - start
    }
}

/// Fixed-step integrator for the coupled wheels
#[derive(Debug, Clone)]
pub struct PhysicsEngine {
    state: Option<SimulationState>,
    epsilon: f64,
}

impl Default for PhysicsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsEngine {
    pub fn new() -> Self {
        Self {
            state: None,
            epsilon: STABILITY_EPSILON,
        }
    }

    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            state: None,
            epsilon,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Take ownership of the wheels' kinematics and apply the impulse
    pub fn begin_spin(&mut self, wheels: &WheelPair, impulse: SpinImpulse) {
        let mut state = SimulationState::from_wheels(wheels);
        state.outer.velocity = impulse.outer;
        state.inner.velocity = impulse.inner;
        log::debug!(
            "Spin started: outer {:.2} deg/s, inner {:.2} deg/s, clutch {:.2}",
            impulse.outer,
            impulse.inner,
            state.clutch_ratio
        );
        self.state = Some(state);
    }

    pub fn is_spinning(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&SimulationState> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut SimulationState> {
        self.state.as_mut()
    }

    /// Steps taken in the current spin
    pub fn steps(&self) -> u32 {
        self.state.as_ref().map(|s| s.steps).unwrap_or(0)
    }

    /// Advance one fixed timestep; returns whether the wheels are now stable
    pub fn step(&mut self, dt: f64) -> bool {
        match self.state.as_mut() {
            Some(state) => {
                state.step(dt);
                state.is_stable_within(self.epsilon)
            }
            None => true,
        }
    }

    /// True when no spin is active or both wheels are below the epsilon
    pub fn is_stable(&self) -> bool {
        self.state
            .as_ref()
            .map(|s| s.is_stable_within(self.epsilon))
            .unwrap_or(true)
    }

    /// Copy the current kinematics into the wheels
    pub fn commit(&self, wheels: &mut WheelPair) {
        if let Some(state) = &self.state {
            state.outer.write_to(&mut wheels.outer);
            state.inner.write_to(&mut wheels.inner);
        }
    }

    /// Commit and release the spin state
    pub fn finish(&mut self, wheels: &mut WheelPair) -> Option<SimulationState> {
        self.commit(wheels);
        self.state.take()
    }

    /// Discard the in-progress spin without committing
    pub fn abort(&mut self) {
        if self.state.take().is_some() {
            log::debug!("Spin aborted");
        }
    }

    /// Rest angles (outer, inner) a spin would reach, without touching `self`
    pub fn predict_rest(&self, wheels: &WheelPair, impulse: SpinImpulse, dt: f64, max_steps: u32) -> (f64, f64) {
        let mut probe = SimulationState::from_wheels(wheels);
        probe.outer.velocity = impulse.outer;
        probe.inner.velocity = impulse.inner;
        probe.run_to_rest(dt, self.epsilon, max_steps);
        (probe.outer.angle, probe.inner.angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::rng::LcgRandom;

    fn pair(outer_friction: f64, inner_friction: f64, clutch: f64) -> WheelPair {
        WheelPair::new(
            Wheel::default_outer(8).with_friction(outer_friction),
            Wheel::default_inner(6)
                .with_friction(inner_friction)
                .with_clutch_ratio(clutch),
        )
    }

    fn spin(wheels: &WheelPair, outer: f64, inner: f64) -> PhysicsEngine {
        let mut engine = PhysicsEngine::new();
        engine.begin_spin(wheels, SpinImpulse { outer, inner });
        engine
    }

    #[test]
    fn test_apply_friction() {
        assert_eq!(apply_friction(100.0, 0.1), 90.0);
        assert_eq!(apply_friction(-100.0, 0.1), -90.0);
        assert_eq!(apply_friction(50.0, 0.0), 50.0);
        // Never overshoots zero
        assert_eq!(apply_friction(10.0, 2.0), 0.0);
        assert_eq!(apply_friction(-10.0, 5.0), -0.0);
    }

    #[test]
    fn test_energy_conserved_without_friction_or_clutch() {
        let wheels = pair(0.0, 0.0, 0.0);
        let mut engine = spin(&wheels, 720.0, -300.0);
        let e0 = engine.state().unwrap().kinetic_energy();
        for _ in 0..1000 {
            engine.step(SIM_DT);
        }
        let e1 = engine.state().unwrap().kinetic_energy();
        assert!(((e1 - e0) / e0).abs() < 0.01);
    }

    #[test]
    fn test_friction_decays_monotonically_to_rest() {
        let wheels = pair(0.02, 0.03, 0.0);
        let mut engine = spin(&wheels, 1080.0, -540.0);
        let mut prev_outer = f64::INFINITY;
        let mut prev_inner = f64::INFINITY;
        let mut prev_energy = engine.state().unwrap().kinetic_energy();
        let mut steps = 0;
        while !engine.is_stable() {
            engine.step(SIM_DT);
            steps += 1;
            let s = engine.state().unwrap();
            assert!(s.is_finite());
            assert!(s.outer.velocity.abs() <= prev_outer);
            assert!(s.inner.velocity.abs() <= prev_inner);
            assert!(s.kinetic_energy() < prev_energy);
            prev_outer = s.outer.velocity.abs();
            prev_inner = s.inner.velocity.abs();
            prev_energy = s.kinetic_energy();
            assert!(steps < 2000, "spin did not settle");
        }
    }

    #[test]
    fn test_coupled_spin_settles_within_bound() {
        let wheels = pair(0.02, 0.02, 0.5);
        let mut engine = spin(&wheels, 648.0, -324.0);
        let mut steps = 0;
        while !engine.step(SIM_DT) {
            steps += 1;
            assert!(steps < 2000);
        }
        assert!(engine.state().unwrap().is_finite());
    }

    #[test]
    fn test_non_finite_body_is_detected() {
        let wheels = pair(0.02, 0.02, 0.5);
        let mut engine = spin(&wheels, 500.0, 0.0);
        assert!(engine.state().unwrap().is_finite());
        engine.state_mut().unwrap().inner.angle = f64::INFINITY;
        assert!(!engine.state().unwrap().is_finite());
    }

    #[test]
    fn test_clutch_transfer_tracks_ratio() {
        for &clutch in &[0.1, 0.25, 0.5, 0.9] {
            let wheels = pair(0.0, 0.0, clutch);
            let mut engine = spin(&wheels, 600.0, 0.0);
            engine.step(SIM_DT);
            let s = engine.state().unwrap();
            let transferred = s.inner.velocity / s.outer.velocity;
            assert!(
                (transferred - clutch).abs() <= clutch * 0.1,
                "clutch {}: transferred {}",
                clutch,
                transferred
            );
        }
    }

    #[test]
    fn test_locked_clutch_follows_outer() {
        let wheels = pair(0.02, 0.0, 1.0);
        let mut engine = spin(&wheels, 500.0, -500.0);
        for _ in 0..10 {
            engine.step(SIM_DT);
            let s = engine.state().unwrap();
            assert!((s.inner.velocity - s.outer.velocity).abs() < 1e-9);
        }
    }

    #[test]
    fn test_decoupled_inner_ignores_outer() {
        let wheels = pair(0.0, 0.0, 0.0);
        let mut engine = spin(&wheels, 900.0, 0.0);
        for _ in 0..100 {
            engine.step(SIM_DT);
        }
        let s = engine.state().unwrap();
        assert_eq!(s.inner.velocity, 0.0);
        assert_eq!(s.inner.angle, 0.0);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let wheels = pair(0.02, 0.01, 0.5);
        let runs: Vec<Vec<(f64, f64)>> = (0..3)
            .map(|_| {
                let mut engine = spin(&wheels, 777.7, -123.4);
                (0..600)
                    .map(|_| {
                        engine.step(SIM_DT);
                        let s = engine.state().unwrap();
                        (s.outer.angle, s.inner.angle)
                    })
                    .collect()
            })
            .collect();
        for run in &runs[1..] {
            for (a, b) in run.iter().zip(&runs[0]) {
                assert!((a.0 - b.0).abs() < 1e-10);
                assert!((a.1 - b.1).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_angles_stay_normalized() {
        let wheels = pair(0.001, 0.001, 0.3);
        let mut engine = spin(&wheels, -2000.0, 1500.0);
        for _ in 0..500 {
            engine.step(SIM_DT);
            let s = engine.state().unwrap();
            assert!((0.0..360.0).contains(&s.outer.angle));
            assert!((0.0..360.0).contains(&s.inner.angle));
        }
    }

    #[test]
    fn test_commit_finish_and_abort() {
        let mut wheels = pair(0.02, 0.02, 0.5);
        let mut engine = spin(&wheels, 300.0, 0.0);
        engine.step(SIM_DT);
        engine.commit(&mut wheels);
        assert_eq!(wheels.outer.angular_velocity, engine.state().unwrap().outer.velocity);
        assert!(wheels.outer.current_angle > 0.0);

        let angle = wheels.outer.current_angle;
        engine.step(SIM_DT);
        engine.abort();
        assert!(!engine.is_spinning());
        assert!(engine.is_stable());
        // Aborted steps never reach the wheels
        assert_eq!(wheels.outer.current_angle, angle);

        let mut engine = spin(&wheels, 300.0, 0.0);
        engine.step(SIM_DT);
        let finished = engine.finish(&mut wheels).unwrap();
        assert_eq!(finished.steps, 1);
        assert_eq!(wheels.outer.current_angle, finished.outer.angle);
    }

    #[test]
    fn test_predict_rest_matches_real_spin() {
        let wheels = pair(0.02, 0.02, 0.5);
        let impulse = SpinImpulse { outer: 640.0, inner: -320.0 };
        let mut engine = PhysicsEngine::new();
        let predicted = engine.predict_rest(&wheels, impulse, SIM_DT, 5000);
        engine.begin_spin(&wheels, impulse);
        while !engine.step(SIM_DT) {}
        let s = engine.state().unwrap();
        assert_eq!((s.outer.angle, s.inner.angle), predicted);
    }

    #[test]
    fn test_impulse_from_power() {
        let settings = GameSettings {
            power_jitter: 0.0,
            ..GameSettings::default()
        };
        let mut rng = LcgRandom::new(1);
        let impulse = SpinImpulse::from_power(0.5, &settings, &mut rng);
        assert_eq!(impulse.outer, 0.5 * settings.max_angular_velocity);
        assert_eq!(impulse.inner, impulse.outer * settings.inner_impulse_ratio);
        // No draw taken without jitter
        assert_eq!(rng.seed(), 1);

        let jittery = GameSettings::default();
        let impulse = SpinImpulse::from_power(1.0, &jittery, &mut rng);
        let max = jittery.max_angular_velocity;
        assert!(impulse.outer >= max * (1.0 - jittery.power_jitter));
        assert!(impulse.outer < max * (1.0 + jittery.power_jitter));
    }
}
