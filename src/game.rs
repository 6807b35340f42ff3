//! Turn orchestration
//!
//! `GameController` sequences setup → playing → power-selection → spinning →
//! result → (playing | finished). The host calls `tick` once per animation
//! frame; the controller runs fixed physics substeps from an accumulator,
//! commits wheel kinematics after each one, and resolves the turn once both
//! wheels are at rest.
//!
//! Runtime anomalies (non-finite physics values, corrupted bookkeeping) never
//! abort the session: they are repaired, logged, recorded on the game state and
//! reported to the optional [`RecoveryObserver`].

use std::collections::BTreeMap;

use crate::consts::*;
use crate::error::{AnomalyKind, GameError, RecoveredError, RecoveryObserver};
use crate::players::Player;
use crate::rng::{LcgRandom, next_float};
use crate::rules::score_turn;
use crate::selection::{WeightedSelector, validate_weights};
use crate::settings::{GameSettings, OutcomeMode};
use crate::sim::{
    GamePhase, GameState, PhysicsEngine, PowerMeter, SpinImpulse, SpinResult, TurnRecord, angle_for_index,
    determine_wedge_result, normalize_power_level,
};
use crate::wheel::{Wheel, WheelPair, WheelRole};
use crate::normalize_degrees;

/// Drives one hot-seat game
pub struct GameController {
    settings: GameSettings,
    rng: LcgRandom,
    wheels: Option<WheelPair>,
    engine: PhysicsEngine,
    power_meter: PowerMeter,
    state: GameState,
    /// Unconsumed frame time (seconds)
    accumulator: f64,
    observer: Option<Box<dyn RecoveryObserver>>,
}

impl Default for GameController {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}

impl GameController {
    pub fn new(settings: GameSettings) -> Self {
        Self {
            rng: LcgRandom::new(settings.seed),
            power_meter: PowerMeter::new(settings.power_meter_speed),
            state: GameState {
                seed: settings.seed,
                ..GameState::default()
            },
            settings,
            wheels: None,
            engine: PhysicsEngine::new(),
            accumulator: 0.0,
            observer: None,
        }
    }

    /// Receive a callback for every runtime recovery
    pub fn set_observer(&mut self, observer: Box<dyn RecoveryObserver>) {
        self.observer = Some(observer);
    }

    // === Commands ===

    /// Register wheels and players; the game waits in `Setup`
    pub fn initialize_game<S: Into<String>>(&mut self, wheels: Vec<Wheel>, players: Vec<S>) -> Result<(), GameError> {
        self.settings.validate()?;
        let pair = WheelPair::from_wheels(wheels)?;
        if self.settings.outcome_mode == OutcomeMode::Weighted {
            validate_weights(&pair.outer.wedge_weights())?;
            validate_weights(&pair.inner.wedge_weights())?;
        }
        let players = crate::players::PlayerManager::new(players)?;

        self.engine.abort();
        self.power_meter = PowerMeter::new(self.settings.power_meter_speed);
        self.accumulator = 0.0;
        self.state = GameState::new(self.rng.seed(), players);

        log::info!(
            "Game initialized: {} players, outer '{}' ({} wedges), inner '{}' ({} wedges), seed {}",
            self.state.players.len(),
            pair.outer.id,
            pair.outer.wedges.len(),
            pair.inner.id,
            pair.inner.wedges.len(),
            self.state.seed
        );
        self.wheels = Some(pair);
        Ok(())
    }

    /// Setup → Playing
    pub fn start_game(&mut self) -> Result<(), GameError> {
        if self.wheels.is_none() {
            return Err(GameError::NotInitialized);
        }
        self.expect_phase(GamePhase::Setup)?;
        self.state.phase = GamePhase::Playing;
        log::info!("Game started, round {}", self.state.players.round);
        Ok(())
    }

    /// Playing → PowerSelection
    pub fn start_power_meter(&mut self) -> Result<(), GameError> {
        self.expect_phase(GamePhase::Playing)?;
        // The spin is scored against the current player's total
        self.repair_state();
        self.power_meter.start();
        self.state.phase = GamePhase::PowerSelection;
        Ok(())
    }

    /// Advance the power meter sweep; returns the meter reading (0..=100)
    pub fn update_power_meter(&mut self, dt: f64) -> f64 {
        if self.state.phase == GamePhase::PowerSelection {
            self.power_meter.update(dt);
        }
        self.power_meter.value()
    }

    /// PowerSelection → Spinning with an explicit level (0..=1, or a percentage)
    pub fn stop_power_meter(&mut self, level: f64) -> Result<(), GameError> {
        self.expect_phase(GamePhase::PowerSelection)?;
        let power = normalize_power_level(level)?;
        self.launch_spin(power)
    }

    /// PowerSelection → Spinning at the meter's current reading
    pub fn stop_power_meter_at_current(&mut self) -> Result<f64, GameError> {
        self.expect_phase(GamePhase::PowerSelection)?;
        let power = self.power_meter.value() / 100.0;
        self.launch_spin(power)?;
        Ok(power)
    }

    /// Advance the spin by one animation frame of `frame_dt` seconds
    ///
    /// Outside `Spinning` this is a no-op. Returns the phase after the frame.
    pub fn tick(&mut self, frame_dt: f64) -> Result<GamePhase, GameError> {
        if self.state.phase != GamePhase::Spinning {
            return Ok(self.state.phase);
        }

        let frame_dt = if frame_dt.is_finite() { frame_dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
            if self.step()? {
                break;
            }
        }
        Ok(self.state.phase)
    }

    /// Run one fixed physics step; returns true once the spin has resolved
    pub fn step(&mut self) -> Result<bool, GameError> {
        if self.state.phase != GamePhase::Spinning {
            return Ok(true);
        }

        self.engine.step(SIM_DT);
        self.recover_physics_anomalies();
        let mut stable = self.engine.is_stable();

        if let Some(wheels) = self.wheels.as_mut() {
            self.engine.commit(wheels);
        }

        let steps = self.engine.steps();
        if !stable && steps >= self.settings.max_spin_steps {
            log::warn!("Spin did not settle after {} steps, forcing resolution", steps);
            stable = true;
        }

        if stable {
            self.resolve_spin()?;
        }
        Ok(stable)
    }

    /// Step the current spin until it resolves
    pub fn run_spin(&mut self) -> Result<(), GameError> {
        // max_spin_steps bounds this loop; the extra margin covers a zero setting
        for _ in 0..=self.settings.max_spin_steps as u64 + 1 {
            if self.step()? {
                break;
            }
        }
        Ok(())
    }

    /// Result → Playing (or Finished): record the score and pass the turn
    pub fn complete_turn(&mut self) -> Result<TurnRecord, GameError> {
        self.expect_phase(GamePhase::Result)?;
        self.repair_state();
        // Repair can demote a malformed result phase
        self.expect_phase(GamePhase::Result)?;

        let Some(result) = self.state.last_result.clone() else {
            return Err(GameError::InvalidPhase {
                expected: GamePhase::Result,
                actual: self.state.phase,
            });
        };
        let score = match self.state.pending_score.take() {
            Some(score) => score,
            None => {
                let total = self.current_total();
                score_turn(&result, &self.settings.rules, total)
            }
        };

        let player = self.state.players.current_player().map(|p| p.name.clone()).unwrap_or_default();
        let total = self.state.players.record_score(score.points).unwrap_or(score.points);
        if score.eliminated {
            self.state.players.eliminate_current();
        }

        let record = TurnRecord {
            player,
            round: self.state.players.round,
            power: self.state.power_level.unwrap_or(0.0),
            result,
            score,
            total,
        };
        log::info!(
            "Turn {}: {} scored {} (total {})",
            self.state.turn_count + 1,
            record.player,
            record.score.points,
            record.total
        );
        self.state.turn_count += 1;
        self.state.history.push(record.clone());

        if self.target_reached(total) {
            self.finish("target score reached");
        } else {
            self.advance_turn();
        }
        Ok(record)
    }

    /// Pass the turn without scoring (from Playing or Result)
    pub fn next_turn(&mut self) -> Result<(), GameError> {
        match self.state.phase {
            GamePhase::Playing | GamePhase::Result => {}
            actual => {
                return Err(GameError::InvalidPhase {
                    expected: GamePhase::Playing,
                    actual,
                });
            }
        }
        self.repair_state();
        self.state.pending_score = None;
        self.advance_turn();
        Ok(())
    }

    /// Spin a whole turn at `power`: meter, physics to rest, score, pass
    pub fn play_turn(&mut self, power: f64) -> Result<TurnRecord, GameError> {
        self.start_power_meter()?;
        self.stop_power_meter(power)?;
        self.run_spin()?;
        self.complete_turn()
    }

    /// Abandon an in-flight power selection or spin, back to Playing
    pub fn abort_spin(&mut self) {
        if !self.state.phase.is_transient() {
            return;
        }
        self.engine.abort();
        self.power_meter.stop();
        if let Some(wheels) = self.wheels.as_mut() {
            wheels.stop();
        }
        self.accumulator = 0.0;
        self.state.phase = GamePhase::Playing;
        log::info!("Spin aborted");
    }

    /// Clear scores and turns, keep wheels and players; back to Setup
    pub fn reset_game(&mut self) {
        self.abort_spin();
        let mut players = std::mem::take(&mut self.state.players);
        players.reset();
        self.state = GameState::new(self.rng.seed(), players);
        log::info!("Game reset");
    }

    /// Reseed the game's RNG
    pub fn set_seed(&mut self, seed: u32) {
        self.rng.set_seed(seed);
        self.state.seed = seed;
        log::debug!("Seed set to {}", seed);
    }

    /// Serialize the game state for the persistence layer
    pub fn snapshot_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string(&self.state)?)
    }

    /// Replace the game state with a persisted snapshot, repairing what is missing
    pub fn restore_state(&mut self, json: &str) -> Result<(), GameError> {
        let restored: GameState = serde_json::from_str(json)?;
        self.engine.abort();
        self.accumulator = 0.0;
        self.state = restored;
        if self.state.phase.is_transient() {
            log::info!("Restored mid-{} state, back to playing", self.state.phase.as_str());
            self.state.phase = GamePhase::Playing;
        }
        self.repair_state();
        Ok(())
    }

    // === Queries ===

    pub fn game_state(&self) -> &GameState {
        &self.state
    }

    /// Mutable state for hosts that patch persisted fields in place
    ///
    /// Anything left inconsistent is repaired at the next turn boundary.
    pub fn game_state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.state.players.current_player()
    }

    pub fn player_scores(&self) -> &BTreeMap<String, i64> {
        &self.state.players.scores
    }

    pub fn winners(&self) -> Vec<String> {
        self.state.players.winners()
    }

    pub fn last_result(&self) -> Option<&SpinResult> {
        self.state.last_result.as_ref()
    }

    /// Live wheels (angles and velocities are committed every step)
    pub fn wheels(&self) -> Option<&WheelPair> {
        self.wheels.as_ref()
    }

    pub fn errors(&self) -> &[RecoveredError] {
        &self.state.errors
    }

    pub fn power_meter(&self) -> &PowerMeter {
        &self.power_meter
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn rng(&self) -> &LcgRandom {
        &self.rng
    }

    // === Internals ===

    fn expect_phase(&self, expected: GamePhase) -> Result<(), GameError> {
        if self.state.phase == expected {
            Ok(())
        } else {
            Err(GameError::InvalidPhase {
                expected,
                actual: self.state.phase,
            })
        }
    }

    fn current_total(&self) -> i64 {
        self.state
            .players
            .current_player()
            .and_then(|p| self.state.players.score_of(&p.name))
            .unwrap_or(0)
    }

    fn launch_spin(&mut self, power: f64) -> Result<(), GameError> {
        let Some(wheels) = self.wheels.as_mut() else {
            return Err(GameError::NotInitialized);
        };

        // Draws go to a copy of the RNG so a failed launch leaves no trace
        let mut rng = self.rng.clone();
        let impulse = SpinImpulse::from_power(power, &self.settings, &mut rng);

        if self.settings.outcome_mode == OutcomeMode::Weighted {
            // Choose the wedges by weight, then shift the start angles so the
            // deterministic spin comes to rest on them
            let (outer_rest, inner_rest) = self.engine.predict_rest(wheels, impulse, SIM_DT, self.settings.max_spin_steps);
            let mut aims = Vec::with_capacity(2);
            for (role, rest) in [(WheelRole::Outer, outer_rest), (WheelRole::Inner, inner_rest)] {
                let wheel = wheels.get(role);
                let index = WeightedSelector::select_index(&mut rng, &wheel.wedge_weights())?;
                let offset = next_float(&mut rng, -0.4, 0.4)?;
                let target = angle_for_index(index, wheel.wedges.len(), offset)?;
                aims.push((role, index, target - rest));
            }
            for (role, index, shift) in aims {
                let wheel = wheels.get_mut(role);
                wheel.current_angle = normalize_degrees(wheel.current_angle + shift);
                log::debug!("Weighted outcome: {} wheel aimed at wedge {}", role.as_str(), index);
            }
        }

        self.rng = rng;
        self.engine.begin_spin(wheels, impulse);
        self.engine.commit(wheels);
        self.power_meter.stop();
        self.accumulator = 0.0;
        self.state.power_level = Some(power);
        self.state.last_result = None;
        self.state.pending_score = None;
        self.state.phase = GamePhase::Spinning;
        log::debug!("Power {:.2} → spinning", power);
        Ok(())
    }

    /// Reset non-finite values in the running simulation
    fn recover_physics_anomalies(&mut self) {
        let Some(sim) = self.engine.state_mut() else {
            return;
        };
        if sim.is_finite() {
            return;
        }
        let mut anomalies = Vec::new();
        for (role, body) in [(WheelRole::Outer, &mut sim.outer), (WheelRole::Inner, &mut sim.inner)] {
            if !body.velocity.is_finite() {
                anomalies.push(format!("{} wheel velocity {} reset to 0", role.as_str(), body.velocity));
                body.velocity = 0.0;
            }
            if !body.angle.is_finite() {
                anomalies.push(format!("{} wheel angle {} reset to 0", role.as_str(), body.angle));
                body.angle = 0.0;
            }
        }
        for detail in anomalies {
            self.record_recovery(AnomalyKind::PhysicsAnomaly, detail);
        }
    }

    fn resolve_spin(&mut self) -> Result<(), GameError> {
        let Some(wheels) = self.wheels.as_mut() else {
            return Err(GameError::NotInitialized);
        };
        let final_state = self.engine.finish(wheels);
        wheels.stop();

        let outer = determine_wedge_result(wheels.outer.current_angle, &wheels.outer.wedges)?;
        let inner = determine_wedge_result(wheels.inner.current_angle, &wheels.inner.wedges)?;
        let result = SpinResult {
            outer_wedge: outer.wedge.clone(),
            inner_wedge: inner.wedge.clone(),
            outer_index: outer.index,
            inner_index: inner.index,
            outer_angle: wheels.outer.current_angle,
            inner_angle: wheels.inner.current_angle,
        };

        let total = self.current_total();
        let score = score_turn(&result, &self.settings.rules, total);
        log::debug!(
            "Spin settled after {} steps: outer '{}' / inner '{}' for {} points",
            final_state.map(|s| s.steps).unwrap_or(0),
            result.outer_wedge.label,
            result.inner_wedge.label,
            score.points
        );

        self.state.last_result = Some(result);
        self.state.pending_score = Some(score);
        self.state.phase = GamePhase::Result;
        Ok(())
    }

    fn target_reached(&self, total: i64) -> bool {
        self.settings.target_score.is_some_and(|target| total >= target)
    }

    /// Hand the turn to the next player, or finish the game
    fn advance_turn(&mut self) {
        let players = &self.state.players;
        let (seats, active, round, next) = (players.len(), players.active_count(), players.round, players.peek_next());
        if seats > 1 && active <= 1 {
            self.finish("one player left standing");
            return;
        }
        match next {
            None => self.finish("no players left"),
            Some(next) if next.wraps && round >= self.settings.max_rounds => {
                self.finish("final round complete");
            }
            Some(_) => {
                self.state.players.advance();
                self.state.phase = GamePhase::Playing;
            }
        }
    }

    fn finish(&mut self, reason: &str) {
        self.state.phase = GamePhase::Finished;
        log::info!("Game finished ({}), winners: {:?}", reason, self.state.players.winners());
    }

    fn repair_state(&mut self) {
        let fixes = self.state.repair();
        if !fixes.is_empty() {
            self.record_recovery(AnomalyKind::StateCorruption, fixes.join("; "));
        }
    }

    fn record_recovery(&mut self, kind: AnomalyKind, detail: String) {
        log::warn!("Recovered {}: {}", kind.as_str(), detail);
        if let Some(observer) = self.observer.as_mut() {
            observer.on_recovered(kind, &detail);
        }
        self.state.errors.push(RecoveredError {
            kind,
            detail,
            recovered: true,
            turn: self.state.turn_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn wheels() -> Vec<Wheel> {
        vec![Wheel::default_outer(8), Wheel::default_inner(4)]
    }

    fn started(settings: GameSettings, players: &[&str]) -> GameController {
        let mut game = GameController::new(settings);
        game.initialize_game(wheels(), players.to_vec()).unwrap();
        game.start_game().unwrap();
        game
    }

    #[test]
    fn test_phase_sequence() {
        let mut game = GameController::default();
        assert!(matches!(game.start_game(), Err(GameError::NotInitialized)));
        game.initialize_game(wheels(), vec!["a", "b"]).unwrap();
        assert_eq!(game.phase(), GamePhase::Setup);
        game.start_game().unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);
        game.start_power_meter().unwrap();
        assert_eq!(game.phase(), GamePhase::PowerSelection);
        game.update_power_meter(0.25);
        game.stop_power_meter(0.5).unwrap();
        assert_eq!(game.phase(), GamePhase::Spinning);
        game.run_spin().unwrap();
        assert_eq!(game.phase(), GamePhase::Result);
        assert!(game.last_result().is_some());
        game.complete_turn().unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.current_player().unwrap().name, "b");
    }

    #[test]
    fn test_commands_check_phase() {
        let mut game = started(GameSettings::default(), &["a"]);
        assert!(matches!(
            game.complete_turn(),
            Err(GameError::InvalidPhase {
                expected: GamePhase::Result,
                actual: GamePhase::Playing
            })
        ));
        assert!(game.stop_power_meter(0.5).is_err());
        game.start_power_meter().unwrap();
        assert!(matches!(
            game.stop_power_meter(150.0),
            Err(GameError::Validation(ValidationError::InvalidPowerLevel(_)))
        ));
        assert_eq!(game.phase(), GamePhase::PowerSelection);
    }

    #[test]
    fn test_initialize_rejects_bad_config() {
        let mut game = GameController::default();
        let empty = vec![Wheel::default_outer(4), Wheel::new("inner", Vec::new(), 50.0)];
        assert!(matches!(
            game.initialize_game(empty, vec!["a"]),
            Err(GameError::Validation(ValidationError::EmptyWedgeSet { .. }))
        ));
        assert!(matches!(
            game.initialize_game(wheels(), Vec::<String>::new()),
            Err(GameError::Validation(ValidationError::NoPlayers))
        ));
    }

    #[test]
    fn test_tick_runs_substeps_and_commits() {
        let mut game = started(GameSettings::default(), &["a"]);
        game.start_power_meter().unwrap();
        game.stop_power_meter(1.0).unwrap();
        let before = game.wheels().unwrap().outer.current_angle;
        game.tick(SIM_DT * 3.0).unwrap();
        let steps = game.engine.steps();
        assert!((2..=3).contains(&steps));
        let wheels = game.wheels().unwrap();
        assert_ne!(wheels.outer.current_angle, before);
        assert!(wheels.outer.angular_velocity.abs() > 0.0);

        // Huge frames are capped
        game.tick(10.0).unwrap();
        assert!(game.engine.steps() <= steps + MAX_SUBSTEPS);
    }

    #[test]
    fn test_tick_until_settled() {
        let mut game = started(GameSettings::default(), &["a", "b"]);
        game.start_power_meter().unwrap();
        game.stop_power_meter(60.0).unwrap();
        let mut frames = 0;
        while game.tick(1.0 / 30.0).unwrap() == GamePhase::Spinning {
            frames += 1;
            assert!(frames < 10_000);
        }
        assert_eq!(game.phase(), GamePhase::Result);
        let wheels = game.wheels().unwrap();
        assert_eq!(wheels.outer.angular_velocity, 0.0);
        assert_eq!(wheels.inner.angular_velocity, 0.0);
    }

    #[test]
    fn test_nan_velocity_is_recovered() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        struct Recorder(Rc<RefCell<Vec<AnomalyKind>>>);
        impl RecoveryObserver for Recorder {
            fn on_recovered(&mut self, kind: AnomalyKind, _detail: &str) {
                self.0.borrow_mut().push(kind);
            }
        }

        let mut game = started(GameSettings::default(), &["a", "b"]);
        game.set_observer(Box::new(Recorder(seen.clone())));
        game.start_power_meter().unwrap();
        game.stop_power_meter(0.8).unwrap();
        game.engine.state_mut().unwrap().outer.velocity = f64::NAN;
        game.run_spin().unwrap();

        assert_eq!(game.phase(), GamePhase::Result);
        let errors = game.errors();
        assert!(!errors.is_empty());
        assert!(errors.iter().all(|e| e.kind == AnomalyKind::PhysicsAnomaly && e.recovered));
        assert!(game.wheels().unwrap().outer.current_angle.is_finite());
        assert_eq!(seen.borrow().len(), errors.len());

        // The turn still completes
        game.complete_turn().unwrap();
        assert_eq!(game.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_forced_resolution_after_max_steps() {
        let settings = GameSettings {
            max_spin_steps: 10,
            ..GameSettings::default()
        };
        let mut game = started(settings, &["a"]);
        game.start_power_meter().unwrap();
        game.stop_power_meter(1.0).unwrap();
        game.run_spin().unwrap();
        assert_eq!(game.phase(), GamePhase::Result);
        assert_eq!(game.wheels().unwrap().outer.angular_velocity, 0.0);
    }

    #[test]
    fn test_same_seed_same_game() {
        let play = || {
            let mut game = started(GameSettings::default().with_seed(4242), &["a", "b"]);
            (0..4)
                .map(|i| game.play_turn(0.3 + 0.15 * i as f64).unwrap())
                .map(|r| (r.result.outer_index, r.result.inner_index, r.result.outer_angle.to_bits()))
                .collect::<Vec<_>>()
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn test_weighted_mode_lands_on_selectable_wedges() {
        let settings = GameSettings {
            outcome_mode: OutcomeMode::Weighted,
            max_rounds: 100,
            ..GameSettings::default()
        };
        let mut outer = Wheel::default_outer(4);
        outer.wedges[0].weight = 0.0;
        outer.wedges[2].weight = 0.0;
        let mut inner = Wheel::default_inner(3);
        inner.wedges[1].weight = 0.0;

        let mut game = GameController::new(settings);
        game.initialize_game(vec![outer, inner], vec!["a"]).unwrap();
        game.start_game().unwrap();
        for i in 0..30 {
            let record = game.play_turn(0.2 + (i % 8) as f64 * 0.1).unwrap();
            assert!(record.result.outer_index == 1 || record.result.outer_index == 3);
            assert_ne!(record.result.inner_index, 1);
        }
    }

    #[test]
    fn test_weighted_mode_follows_weights() {
        let settings = GameSettings {
            outcome_mode: OutcomeMode::Weighted,
            max_rounds: 1000,
            ..GameSettings::default()
        };
        let mut outer = Wheel::default_outer(2);
        outer.wedges[0].weight = 3.0;
        outer.wedges[1].weight = 1.0;
        let mut game = GameController::new(settings);
        game.initialize_game(vec![outer, Wheel::default_inner(2)], vec!["a"]).unwrap();
        game.start_game().unwrap();

        let turns = 400;
        let mut first = 0;
        for _ in 0..turns {
            if game.play_turn(0.5).unwrap().result.outer_index == 0 {
                first += 1;
            }
        }
        let share = first as f64 / turns as f64;
        assert!((share - 0.75).abs() < 0.08, "share {}", share);
    }

    #[test]
    fn test_weighted_mode_rejects_unselectable_wheel() {
        let settings = GameSettings {
            outcome_mode: OutcomeMode::Weighted,
            ..GameSettings::default()
        };
        let mut inner = Wheel::default_inner(3);
        for wedge in &mut inner.wedges {
            wedge.weight = 0.0;
        }

        let mut game = GameController::new(settings);
        assert!(matches!(
            game.initialize_game(vec![Wheel::default_outer(4), inner.clone()], vec!["a"]),
            Err(GameError::Validation(ValidationError::ZeroTotalWeight))
        ));
        assert!(game.wheels().is_none());

        // Physical mode never draws by weight
        let mut physical = GameController::default();
        assert!(physical.initialize_game(vec![Wheel::default_outer(4), inner], vec!["a"]).is_ok());
    }

    #[test]
    fn test_failed_weighted_launch_changes_nothing() {
        let settings = GameSettings {
            outcome_mode: OutcomeMode::Weighted,
            ..GameSettings::default()
        };
        let mut game = started(settings, &["a", "b"]);
        for wedge in &mut game.wheels.as_mut().unwrap().inner.wedges {
            wedge.weight = 0.0;
        }
        game.start_power_meter().unwrap();
        let outer_before = game.wheels().unwrap().outer.current_angle;
        let inner_before = game.wheels().unwrap().inner.current_angle;
        let seed_before = game.rng().seed();

        for _ in 0..2 {
            assert!(matches!(
                game.stop_power_meter(0.5),
                Err(GameError::Validation(ValidationError::ZeroTotalWeight))
            ));
            assert_eq!(game.phase(), GamePhase::PowerSelection);
            assert!(game.power_meter().is_active());
            assert_eq!(game.wheels().unwrap().outer.current_angle, outer_before);
            assert_eq!(game.wheels().unwrap().inner.current_angle, inner_before);
            assert_eq!(game.rng().seed(), seed_before);
        }

        game.wheels.as_mut().unwrap().inner.wedges[1].weight = 1.0;
        game.stop_power_meter(0.5).unwrap();
        assert_eq!(game.phase(), GamePhase::Spinning);
        assert!(!game.power_meter().is_active());
        game.run_spin().unwrap();
        assert_eq!(game.last_result().unwrap().inner_index, 1);
    }

    #[test]
    fn test_set_seed_replays_spins() {
        let play = |initial_seed: u32| {
            let mut game = started(GameSettings::default().with_seed(initial_seed), &["a", "b"]);
            game.set_seed(77);
            assert_eq!(game.rng().seed(), 77);
            assert_eq!(game.game_state().seed, 77);
            (0..3)
                .map(|_| game.play_turn(0.6).unwrap())
                .map(|r| (r.result.outer_index, r.result.inner_index, r.result.outer_angle.to_bits()))
                .collect::<Vec<_>>()
        };
        assert_eq!(play(1), play(2));
    }

    #[test]
    fn test_meter_reading_becomes_spin_power() {
        let mut game = started(GameSettings::default(), &["a"]);
        game.start_power_meter().unwrap();
        let reading = game.update_power_meter(0.25);
        assert!((reading - DEFAULT_POWER_METER_SPEED * 0.25).abs() < 1e-9);

        let power = game.stop_power_meter_at_current().unwrap();
        assert!((power - reading / 100.0).abs() < 1e-12);
        assert_eq!(game.phase(), GamePhase::Spinning);
        assert_eq!(game.game_state().power_level, Some(power));
        assert!(!game.power_meter().is_active());
        assert!(game.wheels().unwrap().outer.angular_velocity > 0.0);

        game.run_spin().unwrap();
        assert_eq!(game.complete_turn().unwrap().power, power);
    }

    #[test]
    fn test_state_repaired_before_spin_is_scored() {
        let mut game = started(GameSettings::default(), &["a", "b"]);
        game.play_turn(0.5).unwrap();
        let a_total = game.player_scores()["a"];
        game.game_state_mut().players.current_player_index = 9;

        game.start_power_meter().unwrap();
        assert_eq!(game.current_player().unwrap().name, "a");
        assert_eq!(game.errors().len(), 1);
        assert_eq!(game.errors()[0].kind, AnomalyKind::StateCorruption);

        game.stop_power_meter(0.5).unwrap();
        game.run_spin().unwrap();
        let record = game.complete_turn().unwrap();
        assert_eq!(record.player, "a");
        assert_eq!(record.total, a_total + record.score.points);
        assert_eq!(game.errors().len(), 1);
    }

    #[test]
    fn test_target_score_finishes() {
        let settings = GameSettings {
            target_score: Some(1),
            ..GameSettings::default()
        };
        let mut game = started(settings, &["a", "b"]);
        let record = game.play_turn(0.7).unwrap();
        // Every default wedge is worth at least 10 points
        assert!(record.total >= 1);
        assert_eq!(game.phase(), GamePhase::Finished);
        assert_eq!(game.winners(), vec!["a".to_string()]);
    }

    #[test]
    fn test_final_round_finishes() {
        let settings = GameSettings {
            max_rounds: 2,
            ..GameSettings::default()
        };
        let mut game = started(settings, &["a", "b"]);
        for _ in 0..4 {
            assert_ne!(game.phase(), GamePhase::Finished);
            game.play_turn(0.5).unwrap();
        }
        assert_eq!(game.phase(), GamePhase::Finished);
        assert_eq!(game.game_state().turn_count, 4);
        assert!(!game.winners().is_empty());
        assert!(game.start_power_meter().is_err());
    }

    #[test]
    fn test_elimination_leaves_one_standing() {
        use crate::rules::{RuleCondition, RuleEffect, ScoringRule};
        let settings = GameSettings {
            rules: vec![ScoringRule::new(
                "everyone out",
                RuleCondition::ScoreThreshold { value: i64::MIN },
                RuleEffect::Eliminate,
            )],
            ..GameSettings::default()
        };
        let mut game = started(settings, &["a", "b", "c"]);
        game.play_turn(0.5).unwrap();
        assert_eq!(game.current_player().unwrap().name, "b");
        game.play_turn(0.5).unwrap();
        assert_eq!(game.phase(), GamePhase::Finished);
        assert_eq!(game.winners(), vec!["c".to_string()]);
    }

    #[test]
    fn test_abort_and_reset() {
        let mut game = started(GameSettings::default(), &["a", "b"]);
        game.start_power_meter().unwrap();
        game.stop_power_meter(0.9).unwrap();
        game.tick(0.05).unwrap();
        game.abort_spin();
        assert_eq!(game.phase(), GamePhase::Playing);
        assert!(!game.engine.is_spinning());
        assert_eq!(game.wheels().unwrap().outer.angular_velocity, 0.0);

        game.play_turn(0.4).unwrap();
        game.reset_game();
        assert_eq!(game.phase(), GamePhase::Setup);
        assert!(game.player_scores().values().all(|&s| s == 0));
        assert_eq!(game.game_state().players.current_player_index, 0);
        game.start_game().unwrap();
    }

    #[test]
    fn test_next_turn_skips_without_scoring() {
        let mut game = started(GameSettings::default(), &["a", "b"]);
        game.next_turn().unwrap();
        assert_eq!(game.current_player().unwrap().name, "b");
        assert_eq!(game.game_state().turn_count, 0);
        assert!(game.player_scores().values().all(|&s| s == 0));
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut game = started(GameSettings::default(), &["a", "b"]);
        game.play_turn(0.5).unwrap();
        let json = game.snapshot_json().unwrap();

        let mut other = GameController::default();
        other.initialize_game(wheels(), vec!["a", "b"]).unwrap();
        other.restore_state(&json).unwrap();
        let (restored, original) = (other.game_state(), game.game_state());
        assert_eq!(restored.players, original.players);
        assert_eq!(restored.phase, GamePhase::Playing);
        assert_eq!(restored.turn_count, 1);
        assert_eq!(restored.history.len(), 1);
        assert_eq!(
            restored.last_result.as_ref().map(|r| (r.outer_index, r.inner_index)),
            original.last_result.as_ref().map(|r| (r.outer_index, r.inner_index))
        );
        assert!(other.errors().is_empty());

        assert!(matches!(other.restore_state("{not json"), Err(GameError::Persistence(_))));
    }

    #[test]
    fn test_restore_repairs_missing_fields() {
        let mut game = started(GameSettings::default(), &["a", "b"]);
        let json = r#"{"phase":"Spinning","players":{"players":[{"name":"a"},{"name":"b"}],"current_player_index":5}}"#;
        game.restore_state(json).unwrap();
        let state = game.game_state();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.players.current_player_index, 0);
        assert_eq!(state.players.round, 1);
        assert_eq!(state.players.scores.len(), 2);
        assert_eq!(game.errors().len(), 1);
        assert_eq!(game.errors()[0].kind, AnomalyKind::StateCorruption);
    }
}
