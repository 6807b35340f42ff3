//! Deterministic simulation module
//!
//! Everything that decides an outcome lives here. This module must be pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, passed in by the caller
//! - No rendering or platform dependencies

pub mod physics;
pub mod power;
pub mod state;
pub mod wedge;

pub use physics::{BodyState, PhysicsEngine, SimulationState, SpinImpulse, apply_friction};
pub use power::{PowerMeter, normalize_power_level};
pub use state::{GamePhase, GameState, SpinResult, TurnRecord};
pub use wedge::{WedgeResult, angle_for_index, determine_wedge_result, wedge_index};
