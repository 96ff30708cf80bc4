//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering or platform dependencies

pub mod boost;
pub mod collision;
pub mod field;
pub mod flight;
pub mod progress;
pub mod state;
pub mod tick;

pub use boost::{GestureBoostController, RockDirection, RockHistory, RockSample};
pub use collision::{CollisionResolver, check_overlap, first_hit};
pub use field::{
    Checkpoint, EntityId, Field, FieldGenerator, Obstacle, Placement, sample_constrained,
};
pub use flight::{FlightState, Pose};
pub use progress::{CheckpointProgression, ProgressPhase, ProgressState, ProgressUpdate};
pub use state::{CheckpointBearing, GameEvent, GameState};
pub use tick::{ControlInput, KeyboardAxes, SensorEvent, Stepper, TickInput, tick};
