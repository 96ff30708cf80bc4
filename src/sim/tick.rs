//! Simulation tick
//!
//! Per tick, strictly in this order: control input -> boost -> flight ->
//! collision -> checkpoint progression.

use glam::{EulerRot, Quat};
use serde::{Deserialize, Serialize};

use super::progress::ProgressUpdate;
use super::state::{GameEvent, GameState};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::roll_degrees;

/// Keyboard steering after dead zone, -1..1 per axis
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyboardAxes {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub boost: bool,
}

/// Where this tick's steering comes from
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum ControlInput {
    /// Baseline-relative sensor heading
    Sensor(Quat),
    /// Keyboard fallback
    Keyboard(KeyboardAxes),
    /// No fresh sample; keep the current heading
    #[default]
    Hold,
}

/// Sensor lifecycle transitions reported to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorEvent {
    Ready,
    Unavailable,
    Lost,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub control: ControlInput,
    pub sensor_event: Option<SensorEvent>,
    /// The sensor baseline changed this tick
    pub recentered: bool,
}

impl TickInput {
    pub fn sensor(heading: Quat) -> Self {
        Self {
            control: ControlInput::Sensor(heading),
            sensor_event: None,
            recentered: false,
        }
    }

    /// Sensor heading that is level except for `roll` degrees
    pub fn roll(degrees: f32) -> Self {
        Self::sensor(Quat::from_rotation_z(degrees.to_radians()))
    }

    pub fn keyboard(axes: KeyboardAxes) -> Self {
        Self {
            control: ControlInput::Keyboard(axes),
            sensor_event: None,
            recentered: false,
        }
    }
}

/// Advance the game state by one timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if let Some(event) = input.sensor_event {
        state.push_event(GameEvent::Sensor(event));
    }
    if input.recentered {
        state.rebase_pending = true;
    }
    if state.is_frozen() {
        return;
    }

    state.time_ticks += 1;
    state.time_secs += f64::from(dt);
    state.ticks_since_respawn += 1;

    // Speed and target heading
    let (target, speed) = match input.control {
        ControlInput::Sensor(heading) => {
            state.keyboard_heading = None;
            let roll = roll_degrees(heading);
            // First reading in a new baseline frame is not motion
            let speed = if std::mem::take(&mut state.rebase_pending) {
                state.boost.rebase(roll, dt)
            } else {
                state.boost.update(roll, dt)
            };
            (Some(heading), speed)
        }
        ControlInput::Keyboard(axes) => {
            let heading = steer_keyboard(state, &axes, dt);
            let speed = state
                .boost
                .update_manual(axes.boost, state.keyboard.boost_speed, dt);
            (Some(heading), speed)
        }
        ControlInput::Hold => {
            state.keyboard_heading = None;
            (None, state.boost.coast(dt))
        }
    };

    state.flight.advance(target, speed, dt);
    state.field.animate(dt);

    let ship_pos = state.flight.pose().position;

    if let Some(obstacle) = state.collision.resolve(ship_pos, state.field.obstacles()) {
        state.note_hit(obstacle, ship_pos);
        state.push_event(GameEvent::Collision { obstacle });
        state.respawn();
        return;
    }

    match state.progress.update(ship_pos, &mut state.field) {
        Some(ProgressUpdate::Reached { index }) => {
            state.push_event(GameEvent::CheckpointReached { index });
            state.push_checkpoint_spawned();
        }
        Some(ProgressUpdate::Completed { index }) => {
            state.push_event(GameEvent::CheckpointReached { index });
            state.push_event(GameEvent::GameWon);
        }
        None => {}
    }
}

/// Integrate keyboard axes into the keyboard heading (local-frame rotation)
fn steer_keyboard(state: &mut GameState, axes: &KeyboardAxes, dt: f32) -> Quat {
    let current = state.flight.pose().orientation;
    let rate = state.keyboard.rotation_speed.to_radians() * dt;
    let step = Quat::from_euler(EulerRot::YXZ, axes.yaw * rate, axes.pitch * rate, axes.roll * rate);
    let heading = (state.keyboard_heading.unwrap_or(current) * step).normalize();
    state.keyboard_heading = Some(heading);
    heading
}

/// Fixed-timestep accumulator for variable frame times
#[derive(Debug, Clone, Default)]
pub struct Stepper {
    accumulator: f32,
}

impl Stepper {
    /// Run as many `SIM_DT` steps as `frame_dt` covers (capped); returns steps taken
    pub fn advance<F: FnMut(f32)>(&mut self, frame_dt: f32, mut step: F) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, 0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            step(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop backlog we could not catch up on
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    /// Fraction of a step left over (for render interpolation)
    pub fn alpha(&self) -> f32 {
        self.accumulator / SIM_DT
    }
}
