//! Session state
//!
//! One `GameState` per run. It owns every simulation component, so the
//! respawn path can reset pose, boost and score together.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::boost::GestureBoostController;
use super::collision::CollisionResolver;
use super::field::{EntityId, Field, FieldGenerator, Obstacle};
use super::flight::{FlightState, Pose};
use super::progress::{CheckpointProgression, ProgressPhase};
use super::tick::SensorEvent;
use crate::settings::{KeyboardSettings, Settings};

/// Something the presentation layer may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    CheckpointSpawned { index: u32, position: Vec3 },
    CheckpointReached { index: u32 },
    GameWon,
    Collision { obstacle: EntityId },
    Respawned,
    Sensor(SensorEvent),
}

/// Where the active checkpoint is relative to the ship
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckpointBearing {
    pub distance: f32,
    /// Unit direction in the ship's local frame (+Z ahead)
    pub local_direction: Vec3,
}

impl CheckpointBearing {
    pub fn is_ahead(&self) -> bool {
        self.local_direction.z > 0.0
    }
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated seconds
    pub time_secs: f64,
    pub(crate) boost: GestureBoostController,
    pub(crate) flight: FlightState,
    pub(crate) field: FieldGenerator,
    pub(crate) progress: CheckpointProgression,
    pub(crate) collision: CollisionResolver,
    pub(crate) keyboard: KeyboardSettings,
    /// Accumulated keyboard heading while steering by keyboard
    pub(crate) keyboard_heading: Option<Quat>,
    /// Next sensor reading starts a new baseline frame
    pub(crate) rebase_pending: bool,
    pub(crate) ticks_since_respawn: u64,
    /// Obstacle sitting on the start position, once detected
    blocked_spawn: Option<EntityId>,
    freeze_on_win: bool,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a run: scatter obstacles around the ship start and spawn checkpoint 1
    pub fn new(settings: &Settings) -> Self {
        let settings = settings.clone().sanitized();
        let flight = FlightState::new(&settings.flight);
        let start = flight.start_pose().position;

        let mut state = Self {
            seed: settings.session.seed,
            time_ticks: 0,
            time_secs: 0.0,
            boost: GestureBoostController::new(settings.boost.clone()),
            flight,
            field: FieldGenerator::new(start, settings.field.clone(), settings.session.seed),
            progress: CheckpointProgression::new(settings.checkpoints.clone()),
            collision: CollisionResolver::new(settings.flight.ship_radius),
            keyboard: settings.keyboard.clone(),
            keyboard_heading: None,
            rebase_pending: false,
            ticks_since_respawn: 0,
            blocked_spawn: None,
            freeze_on_win: settings.session.freeze_on_win,
            events: Vec::new(),
        };

        state.field.populate();
        state.progress.begin(&mut state.field, start);
        state.push_checkpoint_spawned();
        log::info!("Run started (seed {:#x})", state.seed);
        state
    }

    /// Send the ship back to the start with cruise speed and a zero score
    ///
    /// Pose, gesture history and checkpoint progress are always reset together.
    pub fn respawn(&mut self) {
        self.flight.respawn();
        self.boost.reset();
        self.keyboard_heading = None;
        self.ticks_since_respawn = 0;
        let start = self.flight.start_pose().position;
        self.progress.reset_score(&mut self.field, start);

        self.events.push(GameEvent::Respawned);
        self.push_checkpoint_spawned();
        log::info!("Ship respawned at start position");
    }

    /// Log a hit; a hit on the first tick of a life is reported once per obstacle
    pub(crate) fn note_hit(&mut self, obstacle: EntityId, ship_pos: Vec3) {
        if self.ticks_since_respawn > 1 {
            self.blocked_spawn = None;
            log::info!("Hit obstacle {:?} at {:?}", obstacle, ship_pos);
        } else if self.blocked_spawn != Some(obstacle) {
            self.blocked_spawn = Some(obstacle);
            let clearance = self
                .field
                .obstacle(obstacle)
                .map(|o| o.position.distance(self.flight.start_pose().position) - o.radius);
            log::warn!(
                "Obstacle {:?} blocks the start position (clearance {:?}); every respawn will collide",
                obstacle,
                clearance
            );
        }
    }

    /// Obstacle that hit the ship immediately after the last respawn
    pub fn blocked_spawn(&self) -> Option<EntityId> {
        self.blocked_spawn
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn push_checkpoint_spawned(&mut self) {
        if let Some(cp) = self.field.active_checkpoint() {
            let event = GameEvent::CheckpointSpawned {
                index: cp.index,
                position: cp.position,
            };
            self.events.push(event);
        }
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Whether ticks are currently no-ops
    pub fn is_frozen(&self) -> bool {
        self.freeze_on_win && self.progress.is_won()
    }

    pub fn pose(&self) -> &Pose {
        self.flight.pose()
    }

    pub fn start_pose(&self) -> &Pose {
        self.flight.start_pose()
    }

    pub fn speed(&self) -> f32 {
        self.boost.speed()
    }

    /// 0 at cruise, 1 at full boost
    pub fn boost_percent(&self) -> f32 {
        self.boost.boost_percent()
    }

    pub fn boost(&self) -> &GestureBoostController {
        &self.boost
    }

    pub fn phase(&self) -> ProgressPhase {
        self.progress.phase()
    }

    pub fn is_won(&self) -> bool {
        self.progress.is_won()
    }

    pub fn progress(&self) -> &CheckpointProgression {
        &self.progress
    }

    pub fn hud_text(&self) -> String {
        self.progress.hud_text()
    }

    pub fn field(&self) -> &Field {
        self.field.field()
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.field.obstacles()
    }

    pub fn active_checkpoint_position(&self) -> Option<Vec3> {
        self.field.active_checkpoint().map(|c| c.position)
    }

    /// Distance and ship-relative direction to the active checkpoint
    pub fn checkpoint_bearing(&self) -> Option<CheckpointBearing> {
        let target = self.active_checkpoint_position()?;
        let pose = self.flight.pose();
        let local = pose.to_local(target);
        Some(CheckpointBearing {
            distance: local.length(),
            local_direction: local.normalize_or_zero(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_layout() {
        let mut state = GameState::new(&Settings::with_seed(12345));
        assert_eq!(state.obstacles().len(), 50);
        assert_eq!(state.phase(), ProgressPhase::Active(1));
        assert_eq!(state.speed(), 30.0);
        assert_eq!(state.field().center, Vec3::ZERO);

        assert_eq!(state.pending_events().len(), 1);
        let events = state.drain_events();
        assert!(matches!(events.as_slice(), [GameEvent::CheckpointSpawned { index: 1, .. }]));
        assert!(state.pending_events().is_empty());
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = GameState::new(&Settings::with_seed(7));
        let b = GameState::new(&Settings::with_seed(7));
        let pa: Vec<Vec3> = a.obstacles().iter().map(|o| o.position).collect();
        let pb: Vec<Vec3> = b.obstacles().iter().map(|o| o.position).collect();
        assert_eq!(pa, pb);
        assert_eq!(a.active_checkpoint_position(), b.active_checkpoint_position());
    }

    #[test]
    fn test_respawn_resets_everything_together() {
        let mut state = GameState::new(&Settings::with_seed(1));
        state.flight.advance(Some(Quat::from_rotation_y(0.5)), 40.0, 1.0);
        for i in 0..10 {
            let angle = if i % 2 == 0 { 20.0 } else { -20.0 };
            state.boost.update(angle, 0.2);
        }
        assert!(state.speed() > 30.0);
        let cp = *state.field.active_checkpoint().unwrap();
        state.progress.update(cp.position, &mut state.field);
        assert_eq!(state.progress().checkpoints_reached(), 1);
        state.drain_events();

        state.respawn();
        assert_eq!(state.pose(), state.start_pose());
        assert_eq!(state.speed(), 30.0);
        assert_eq!(state.boost().recent_rock_count(), 0);
        assert_eq!(state.progress().checkpoints_reached(), 0);
        assert_eq!(state.phase(), ProgressPhase::Active(1));

        let events = state.drain_events();
        assert_eq!(events[0], GameEvent::Respawned);
        assert!(matches!(events[1], GameEvent::CheckpointSpawned { index: 1, .. }));
    }

    #[test]
    fn test_checkpoint_bearing_in_ship_frame() {
        let state = GameState::new(&Settings::with_seed(3));
        let bearing = state.checkpoint_bearing().unwrap();
        let target = state.active_checkpoint_position().unwrap();
        assert!((bearing.distance - target.length()).abs() < 1e-3);
        assert!((bearing.local_direction.length() - 1.0).abs() < 1e-4);
        // Ship starts at identity, so local == world
        assert_eq!(bearing.is_ahead(), target.z > 0.0);
    }

    #[test]
    fn test_freeze_only_after_win_when_enabled() {
        let mut settings = Settings::with_seed(4);
        settings.session.freeze_on_win = true;
        settings.checkpoints.total = 1;
        let mut state = GameState::new(&settings);
        assert!(!state.is_frozen());

        let cp = *state.field.active_checkpoint().unwrap();
        state.progress.update(cp.position, &mut state.field);
        assert!(state.is_won());
        assert!(state.is_frozen());
    }
}
