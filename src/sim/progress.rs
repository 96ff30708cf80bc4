//! Checkpoint progression
//!
//! Exactly one checkpoint is active until the last one is reached. Reaching a
//! checkpoint spawns the next; reaching the final one wins the run and stops
//! all further spawning and proximity checks until the score is reset.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::field::FieldGenerator;
use crate::settings::CheckpointSettings;

/// Where the run stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressPhase {
    /// Flying to checkpoint `n` (1-based)
    Active(u32),
    /// Every checkpoint collected
    Won,
}

/// Score counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub checkpoints_reached: u32,
    pub won: bool,
}

impl ProgressState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Result of a proximity check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Checkpoint `index` reached, next one spawned
    Reached { index: u32 },
    /// Final checkpoint `index` reached, run won
    Completed { index: u32 },
}

/// Drives the single-active-checkpoint state machine
#[derive(Debug, Clone)]
pub struct CheckpointProgression {
    settings: CheckpointSettings,
    state: ProgressState,
}

impl CheckpointProgression {
    pub fn new(settings: CheckpointSettings) -> Self {
        Self {
            settings,
            state: ProgressState::default(),
        }
    }

    pub fn phase(&self) -> ProgressPhase {
        if self.state.won {
            ProgressPhase::Won
        } else {
            ProgressPhase::Active(self.state.checkpoints_reached + 1)
        }
    }

    /// Spawn the checkpoint for the current phase
    pub fn begin(&mut self, field: &mut FieldGenerator, ship_position: Vec3) {
        if self.settings.total == 0 {
            self.state.won = true;
            field.clear_checkpoint();
            log::info!("No checkpoints configured; run starts won");
            return;
        }
        if let ProgressPhase::Active(index) = self.phase() {
            field.place_next_checkpoint(
                ship_position,
                self.settings.min_distance_from_ship,
                index,
                self.settings.trigger_radius,
            );
        }
    }

    /// Check the ship against the active checkpoint and advance on contact
    pub fn update(&mut self, ship_position: Vec3, field: &mut FieldGenerator) -> Option<ProgressUpdate> {
        if self.state.won {
            return None;
        }
        let checkpoint = *field.active_checkpoint()?;
        if ship_position.distance(checkpoint.position) >= checkpoint.trigger_radius {
            return None;
        }

        field.clear_checkpoint();
        self.state.checkpoints_reached += 1;
        log::info!(
            "Checkpoint {} reached ({}/{})",
            checkpoint.index,
            self.state.checkpoints_reached,
            self.settings.total
        );

        if self.state.checkpoints_reached >= self.settings.total {
            self.state.won = true;
            log::info!("All {} checkpoints collected, run won", self.settings.total);
            return Some(ProgressUpdate::Completed {
                index: checkpoint.index,
            });
        }

        self.begin(field, ship_position);
        Some(ProgressUpdate::Reached {
            index: checkpoint.index,
        })
    }

    /// Back to checkpoint 1 with a zero score, from any phase
    pub fn reset_score(&mut self, field: &mut FieldGenerator, ship_position: Vec3) {
        self.state.reset();
        self.begin(field, ship_position);
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn checkpoints_reached(&self) -> u32 {
        self.state.checkpoints_reached
    }

    pub fn total(&self) -> u32 {
        self.settings.total
    }

    pub fn is_won(&self) -> bool {
        self.state.won
    }

    /// Score line for the HUD
    pub fn hud_text(&self) -> String {
        if self.state.won {
            format!("YOU WIN!\nAll {} checkpoints collected!", self.settings.total)
        } else {
            format!(
                "Checkpoints: {} / {}",
                self.state.checkpoints_reached, self.settings.total
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::FieldSettings;

    fn setup(total: u32) -> (CheckpointProgression, FieldGenerator) {
        let settings = CheckpointSettings {
            total,
            ..CheckpointSettings::default()
        };
        let mut field = FieldGenerator::new(Vec3::ZERO, FieldSettings::default(), 11);
        let mut progress = CheckpointProgression::new(settings);
        progress.begin(&mut field, Vec3::ZERO);
        (progress, field)
    }

    /// Fly straight onto the active checkpoint
    fn reach(progress: &mut CheckpointProgression, field: &mut FieldGenerator) -> Option<ProgressUpdate> {
        let target = field.active_checkpoint().map(|c| c.position)?;
        progress.update(target, field)
    }

    #[test]
    fn test_begin_spawns_first_checkpoint() {
        let (progress, field) = setup(5);
        assert_eq!(progress.phase(), ProgressPhase::Active(1));
        assert_eq!(field.active_checkpoint().map(|c| c.index), Some(1));
        assert_eq!(progress.hud_text(), "Checkpoints: 0 / 5");
    }

    #[test]
    fn test_far_ship_does_not_trigger() {
        let (mut progress, mut field) = setup(5);
        let cp = *field.active_checkpoint().unwrap();
        let away = cp.position + Vec3::X * (cp.trigger_radius + 0.5);
        assert_eq!(progress.update(away, &mut field), None);
        assert_eq!(progress.checkpoints_reached(), 0);
        assert_eq!(field.active_checkpoint(), Some(&cp));
    }

    #[test]
    fn test_reaching_advances_to_next() {
        let (mut progress, mut field) = setup(5);
        let first = *field.active_checkpoint().unwrap();

        assert_eq!(
            reach(&mut progress, &mut field),
            Some(ProgressUpdate::Reached { index: 1 })
        );
        assert_eq!(progress.phase(), ProgressPhase::Active(2));
        let second = field.active_checkpoint().unwrap();
        assert_eq!(second.index, 2);
        assert!(field.checkpoint(first.id).is_none());
    }

    #[test]
    fn test_final_checkpoint_wins_and_stops_spawning() {
        let (mut progress, mut field) = setup(3);
        assert_eq!(reach(&mut progress, &mut field), Some(ProgressUpdate::Reached { index: 1 }));
        assert_eq!(reach(&mut progress, &mut field), Some(ProgressUpdate::Reached { index: 2 }));
        assert_eq!(
            reach(&mut progress, &mut field),
            Some(ProgressUpdate::Completed { index: 3 })
        );

        assert_eq!(progress.phase(), ProgressPhase::Won);
        assert!(field.active_checkpoint().is_none());
        assert_eq!(progress.update(Vec3::ZERO, &mut field), None);
        assert_eq!(progress.checkpoints_reached(), 3);
        assert_eq!(progress.hud_text(), "YOU WIN!\nAll 3 checkpoints collected!");
    }

    #[test]
    fn test_reset_score_from_won() {
        let (mut progress, mut field) = setup(2);
        reach(&mut progress, &mut field);
        reach(&mut progress, &mut field);
        assert!(progress.is_won());

        progress.reset_score(&mut field, Vec3::ZERO);
        assert_eq!(progress.phase(), ProgressPhase::Active(1));
        assert_eq!(progress.checkpoints_reached(), 0);
        assert!(!progress.is_won());
        assert_eq!(field.active_checkpoint().map(|c| c.index), Some(1));
    }

    #[test]
    fn test_reset_score_mid_run_replaces_checkpoint() {
        let (mut progress, mut field) = setup(5);
        reach(&mut progress, &mut field);
        let stale = field.active_checkpoint().unwrap().id;

        progress.reset_score(&mut field, Vec3::ZERO);
        assert_eq!(progress.phase(), ProgressPhase::Active(1));
        assert!(field.checkpoint(stale).is_none());
        assert_eq!(field.active_checkpoint().map(|c| c.index), Some(1));
    }

    #[test]
    fn test_zero_checkpoints_is_immediately_won() {
        let (progress, field) = setup(0);
        assert_eq!(progress.phase(), ProgressPhase::Won);
        assert!(field.active_checkpoint().is_none());
    }
}
