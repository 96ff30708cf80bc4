//! Procedural obstacle field and checkpoint placement
//!
//! The field is a sphere anchored at the ship's start position. Obstacles are
//! scattered once at startup; checkpoints are placed one at a time. Both use
//! the same capped rejection sampling: draw uniformly inside a sphere, redraw
//! while the candidate is too close to a reference point, and after the last
//! attempt take whatever was drawn.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{
    CHECKPOINT_PLACEMENT_RETRIES, CHECKPOINT_SEARCH_FRACTION, OBSTACLE_PLACEMENT_RETRIES,
};
use crate::settings::FieldSettings;
use crate::{random_in_unit_sphere, random_on_unit_sphere, random_rotation};

/// Handle for an obstacle or checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Spherical play volume (read-only after creation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub center: Vec3,
    pub radius: f32,
}

impl Field {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.distance(self.center) <= self.radius
    }
}

/// Outcome of one rejection-sampled placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    /// Draws used (1..=max_attempts)
    pub attempts: u32,
    /// Whether the distance constraint holds for `position`
    pub satisfied: bool,
}

/// Draw points inside the sphere (`center`, `radius`) until one is at least
/// `min_distance` from `reference`, giving up after `max_attempts` draws.
pub fn sample_constrained<R: Rng + ?Sized>(
    rng: &mut R,
    center: Vec3,
    radius: f32,
    reference: Vec3,
    min_distance: f32,
    max_attempts: u32,
) -> Placement {
    let max_attempts = max_attempts.max(1);
    let mut position = center;
    for attempt in 1..=max_attempts {
        position = center + random_in_unit_sphere(rng) * radius;
        if position.distance(reference) >= min_distance {
            return Placement {
                position,
                attempts: attempt,
                satisfied: true,
            };
        }
    }
    Placement {
        position,
        attempts: max_attempts,
        satisfied: false,
    }
}

/// A static hazard; the spin is purely cosmetic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub position: Vec3,
    /// Collision radius
    pub radius: f32,
    /// Orientation at spawn
    pub base_rotation: Quat,
    pub spin_axis: Vec3,
    /// Accumulated spin (radians)
    pub spin_angle: f32,
    /// Degrees per second
    pub spin_speed: f32,
}

impl Obstacle {
    /// Advance the cosmetic spin
    pub fn spin(&mut self, dt: f32) {
        if self.spin_speed != 0.0 {
            self.spin_angle =
                (self.spin_angle + self.spin_speed.to_radians() * dt).rem_euclid(std::f32::consts::TAU);
        }
    }

    /// Orientation for rendering
    pub fn visual_rotation(&self) -> Quat {
        Quat::from_axis_angle(self.spin_axis, self.spin_angle) * self.base_rotation
    }
}

/// The one checkpoint the player is currently flying to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: EntityId,
    /// Ordinal in the run, 1-based
    pub index: u32,
    pub position: Vec3,
    pub trigger_radius: f32,
}

/// Owns the field, its obstacles and the active checkpoint slot
#[derive(Debug, Clone)]
pub struct FieldGenerator {
    field: Field,
    settings: FieldSettings,
    rng: Pcg32,
    obstacles: Vec<Obstacle>,
    checkpoint: Option<Checkpoint>,
    next_id: u32,
}

impl FieldGenerator {
    /// Create a generator for a field centered on the ship start
    pub fn new(center: Vec3, settings: FieldSettings, seed: u64) -> Self {
        Self {
            field: Field::new(center, settings.radius),
            settings,
            rng: Pcg32::seed_from_u64(seed),
            obstacles: Vec::new(),
            checkpoint: None,
            next_id: 1,
        }
    }

    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Scatter `count` obstacles, keeping them `min_distance_from_center` clear of the field center.
    ///
    /// Returns the placed positions in spawn order.
    pub fn place_obstacles(&mut self, count: usize, min_distance_from_center: f32) -> Vec<Vec3> {
        let field = self.field;
        let mut positions = Vec::with_capacity(count);
        let mut relaxed = 0usize;

        for _ in 0..count {
            let placement = sample_constrained(
                &mut self.rng,
                field.center,
                field.radius,
                field.center,
                min_distance_from_center,
                OBSTACLE_PLACEMENT_RETRIES,
            );
            if !placement.satisfied {
                relaxed += 1;
            }

            let radius = if self.settings.max_obstacle_radius > self.settings.min_obstacle_radius {
                self.rng
                    .random_range(self.settings.min_obstacle_radius..=self.settings.max_obstacle_radius)
            } else {
                self.settings.min_obstacle_radius
            };
            let obstacle = Obstacle {
                id: self.next_entity_id(),
                position: placement.position,
                radius,
                base_rotation: random_rotation(&mut self.rng),
                spin_axis: random_on_unit_sphere(&mut self.rng),
                spin_angle: 0.0,
                spin_speed: self.settings.obstacle_spin_speed,
            };
            positions.push(obstacle.position);
            self.obstacles.push(obstacle);
        }

        if relaxed > 0 {
            log::warn!(
                "{} of {} obstacles placed inside the {:.0} clearance after {} retries",
                relaxed,
                count,
                min_distance_from_center,
                OBSTACLE_PLACEMENT_RETRIES
            );
        }
        log::info!(
            "Spawned {} obstacles in field r={:.0} around {:?}",
            count,
            field.radius,
            field.center
        );
        positions
    }

    /// Populate the field from settings
    pub fn populate(&mut self) -> usize {
        let count = self.settings.obstacle_count;
        let clearance = self.settings.min_distance_from_center;
        self.place_obstacles(count, clearance).len()
    }

    /// Replace the active checkpoint with a new one at least `min_distance_from_ship` from the ship.
    ///
    /// The previous checkpoint is gone before the new one is drawn.
    pub fn place_next_checkpoint(
        &mut self,
        ship_position: Vec3,
        min_distance_from_ship: f32,
        index: u32,
        trigger_radius: f32,
    ) -> Checkpoint {
        self.clear_checkpoint();

        let field = self.field;
        let placement = sample_constrained(
            &mut self.rng,
            field.center,
            field.radius * CHECKPOINT_SEARCH_FRACTION,
            ship_position,
            min_distance_from_ship,
            CHECKPOINT_PLACEMENT_RETRIES,
        );
        if !placement.satisfied {
            log::warn!(
                "Checkpoint {} placed {:.1} from ship (wanted {:.1}) after {} attempts",
                index,
                placement.position.distance(ship_position),
                min_distance_from_ship,
                placement.attempts
            );
        }

        let checkpoint = Checkpoint {
            id: self.next_entity_id(),
            index,
            position: placement.position,
            trigger_radius,
        };
        log::info!("Checkpoint {} spawned at {:?}", index, checkpoint.position);
        self.checkpoint = Some(checkpoint);
        checkpoint
    }

    /// Remove the active checkpoint, if any
    pub fn clear_checkpoint(&mut self) -> Option<Checkpoint> {
        self.checkpoint.take()
    }

    pub fn active_checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoint.as_ref()
    }

    /// Look up a checkpoint by handle; only the active one resolves
    pub fn checkpoint(&self, id: EntityId) -> Option<&Checkpoint> {
        self.checkpoint.as_ref().filter(|c| c.id == id)
    }

    pub fn obstacle(&self, id: EntityId) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    #[cfg(test)]
    pub(crate) fn obstacles_mut(&mut self) -> &mut [Obstacle] {
        &mut self.obstacles
    }

    /// Advance cosmetic obstacle spin
    pub fn animate(&mut self, dt: f32) {
        for obstacle in &mut self.obstacles {
            obstacle.spin(dt);
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn generator(seed: u64) -> FieldGenerator {
        FieldGenerator::new(Vec3::ZERO, FieldSettings::default(), seed)
    }

    #[test]
    fn test_obstacles_respect_field_and_clearance() {
        let mut g = generator(1);
        let positions = g.place_obstacles(200, 30.0);
        assert_eq!(positions.len(), 200);
        assert_eq!(g.obstacles().len(), 200);

        let field = *g.field();
        for o in g.obstacles() {
            assert!(o.position.distance(field.center) <= field.radius + 1e-3);
            assert!((1.0..=4.0).contains(&o.radius));
        }
        // With 10 retries at this ratio a violation is astronomically unlikely
        assert!(positions.iter().all(|p| p.length() >= 30.0));
    }

    #[test]
    fn test_obstacle_ids_are_unique() {
        let mut g = generator(2);
        g.populate();
        let mut ids: Vec<u32> = g.obstacles().iter().map(|o| o.id.0).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 50);

        let first = g.obstacles()[0].id;
        assert_eq!(g.obstacle(first).map(|o| o.id), Some(first));
        assert!(g.obstacle(EntityId(9999)).is_none());
    }

    #[test]
    fn test_same_seed_same_layout() {
        let mut a = generator(99);
        let mut b = generator(99);
        assert_eq!(a.place_obstacles(20, 30.0), b.place_obstacles(20, 30.0));
        let ca = a.place_next_checkpoint(Vec3::ZERO, 40.0, 1, 10.0);
        let cb = b.place_next_checkpoint(Vec3::ZERO, 40.0, 1, 10.0);
        assert_eq!(ca.position, cb.position);
    }

    #[test]
    fn test_checkpoint_stays_inside_search_radius() {
        let mut g = generator(3);
        for i in 1..=100 {
            let c = g.place_next_checkpoint(Vec3::ZERO, 40.0, i, 10.0);
            assert!(c.position.length() <= 200.0 * CHECKPOINT_SEARCH_FRACTION + 1e-3);
            assert!(c.position.length() >= 40.0);
            assert!(g.field().contains(c.position));
        }
    }

    #[test]
    fn test_next_checkpoint_replaces_previous() {
        let mut g = generator(4);
        let first = g.place_next_checkpoint(Vec3::ZERO, 40.0, 1, 10.0);
        let second = g.place_next_checkpoint(Vec3::ZERO, 40.0, 2, 10.0);

        assert_ne!(first.id, second.id);
        assert!(g.checkpoint(first.id).is_none());
        assert_eq!(g.checkpoint(second.id), Some(&second));
        assert_eq!(g.active_checkpoint().map(|c| c.index), Some(2));

        g.clear_checkpoint();
        assert!(g.active_checkpoint().is_none());
        assert!(g.checkpoint(second.id).is_none());
    }

    #[test]
    fn test_impossible_constraint_falls_back_to_last_draw() {
        let mut rng = Pcg32::seed_from_u64(5);
        // Nothing in a radius-10 sphere is 1000 away from its center
        let p = sample_constrained(&mut rng, Vec3::ZERO, 10.0, Vec3::ZERO, 1000.0, 20);
        assert!(!p.satisfied);
        assert_eq!(p.attempts, 20);
        assert!(p.position.length() <= 10.0);
    }

    #[test]
    fn test_sampling_acceptance_over_many_trials() {
        let mut rng = Pcg32::seed_from_u64(6);
        let ship = Vec3::new(20.0, -10.0, 5.0);
        let trials = 1000;
        let mut accepted = 0;
        for _ in 0..trials {
            let p = sample_constrained(&mut rng, Vec3::ZERO, 160.0, ship, 40.0, 20);
            if p.satisfied {
                accepted += 1;
                assert!(p.position.distance(ship) >= 40.0);
            }
        }
        assert!(accepted > 0);
    }

    #[test]
    fn test_spin_is_cosmetic() {
        let mut g = generator(7);
        g.place_obstacles(3, 30.0);
        let before: Vec<(Vec3, f32)> = g.obstacles().iter().map(|o| (o.position, o.radius)).collect();
        let rot_before = g.obstacles()[0].visual_rotation();
        g.animate(1.0);
        let after: Vec<(Vec3, f32)> = g.obstacles().iter().map(|o| (o.position, o.radius)).collect();
        assert_eq!(before, after);
        assert!(g.obstacles()[0].visual_rotation().angle_between(rot_before) > 0.1);
    }

    proptest! {
        #[test]
        fn prop_satisfied_placements_never_violate(
            seed in any::<u64>(),
            min_distance in 0.0f32..200.0,
            offset in -100.0f32..100.0,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let reference = Vec3::new(offset, 0.0, -offset);
            let p = sample_constrained(&mut rng, Vec3::ZERO, 160.0, reference, min_distance, 20);
            prop_assert!(p.position.length() <= 160.0 + 1e-3);
            prop_assert!(p.attempts >= 1 && p.attempts <= 20);
            if p.satisfied {
                prop_assert!(p.position.distance(reference) >= min_distance);
            }
        }
    }
}
