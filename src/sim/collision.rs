//! Ship/obstacle overlap detection
//!
//! Both the ship and every obstacle are treated as spheres. There is no
//! partial damage: any overlap sends the ship back to the start.

use glam::Vec3;

use super::field::{EntityId, Obstacle};

/// Whether a ship sphere overlaps an obstacle sphere
#[inline]
pub fn sphere_overlap(ship_pos: Vec3, ship_radius: f32, obstacle: &Obstacle) -> bool {
    let reach = ship_radius + obstacle.radius;
    ship_pos.distance_squared(obstacle.position) < reach * reach
}

/// Whether the ship overlaps any obstacle
pub fn check_overlap(ship_pos: Vec3, ship_radius: f32, obstacles: &[Obstacle]) -> bool {
    first_hit(ship_pos, ship_radius, obstacles).is_some()
}

/// The first obstacle (in spawn order) the ship overlaps
pub fn first_hit(ship_pos: Vec3, ship_radius: f32, obstacles: &[Obstacle]) -> Option<EntityId> {
    obstacles
        .iter()
        .find(|o| sphere_overlap(ship_pos, ship_radius, o))
        .map(|o| o.id)
}

/// Collision check bound to the ship's radius
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    pub ship_radius: f32,
}

impl CollisionResolver {
    pub fn new(ship_radius: f32) -> Self {
        Self {
            ship_radius: ship_radius.max(0.0),
        }
    }

    /// Obstacle hit this tick, if any
    pub fn resolve(&self, ship_pos: Vec3, obstacles: &[Obstacle]) -> Option<EntityId> {
        first_hit(ship_pos, self.ship_radius, obstacles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn rock_at(id: u32, position: Vec3, radius: f32) -> Obstacle {
        Obstacle {
            id: EntityId(id),
            position,
            radius,
            base_rotation: Quat::IDENTITY,
            spin_axis: Vec3::Y,
            spin_angle: 0.0,
            spin_speed: 0.0,
        }
    }

    #[test]
    fn test_overlap_uses_combined_radius() {
        let obstacles = [rock_at(1, Vec3::new(10.0, 0.0, 0.0), 3.0)];

        // 2 + 3 = 5 reach
        assert!(!check_overlap(Vec3::new(4.9, 0.0, 0.0), 2.0, &obstacles));
        assert!(check_overlap(Vec3::new(5.1, 0.0, 0.0), 2.0, &obstacles));
        assert!(check_overlap(Vec3::new(10.0, 0.0, 0.0), 2.0, &obstacles));
    }

    #[test]
    fn test_touching_is_not_overlap() {
        let obstacles = [rock_at(1, Vec3::new(0.0, 0.0, 4.0), 2.0)];
        assert!(!check_overlap(Vec3::ZERO, 2.0, &obstacles));
    }

    #[test]
    fn test_first_hit_in_spawn_order() {
        let obstacles = [
            rock_at(1, Vec3::new(100.0, 0.0, 0.0), 1.0),
            rock_at(2, Vec3::new(1.0, 0.0, 0.0), 1.0),
            rock_at(3, Vec3::new(-1.0, 0.0, 0.0), 1.0),
        ];
        assert_eq!(first_hit(Vec3::ZERO, 2.0, &obstacles), Some(EntityId(2)));
        assert_eq!(CollisionResolver::new(2.0).resolve(Vec3::ZERO, &obstacles), Some(EntityId(2)));
    }

    #[test]
    fn test_empty_field_never_hits() {
        assert!(!check_overlap(Vec3::ZERO, 2.0, &[]));
    }
}
