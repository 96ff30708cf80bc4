//! Rock Flight - tilt-steered space flight with a rock-to-boost gesture
//!
//! Core modules:
//! - `sim`: Deterministic simulation (boost detection, flight, field, progression)
//! - `platform`: Orientation sensor abstraction with keyboard fallback
//! - `settings`: Data-driven tuning loaded from JSON

pub mod platform;
pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};

use glam::{EulerRot, Quat, Vec3};
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Confirmed rocks remembered by the boost detector
    pub const ROCK_HISTORY_CAPACITY: usize = 20;
    /// Below this the tick is treated as zero-length
    pub const MIN_DELTA_TIME: f32 = 1e-6;

    /// Rejection sampling caps
    pub const OBSTACLE_PLACEMENT_RETRIES: u32 = 10;
    pub const CHECKPOINT_PLACEMENT_RETRIES: u32 = 20;
    /// Checkpoints are drawn from this fraction of the field radius (keeps them off the edge)
    pub const CHECKPOINT_SEARCH_FRACTION: f32 = 0.8;

    /// Ship overlap sphere radius
    pub const SHIP_COLLISION_RADIUS: f32 = 2.0;
}

/// Normalize an angle in degrees to (-180, 180]
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let a = angle % 360.0;
    if a > 180.0 {
        a - 360.0
    } else if a <= -180.0 {
        a + 360.0
    } else {
        a
    }
}

/// Roll (rotation about local forward) of a rotation, in degrees, normalized to (-180, 180]
#[inline]
pub fn roll_degrees(rotation: Quat) -> f32 {
    let (_yaw, _pitch, roll) = rotation.to_euler(EulerRot::YXZ);
    normalize_degrees(roll.to_degrees())
}

/// Uniformly random point inside the unit ball
pub fn random_in_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let p = Vec3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        if p.length_squared() <= 1.0 {
            return p;
        }
    }
}

/// Uniformly random direction
pub fn random_on_unit_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let p = random_in_unit_sphere(rng);
        let len_sq = p.length_squared();
        if len_sq > 1e-4 {
            return p / len_sq.sqrt();
        }
    }
}

/// Uniformly random rotation (Shoemake's method)
pub fn random_rotation<R: Rng + ?Sized>(rng: &mut R) -> Quat {
    use std::f32::consts::TAU;
    let u1: f32 = rng.random();
    let u2: f32 = rng.random::<f32>() * TAU;
    let u3: f32 = rng.random::<f32>() * TAU;
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    Quat::from_xyzw(a * u2.sin(), a * u2.cos(), b * u3.sin(), b * u3.cos()).normalize()
}
