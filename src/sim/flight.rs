//! Ship pose integration
//!
//! The ship always flies along its local forward axis (+Z). Steering never
//! snaps: each tick the orientation slerps toward the target heading by
//! `rotation_smoothness * dt`.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::settings::FlightSettings;

/// Position and orientation of the ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// World-space forward direction
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }

    /// Express a world-space point in the ship's local frame
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.orientation.inverse() * (point - self.position)
    }
}

/// Ship pose plus the pose it respawns at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightState {
    pose: Pose,
    start: Pose,
    /// Slerp rate toward the target heading (per second)
    sensitivity: f32,
}

impl FlightState {
    pub fn new(settings: &FlightSettings) -> Self {
        let start = Pose::new(settings.start_position, settings.start_orientation.normalize());
        Self {
            pose: start,
            start,
            sensitivity: settings.rotation_smoothness.max(0.0),
        }
    }

    /// Turn toward `target` (if any) and fly forward for one tick
    pub fn advance(&mut self, target: Option<Quat>, speed: f32, dt: f32) {
        if let Some(target) = target {
            let t = (self.sensitivity * dt).clamp(0.0, 1.0);
            self.pose.orientation = self.pose.orientation.slerp(target, t).normalize();
        }
        self.pose.position += self.pose.forward() * speed * dt;
    }

    /// Put the ship back at its start pose
    ///
    /// Only the pose lives here; the session pairs this with the boost and
    /// score resets so the three always happen together.
    pub fn respawn(&mut self) {
        self.pose = self.start;
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn start_pose(&self) -> &Pose {
        &self.start
    }
}
