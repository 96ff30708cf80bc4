//! Game tuning and preferences
//!
//! Every section defaults to the shipped game balance, so a settings file
//! only needs the values it wants to change.

use std::fmt;
use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Rock-to-boost gesture tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostSettings {
    /// Speed with no boost (units/s)
    pub cruise_speed: f32,
    /// Ceiling reached by rocking
    pub max_boost_speed: f32,
    /// Base acceleration while rocking (units/s²)
    pub boost_build_up_speed: f32,
    /// Deceleration back to cruise (units/s²)
    pub boost_decay_speed: f32,
    /// Minimum swing between peaks for a rock to count (degrees)
    pub min_rock_angle: f32,
    /// Roll rate below which motion counts as neutral (degrees/s)
    pub min_angular_velocity: f32,
    /// Rocks inside the window needed to start boosting
    pub rocks_for_boost: usize,
    /// Sliding window for counting rocks (seconds)
    pub rock_window_time: f32,
    /// How strongly rocking frequency scales the build-up
    pub frequency_boost_multiplier: f32,
}

impl Default for BoostSettings {
    fn default() -> Self {
        Self {
            cruise_speed: 30.0,
            max_boost_speed: 80.0,
            boost_build_up_speed: 15.0,
            boost_decay_speed: 20.0,
            min_rock_angle: 8.0,
            min_angular_velocity: 30.0,
            rocks_for_boost: 3,
            rock_window_time: 1.5,
            frequency_boost_multiplier: 2.0,
        }
    }
}

/// Ship pose and steering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightSettings {
    /// Slerp rate toward the target heading (per second)
    pub rotation_smoothness: f32,
    pub start_position: Vec3,
    pub start_orientation: Quat,
    /// Ship overlap sphere radius
    pub ship_radius: f32,
}

impl Default for FlightSettings {
    fn default() -> Self {
        Self {
            rotation_smoothness: 5.0,
            start_position: Vec3::ZERO,
            start_orientation: Quat::IDENTITY,
            ship_radius: crate::consts::SHIP_COLLISION_RADIUS,
        }
    }
}

/// Keyboard fallback when no sensor is available
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardSettings {
    pub enabled: bool,
    /// Degrees per second at full deflection
    pub rotation_speed: f32,
    /// Target speed while the boost key is held
    pub boost_speed: f32,
    /// Axis magnitudes at or below this are ignored
    pub dead_zone: f32,
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            rotation_speed: 60.0,
            boost_speed: 60.0,
            dead_zone: 0.1,
        }
    }
}

/// Obstacle field layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    /// Radius of the spherical field around the ship start
    pub radius: f32,
    pub obstacle_count: usize,
    /// Keeps the spawn point clear
    pub min_distance_from_center: f32,
    pub min_obstacle_radius: f32,
    pub max_obstacle_radius: f32,
    /// Cosmetic spin (degrees/s)
    pub obstacle_spin_speed: f32,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            radius: 200.0,
            obstacle_count: 50,
            min_distance_from_center: 30.0,
            min_obstacle_radius: 1.0,
            max_obstacle_radius: 4.0,
            obstacle_spin_speed: 20.0,
        }
    }
}

/// Checkpoint sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointSettings {
    /// Checkpoints required to win
    pub total: u32,
    pub trigger_radius: f32,
    pub min_distance_from_ship: f32,
}

impl Default for CheckpointSettings {
    fn default() -> Self {
        Self {
            total: 5,
            trigger_radius: 10.0,
            min_distance_from_ship: 40.0,
        }
    }
}

/// Per-run options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Seed for field layout and checkpoint placement
    pub seed: u64,
    /// Stop simulating once every checkpoint is collected
    pub freeze_on_win: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            seed: 0x5EED_F11E,
            freeze_on_win: false,
        }
    }
}

/// Complete game tuning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub boost: BoostSettings,
    pub flight: FlightSettings,
    pub keyboard: KeyboardSettings,
    pub field: FieldSettings,
    pub checkpoints: CheckpointSettings,
    pub session: SessionSettings,
}

/// Failure loading or saving settings
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "settings file error: {e}"),
            SettingsError::Parse(e) => write!(f, "invalid settings: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

impl Settings {
    /// Settings with a specific run seed
    pub fn with_seed(seed: u64) -> Self {
        let mut settings = Self::default();
        settings.session.seed = seed;
        settings
    }

    /// Parse settings from JSON (missing fields keep their defaults)
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Repair values that would break the simulation
    pub fn sanitized(mut self) -> Self {
        let boost = &mut self.boost;
        if boost.max_boost_speed < boost.cruise_speed {
            log::warn!(
                "max_boost_speed {} below cruise_speed {}, clamping",
                boost.max_boost_speed,
                boost.cruise_speed
            );
            boost.max_boost_speed = boost.cruise_speed;
        }
        if boost.rock_window_time <= 0.0 {
            log::warn!("rock_window_time must be positive, using default");
            boost.rock_window_time = BoostSettings::default().rock_window_time;
        }
        if boost.boost_build_up_speed < 0.0 || boost.boost_decay_speed < 0.0 {
            log::warn!(
                "negative boost rates ({}, {}), clamping to zero",
                boost.boost_build_up_speed,
                boost.boost_decay_speed
            );
            boost.boost_build_up_speed = boost.boost_build_up_speed.max(0.0);
            boost.boost_decay_speed = boost.boost_decay_speed.max(0.0);
        }
        if boost.rocks_for_boost == 0 {
            log::warn!("rocks_for_boost must be at least 1");
            boost.rocks_for_boost = 1;
        }

        let field = &mut self.field;
        if field.max_obstacle_radius < field.min_obstacle_radius {
            std::mem::swap(&mut field.min_obstacle_radius, &mut field.max_obstacle_radius);
        }
        field.radius = field.radius.max(0.0);

        self.flight.start_orientation = self.flight.start_orientation.normalize();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_shipped_balance() {
        let s = Settings::default();
        assert_eq!(s.boost.cruise_speed, 30.0);
        assert_eq!(s.boost.max_boost_speed, 80.0);
        assert_eq!(s.boost.rocks_for_boost, 3);
        assert_eq!(s.field.obstacle_count, 50);
        assert_eq!(s.checkpoints.total, 5);
        assert!(!s.session.freeze_on_win);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s = Settings::from_json(r#"{ "boost": { "cruise_speed": 25.0 }, "checkpoints": { "total": 3 } }"#)
            .unwrap();
        assert_eq!(s.boost.cruise_speed, 25.0);
        assert_eq!(s.boost.max_boost_speed, 80.0);
        assert_eq!(s.checkpoints.total, 3);
        assert_eq!(s.field, FieldSettings::default());
    }

    #[test]
    fn test_json_round_trip() {
        let s = Settings::with_seed(42);
        let parsed = Settings::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(parsed, s);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Settings::load("/nonexistent/rock-flight-settings.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn test_sanitize_repairs_inverted_ranges() {
        let s = Settings::from_json(
            r#"{ "boost": { "cruise_speed": 50.0, "max_boost_speed": 40.0 },
                 "field": { "min_obstacle_radius": 5.0, "max_obstacle_radius": 2.0 } }"#,
        )
        .unwrap();
        assert_eq!(s.boost.max_boost_speed, 50.0);
        assert_eq!(s.field.min_obstacle_radius, 2.0);
        assert_eq!(s.field.max_obstacle_radius, 5.0);

        let s = Settings::from_json(
            r#"{ "boost": { "boost_build_up_speed": -15, "boost_decay_speed": -5, "rocks_for_boost": 0 } }"#,
        )
        .unwrap();
        assert_eq!(s.boost.boost_build_up_speed, 0.0);
        assert_eq!(s.boost.boost_decay_speed, 0.0);
        assert_eq!(s.boost.rocks_for_boost, 1);
    }

    #[test]
    fn test_sanitized_boost_stays_at_cruise_when_flat() {
        let s = Settings::from_json(r#"{ "boost": { "boost_build_up_speed": -15, "rocks_for_boost": 0 } }"#)
            .unwrap();
        let mut boost = crate::sim::GestureBoostController::new(s.boost);
        for _ in 0..10 {
            assert_eq!(boost.update(0.0, 0.2), 30.0);
        }
    }
}
