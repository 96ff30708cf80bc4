//! Rock-to-boost gesture detection
//!
//! The player gains speed by rocking the cushion left and right. Each tick the
//! roll angle is differentiated into an angular velocity, direction reversals
//! that swing far enough from the previous peak are confirmed as "rocks", and
//! the number of rocks inside a sliding time window drives the speed.

use serde::{Deserialize, Serialize};

use crate::consts::{MIN_DELTA_TIME, ROCK_HISTORY_CAPACITY};
use crate::normalize_degrees;
use crate::settings::BoostSettings;

/// Direction of roll motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RockDirection {
    Left,
    Right,
}

/// A single roll reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RockSample {
    /// Controller clock time (seconds)
    pub time: f64,
    /// Roll in degrees, (-180, 180]
    pub angle: f32,
}

/// Fixed-capacity ring of confirmed rock timestamps
///
/// Entries older than the detection window are ignored by [`RockHistory::count_since`]
/// even though they stay in the ring until overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RockHistory {
    slots: [Option<f64>; ROCK_HISTORY_CAPACITY],
    next: usize,
}

impl Default for RockHistory {
    fn default() -> Self {
        Self {
            slots: [None; ROCK_HISTORY_CAPACITY],
            next: 0,
        }
    }
}

impl RockHistory {
    /// Record a rock, overwriting the oldest slot when full
    pub fn record(&mut self, time: f64) {
        self.slots[self.next] = Some(time);
        self.next = (self.next + 1) % ROCK_HISTORY_CAPACITY;
    }

    /// Rocks recorded within `window` seconds of `now`
    pub fn count_since(&self, now: f64, window: f32) -> usize {
        let window = f64::from(window);
        self.slots
            .iter()
            .flatten()
            .filter(|&&t| now - t <= window)
            .count()
    }

    /// Rocks physically stored, expired or not
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Turns a roll-angle stream into a forward speed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureBoostController {
    settings: BoostSettings,
    /// Controller clock (seconds of accumulated tick time)
    clock: f64,
    speed: f32,
    last_angle: f32,
    angular_velocity: f32,
    /// Direction of the last confirmed rock (None until motion is first seen)
    last_rock_direction: Option<RockDirection>,
    last_peak_angle: f32,
    was_moving_right: bool,
    history: RockHistory,
}

impl GestureBoostController {
    pub fn new(settings: BoostSettings) -> Self {
        let speed = settings.cruise_speed;
        Self {
            settings,
            clock: 0.0,
            speed,
            last_angle: 0.0,
            angular_velocity: 0.0,
            last_rock_direction: None,
            last_peak_angle: 0.0,
            was_moving_right: false,
            history: RockHistory::default(),
        }
    }

    /// Feed one roll reading; returns the updated speed
    pub fn update(&mut self, roll_degrees: f32, dt: f32) -> f32 {
        let dt = dt.max(0.0);
        self.clock += f64::from(dt);
        let sample = RockSample {
            time: self.clock,
            angle: normalize_degrees(roll_degrees),
        };

        let delta = sample.angle - self.last_angle;
        if delta.abs() > 180.0 {
            // Crossed the ±180° seam; the difference is meaningless
            log::trace!("Roll wrapped {} -> {}", self.last_angle, sample.angle);
        } else if dt > MIN_DELTA_TIME {
            self.angular_velocity = delta / dt;
            self.classify(sample);
        }
        self.last_angle = sample.angle;

        self.apply_speed(dt);
        self.speed
    }

    /// Feed a reading taken against a new reference frame
    ///
    /// The jump from the previous angle is not motion, so this re-seeds the
    /// last angle and peak without classifying. Rock history and speed carry on.
    pub fn rebase(&mut self, roll_degrees: f32, dt: f32) -> f32 {
        let dt = dt.max(0.0);
        self.clock += f64::from(dt);
        let angle = normalize_degrees(roll_degrees);
        log::debug!("Roll rebased {:.1} -> {:.1}", self.last_angle, angle);
        self.last_angle = angle;
        self.last_peak_angle = angle;
        self.angular_velocity = 0.0;

        self.apply_speed(dt);
        self.speed
    }

    /// Advance time without a reading: no direction tracking, speed follows the rock count
    pub fn coast(&mut self, dt: f32) -> f32 {
        let dt = dt.max(0.0);
        self.clock += f64::from(dt);
        self.apply_speed(dt);
        self.speed
    }

    /// Keyboard boost: move toward `boost_speed` while held, back to cruise otherwise
    pub fn update_manual(&mut self, boost_held: bool, boost_speed: f32, dt: f32) -> f32 {
        let dt = dt.max(0.0);
        self.clock += f64::from(dt);
        let (target, rate) = if boost_held {
            (
                boost_speed.clamp(self.settings.cruise_speed, self.settings.max_boost_speed),
                self.settings.boost_build_up_speed,
            )
        } else {
            (self.settings.cruise_speed, self.settings.boost_decay_speed)
        };
        self.speed = move_towards(self.speed, target, rate * dt);
        self.speed
    }

    fn classify(&mut self, sample: RockSample) {
        let moving_right = self.angular_velocity > self.settings.min_angular_velocity;
        let moving_left = self.angular_velocity < -self.settings.min_angular_velocity;
        let swing = (sample.angle - self.last_peak_angle).abs();

        let reversal = if moving_right
            && !self.was_moving_right
            && self.last_rock_direction == Some(RockDirection::Left)
        {
            Some(RockDirection::Right)
        } else if moving_left
            && self.was_moving_right
            && self.last_rock_direction == Some(RockDirection::Right)
        {
            Some(RockDirection::Left)
        } else {
            None
        };

        if let Some(direction) = reversal
            && swing >= self.settings.min_rock_angle
        {
            self.last_rock_direction = Some(direction);
            self.last_peak_angle = sample.angle;
            self.history.record(sample.time);
            log::debug!(
                "Rock {:?} at {:.2}s (swing {:.1}°, {} in window)",
                direction,
                sample.time,
                swing,
                self.recent_rock_count()
            );
        }

        if self.last_rock_direction.is_none() {
            if moving_right {
                self.last_rock_direction = Some(RockDirection::Right);
            } else if moving_left {
                self.last_rock_direction = Some(RockDirection::Left);
            }
            self.last_peak_angle = sample.angle;
        }

        if moving_right {
            self.was_moving_right = true;
        } else if moving_left {
            self.was_moving_right = false;
        }
    }

    fn apply_speed(&mut self, dt: f32) {
        let recent = self.recent_rock_count();
        let frequency = self.rock_frequency();
        let s = &self.settings;
        if recent >= s.rocks_for_boost {
            let multiplier = 1.0 + frequency * s.frequency_boost_multiplier;
            self.speed += s.boost_build_up_speed * multiplier * dt;
        } else if self.speed > s.cruise_speed {
            self.speed -= s.boost_decay_speed * dt;
        }
        self.speed = self.speed.min(s.max_boost_speed).max(s.cruise_speed);
    }

    /// Clear all gesture history and drop back to cruise speed
    pub fn reset(&mut self) {
        self.history.clear();
        self.last_rock_direction = None;
        self.last_peak_angle = 0.0;
        self.last_angle = 0.0;
        self.angular_velocity = 0.0;
        self.was_moving_right = false;
        self.speed = self.settings.cruise_speed;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Speed mapped linearly from cruise (0) to max boost (1)
    pub fn boost_percent(&self) -> f32 {
        let range = self.settings.max_boost_speed - self.settings.cruise_speed;
        if range <= f32::EPSILON {
            return 0.0;
        }
        ((self.speed - self.settings.cruise_speed) / range).clamp(0.0, 1.0)
    }

    /// Confirmed rocks inside the sliding window
    pub fn recent_rock_count(&self) -> usize {
        self.history
            .count_since(self.clock, self.settings.rock_window_time)
    }

    /// Rocks per second over the sliding window
    pub fn rock_frequency(&self) -> f32 {
        self.recent_rock_count() as f32 / self.settings.rock_window_time
    }

    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    pub fn history(&self) -> &RockHistory {
        &self.history
    }

    pub fn settings(&self) -> &BoostSettings {
        &self.settings
    }
}

/// Step `current` toward `target` by at most `max_delta`
fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
