//! Orientation input with keyboard fallback
//!
//! The sensor is polled once per tick. `Ok(None)` means "nothing new yet";
//! the first `Ok(Some(_))` marks the device ready. Any fault disables the
//! sensor for the rest of the session and control drops to the keyboard.

use std::collections::VecDeque;
use std::fmt;

use glam::Quat;

use crate::settings::KeyboardSettings;
use crate::sim::tick::{ControlInput, KeyboardAxes, SensorEvent, TickInput};

/// Why a sensor read produced no orientation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorFault {
    /// No device present
    Unavailable,
    /// Device went away mid-session
    Disconnected,
    /// Device present but the read failed
    ReadFailed(String),
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorFault::Unavailable => write!(f, "orientation sensor unavailable"),
            SensorFault::Disconnected => write!(f, "orientation sensor disconnected"),
            SensorFault::ReadFailed(reason) => write!(f, "orientation read failed: {reason}"),
        }
    }
}

impl std::error::Error for SensorFault {}

/// A tilt device that can be polled for its absolute rotation
pub trait OrientationSource {
    /// Latest absolute rotation, `Ok(None)` if no new sample is ready
    fn try_get_orientation(&mut self) -> Result<Option<Quat>, SensorFault>;
}

/// Lifecycle of the sensor path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatus {
    /// Polling, no sample seen yet
    Waiting,
    /// Delivering samples
    Ready,
    /// Given up; keyboard only
    Disabled,
}

/// Raw keyboard state for one tick
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardState {
    /// A/D or Left/Right, -1..1
    pub horizontal: f32,
    /// W/S or Up/Down, -1..1
    pub vertical: f32,
    /// Q (+1) / E (-1)
    pub roll: f32,
    /// Shift held
    pub boost: bool,
    /// Recenter key held (edge-detected by the router)
    pub recenter: bool,
}

/// Chooses between sensor and keyboard each tick and owns the heading baseline
pub struct InputRouter {
    source: Option<Box<dyn OrientationSource>>,
    status: SensorStatus,
    keyboard: KeyboardSettings,
    /// Raw rotation treated as "level"
    baseline: Quat,
    last_raw: Option<Quat>,
    recenter_was_down: bool,
}

impl InputRouter {
    pub fn new(source: Option<Box<dyn OrientationSource>>, keyboard: KeyboardSettings) -> Self {
        let status = if source.is_some() {
            SensorStatus::Waiting
        } else {
            log::info!("No orientation sensor; using keyboard controls");
            SensorStatus::Disabled
        };
        Self {
            source,
            status,
            keyboard,
            baseline: Quat::IDENTITY,
            last_raw: None,
            recenter_was_down: false,
        }
    }

    /// Keyboard-only router
    pub fn keyboard_only(keyboard: KeyboardSettings) -> Self {
        Self::new(None, keyboard)
    }

    pub fn status(&self) -> SensorStatus {
        self.status
    }

    pub fn baseline(&self) -> Quat {
        self.baseline
    }

    /// Poll all inputs and build this tick's input
    pub fn poll(&mut self, keys: &KeyboardState) -> TickInput {
        let before = self.status;
        let raw = self.poll_sensor();

        let recenter = keys.recenter && !self.recenter_was_down;
        self.recenter_was_down = keys.recenter;
        let recentered = recenter && self.recenter(raw);

        let control = match (self.status, raw) {
            (SensorStatus::Ready, Some(raw)) => ControlInput::Sensor(self.baseline.inverse() * raw),
            // Ready but nothing new, or the sensor faulted this very tick
            (SensorStatus::Ready, None) => ControlInput::Hold,
            (SensorStatus::Disabled, None) if before == SensorStatus::Ready => ControlInput::Hold,
            _ => self.keyboard_control(keys),
        };

        let sensor_event = match (before, self.status) {
            (SensorStatus::Waiting, SensorStatus::Ready) => Some(SensorEvent::Ready),
            (SensorStatus::Waiting, SensorStatus::Disabled) => Some(SensorEvent::Unavailable),
            (SensorStatus::Ready, SensorStatus::Disabled) => Some(SensorEvent::Lost),
            _ => None,
        };

        TickInput {
            control,
            sensor_event,
            recentered,
        }
    }

    fn poll_sensor(&mut self) -> Option<Quat> {
        if self.status == SensorStatus::Disabled {
            return None;
        }
        let source = self.source.as_mut()?;

        match source.try_get_orientation() {
            Ok(Some(raw)) => {
                if self.status == SensorStatus::Waiting {
                    log::info!("Orientation sensor ready");
                    self.status = SensorStatus::Ready;
                    self.baseline = raw.normalize();
                }
                let raw = raw.normalize();
                self.last_raw = Some(raw);
                Some(raw)
            }
            Ok(None) => None,
            Err(fault) => {
                match self.status {
                    SensorStatus::Ready => {
                        log::warn!("{fault}; holding heading and switching to keyboard")
                    }
                    _ => log::warn!("{fault}; using keyboard controls"),
                }
                self.status = SensorStatus::Disabled;
                self.source = None;
                None
            }
        }
    }

    /// Make the current raw rotation the new level reference; false if there was none
    fn recenter(&mut self, raw: Option<Quat>) -> bool {
        match raw.or(self.last_raw) {
            Some(raw) if self.status == SensorStatus::Ready => {
                self.baseline = raw;
                log::info!("Heading baseline reset");
                true
            }
            _ => {
                log::debug!("Recenter ignored: no sensor heading");
                false
            }
        }
    }

    fn keyboard_control(&self, keys: &KeyboardState) -> ControlInput {
        if !self.keyboard.enabled {
            return ControlInput::Hold;
        }
        let dead_zone = self.keyboard.dead_zone;
        let axis = |v: f32| {
            if v.abs() > dead_zone {
                v.clamp(-1.0, 1.0)
            } else {
                0.0
            }
        };
        ControlInput::Keyboard(KeyboardAxes {
            yaw: axis(keys.horizontal),
            pitch: -axis(keys.vertical),
            roll: axis(keys.roll),
            boost: keys.boost,
        })
    }
}

/// Sensor replaying a fixed sequence of reads, then reporting a disconnect
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    reads: VecDeque<Result<Option<Quat>, SensorFault>>,
}

impl ScriptedSource {
    pub fn new(reads: impl IntoIterator<Item = Result<Option<Quat>, SensorFault>>) -> Self {
        Self {
            reads: reads.into_iter().collect(),
        }
    }

    /// One ready sample per roll angle (degrees)
    pub fn from_rolls(rolls: impl IntoIterator<Item = f32>) -> Self {
        Self::new(
            rolls
                .into_iter()
                .map(|roll| Ok(Some(Quat::from_rotation_z(roll.to_radians())))),
        )
    }

    pub fn push(&mut self, read: Result<Option<Quat>, SensorFault>) {
        self.reads.push_back(read);
    }

    pub fn remaining(&self) -> usize {
        self.reads.len()
    }
}

impl OrientationSource for ScriptedSource {
    fn try_get_orientation(&mut self) -> Result<Option<Quat>, SensorFault> {
        self.reads.pop_front().unwrap_or(Err(SensorFault::Disconnected))
    }
}
