//! Platform abstraction layer
//!
//! Handles device differences for:
//! - Orientation sensor polling (cushion or any tilt device)
//! - Keyboard fallback when no sensor is available
//! - Heading recenter

pub mod input;

pub use input::{
    InputRouter, KeyboardState, OrientationSource, ScriptedSource, SensorFault, SensorStatus,
};
