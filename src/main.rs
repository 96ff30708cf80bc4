//! Rock Flight entry point
//!
//! Native build runs a headless session driven by a synthetic rocking
//! cushion and logs what happens. Pass a settings JSON path as the first
//! argument and a duration in seconds as the second.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::f32::consts::TAU;

    use glam::Quat;
    use rock_flight::consts::SIM_DT;
    use rock_flight::platform::{InputRouter, KeyboardState, OrientationSource, SensorFault};
    use rock_flight::settings::Settings;
    use rock_flight::sim::{GameEvent, GameState, Stepper, tick};

    /// Display refresh the demo pretends to run at
    const FRAME_DT: f32 = 1.0 / 60.0;

    /// Cushion that rocks side to side for a while, then sits still
    pub struct RockingCushion {
        time: f32,
        amplitude: f32,
        frequency: f32,
        rock_for: f32,
    }

    impl RockingCushion {
        pub fn new(amplitude: f32, frequency: f32, rock_for: f32) -> Self {
            Self {
                time: 0.0,
                amplitude,
                frequency,
                rock_for,
            }
        }
    }

    impl OrientationSource for RockingCushion {
        fn try_get_orientation(&mut self) -> Result<Option<Quat>, SensorFault> {
            let roll = if self.time < self.rock_for {
                self.amplitude * (TAU * self.frequency * self.time).sin()
            } else {
                0.0
            };
            self.time += SIM_DT;
            Ok(Some(Quat::from_rotation_z(roll.to_radians())))
        }
    }

    fn load_settings(path: Option<&str>) -> Settings {
        let Some(path) = path else {
            return Settings::default();
        };
        match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings ({}): {}", path, e);
                Settings::default()
            }
        }
    }

    pub fn run() {
        let args: Vec<String> = std::env::args().collect();
        let settings = load_settings(args.get(1).map(String::as_str));
        let seconds: f64 = args
            .get(2)
            .and_then(|s| s.parse().ok())
            .unwrap_or(20.0);

        let cushion = RockingCushion::new(20.0, 1.5, seconds as f32 * 0.5);
        let mut router = InputRouter::new(Some(Box::new(cushion)), settings.keyboard.clone());
        let keys = KeyboardState::default();

        let mut state = GameState::new(&settings);
        let mut stepper = Stepper::default();
        let mut next_report: f64 = 0.0;

        while state.time_secs < seconds && !state.is_frozen() {
            stepper.advance(FRAME_DT, |dt| {
                let input = router.poll(&keys);
                tick(&mut state, &input, dt);
            });

            for event in state.drain_events() {
                match event {
                    GameEvent::CheckpointSpawned { index, position } => {
                        log::info!("Checkpoint {} at {:.1?}", index, position)
                    }
                    GameEvent::GameWon => log::info!("{}", state.hud_text()),
                    other => log::info!("{:?}", other),
                }
            }

            if state.time_secs >= next_report {
                next_report += 1.0;
                let bearing = state
                    .checkpoint_bearing()
                    .map(|b| format!("{:.0} units", b.distance))
                    .unwrap_or_else(|| "-".to_string());
                log::info!(
                    "t={:>5.1}s speed={:>5.1} boost={:>3.0}% rocks={} next={} | {}",
                    state.time_secs,
                    state.speed(),
                    state.boost_percent() * 100.0,
                    state.boost().recent_rock_count(),
                    bearing,
                    state.hud_text(),
                );
            }
        }

        log::info!(
            "Session over after {} ticks: {}",
            state.time_ticks,
            state.hud_text()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Rock Flight (native) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser entry point; the library is driven by the host page
}
