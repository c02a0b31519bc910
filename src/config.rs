//! Driver defaults persisted with confy
//!
//! Stored as `flextimer/config` in the platform config directory. Command
//! line flags override whatever is stored.

use std::path::PathBuf;

use flextimer_types::DriverConfig;

const APP_NAME: &str = "flextimer";
const CONFIG_NAME: &str = "config";

/// Load stored defaults, falling back to built-in ones if the file is
/// unreadable.
pub fn load() -> DriverConfig {
    match confy::load(APP_NAME, CONFIG_NAME) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load driver config; using defaults");
            DriverConfig::default()
        }
    }
}

/// Location of the settings file, if the platform has a config directory
pub fn path() -> Option<PathBuf> {
    confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).ok()
}

/// Apply command line overrides on top of stored defaults
pub fn with_overrides(
    mut config: DriverConfig,
    frames: Option<u64>,
    fps: Option<f32>,
    time_scale: Option<f32>,
) -> DriverConfig {
    if let Some(frames) = frames {
        config.frames = frames;
    }
    if let Some(fps) = fps {
        config.fps = fps;
    }
    if let Some(time_scale) = time_scale {
        config.time_scale = time_scale;
    }
    config
}
