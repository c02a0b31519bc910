//! Timer preset loading
//!
//! Presets describe timer behavior in TOML so hosts can tune durations
//! without recompiling. Callbacks are attached in code after loading:
//!
//! ```toml
//! [[timers]]
//! name = "poison"
//! duration_secs = 2.0
//! tick_count = 3
//!
//! [[timers]]
//! name = "regen"
//! duration_secs = 0.5
//! looping = true
//! scaled = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use flextimer_types::{PresetFile, TimerSettings};

use super::error::TimerError;

/// Check the options a timer needs before it can be built
pub fn validate_settings(settings: &TimerSettings) -> Result<(), TimerError> {
    TimerError::check_duration(settings.duration_secs)?;
    if !settings.looping {
        TimerError::check_tick_count(settings.tick_count)?;
    }
    Ok(())
}

/// Parse preset TOML. `path` is only used for error context.
pub fn parse_presets(content: &str, path: &Path) -> Result<PresetFile, TimerError> {
    let presets: PresetFile = toml::from_str(content).map_err(|source| TimerError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;

    for settings in &presets.timers {
        validate_settings(settings).map_err(|source| TimerError::InvalidDefinition {
            path: path.to_path_buf(),
            name: settings.display_name().to_string(),
            source: Box::new(source),
        })?;
    }

    Ok(presets)
}

/// Load and validate a single preset file
pub fn load_presets(path: &Path) -> Result<PresetFile, TimerError> {
    let content = fs::read_to_string(path).map_err(|source| TimerError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    let presets = parse_presets(&content, path)?;
    tracing::debug!(path = %path.display(), count = presets.timers.len(), "Loaded timer presets");
    Ok(presets)
}

/// Load every `.toml` file under `dir` (recursively), in path order.
/// A missing directory yields no presets.
pub fn load_presets_from_dir(dir: &Path) -> Result<Vec<(PathBuf, PresetFile)>, TimerError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = Vec::new();

    collect_toml_files(dir, &mut files)?;
    files.sort();

    files
        .into_iter()
        .map(|path| load_presets(&path).map(|presets| (path, presets)))
        .collect()
}

fn collect_toml_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), TimerError> {
    let entries = fs::read_dir(dir).map_err(|source| TimerError::ReadFile {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_toml_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    Ok(())
}
