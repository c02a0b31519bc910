//! Error types for timer operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors during timer construction and preset loading
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("tick duration must be a positive number of seconds, got {duration}")]
    InvalidDuration { duration: f32 },

    #[error("tick count must be at least 1, got {count}")]
    InvalidTickCount { count: u32 },

    #[error("failed to read preset file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse preset TOML in {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid timer '{name}' in {path}")]
    InvalidDefinition {
        path: PathBuf,
        name: String,
        #[source]
        source: Box<TimerError>,
    },
}

impl TimerError {
    /// Check a tick duration, rejecting zero, negative and non-finite values
    pub fn check_duration(duration: f32) -> Result<f32, TimerError> {
        if duration.is_finite() && duration > 0.0 {
            Ok(duration)
        } else {
            Err(TimerError::InvalidDuration { duration })
        }
    }

    /// Check a tick count (must be at least one)
    pub fn check_tick_count(count: u32) -> Result<u32, TimerError> {
        if count >= 1 {
            Ok(count)
        } else {
            Err(TimerError::InvalidTickCount { count })
        }
    }
}
