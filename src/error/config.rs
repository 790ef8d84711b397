// Configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Single source of truth for the numeric codes reported by
/// [`ConfigError::code`].
///
/// Error code range: 1001-1008
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// Sample rate is zero
    pub const INVALID_SAMPLE_RATE: i32 = 1001;

    /// Frequency bounds are non-positive, non-finite or inverted
    pub const INVALID_FREQUENCY_RANGE: i32 = 1002;

    /// Frequency bounds collapse to an empty lag search window
    pub const INVALID_LAG_RANGE: i32 = 1003;

    /// CMND threshold outside (0, 1)
    pub const INVALID_THRESHOLD: i32 = 1004;

    /// Voicing probability gate outside [0, 1]
    pub const INVALID_PROBABILITY_THRESHOLD: i32 = 1005;

    /// Analysis window or hop size is zero, or hop exceeds window
    pub const INVALID_WINDOW: i32 = 1006;

    /// Smoothing factor outside (0, 1]
    pub const INVALID_SMOOTHING: i32 = 1007;

    /// Tracker scheduling or buffering parameter is unusable
    pub const INVALID_TRACKER_SETTING: i32 = 1008;
}

/// Log a configuration error with structured context
///
/// Logs the numeric code and message alongside the caller-supplied
/// context. Never panics.
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=Config, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration errors
///
/// Raised eagerly when a detector, tracker or segmenter is constructed,
/// before any sample is analysed.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Sample rate must be greater than zero
    InvalidSampleRate { sample_rate: u32 },

    /// min_freq must be positive and below max_freq
    InvalidFrequencyRange { min_freq: f32, max_freq: f32 },

    /// Derived lag window is empty (min_lag must be >= 1 and < max_lag)
    InvalidLagRange { min_lag: usize, max_lag: usize },

    /// CMND threshold must lie strictly between 0 and 1
    InvalidThreshold { threshold: f32 },

    /// Probability gate must lie in [0, 1]
    InvalidProbabilityThreshold { probability_threshold: f32 },

    /// Window and hop must be non-zero, hop no larger than window
    InvalidWindow { window_size: usize, hop_size: usize },

    /// EMA factor must lie in (0, 1]
    InvalidSmoothing { alpha: f32 },

    /// Any other tracker setting out of range
    InvalidTrackerSetting { reason: String },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::InvalidSampleRate { .. } => ConfigErrorCodes::INVALID_SAMPLE_RATE,
            ConfigError::InvalidFrequencyRange { .. } => {
                ConfigErrorCodes::INVALID_FREQUENCY_RANGE
            }
            ConfigError::InvalidLagRange { .. } => ConfigErrorCodes::INVALID_LAG_RANGE,
            ConfigError::InvalidThreshold { .. } => ConfigErrorCodes::INVALID_THRESHOLD,
            ConfigError::InvalidProbabilityThreshold { .. } => {
                ConfigErrorCodes::INVALID_PROBABILITY_THRESHOLD
            }
            ConfigError::InvalidWindow { .. } => ConfigErrorCodes::INVALID_WINDOW,
            ConfigError::InvalidSmoothing { .. } => ConfigErrorCodes::INVALID_SMOOTHING,
            ConfigError::InvalidTrackerSetting { .. } => {
                ConfigErrorCodes::INVALID_TRACKER_SETTING
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::InvalidSampleRate { sample_rate } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate)
            }
            ConfigError::InvalidFrequencyRange { min_freq, max_freq } => {
                format!(
                    "Frequency range must satisfy 0 < min_freq < max_freq (got {}..{} Hz)",
                    min_freq, max_freq
                )
            }
            ConfigError::InvalidLagRange { min_lag, max_lag } => {
                format!(
                    "Lag search window is empty: min_lag={} max_lag={}",
                    min_lag, max_lag
                )
            }
            ConfigError::InvalidThreshold { threshold } => {
                format!("Threshold must be in (0, 1) (got {})", threshold)
            }
            ConfigError::InvalidProbabilityThreshold {
                probability_threshold,
            } => {
                format!(
                    "Probability threshold must be in [0, 1] (got {})",
                    probability_threshold
                )
            }
            ConfigError::InvalidWindow {
                window_size,
                hop_size,
            } => {
                format!(
                    "Window/hop must be non-zero with hop <= window (got window={}, hop={})",
                    window_size, hop_size
                )
            }
            ConfigError::InvalidSmoothing { alpha } => {
                format!("Smoothing alpha must be in (0, 1] (got {})", alpha)
            }
            ConfigError::InvalidTrackerSetting { reason } => {
                format!("Invalid tracker setting: {}", reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
