// Streaming tracker error types and constants

use crate::error::{ConfigError, ErrorCode};
use log::error;
use std::fmt;

/// Tracker error code constants
///
/// Error code range: 2001-2004
pub struct TrackerErrorCodes {}

impl TrackerErrorCodes {
    /// Tracker was constructed with an invalid configuration
    pub const CONFIG: i32 = 2001;

    /// Start offset was negative or not finite
    pub const INVALID_START_OFFSET: i32 = 2002;

    /// No tokio runtime available to schedule ticks on
    pub const RUNTIME_UNAVAILABLE: i32 = 2003;

    /// Mutex guarding the frame source was poisoned
    pub const LOCK_POISONED: i32 = 2004;
}

/// Log a tracker error with structured context
pub fn log_tracker_error(err: &TrackerError, context: &str) {
    error!(
        "Tracker error in {}: code={}, component=PitchTracker, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Streaming tracker errors
///
/// Signal content never produces one of these; they cover lifecycle and
/// wiring problems only.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// Underlying configuration was rejected
    Config { source: ConfigError },

    /// start() received a negative or non-finite offset
    InvalidStartOffset { offset_secs: f64 },

    /// start() was called outside a tokio runtime
    RuntimeUnavailable,

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for TrackerError {
    fn code(&self) -> i32 {
        match self {
            TrackerError::Config { .. } => TrackerErrorCodes::CONFIG,
            TrackerError::InvalidStartOffset { .. } => TrackerErrorCodes::INVALID_START_OFFSET,
            TrackerError::RuntimeUnavailable => TrackerErrorCodes::RUNTIME_UNAVAILABLE,
            TrackerError::LockPoisoned { .. } => TrackerErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            TrackerError::Config { source } => {
                format!("Invalid tracker configuration: {}", source.message())
            }
            TrackerError::InvalidStartOffset { offset_secs } => {
                format!(
                    "Start offset must be finite and >= 0 (got {})",
                    offset_secs
                )
            }
            TrackerError::RuntimeUnavailable => {
                "No tokio runtime available. Call start() from within a runtime.".to_string()
            }
            TrackerError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
        }
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrackerError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for TrackerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackerError::Config { source } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for TrackerError {
    fn from(source: ConfigError) -> Self {
        TrackerError::Config { source }
    }
}
