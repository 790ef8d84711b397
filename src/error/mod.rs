// Error types for the melody tracker
//
// This module defines custom error types for configuration, streaming and
// input operations, providing structured error handling with numeric codes
// that survive serialization to JSON reports.

mod config;
mod input;
mod tracker;

pub use config::{log_config_error, ConfigError, ConfigErrorCodes};
pub use input::{log_input_error, InputError, InputErrorCodes};
pub use tracker::{log_tracker_error, TrackerError, TrackerErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the library and CLI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
