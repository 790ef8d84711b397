// Input/fixture error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Input error code constants
///
/// Error code range: 3001-3005
pub struct InputErrorCodes {}

impl InputErrorCodes {
    pub const OPEN_FAILED: i32 = 3001;
    pub const UNSUPPORTED_FORMAT: i32 = 3002;
    pub const READ_FAILED: i32 = 3003;
    pub const WRITE_FAILED: i32 = 3004;
    pub const INVALID_FIXTURE: i32 = 3005;
}

/// Log an input error with structured context
pub fn log_input_error(err: &InputError, context: &str) {
    error!(
        "Input error in {}: code={}, component=Fixtures, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while loading or writing sample buffers and fixture files
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    /// File could not be opened or created
    OpenFailed { path: String, reason: String },

    /// WAV layout not supported (bit depth, zero channels)
    UnsupportedFormat { reason: String },

    /// Error while decoding PCM samples or parsing JSON
    ReadFailed { reason: String },

    /// Error while encoding or flushing output
    WriteFailed { reason: String },

    /// Malformed synthetic signal or expectation description
    InvalidFixture { reason: String },
}

impl ErrorCode for InputError {
    fn code(&self) -> i32 {
        match self {
            InputError::OpenFailed { .. } => InputErrorCodes::OPEN_FAILED,
            InputError::UnsupportedFormat { .. } => InputErrorCodes::UNSUPPORTED_FORMAT,
            InputError::ReadFailed { .. } => InputErrorCodes::READ_FAILED,
            InputError::WriteFailed { .. } => InputErrorCodes::WRITE_FAILED,
            InputError::InvalidFixture { .. } => InputErrorCodes::INVALID_FIXTURE,
        }
    }

    fn message(&self) -> String {
        match self {
            InputError::OpenFailed { path, reason } => {
                format!("Failed to open {}: {}", path, reason)
            }
            InputError::UnsupportedFormat { reason } => {
                format!("Unsupported audio format: {}", reason)
            }
            InputError::ReadFailed { reason } => format!("Read failed: {}", reason),
            InputError::WriteFailed { reason } => format!("Write failed: {}", reason),
            InputError::InvalidFixture { reason } => format!("Invalid fixture: {}", reason),
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InputError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for InputError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_codes() {
        assert_eq!(
            InputError::OpenFailed {
                path: "a.wav".to_string(),
                reason: "missing".to_string()
            }
            .code(),
            3001
        );
        assert_eq!(
            InputError::InvalidFixture {
                reason: "bad".to_string()
            }
            .code(),
            InputErrorCodes::INVALID_FIXTURE
        );
    }
}
