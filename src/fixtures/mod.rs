//! Fixture utilities for the deterministic CLI harness.
//!
//! This module loads PCM WAV input, renders synthetic signals, and checks
//! segmented notes against expectation JSON. It backs the `melody_cli`
//! binary and the integration tests.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::segmenter::Note;
use crate::error::InputError;

pub mod signals;
pub mod wav;

pub use signals::{render, SignalPart, DEFAULT_NOISE_SEED};
pub use wav::{read_wav, write_wav};

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteExpectations {
    #[serde(default)]
    pub description: Option<String>,
    pub notes: Vec<ExpectedNote>,
}

/// Expected note definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedNote {
    pub midi: i32,
    pub start: f64,
    pub duration: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance_secs: f64,
}

fn default_tolerance() -> f64 {
    0.05
}

impl NoteExpectations {
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let json = fs::read_to_string(path).map_err(|err| InputError::OpenFailed {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        serde_json::from_str(&json).map_err(|err| InputError::ReadFailed {
            reason: format!("parsing {}: {err}", path.display()),
        })
    }

    /// Compare notes index by index; extra or missing notes are failures.
    pub fn verify(&self, actual: &[Note]) -> Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        for (idx, expected) in self.notes.iter().enumerate() {
            match actual.get(idx) {
                Some(note) => {
                    let start_delta = (note.start - expected.start).abs();
                    let duration_delta = (note.duration - expected.duration).abs();
                    if note.midi != expected.midi
                        || start_delta > expected.tolerance_secs
                        || duration_delta > expected.tolerance_secs
                    {
                        failures.push(ExpectationFailure {
                            index: idx,
                            expected: Some(expected.clone()),
                            actual: Some(note.clone()),
                            start_delta: Some(start_delta),
                            duration_delta: Some(duration_delta),
                        });
                    }
                }
                None => failures.push(ExpectationFailure {
                    index: idx,
                    expected: Some(expected.clone()),
                    actual: None,
                    start_delta: None,
                    duration_delta: None,
                }),
            }
        }

        for (idx, note) in actual.iter().enumerate().skip(self.notes.len()) {
            failures.push(ExpectationFailure {
                index: idx,
                expected: None,
                actual: Some(note.clone()),
                start_delta: None,
                duration_delta: None,
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing actual notes with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "index": failure.index,
                    "expected": failure.expected,
                    "actual": failure.actual,
                    "start_delta": failure.start_delta,
                    "duration_delta": failure.duration_delta,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single failure.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub index: usize,
    pub expected: Option<ExpectedNote>,
    pub actual: Option<Note>,
    pub start_delta: Option<f64>,
    pub duration_delta: Option<f64>,
}
