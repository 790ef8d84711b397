//! Configuration management for pitch tracking and segmentation
//!
//! This module provides runtime configuration loading from JSON files,
//! so detector thresholds, tracker cadence and segmentation gates can be
//! tuned without recompilation. Every section validates eagerly; a bad
//! value is reported as a [`ConfigError`] before any sample is analysed.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub yin: YinConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub segmenter: SegmenterConfig,
}

/// YIN estimator parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YinConfig {
    /// CMND dip threshold; lower means fewer false positives, more misses
    pub threshold: f32,
    /// Final voicing gate applied to `1 - cmnd(tau)`
    pub probability_threshold: f32,
    /// Sample rate in Hz used for lag <-> frequency conversion
    pub sample_rate: u32,
    /// Lowest detectable frequency; sets max_lag
    pub min_freq: f32,
    /// Highest detectable frequency; sets min_lag
    pub max_freq: f32,
}

impl Default for YinConfig {
    fn default() -> Self {
        Self {
            threshold: 0.15,
            probability_threshold: 0.1,
            sample_rate: 44_100,
            min_freq: 50.0,
            max_freq: 1_500.0,
        }
    }
}

impl YinConfig {
    /// Copy of this config retargeted at another sample rate
    pub fn with_sample_rate(&self, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..*self
        }
    }

    /// Reject malformed settings before any lag computation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }

        if !self.min_freq.is_finite()
            || !self.max_freq.is_finite()
            || self.min_freq <= 0.0
            || self.min_freq >= self.max_freq
        {
            return Err(ConfigError::InvalidFrequencyRange {
                min_freq: self.min_freq,
                max_freq: self.max_freq,
            });
        }

        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.threshold,
            });
        }

        if !(0.0..=1.0).contains(&self.probability_threshold) {
            return Err(ConfigError::InvalidProbabilityThreshold {
                probability_threshold: self.probability_threshold,
            });
        }

        let min_lag = self.min_lag();
        let max_lag = self.max_lag();
        if min_lag < 1 || min_lag >= max_lag {
            return Err(ConfigError::InvalidLagRange { min_lag, max_lag });
        }

        Ok(())
    }

    /// Shortest candidate period in samples, `floor(sample_rate / max_freq)`
    pub fn min_lag(&self) -> usize {
        (self.sample_rate as f64 / self.max_freq as f64).floor() as usize
    }

    /// Longest candidate period in samples, `floor(sample_rate / min_freq)`
    pub fn max_lag(&self) -> usize {
        (self.sample_rate as f64 / self.min_freq as f64).floor() as usize
    }
}

/// Streaming tracker parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Samples pulled from the frame source per tick
    pub frame_size: usize,
    /// Period of the tick trigger in milliseconds (~60 Hz refresh by default)
    pub tick_interval_ms: u64,
    /// EMA factor applied to voiced frequencies
    pub smoothing_alpha: f32,
    /// Capacity of the bounded pitch-point channel
    pub channel_capacity: usize,
    /// Retention window for [`crate::engine::PitchHistory`]
    pub history_secs: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            tick_interval_ms: 16,
            smoothing_alpha: 0.25,
            channel_capacity: 256,
            history_secs: 30.0,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_size == 0 {
            return Err(ConfigError::InvalidTrackerSetting {
                reason: "frame_size must be > 0".to_string(),
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidTrackerSetting {
                reason: "tick_interval_ms must be > 0".to_string(),
            });
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(ConfigError::InvalidSmoothing {
                alpha: self.smoothing_alpha,
            });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidTrackerSetting {
                reason: "channel_capacity must be > 0".to_string(),
            });
        }
        if !(self.history_secs.is_finite() && self.history_secs > 0.0) {
            return Err(ConfigError::InvalidTrackerSetting {
                reason: format!("history_secs must be > 0 (got {})", self.history_secs),
            });
        }
        Ok(())
    }
}

/// Offline segmentation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Analysis window in samples
    pub window_size: usize,
    /// Distance between consecutive windows in samples
    pub hop_size: usize,
    /// Median filter width over the per-hop pitch track (forced odd)
    pub median_width: usize,
    /// Segments shorter than this are discarded
    pub min_note_duration_secs: f64,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            hop_size: 512,
            median_width: 7,
            min_note_duration_secs: 0.08,
        }
    }
}

impl SegmenterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 || self.hop_size == 0 || self.hop_size > self.window_size {
            return Err(ConfigError::InvalidWindow {
                window_size: self.window_size,
                hop_size: self.hop_size,
            });
        }
        if !(self.min_note_duration_secs.is_finite() && self.min_note_duration_secs >= 0.0) {
            return Err(ConfigError::InvalidTrackerSetting {
                reason: format!(
                    "min_note_duration_secs must be >= 0 (got {})",
                    self.min_note_duration_secs
                ),
            });
        }
        Ok(())
    }
}

impl AppConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.yin.validate()?;
        self.tracker.validate()?;
        self.segmenter.validate()
    }

    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults if the file is missing or the
    /// JSON is invalid. Missing sections fall back to their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the bundled assets directory
    pub fn load() -> Self {
        Self::load_from_file("assets/pitch_config.json")
    }
}
