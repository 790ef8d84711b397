//! YIN fundamental frequency estimator
//!
//! Single-frame F0 estimation using the cumulative mean normalized
//! difference (CMND) function:
//! 1. Difference function d(τ) over lags 1..=ceiling
//! 2. CMND normalization by the running mean of d(1..τ)
//! 3. Earliest dip below `threshold`, followed to its local minimum
//! 4. Parabolic refinement around the integer lag
//! 5. Voicing gate on `1 - cmnd(τ)`
//!
//! [`YinDetector`] owns its scratch buffers and is reused across frames, so
//! steady-state estimation does not allocate.

use serde::{Deserialize, Serialize};

use crate::config::YinConfig;
use crate::error::ConfigError;

/// Candidate period window in samples derived from a [`YinConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRange {
    pub min_lag: usize,
    pub max_lag: usize,
}

impl LagRange {
    pub fn from_config(config: &YinConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            min_lag: config.min_lag(),
            max_lag: config.max_lag(),
        })
    }

    /// Highest lag usable for a frame of `frame_len` samples
    ///
    /// The analysed span is capped at `2 * max_lag`, and every lag needs a
    /// full half-span of overlap.
    pub fn ceiling(&self, frame_len: usize) -> usize {
        let span = frame_len.min(2 * self.max_lag);
        self.max_lag.min(span / 2)
    }
}

/// Result of analysing one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchEstimate {
    /// Refined F0 in Hz, `None` when unvoiced
    pub frequency_hz: Option<f32>,
    /// Voicing confidence in [0, 1]; may be nonzero while unvoiced
    pub probability: f32,
}

impl PitchEstimate {
    pub const UNVOICED: PitchEstimate = PitchEstimate {
        frequency_hz: None,
        probability: 0.0,
    };

    pub fn is_voiced(&self) -> bool {
        self.frequency_hz.is_some()
    }
}

/// Reusable YIN estimator
#[derive(Debug, Clone)]
pub struct YinDetector {
    config: YinConfig,
    lags: LagRange,
    difference: Vec<f64>,
    cmnd: Vec<f64>,
}

impl YinDetector {
    /// Build a detector, rejecting malformed configuration up front
    pub fn new(config: YinConfig) -> Result<Self, ConfigError> {
        let lags = LagRange::from_config(&config)?;
        Ok(Self {
            config,
            lags,
            difference: vec![0.0; lags.max_lag + 1],
            cmnd: vec![0.0; lags.max_lag + 1],
        })
    }

    pub fn config(&self) -> &YinConfig {
        &self.config
    }

    pub fn lag_range(&self) -> LagRange {
        self.lags
    }

    /// Estimate the F0 of `frame`
    ///
    /// Never fails: short frames, silence and aperiodic input resolve to an
    /// unvoiced estimate.
    pub fn estimate(&mut self, frame: &[f32]) -> PitchEstimate {
        let min_lag = self.lags.min_lag;
        let ceiling = self.lags.ceiling(frame.len());
        if ceiling <= min_lag {
            return PitchEstimate::UNVOICED;
        }

        let span = &frame[..frame.len().min(2 * self.lags.max_lag)];
        if !self.fill_difference(span, ceiling) {
            return PitchEstimate::UNVOICED;
        }
        self.fill_cmnd(ceiling);

        let threshold = self.config.threshold as f64;
        let Some(tau) = self.earliest_dip(min_lag, ceiling, threshold) else {
            return PitchEstimate::UNVOICED;
        };

        let refined = self.refine(tau, min_lag, ceiling);
        let probability = (1.0 - self.cmnd[tau]).clamp(0.0, 1.0) as f32;

        if probability < self.config.probability_threshold {
            return PitchEstimate {
                frequency_hz: None,
                probability,
            };
        }

        let frequency = (self.config.sample_rate as f64 / refined) as f32;
        if !(frequency.is_finite() && frequency > 0.0) {
            return PitchEstimate {
                frequency_hz: None,
                probability,
            };
        }

        PitchEstimate {
            frequency_hz: Some(frequency),
            probability,
        }
    }

    /// Fill d(1..=ceiling); returns false when every lag is exactly zero
    fn fill_difference(&mut self, span: &[f32], ceiling: usize) -> bool {
        let n = span.len();
        let mut any_nonzero = false;

        self.difference[0] = 0.0;
        for tau in 1..=ceiling {
            let d: f64 = span[..n - tau]
                .iter()
                .zip(&span[tau..n])
                .map(|(&a, &b)| {
                    let delta = a as f64 - b as f64;
                    delta * delta
                })
                .sum();
            any_nonzero |= d != 0.0;
            self.difference[tau] = d;
        }

        any_nonzero
    }

    fn fill_cmnd(&mut self, ceiling: usize) {
        self.cmnd[0] = 1.0;
        let mut running = 0.0_f64;
        for tau in 1..=ceiling {
            running += self.difference[tau];
            self.cmnd[tau] = if running == 0.0 {
                0.0
            } else {
                self.difference[tau] * tau as f64 / running
            };
        }
    }

    /// First lag under `threshold`, descended to the bottom of that dip
    fn earliest_dip(&self, min_lag: usize, ceiling: usize, threshold: f64) -> Option<usize> {
        let mut tau = (min_lag..=ceiling).find(|&tau| self.cmnd[tau] < threshold)?;
        while tau < ceiling && self.cmnd[tau + 1] < self.cmnd[tau] {
            tau += 1;
        }
        Some(tau)
    }

    fn refine(&self, tau: usize, min_lag: usize, ceiling: usize) -> f64 {
        if tau <= min_lag || tau >= ceiling {
            return tau as f64;
        }

        let prev = self.cmnd[tau - 1];
        let curr = self.cmnd[tau];
        let next = self.cmnd[tau + 1];
        let denom = 2.0 * curr - next - prev;
        if denom == 0.0 {
            return tau as f64;
        }

        tau as f64 + (next - prev) / (2.0 * denom)
    }
}

/// One-shot estimate without keeping a detector around
pub fn estimate_pitch(frame: &[f32], config: &YinConfig) -> Result<PitchEstimate, ConfigError> {
    let mut detector = YinDetector::new(*config)?;
    Ok(detector.estimate(frame))
}
