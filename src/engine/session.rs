//! Owned per-run state of the streaming tracker.

use super::source::{FrameRead, FrameSource};
use super::time::TimeSource;
use super::PitchPoint;
use crate::analysis::yin::{PitchEstimate, YinDetector};
use crate::config::{TrackerConfig, YinConfig};
use crate::error::ConfigError;

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Point(PitchPoint),
    Pending,
    Finished,
}

/// Everything a single tracking run mutates.
///
/// A session is created by [`crate::engine::PitchTracker::start`] and moved
/// into the tick task, so no lock guards it. Callers with their own refresh
/// signal may also build one and call [`TrackerSession::tick`] directly.
pub struct TrackerSession {
    detector: YinDetector,
    alpha: f32,
    smoothed_hz: Option<f32>,
    reference_secs: f64,
    frame: Vec<f32>,
}

impl TrackerSession {
    /// `reference_secs` is the clock reading that maps to `t_sec == 0`.
    pub fn new(
        yin: YinConfig,
        config: &TrackerConfig,
        reference_secs: f64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            detector: YinDetector::new(yin)?,
            alpha: config.smoothing_alpha,
            smoothed_hz: None,
            reference_secs,
            frame: vec![0.0; config.frame_size],
        })
    }

    pub fn reference_secs(&self) -> f64 {
        self.reference_secs
    }

    pub fn smoothed_hz(&self) -> Option<f32> {
        self.smoothed_hz
    }

    /// Pull the newest frame, estimate, smooth and timestamp it.
    pub fn tick(&mut self, source: &mut dyn FrameSource, clock: &dyn TimeSource) -> TickOutcome {
        match source.pull_frame(&mut self.frame) {
            FrameRead::Ready => {}
            FrameRead::Pending => return TickOutcome::Pending,
            FrameRead::Finished => return TickOutcome::Finished,
        }

        let estimate = self.detector.estimate(&self.frame);
        let frequency_hz = self.smooth(&estimate);
        let t_sec = (clock.now_secs() - self.reference_secs).max(0.0);

        TickOutcome::Point(PitchPoint {
            t_sec,
            frequency_hz,
            probability: estimate.probability,
        })
    }

    /// EMA over voiced frequencies; unvoiced frames leave the state untouched.
    fn smooth(&mut self, estimate: &PitchEstimate) -> Option<f32> {
        let hz = estimate.frequency_hz?;
        let next = match self.smoothed_hz {
            Some(prev) => prev + self.alpha * (hz - prev),
            None => hz,
        };
        self.smoothed_hz = Some(next);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::source::PlaybackFrameSource;
    use crate::engine::time::StubTimeSource;
    use std::f32::consts::PI;

    const SR: u32 = 44_100;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    fn small_config() -> TrackerConfig {
        TrackerConfig {
            frame_size: 2048,
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn test_tick_sequence_on_playback() {
        let mut source = PlaybackFrameSource::new(sine(440.0, 4096), SR, 2048);
        let clock = StubTimeSource::new();
        let mut session = TrackerSession::new(YinConfig::default(), &small_config(), 0.0).unwrap();

        match session.tick(&mut source, &clock) {
            TickOutcome::Point(point) => {
                let hz = point.frequency_hz.unwrap();
                assert!((hz - 440.0).abs() < 4.4);
                assert!(point.probability > 0.85);
            }
            other => panic!("expected point, got {:?}", other),
        }
        assert!(matches!(session.tick(&mut source, &clock), TickOutcome::Point(_)));
        assert_eq!(session.tick(&mut source, &clock), TickOutcome::Finished);
    }

    #[test]
    fn test_pending_until_frame_available() {
        let mut source = PlaybackFrameSource::new(sine(440.0, 4096), SR, 1024);
        let clock = StubTimeSource::new();
        let mut session = TrackerSession::new(YinConfig::default(), &small_config(), 0.0).unwrap();

        assert_eq!(session.tick(&mut source, &clock), TickOutcome::Pending);
        assert!(matches!(session.tick(&mut source, &clock), TickOutcome::Point(_)));
    }

    #[test]
    fn test_ema_persists_across_unvoiced_gap() {
        let mut samples = sine(200.0, 2048);
        samples.extend(vec![0.0; 2048]);
        samples.extend(sine(400.0, 2048));
        let mut source = PlaybackFrameSource::new(samples, SR, 2048);
        let clock = StubTimeSource::new();
        let mut session = TrackerSession::new(YinConfig::default(), &small_config(), 0.0).unwrap();

        let first = match session.tick(&mut source, &clock) {
            TickOutcome::Point(p) => p.frequency_hz.unwrap(),
            other => panic!("expected point, got {:?}", other),
        };
        assert!((first - 200.0).abs() < 2.0);

        match session.tick(&mut source, &clock) {
            TickOutcome::Point(p) => assert!(p.frequency_hz.is_none()),
            other => panic!("expected point, got {:?}", other),
        }
        assert_eq!(session.smoothed_hz(), Some(first));

        // 0.25 of the way from ~200 Hz towards ~400 Hz
        let third = match session.tick(&mut source, &clock) {
            TickOutcome::Point(p) => p.frequency_hz.unwrap(),
            other => panic!("expected point, got {:?}", other),
        };
        assert!((third - 250.0).abs() < 3.0, "smoothed to {}", third);
    }

    #[test]
    fn test_gated_point_keeps_probability() {
        let yin = YinConfig {
            probability_threshold: 1.0,
            ..YinConfig::default()
        };
        let mut source = PlaybackFrameSource::new(sine(440.0, 2048), SR, 2048);
        let clock = StubTimeSource::new();
        let mut session = TrackerSession::new(yin, &small_config(), 0.0).unwrap();

        match session.tick(&mut source, &clock) {
            TickOutcome::Point(point) => {
                assert!(point.frequency_hz.is_none());
                assert!(point.probability > 0.85, "probability {}", point.probability);
                assert!(point.probability < 1.0);
            }
            other => panic!("expected point, got {:?}", other),
        }
        assert_eq!(session.smoothed_hz(), None);
    }

    #[test]
    fn test_timestamps_relative_to_reference() {
        let mut source = PlaybackFrameSource::new(sine(440.0, 8192), SR, 2048);
        let clock = StubTimeSource::new();
        clock.set(10.0);
        let mut session = TrackerSession::new(YinConfig::default(), &small_config(), 8.0).unwrap();

        let mut last = -1.0;
        while let TickOutcome::Point(point) = session.tick(&mut source, &clock) {
            assert!(point.t_sec >= 2.0);
            assert!(point.t_sec > last);
            last = point.t_sec;
        }
    }

    #[test]
    fn test_rejects_invalid_smoothing() {
        let config = TrackerConfig {
            smoothing_alpha: 1.5,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            TrackerSession::new(YinConfig::default(), &config, 0.0),
            Err(ConfigError::InvalidSmoothing { .. })
        ));
    }
}
