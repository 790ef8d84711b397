//! Offline note segmentation
//!
//! Collapses a recorded buffer into discrete, quantized note events:
//! windowed YIN pitch track → median filter → semitone quantization →
//! run-length merge → minimum-duration gate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::median::median_filter;
use super::pitch::hz_to_midi;
use super::yin::{PitchEstimate, YinDetector};
use crate::config::{SegmenterConfig, YinConfig};
use crate::error::{log_config_error, ConfigError};

/// A committed note event
///
/// Times are in seconds from the start of the analysed buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub start: f64,
    pub duration: f64,
    pub midi: i32,
}

impl Note {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Batch segmenter over a whole sample buffer
#[derive(Debug, Clone)]
pub struct OfflineSegmenter {
    config: SegmenterConfig,
    yin: YinConfig,
}

impl OfflineSegmenter {
    pub fn new(config: SegmenterConfig, yin: YinConfig) -> Result<Self, ConfigError> {
        config
            .validate()
            .and_then(|()| yin.validate())
            .map_err(|err| {
                log_config_error(&err, "OfflineSegmenter::new");
                err
            })?;
        Ok(Self { config, yin })
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Seconds between the starts of consecutive analysis windows
    pub fn frame_step_secs(&self, sample_rate: u32) -> f64 {
        self.config.hop_size as f64 / sample_rate as f64
    }

    /// Per-hop pitch estimates; windows that would run past the end are skipped
    ///
    /// `sample_rate` is the buffer's own rate and takes precedence over the
    /// rate in the detector configuration.
    pub fn pitch_track(
        &self,
        samples: &[f32],
        sample_rate: u32,
    ) -> Result<Vec<PitchEstimate>, ConfigError> {
        let mut detector = YinDetector::new(self.yin.with_sample_rate(sample_rate))?;
        let window = self.config.window_size;
        let hop = self.config.hop_size;

        let mut track = Vec::with_capacity(samples.len().saturating_sub(window) / hop + 1);
        let mut start = 0;
        while start + window <= samples.len() {
            track.push(detector.estimate(&samples[start..start + window]));
            start += hop;
        }
        Ok(track)
    }

    /// Denoise, quantize and merge a raw frequency track (`NaN` = unvoiced)
    pub fn notes_from_track(&self, track_hz: &[f32], sample_rate: u32) -> Vec<Note> {
        let filtered = median_filter(track_hz, self.config.median_width);
        let quantized = quantize_track(&filtered);
        merge_runs(
            &quantized,
            self.frame_step_secs(sample_rate),
            self.config.min_note_duration_secs,
        )
    }

    /// Full pipeline from samples to committed notes
    pub fn segment(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<Note>, ConfigError> {
        let track = self.pitch_track(samples, sample_rate)?;
        let track_hz: Vec<f32> = track
            .iter()
            .map(|estimate| estimate.frequency_hz.unwrap_or(f32::NAN))
            .collect();

        let notes = self.notes_from_track(&track_hz, sample_rate);

        tracing::debug!(
            frames = track.len(),
            voiced = track.iter().filter(|e| e.is_voiced()).count(),
            notes = notes.len(),
            sample_rate,
            "segmented buffer"
        );

        Ok(notes)
    }
}

/// Round each present frequency to the nearest MIDI number
pub fn quantize_track(track_hz: &[f32]) -> Vec<Option<i32>> {
    track_hz
        .iter()
        .map(|&hz| hz_to_midi(hz).map(|midi| midi.round() as i32))
        .collect()
}

/// Merge runs of equal quantized pitch into notes
///
/// Frame `i` starts at `i * frame_step_secs`. A run closes at the first
/// absent or differing frame, or at the end of the sequence. Runs shorter
/// than `min_duration_secs` are discarded.
pub fn merge_runs(
    pitches: &[Option<i32>],
    frame_step_secs: f64,
    min_duration_secs: f64,
) -> Vec<Note> {
    let mut notes = Vec::new();
    let mut open: Option<(usize, i32)> = None;

    let mut close = |open: &mut Option<(usize, i32)>, end_frame: usize| {
        if let Some((start_frame, midi)) = open.take() {
            let start = start_frame as f64 * frame_step_secs;
            let duration = end_frame as f64 * frame_step_secs - start;
            if duration >= min_duration_secs {
                notes.push(Note {
                    id: Uuid::new_v4(),
                    start,
                    duration,
                    midi,
                });
            }
        }
    };

    for (index, pitch) in pitches.iter().enumerate() {
        match (*pitch, open) {
            (None, _) => close(&mut open, index),
            (Some(midi), Some((_, current))) if midi == current => {}
            (Some(midi), _) => {
                close(&mut open, index);
                open = Some((index, midi));
            }
        }
    }
    close(&mut open, pitches.len());

    notes
}

/// Segment `samples` with the default window/hop/median/duration settings
pub fn segment_notes(
    samples: &[f32],
    sample_rate: u32,
    yin: &YinConfig,
) -> Result<Vec<Note>, ConfigError> {
    OfflineSegmenter::new(SegmenterConfig::default(), *yin)?.segment(samples, sample_rate)
}
