// Melody Tracker Core - monophonic pitch tracking
// YIN pitch estimation, streaming tracker and offline note segmentation

// Module declarations
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;

// Re-exports for convenience
pub use analysis::{
    estimate_pitch, hz_to_midi, median_filter, midi_to_hz, midi_to_note_name, midi_to_solfege,
    segment_notes, Note, OfflineSegmenter, PitchEstimate, YinDetector,
};
pub use config::{AppConfig, SegmenterConfig, TrackerConfig, YinConfig};
pub use engine::{PitchPoint, PitchStream, PitchTracker};
