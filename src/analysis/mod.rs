// Analysis module - pitch estimation and note segmentation
//
// Pure, synchronous building blocks shared by the streaming tracker and the
// offline segmenter.
//
// Architecture:
// - yin: single-frame F0 estimator (YinDetector)
// - median: NaN-aware sliding median for pitch tracks
// - pitch: Hz <-> MIDI <-> note name conversion
// - segmenter: YinDetector → median → quantize → run merge → Note list

pub mod median;
pub mod pitch;
pub mod segmenter;
pub mod yin;

pub use median::median_filter;
pub use pitch::{
    cents_offset, hz_to_midi, midi_to_hz, midi_to_note_name, midi_to_solfege, NOTE_NAMES,
    SOLFEGE_NAMES,
};
pub use segmenter::{merge_runs, quantize_track, segment_notes, Note, OfflineSegmenter};
pub use yin::{estimate_pitch, LagRange, PitchEstimate, YinDetector};
