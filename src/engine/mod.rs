//! Streaming pitch tracking.
//!
//! `PitchTracker` drives a `TrackerSession` from a tokio interval, pulling
//! frames from an injected `FrameSource` and timestamping against an
//! injected `TimeSource`. Smoothed points are delivered through a bounded
//! `PitchStream`; lifecycle events go out on a broadcast telemetry channel.

use serde::{Deserialize, Serialize};

pub mod history;
pub mod session;
pub mod source;
pub mod telemetry;
pub mod time;
mod tracker;

pub use history::PitchHistory;
pub use session::{TickOutcome, TrackerSession};
pub use source::{FrameRead, FrameSource, PlaybackFrameSource, RingFrameSource};
pub use telemetry::{TelemetryEvent, TelemetryEventKind};
pub use time::{StubTimeSource, SystemTimeSource, TimeSource};
pub use tracker::{PitchStream, PitchTracker};

/// One timestamped output of the streaming tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchPoint {
    /// Seconds since the run's reference instant (start offset included)
    pub t_sec: f64,
    /// EMA-smoothed frequency, `None` when the frame was unvoiced
    pub frequency_hz: Option<f32>,
    /// Raw voicing probability of the frame
    pub probability: f32,
}
