//! Tracker lifecycle telemetry.
//!
//! Events are fanned out over a tokio broadcast channel. Publishing never
//! blocks and never fails: with no subscribers the event is discarded.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::time::TimeSource;

/// Telemetry event emitted by the pitch tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Reading of the tracker's clock when the event was published
    pub timestamp_secs: f64,
    pub kind: TelemetryEventKind,
    pub detail: Option<String>,
}

/// Types of telemetry events supported by the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEventKind {
    TrackerStarted { start_offset_secs: f64 },
    TrackerStopped,
    SourceFinished,
    PointsDropped { total: u64 },
    Warning,
}

pub(crate) fn publish_event(
    tx: &broadcast::Sender<TelemetryEvent>,
    time_source: &dyn TimeSource,
    kind: TelemetryEventKind,
    detail: Option<String>,
) {
    let _ = tx.send(TelemetryEvent {
        timestamp_secs: time_source.now_secs(),
        kind,
        detail,
    });
}
