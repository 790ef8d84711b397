//! PitchTracker orchestrates streaming runs.
//!
//! Lifecycle is Idle → Running → Idle. Each run owns a fresh
//! [`TrackerSession`] inside a single tokio task; the frame source is shared
//! across runs behind a mutex that is only held inside the synchronous tick
//! body. A run generation counter guarantees that a stopped run cannot
//! emit, even if one of its ticks was already executing.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::BroadcastStream;

use super::session::{TickOutcome, TrackerSession};
use super::source::FrameSource;
use super::telemetry::{publish_event, TelemetryEvent, TelemetryEventKind};
use super::time::TimeSource;
use super::PitchPoint;
use crate::config::{TrackerConfig, YinConfig};
use crate::error::{log_config_error, log_tracker_error, TrackerError};

const TELEMETRY_CAPACITY: usize = 64;

type SharedSource = Arc<Mutex<Box<dyn FrameSource>>>;

/// Receiving half of a tracking run.
///
/// Yields points in emission order and ends when the run stops, the source
/// finishes, or the tracker is dropped.
#[derive(Debug)]
pub struct PitchStream {
    rx: mpsc::Receiver<PitchPoint>,
}

impl PitchStream {
    pub async fn recv(&mut self) -> Option<PitchPoint> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<PitchPoint> {
        self.rx.try_recv().ok()
    }
}

impl Stream for PitchStream {
    type Item = PitchPoint;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// State shared between the tracker handle and its tick task.
struct RunContext {
    generation: Arc<AtomicU64>,
    run_generation: u64,
    source: SharedSource,
    time_source: Arc<dyn TimeSource>,
    telemetry_tx: broadcast::Sender<TelemetryEvent>,
    dropped: Arc<AtomicU64>,
}

impl RunContext {
    fn is_current(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.run_generation
    }

    fn publish(&self, kind: TelemetryEventKind, detail: Option<String>) {
        publish_event(&self.telemetry_tx, self.time_source.as_ref(), kind, detail);
    }

    fn tick(&self, session: &mut TrackerSession) -> Result<TickOutcome, TrackerError> {
        let mut guard = self.source.lock().map_err(|_| TrackerError::LockPoisoned {
            component: "FrameSource".to_string(),
        })?;
        Ok(session.tick(&mut **guard, self.time_source.as_ref()))
    }

    fn emit(&self, tx: &mpsc::Sender<PitchPoint>, point: PitchPoint) -> bool {
        match tx.try_send(point) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let total = self.dropped.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::warn!(total, "pitch stream full, dropping point");
                self.publish(
                    TelemetryEventKind::PointsDropped { total },
                    Some("pitch stream consumer is lagging".to_string()),
                );
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("pitch stream receiver dropped, ending run");
                false
            }
        }
    }
}

async fn run_ticks(
    ctx: RunContext,
    mut session: TrackerSession,
    tx: mpsc::Sender<PitchPoint>,
    tick_interval: Duration,
) {
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        if !ctx.is_current() {
            break;
        }

        let outcome = match ctx.tick(&mut session) {
            Ok(outcome) => outcome,
            Err(err) => {
                log_tracker_error(&err, "run_ticks");
                tracing::warn!(error = %err, "tick aborted");
                ctx.publish(TelemetryEventKind::Warning, Some(err.to_string()));
                break;
            }
        };

        match outcome {
            TickOutcome::Point(point) => {
                if !ctx.is_current() || !ctx.emit(&tx, point) {
                    break;
                }
            }
            TickOutcome::Pending => {}
            TickOutcome::Finished => {
                tracing::info!(generation = ctx.run_generation, "frame source finished");
                ctx.publish(TelemetryEventKind::SourceFinished, None);
                break;
            }
        }
    }
}

/// Streaming pitch tracker.
///
/// Owns its frame source, clock and telemetry sender. Dropping the tracker
/// stops any active run.
pub struct PitchTracker {
    yin: YinConfig,
    config: TrackerConfig,
    source: SharedSource,
    sample_rate: u32,
    time_source: Arc<dyn TimeSource>,
    telemetry_tx: broadcast::Sender<TelemetryEvent>,
    generation: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PitchTracker {
    /// Create an idle tracker.
    ///
    /// The source's sample rate replaces `yin.sample_rate`; the resulting
    /// detector configuration is validated here.
    pub fn new<S>(
        yin: YinConfig,
        config: TrackerConfig,
        source: S,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<Self, TrackerError>
    where
        S: FrameSource + 'static,
    {
        let sample_rate = source.sample_rate();
        let yin = yin.with_sample_rate(sample_rate);
        yin.validate()
            .and_then(|()| config.validate())
            .map_err(|err| {
                log_config_error(&err, "PitchTracker::new");
                err
            })?;

        let (telemetry_tx, _) = broadcast::channel(TELEMETRY_CAPACITY);
        let source: Box<dyn FrameSource> = Box::new(source);

        Ok(Self {
            yin,
            config,
            source: Arc::new(Mutex::new(source)),
            sample_rate,
            time_source,
            telemetry_tx,
            generation: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Begin a run whose first point is stamped `start_offset_secs` in.
    ///
    /// Any active run is stopped first. Must be called from within a tokio
    /// runtime.
    pub fn start(&self, start_offset_secs: f64) -> Result<PitchStream, TrackerError> {
        if !(start_offset_secs.is_finite() && start_offset_secs >= 0.0) {
            return Err(TrackerError::InvalidStartOffset {
                offset_secs: start_offset_secs,
            });
        }
        let handle = Handle::try_current().map_err(|_| TrackerError::RuntimeUnavailable)?;

        let mut task = self.task.lock().map_err(|_| TrackerError::LockPoisoned {
            component: "PitchTracker task".to_string(),
        })?;
        self.stop_locked(&mut task);

        let reference_secs = self.time_source.now_secs() - start_offset_secs;
        let session = TrackerSession::new(self.yin, &self.config, reference_secs)?;
        let run_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let ctx = RunContext {
            generation: Arc::clone(&self.generation),
            run_generation,
            source: Arc::clone(&self.source),
            time_source: Arc::clone(&self.time_source),
            telemetry_tx: self.telemetry_tx.clone(),
            dropped: Arc::clone(&self.dropped),
        };
        let tick_interval = Duration::from_millis(self.config.tick_interval_ms);
        *task = Some(handle.spawn(run_ticks(ctx, session, tx, tick_interval)));

        tracing::info!(
            generation = run_generation,
            start_offset_secs,
            sample_rate = self.sample_rate,
            "pitch tracker started"
        );
        self.publish(
            TelemetryEventKind::TrackerStarted { start_offset_secs },
            None,
        );

        Ok(PitchStream { rx })
    }

    /// End the active run, if any. Safe to call repeatedly.
    pub fn stop(&self) {
        match self.task.lock() {
            Ok(mut task) => self.stop_locked(&mut task),
            Err(poisoned) => {
                tracing::warn!("tracker task lock poisoned during stop");
                self.stop_locked(&mut poisoned.into_inner());
            }
        }
    }

    fn stop_locked(&self, task: &mut Option<JoinHandle<()>>) {
        // Invalidate the run before aborting so an in-flight tick cannot emit
        self.generation.fetch_add(1, Ordering::SeqCst);

        if let Some(handle) = task.take() {
            let was_running = !handle.is_finished();
            handle.abort();
            if was_running {
                tracing::info!("pitch tracker stopped");
                self.publish(TelemetryEventKind::TrackerStopped, None);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        match self.task.lock() {
            Ok(task) => task.as_ref().is_some_and(|handle| !handle.is_finished()),
            Err(_) => false,
        }
    }

    /// Points dropped because the consumer fell behind, across all runs
    pub fn dropped_points(&self) -> u64 {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn subscribe_telemetry(&self) -> broadcast::Receiver<TelemetryEvent> {
        self.telemetry_tx.subscribe()
    }

    /// Telemetry as a `Stream`; lagged receivers see `Err` items.
    pub fn telemetry_stream(&self) -> BroadcastStream<TelemetryEvent> {
        BroadcastStream::new(self.telemetry_tx.subscribe())
    }

    fn publish(&self, kind: TelemetryEventKind, detail: Option<String>) {
        publish_event(&self.telemetry_tx, self.time_source.as_ref(), kind, detail);
    }
}

impl Drop for PitchTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests;
