use super::*;
use crate::engine::source::{FrameRead, PlaybackFrameSource};
use crate::engine::time::{StubTimeSource, SystemTimeSource};
use crate::error::{ErrorCode, TrackerErrorCodes};
use std::f32::consts::PI;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast::error::TryRecvError;

const SR: u32 = 44_100;

/// Endless sine source that counts how often it is pulled
struct SineSource {
    freq: f32,
    position: usize,
    pulls: Arc<AtomicUsize>,
}

impl SineSource {
    fn new(freq: f32) -> (Self, Arc<AtomicUsize>) {
        let pulls = Arc::new(AtomicUsize::new(0));
        let source = Self {
            freq,
            position: 0,
            pulls: Arc::clone(&pulls),
        };
        (source, pulls)
    }
}

impl FrameSource for SineSource {
    fn sample_rate(&self) -> u32 {
        SR
    }

    fn pull_frame(&mut self, frame: &mut [f32]) -> FrameRead {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        for (i, sample) in frame.iter_mut().enumerate() {
            let n = (self.position + i) as f32;
            *sample = 0.5 * (2.0 * PI * self.freq * n / SR as f32).sin();
        }
        self.position += 441;
        FrameRead::Ready
    }
}

fn fast_config() -> TrackerConfig {
    TrackerConfig {
        frame_size: 1024,
        tick_interval_ms: 10,
        ..TrackerConfig::default()
    }
}

fn sine_tracker(config: TrackerConfig) -> (PitchTracker, Arc<AtomicUsize>) {
    let (source, pulls) = SineSource::new(440.0);
    let tracker = PitchTracker::new(
        YinConfig::default(),
        config,
        source,
        Arc::new(SystemTimeSource::new()),
    )
    .unwrap();
    (tracker, pulls)
}

async fn drain_until_closed(stream: &mut PitchStream) -> usize {
    let mut count = 0;
    let result = tokio::time::timeout(Duration::from_secs(2), async {
        while stream.recv().await.is_some() {
            count += 1;
        }
    })
    .await;
    assert!(result.is_ok(), "stream did not close");
    count
}

#[test]
fn test_start_requires_runtime() {
    let (tracker, _) = sine_tracker(fast_config());
    let err = tracker.start(0.0).unwrap_err();
    assert_eq!(err, TrackerError::RuntimeUnavailable);
    assert_eq!(err.code(), TrackerErrorCodes::RUNTIME_UNAVAILABLE);
    assert!(!tracker.is_running());
}

#[tokio::test]
async fn test_rejects_invalid_start_offset() {
    let (tracker, _) = sine_tracker(fast_config());
    for offset in [-0.5, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            tracker.start(offset),
            Err(TrackerError::InvalidStartOffset { .. })
        ));
    }
    assert!(!tracker.is_running());
}

#[test]
fn test_new_validates_configuration() {
    let (source, _) = SineSource::new(440.0);
    let config = TrackerConfig {
        channel_capacity: 0,
        ..fast_config()
    };
    let result = PitchTracker::new(
        YinConfig::default(),
        config,
        source,
        Arc::new(SystemTimeSource::new()),
    );
    assert!(matches!(result, Err(TrackerError::Config { .. })));
}

#[tokio::test]
async fn test_emits_smoothed_voiced_points() {
    let (tracker, _) = sine_tracker(fast_config());
    let mut stream = tracker.start(0.0).unwrap();
    assert!(tracker.is_running());

    let mut last_t = -1.0;
    for _ in 0..5 {
        let point = tokio::time::timeout(Duration::from_secs(2), stream.recv())
            .await
            .expect("tick timed out")
            .expect("stream closed early");
        let hz = point.frequency_hz.expect("sine should be voiced");
        assert!((hz - 440.0).abs() < 4.4, "got {} Hz", hz);
        assert!(point.t_sec >= last_t);
        last_t = point.t_sec;
    }

    tracker.stop();
    assert!(!tracker.is_running());
}

#[tokio::test]
async fn test_start_offset_shifts_timestamps() {
    let (source, _) = SineSource::new(440.0);
    let tracker = PitchTracker::new(
        YinConfig::default(),
        fast_config(),
        source,
        Arc::new(StubTimeSource::new()),
    )
    .unwrap();

    let mut stream = tracker.start(5.0).unwrap();
    let point = tokio::time::timeout(Duration::from_secs(2), stream.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(point.t_sec >= 5.0 && point.t_sec < 6.0, "t = {}", point.t_sec);
}

#[tokio::test]
async fn test_stop_is_idempotent_and_closes_stream() {
    let (tracker, _) = sine_tracker(fast_config());
    tracker.stop();

    let mut stream = tracker.start(0.0).unwrap();
    tracker.stop();
    tracker.stop();

    drain_until_closed(&mut stream).await;
    assert!(!tracker.is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_ticks_after_stop() {
    let (tracker, pulls) = sine_tracker(fast_config());
    let _stream = tracker.start(0.0).unwrap();
    tokio::time::sleep(Duration::from_millis(80)).await;
    tracker.stop();

    // Allow a tick that was already executing to finish
    tokio::time::sleep(Duration::from_millis(30)).await;
    let settled = pulls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(pulls.load(Ordering::SeqCst), settled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restart_never_overlaps_runs() {
    let (tracker, pulls) = sine_tracker(fast_config());

    let mut first = tracker.start(0.0).unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    tracker.stop();
    let mut second = tracker.start(0.0).unwrap();

    // Restarting without stop() must also retire the previous run
    let mut third = tracker.start(0.0).unwrap();
    drain_until_closed(&mut first).await;
    drain_until_closed(&mut second).await;

    tokio::time::sleep(Duration::from_millis(30)).await;
    let before = pulls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let during = pulls.load(Ordering::SeqCst) - before;

    // One run at 10ms yields at most ~21 ticks in 200ms; two would double it
    assert!(during <= 30, "{} pulls in 200ms suggests overlapping runs", during);
    assert!(third.try_recv().is_some() || third.recv().await.is_some());

    tracker.stop();
}

#[tokio::test]
async fn test_full_channel_drops_points() {
    let config = TrackerConfig {
        channel_capacity: 1,
        tick_interval_ms: 2,
        ..fast_config()
    };
    let (tracker, _) = sine_tracker(config);
    let mut telemetry = tracker.subscribe_telemetry();

    let _stream = tracker.start(0.0).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    tracker.stop();

    assert!(tracker.dropped_points() > 0);

    let mut saw_drop = false;
    loop {
        match telemetry.try_recv() {
            Ok(event) => {
                if matches!(event.kind, TelemetryEventKind::PointsDropped { .. }) {
                    saw_drop = true;
                }
            }
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    assert!(saw_drop);
}

#[tokio::test]
async fn test_finished_source_ends_run() {
    let samples: Vec<f32> = (0..4096)
        .map(|i| 0.5 * (2.0 * PI * 330.0 * i as f32 / SR as f32).sin())
        .collect();
    let source = PlaybackFrameSource::new(samples, SR, 1024);
    let tracker = PitchTracker::new(
        YinConfig::default(),
        fast_config(),
        source,
        Arc::new(StubTimeSource::new()),
    )
    .unwrap();
    let mut telemetry = tracker.subscribe_telemetry();

    let mut stream = tracker.start(0.0).unwrap();
    let count = drain_until_closed(&mut stream).await;
    assert_eq!(count, 4);

    let mut kinds = Vec::new();
    while let Ok(event) = telemetry.try_recv() {
        kinds.push(event.kind);
    }
    assert_eq!(
        kinds,
        vec![
            TelemetryEventKind::TrackerStarted {
                start_offset_secs: 0.0
            },
            TelemetryEventKind::SourceFinished,
        ]
    );
}

#[tokio::test]
async fn test_lifecycle_telemetry() {
    let (tracker, _) = sine_tracker(fast_config());
    let mut telemetry = tracker.subscribe_telemetry();

    let _stream = tracker.start(1.5).unwrap();
    tracker.stop();

    let started = telemetry.recv().await.unwrap();
    assert_eq!(
        started.kind,
        TelemetryEventKind::TrackerStarted {
            start_offset_secs: 1.5
        }
    );
    let stopped = telemetry.recv().await.unwrap();
    assert_eq!(stopped.kind, TelemetryEventKind::TrackerStopped);
}

#[tokio::test]
async fn test_pitch_stream_implements_stream() {
    use futures::StreamExt;

    let (tracker, _) = sine_tracker(fast_config());
    let stream = tracker.start(0.0).unwrap();
    let points: Vec<PitchPoint> =
        tokio::time::timeout(Duration::from_secs(2), stream.take(3).collect())
            .await
            .unwrap();
    assert_eq!(points.len(), 3);
}

#[tokio::test]
async fn test_drop_stops_tracker() {
    let (tracker, _) = sine_tracker(fast_config());
    let mut stream = tracker.start(0.0).unwrap();
    drop(tracker);
    drain_until_closed(&mut stream).await;
}
