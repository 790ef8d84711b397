//! Pull-based frame sources feeding the streaming tracker.
//!
//! The tracker never talks to a capture device directly. Each tick it asks
//! a [`FrameSource`] for the newest frame; capture backends push samples
//! into a [`RingFrameSource`], and recorded buffers are replayed through a
//! [`PlaybackFrameSource`].

use rtrb::{Consumer, Producer, RingBuffer};

/// Outcome of a single pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRead {
    /// `frame` was overwritten with the newest samples
    Ready,
    /// Not enough new samples yet; try again next tick
    Pending,
    /// The source is exhausted and will never produce another frame
    Finished,
}

/// Capability to pull the newest analysis frame.
pub trait FrameSource: Send {
    /// Rate of the samples this source produces, in Hz
    fn sample_rate(&self) -> u32;

    /// Fill `frame` with the most recent `frame.len()` samples.
    fn pull_frame(&mut self, frame: &mut [f32]) -> FrameRead;
}

/// Frame source fed by a lock-free SPSC ring buffer.
///
/// The capture callback owns the [`Producer`] half and pushes samples as
/// they arrive. Pulls drain everything queued and keep only the newest
/// `frame_size` samples, so a slow consumer skips ahead instead of falling
/// behind.
pub struct RingFrameSource {
    consumer: Consumer<f32>,
    sample_rate: u32,
    window: Vec<f32>,
    filled: usize,
    fresh: bool,
}

impl RingFrameSource {
    /// Create a source and the producer half for the capture side.
    ///
    /// `capacity` bounds how many samples may queue between two pulls.
    pub fn new(sample_rate: u32, frame_size: usize, capacity: usize) -> (Producer<f32>, Self) {
        let (producer, consumer) = RingBuffer::new(capacity.max(1));
        let source = Self {
            consumer,
            sample_rate,
            window: vec![0.0; frame_size],
            filled: 0,
            fresh: false,
        };
        (producer, source)
    }

    fn drain(&mut self) -> usize {
        let available = self.consumer.slots();
        if available == 0 {
            return 0;
        }

        let chunk = match self.consumer.read_chunk(available) {
            Ok(chunk) => chunk,
            Err(_) => return 0,
        };
        let (first, second) = chunk.as_slices();
        for slice in [first, second] {
            push_newest(&mut self.window, &mut self.filled, slice);
        }
        chunk.commit_all();
        available
    }

    /// Widen the window for a larger frame, keeping buffered samples at the tail
    fn grow_window(&mut self, size: usize) {
        let mut window = vec![0.0; size];
        window[size - self.window.len()..].copy_from_slice(&self.window);
        self.window = window;
    }
}

/// Shift `samples` into the tail of `window`, discarding the oldest values
fn push_newest(window: &mut [f32], filled: &mut usize, samples: &[f32]) {
    let size = window.len();
    if samples.len() >= size {
        window.copy_from_slice(&samples[samples.len() - size..]);
        *filled = size;
        return;
    }

    window.copy_within(samples.len().., 0);
    window[size - samples.len()..].copy_from_slice(samples);
    *filled = (*filled + samples.len()).min(size);
}

impl FrameSource for RingFrameSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn pull_frame(&mut self, frame: &mut [f32]) -> FrameRead {
        if self.window.len() < frame.len() {
            self.grow_window(frame.len());
        }
        if self.drain() > 0 {
            self.fresh = true;
        }

        if self.filled < frame.len() || !self.fresh {
            if self.consumer.is_abandoned() && self.consumer.slots() == 0 {
                return FrameRead::Finished;
            }
            return FrameRead::Pending;
        }

        frame.copy_from_slice(&self.window[self.window.len() - frame.len()..]);
        self.fresh = false;
        FrameRead::Ready
    }
}

/// Replays a recorded buffer as if it were arriving live.
///
/// Every pull advances the play head by a fixed number of samples and
/// returns the frame ending at the play head.
pub struct PlaybackFrameSource {
    samples: Vec<f32>,
    sample_rate: u32,
    advance: usize,
    position: usize,
}

impl PlaybackFrameSource {
    pub fn new(samples: Vec<f32>, sample_rate: u32, advance: usize) -> Self {
        Self {
            samples,
            sample_rate,
            advance: advance.max(1),
            position: 0,
        }
    }

    /// Advance by one tick's worth of audio per pull.
    pub fn realtime(samples: Vec<f32>, sample_rate: u32, tick_interval_ms: u64) -> Self {
        let advance = (sample_rate as u64 * tick_interval_ms / 1000) as usize;
        Self::new(samples, sample_rate, advance)
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl FrameSource for PlaybackFrameSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn pull_frame(&mut self, frame: &mut [f32]) -> FrameRead {
        if self.position >= self.samples.len() {
            return FrameRead::Finished;
        }

        self.position = (self.position + self.advance).min(self.samples.len());
        if self.position < frame.len() {
            return FrameRead::Pending;
        }

        frame.copy_from_slice(&self.samples[self.position - frame.len()..self.position]);
        FrameRead::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_source_pending_until_filled() {
        let (mut producer, mut source) = RingFrameSource::new(44_100, 4, 64);
        let mut frame = [0.0; 4];

        assert_eq!(source.pull_frame(&mut frame), FrameRead::Pending);
        for v in [1.0, 2.0] {
            producer.push(v).unwrap();
        }
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Pending);

        for v in [3.0, 4.0, 5.0] {
            producer.push(v).unwrap();
        }
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Ready);
        assert_eq!(frame, [2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_ring_source_waits_for_new_samples() {
        let (mut producer, mut source) = RingFrameSource::new(44_100, 2, 16);
        let mut frame = [0.0; 2];
        producer.push(1.0).unwrap();
        producer.push(2.0).unwrap();

        assert_eq!(source.pull_frame(&mut frame), FrameRead::Ready);
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Pending);

        producer.push(3.0).unwrap();
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Ready);
        assert_eq!(frame, [2.0, 3.0]);
    }

    #[test]
    fn test_ring_source_keeps_newest_on_overflow() {
        let (mut producer, mut source) = RingFrameSource::new(44_100, 3, 16);
        for i in 0..10 {
            producer.push(i as f32).unwrap();
        }
        let mut frame = [0.0; 3];
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Ready);
        assert_eq!(frame, [7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_ring_source_grows_for_larger_frames() {
        let (mut producer, mut source) = RingFrameSource::new(44_100, 2, 16);
        for v in [1.0, 2.0, 3.0] {
            producer.push(v).unwrap();
        }

        // Only three real samples exist, so a four-sample frame must wait
        let mut frame = [0.0; 4];
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Pending);

        producer.push(4.0).unwrap();
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Ready);
        assert_eq!(frame, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_ring_source_finishes_when_producer_dropped() {
        let (producer, mut source) = RingFrameSource::new(44_100, 4, 16);
        drop(producer);
        let mut frame = [0.0; 4];
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Finished);
    }

    #[test]
    fn test_playback_source_sequence() {
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let mut source = PlaybackFrameSource::new(samples, 8_000, 3);
        let mut frame = [0.0; 4];

        assert_eq!(source.pull_frame(&mut frame), FrameRead::Pending);
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Ready);
        assert_eq!(frame, [2.0, 3.0, 4.0, 5.0]);
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Ready);
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Ready);
        assert_eq!(frame, [6.0, 7.0, 8.0, 9.0]);
        assert_eq!(source.pull_frame(&mut frame), FrameRead::Finished);
    }

    #[test]
    fn test_playback_realtime_advance() {
        let source = PlaybackFrameSource::realtime(vec![0.0; 100], 44_100, 16);
        assert_eq!(source.advance, 705);
    }
}
