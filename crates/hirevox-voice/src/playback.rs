//! Playback scheduling: gapless, non-overlapping rendering of inbound audio.
//!
//! The scheduler owns a monotonically non-decreasing cursor on the output
//! device clock. Each chunk starts at `max(cursor, now)` and advances the
//! cursor by its duration, so chunks never overlap and never start before
//! the previous chunk's declared end, regardless of inter-arrival jitter.
//! An interruption force-stops every active source and resets the cursor to
//! zero, so the next chunk starts at the device's current time.

use crate::error::{VoiceError, VoiceResult};
use rodio::buffer::SamplesBuffer;
use rodio::source::Zero;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A decoded block of playable samples at the playback rate.
#[derive(Debug, Clone)]
pub struct PlaybackChunk {
    /// Mono f32 samples in [-1, 1].
    pub samples: Vec<f32>,
    /// Declared sample rate in Hz.
    pub sample_rate: u32,
}

impl PlaybackChunk {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Seam between the scheduling discipline and the output device, so the
/// cursor logic is testable without audio hardware.
pub trait OutputSink {
    /// Current time on the device clock, in seconds.
    fn now(&self) -> f64;

    /// Render `chunk` starting at `start_at` on the device clock. The caller
    /// guarantees `start_at >= now` and `start_at` at or after the end of
    /// every previously scheduled chunk.
    fn play_at(&mut self, chunk: PlaybackChunk, start_at: f64) -> VoiceResult<()>;

    /// Force-stop everything scheduled, finished or not.
    fn stop_all(&mut self);
}

#[derive(Debug)]
struct ScheduledSource {
    id: u64,
    end_at: f64,
}

/// Tracks the cursor and the set of scheduled, not-yet-finished sources.
pub struct PlaybackScheduler<S> {
    sink: S,
    cursor: f64,
    active: Vec<ScheduledSource>,
    next_id: u64,
}

impl<S: OutputSink> PlaybackScheduler<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            cursor: 0.0,
            active: Vec::new(),
            next_id: 0,
        }
    }

    /// Current device-clock time in seconds.
    pub fn now(&self) -> f64 {
        self.sink.now()
    }

    /// Schedule a chunk back-to-back with whatever is already queued.
    /// Returns the chunk's end time on the device clock.
    pub fn schedule(&mut self, chunk: PlaybackChunk) -> VoiceResult<f64> {
        let start_at = self.cursor.max(self.sink.now());
        let end_at = start_at + chunk.duration_secs();
        self.sink.play_at(chunk, start_at)?;

        self.cursor = end_at;
        self.active.push(ScheduledSource {
            id: self.next_id,
            end_at,
        });
        self.next_id += 1;

        debug!(
            "Scheduled playback chunk: start={:.3}s end={:.3}s active={}",
            start_at,
            end_at,
            self.active.len()
        );
        Ok(end_at)
    }

    /// Remove sources whose declared end has passed. Returns the number of
    /// sources still active.
    pub fn drain_finished(&mut self) -> usize {
        let now = self.sink.now();
        self.active.retain(|s| s.end_at > now);
        self.active.len()
    }

    /// Earliest end time among active sources, if any.
    pub fn next_end(&self) -> Option<f64> {
        self.active
            .iter()
            .map(|s| s.end_at)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Whether no sources are scheduled or playing.
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    /// Barge-in: force-stop every active source, clear the set, and reset
    /// the cursor so the next chunk starts at the device's current time
    /// rather than a stale future point.
    pub fn interrupt(&mut self) {
        if !self.active.is_empty() {
            info!("Playback interrupted: stopping {} active source(s)", self.active.len());
        }
        self.sink.stop_all();
        self.active.clear();
        self.cursor = 0.0;
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> f64 {
        self.cursor
    }
}

/// Production sink on the default output device via rodio.
///
/// The rodio `Sink` renders appended sources sequentially, which matches the
/// cursor discipline: the scheduler only ever hands us starts at or after the
/// end of the previous chunk, and any gap between queue end and the requested
/// start is padded with silence.
pub struct RodioSink {
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
    sink: Sink,
    epoch: Instant,
    queued_end: f64,
}

impl RodioSink {
    /// Open the default output device at the playback rate.
    pub fn new() -> VoiceResult<Self> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| VoiceError::Playback(e.to_string()))?;
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| VoiceError::Playback(e.to_string()))?;
        info!("Output sink ready");
        Ok(Self {
            _stream: stream,
            _stream_handle: stream_handle,
            sink,
            epoch: Instant::now(),
            queued_end: 0.0,
        })
    }
}

impl OutputSink for RodioSink {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn play_at(&mut self, chunk: PlaybackChunk, start_at: f64) -> VoiceResult<()> {
        let queue_head = self.queued_end.max(self.now());
        let gap = start_at - queue_head;
        if gap > 1e-3 {
            let silence = Zero::<f32>::new(1, chunk.sample_rate)
                .take_duration(Duration::from_secs_f64(gap));
            self.sink.append(silence);
        }
        self.queued_end = start_at + chunk.duration_secs();
        self.sink
            .append(SamplesBuffer::new(1, chunk.sample_rate, chunk.samples));
        Ok(())
    }

    fn stop_all(&mut self) {
        // Stopping an already-empty sink is a no-op; failures on finished
        // sources cannot occur here.
        self.sink.stop();
        self.queued_end = 0.0;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Recorded call to `play_at`.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Played {
        pub start_at: f64,
        pub duration: f64,
    }

    #[derive(Default)]
    pub struct MockState {
        pub now: f64,
        pub played: Vec<Played>,
        pub stops: usize,
    }

    /// Clock-controllable sink for scheduler tests.
    #[derive(Clone, Default)]
    pub struct MockSink(pub Rc<RefCell<MockState>>);

    impl MockSink {
        pub fn set_now(&self, now: f64) {
            self.0.borrow_mut().now = now;
        }
    }

    impl OutputSink for MockSink {
        fn now(&self) -> f64 {
            self.0.borrow().now
        }

        fn play_at(&mut self, chunk: PlaybackChunk, start_at: f64) -> VoiceResult<()> {
            let duration = chunk.duration_secs();
            self.0.borrow_mut().played.push(Played { start_at, duration });
            Ok(())
        }

        fn stop_all(&mut self) {
            self.0.borrow_mut().stops += 1;
        }
    }

    pub fn chunk_of(duration_secs: f64) -> PlaybackChunk {
        let sample_rate = 24_000u32;
        PlaybackChunk {
            samples: vec![0.0; (duration_secs * sample_rate as f64) as usize],
            sample_rate,
        }
    }
}
