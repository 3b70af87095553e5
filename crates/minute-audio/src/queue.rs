//! Thread-safe bounded queue of scheduled mono samples.
//!
//! The control thread appends whole clips (tone bursts, the declaration) with
//! [`SharedAudio::schedule`]; the CPAL callback drains them with
//! [`SharedAudio::pop_up_to`] and never blocks. Clips play back to back in the order they
//! were scheduled, the way a player node plays its scheduled buffers.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Bounded FIFO of mono `f32` samples.
///
/// Scheduling never waits: samples that do not fit under `max_buffered_samples` are
/// dropped and reported to the caller.
pub struct SharedAudio {
    inner: Mutex<SharedInner>,
    max_buffered_samples: usize,
}

struct SharedInner {
    queue: VecDeque<f32>,
    done: bool,
}

/// Queue capacity in samples for `buffer_seconds` of mono audio at `rate_hz`.
///
/// Non-finite or non-positive `buffer_seconds` falls back to 30 s.
pub fn calc_max_buffered_samples(rate_hz: u32, buffer_seconds: f32) -> usize {
    let secs = if buffer_seconds.is_finite() && buffer_seconds > 0.0 {
        buffer_seconds
    } else {
        DEFAULT_BUFFER_SECONDS
    };

    (rate_hz as f32 * secs).ceil() as usize
}

const DEFAULT_BUFFER_SECONDS: f32 = 30.0;

impl SharedAudio {
    pub fn new(max_buffered_samples: usize) -> Self {
        Self {
            inner: Mutex::new(SharedInner {
                queue: VecDeque::new(),
                done: false,
            }),
            max_buffered_samples,
        }
    }

    /// Close the queue and discard anything still pending. Idempotent.
    pub fn close(&self) {
        let mut g = self.inner.lock().unwrap();
        g.done = true;
        g.queue.clear();
    }

    /// Append a clip after whatever is already scheduled.
    ///
    /// Returns the number of samples accepted; the remainder is dropped when the queue is
    /// full, and everything is dropped once the queue is closed.
    pub fn schedule(&self, samples: &[f32]) -> usize {
        let mut g = self.inner.lock().unwrap();
        if g.done {
            return 0;
        }
        let room = self.max_buffered_samples.saturating_sub(g.queue.len());
        let take = samples.len().min(room);
        g.queue.extend(&samples[..take]);
        drop(g);

        if take < samples.len() {
            tracing::warn!(
                dropped_samples = samples.len() - take,
                capacity_samples = self.max_buffered_samples,
                "scheduled audio exceeds queue capacity"
            );
        }
        take
    }

    /// Take up to `max_samples` samples without waiting, or `None` if nothing is queued.
    pub fn pop_up_to(&self, max_samples: usize) -> Option<Vec<f32>> {
        let mut g = self.inner.lock().unwrap();
        let take = g.queue.len().min(max_samples);
        if take == 0 {
            return None;
        }
        Some(g.queue.drain(..take).collect())
    }
}
