//! Audio session lifecycle.
//!
//! An [`AudioSession`] owns one running output stream, the queue feeding it and the tone
//! burst synthesized for the device rate. Dropping the session stops the stream and
//! discards anything still scheduled. Callers keep at most one alive; starting a new one
//! means dropping the old one first.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicU8;

use cpal::traits::StreamTrait;

use crate::bang::BangBuffer;
use crate::config::PlaybackConfig;
use crate::error::AudioError;
use crate::queue::{SharedAudio, calc_max_buffered_samples};
use crate::resample::ResampleConfig;
use crate::{decode, device, playback, resample};

/// Inputs for [`AudioSession::start`].
#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Output device substring; `None` selects the host default.
    pub device: Option<String>,
    /// Shared software volume percent (0..=100).
    pub volume_percent: Arc<AtomicU8>,
    pub playback: PlaybackConfig,
}

/// A live output stream plus everything scheduled on it.
pub struct AudioSession {
    stream: cpal::Stream,
    queue: Arc<SharedAudio>,
    bang: BangBuffer,
    sample_rate: u32,
    device_name: String,
    resample: ResampleConfig,
}

impl AudioSession {
    /// Open the output device at its native rate, synthesize the tone burst and start
    /// the stream.
    pub fn start(opts: SessionOptions) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = device::pick_device(&host, opts.device.as_deref())?;
        let format = device::output_format(&device)?;
        let sample_rate = format.sample_rate();
        let device_name = device::device_label(&device);

        let bang = BangBuffer::synthesize(f64::from(sample_rate))?;

        let max_samples = calc_max_buffered_samples(sample_rate, opts.playback.buffer_seconds);
        let queue = Arc::new(SharedAudio::new(max_samples));

        let stream = playback::build_output_stream(
            &device,
            &format.stream_config,
            format.sample_format,
            &queue,
            playback::PlaybackConfig {
                refill_max_frames: opts.playback.refill_max_frames,
                volume_percent: opts.volume_percent,
            },
        )?;
        stream.play()?;

        tracing::info!(
            device = %device_name,
            rate_hz = sample_rate,
            channels = format.channels(),
            format = ?format.sample_format,
            burst_samples = bang.len(),
            "audio session started"
        );

        Ok(Self {
            stream,
            queue,
            bang,
            sample_rate,
            device_name,
            resample: ResampleConfig {
                chunk_frames: opts.playback.chunk_frames,
            },
        })
    }

    /// Schedule one tone burst after whatever is already queued.
    pub fn play_bang(&self) {
        self.queue.schedule(self.bang.samples());
    }

    /// Load, decode and schedule the clip at `path` once.
    ///
    /// The clip is converted to the session rate when needed. Completion is not tracked.
    pub fn play_declaration(&self, path: &Path) -> Result<(), AudioError> {
        let clip = decode::decode_file(path).map_err(AudioError::Declaration)?;
        let samples =
            resample::resample_mono(&clip.samples, clip.rate, self.sample_rate, self.resample)
                .map_err(AudioError::Declaration)?;
        let accepted = self.queue.schedule(&samples);
        tracing::info!(
            path = ?path,
            duration_ms = clip.duration_ms(),
            scheduled_samples = accepted,
            "declaration scheduled"
        );
        Ok(())
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.queue.close();
        if let Err(e) = self.stream.pause() {
            tracing::warn!("stream pause on teardown failed: {e}");
        }
        tracing::info!(device = %self.device_name, "audio session stopped");
    }
}
