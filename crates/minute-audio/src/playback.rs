//! Playback stage (CPAL output stream).
//!
//! Builds the CPAL output stream and provides the real-time audio callback.
//! The callback:
//! - refills a small local buffer from the scheduled-audio queue without blocking
//! - fans the mono source out to every device channel
//! - applies the software output volume
//! - converts `f32` samples to the device sample format
//!
//! When nothing is scheduled the device is fed silence; the stream keeps running for the
//! whole session.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::DeviceTrait;

use crate::error::AudioError;
use crate::queue::SharedAudio;

/// Configuration for the playback stage (CPAL output callback).
#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    /// Maximum number of frames to pull from the queue per refill.
    pub refill_max_frames: usize,
    /// User-facing volume percent (0..=100), read on every callback.
    pub volume_percent: Arc<AtomicU8>,
}

/// Build a CPAL output stream that plays audio scheduled on `queue`.
///
/// `queue` must carry mono `f32` samples at the stream's sample rate.
/// Unsupported device sample formats map to [`AudioError::BadOutputFormat`].
pub fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    queue: &Arc<SharedAudio>,
    cfg: PlaybackConfig,
) -> Result<cpal::Stream, AudioError> {
    match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(device, config, queue, cfg),
        cpal::SampleFormat::I16 => build_stream::<i16>(device, config, queue, cfg),
        cpal::SampleFormat::I32 => build_stream::<i32>(device, config, queue, cfg),
        cpal::SampleFormat::U16 => build_stream::<u16>(device, config, queue, cfg),
        other => {
            tracing::warn!(format = ?other, "unsupported output sample format");
            Err(AudioError::BadOutputFormat)
        }
    }
}

/// Type-specialized stream builder for CPAL sample formats.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    queue: &Arc<SharedAudio>,
    cfg: PlaybackConfig,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels_out = usize::from(config.channels);
    if channels_out == 0 {
        return Err(AudioError::NoOutput);
    }

    let state = Arc::new(Mutex::new(PlaybackState {
        pos: 0,
        src: Vec::new(),
    }));

    let refill_max_frames = cfg.refill_max_frames.max(1);
    let queue_cb = queue.clone();
    let volume = cfg.volume_percent.clone();

    let err_fn = |err| tracing::warn!("stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            let gain = gain_for_percent(volume.load(Ordering::Relaxed));
            let mut st = state.lock().unwrap();
            fill_frames(&mut st, data, channels_out, gain, |max| {
                queue_cb.pop_up_to(max.min(refill_max_frames))
            });
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

/// Local playback buffer state for the CPAL callback.
///
/// We keep a small Vec of mono samples fetched from the queue so the callback can run
/// quickly without locking the queue for every frame.
struct PlaybackState {
    pos: usize,
    src: Vec<f32>,
}

/// Write every frame of `data`, refilling from `refill` as the local buffer empties.
///
/// Frames with nothing scheduled are written as silence.
fn fill_frames<T, F>(
    st: &mut PlaybackState,
    data: &mut [T],
    channels_out: usize,
    gain: f32,
    mut refill: F,
) where
    T: cpal::Sample + cpal::FromSample<f32>,
    F: FnMut(usize) -> Option<Vec<f32>>,
{
    let frames = data.len() / channels_out;
    for frame in 0..frames {
        if st.pos >= st.src.len() {
            st.pos = 0;
            st.src.clear();
            match refill(frames - frame) {
                Some(v) => st.src = v,
                None => {
                    let silence = <T as cpal::Sample>::from_sample::<f32>(0.0);
                    data[frame * channels_out..].fill(silence);
                    return;
                }
            }
        }
        let sample = <T as cpal::Sample>::from_sample::<f32>(st.src[st.pos] * gain);
        data[frame * channels_out..(frame + 1) * channels_out].fill(sample);
        st.pos += 1;
    }
}

/// Map a 0..=100 volume percent to a linear gain.
pub(crate) fn gain_for_percent(percent: u8) -> f32 {
    f32::from(percent.min(100)) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_is_linear_and_clamped() {
        assert_eq!(gain_for_percent(0), 0.0);
        assert_eq!(gain_for_percent(50), 0.5);
        assert_eq!(gain_for_percent(100), 1.0);
        assert_eq!(gain_for_percent(250), 1.0);
    }

    #[test]
    fn mono_source_fans_out_to_all_channels() {
        let mut st = PlaybackState { pos: 0, src: Vec::new() };
        let mut chunks = vec![vec![0.5, -0.5]];
        let mut data = [0.0f32; 6];
        fill_frames(&mut st, &mut data, 2, 1.0, |_| chunks.pop());
        assert_eq!(data, [0.5, 0.5, -0.5, -0.5, 0.0, 0.0]);
    }

    #[test]
    fn gain_scales_samples() {
        let mut st = PlaybackState { pos: 0, src: Vec::new() };
        let mut chunks = vec![vec![1.0, 0.5]];
        let mut data = [0.0f32; 2];
        fill_frames(&mut st, &mut data, 1, 0.5, |_| chunks.pop());
        assert_eq!(data, [0.5, 0.25]);
    }

    #[test]
    fn leftover_samples_carry_into_next_callback() {
        let mut st = PlaybackState { pos: 0, src: Vec::new() };
        let mut chunks = vec![vec![0.1, 0.2, 0.3]];
        let mut first = [0.0f32; 2];
        fill_frames(&mut st, &mut first, 1, 1.0, |_| chunks.pop());
        assert_eq!(first, [0.1, 0.2]);

        let mut second = [9.0f32; 2];
        fill_frames(&mut st, &mut second, 1, 1.0, |_| None);
        assert_eq!(second, [0.3, 0.0]);
    }

    #[test]
    fn converts_to_integer_formats() {
        let mut st = PlaybackState { pos: 0, src: Vec::new() };
        let mut chunks = vec![vec![0.0]];
        let mut data = [1i16; 2];
        fill_frames(&mut st, &mut data, 1, 1.0, |_| chunks.pop());
        assert_eq!(data, [0, 0]);
    }
}
