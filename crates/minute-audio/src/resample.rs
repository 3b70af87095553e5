//! Clip resample stage.
//!
//! Uses Rubato to convert a decoded mono clip from its source rate to the session's
//! output rate. Runs synchronously over the whole clip in fixed input chunks, then
//! flushes the resampler's delay line so the tail of the clip is not cut off.

use anyhow::{Context, Result, anyhow};
use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{
    Async, FixedAsync, Indexing, Resampler, SincInterpolationParameters, SincInterpolationType,
    WindowFunction, calculate_cutoff,
};

/// Upper bound on silent passes used to drain the delay line.
const MAX_FLUSH_PASSES: usize = 64;

/// Configuration for the clip resampler.
#[derive(Clone, Copy, Debug)]
pub struct ResampleConfig {
    /// Input chunk size in frames.
    pub chunk_frames: usize,
}

/// Resample mono `samples` from `src_rate` to `dst_rate`.
///
/// Returns the input unchanged when the rates already match.
pub fn resample_mono(
    samples: &[f32],
    src_rate: u32,
    dst_rate: u32,
    cfg: ResampleConfig,
) -> Result<Vec<f32>> {
    if src_rate == 0 || dst_rate == 0 {
        return Err(anyhow!("invalid resample rates {src_rate} -> {dst_rate}"));
    }
    if src_rate == dst_rate {
        return Ok(samples.to_vec());
    }

    let f_ratio = dst_rate as f64 / src_rate as f64;

    let sinc_len = 128;
    let oversampling_factor = 256;
    let interpolation = SincInterpolationType::Cubic;
    let window = WindowFunction::BlackmanHarris2;
    let f_cutoff = calculate_cutoff(sinc_len, window);

    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff,
        interpolation,
        oversampling_factor,
        window,
    };

    let chunk_in_frames = cfg.chunk_frames.max(1);
    let mut resampler = Async::<f32>::new_sinc(
        f_ratio,
        1.1,
        &params,
        chunk_in_frames,
        1,
        FixedAsync::Input,
    )
    .context("resampler init")?;

    let delay = resampler.output_delay();
    let mut out_chunk = vec![0.0f32; output_capacity_frames(chunk_in_frames, f_ratio)];
    let mut out = Vec::with_capacity((samples.len() as f64 * f_ratio).ceil() as usize);

    let mut indexing = Indexing {
        input_offset: 0,
        output_offset: 0,
        active_channels_mask: None,
        partial_len: None,
    };

    let silence = vec![0.0f32; chunk_in_frames];
    let mut process = |chunk: &[f32], partial_len: Option<usize>, out: &mut Vec<f32>| {
        let input: &[f32] = if chunk.is_empty() { &silence } else { chunk };
        let input_adapter = InterleavedSlice::new(input, 1, input.len())
            .map_err(|e| anyhow!("interleaved slice (input) error: {e}"))?;
        let out_frames = out_chunk.len();
        let mut output_adapter = InterleavedSlice::new_mut(&mut out_chunk, 1, out_frames)
            .map_err(|e| anyhow!("interleaved slice (output) error: {e}"))?;

        indexing.input_offset = 0;
        indexing.output_offset = 0;
        indexing.partial_len = partial_len;

        let (_nbr_in, nbr_out) = resampler
            .process_into_buffer(&input_adapter, &mut output_adapter, Some(&indexing))
            .context("resampler process")?;
        out.extend_from_slice(&out_chunk[..nbr_out]);
        Ok::<usize, anyhow::Error>(nbr_out)
    };

    for chunk in samples.chunks(chunk_in_frames) {
        let partial_len = (chunk.len() < chunk_in_frames).then_some(chunk.len());
        process(chunk, partial_len, &mut out)?;
    }

    // Output starts `delay` frames late; flush with silence until the shifted clip is
    // complete, then drop the leading delay.
    let expected = (samples.len() as f64 * f_ratio).round() as usize;
    let mut flushes = 0;
    while out.len() < delay + expected && flushes < MAX_FLUSH_PASSES {
        if process(&[], Some(0), &mut out)? == 0 {
            break;
        }
        flushes += 1;
    }
    out.drain(..delay.min(out.len()));
    out.truncate(expected.max(1).min(out.len()));

    tracing::debug!(
        from_hz = src_rate,
        to_hz = dst_rate,
        in_frames = samples.len(),
        out_frames = out.len(),
        "clip resampled"
    );
    Ok(out)
}

/// Output buffer size for one chunk, with headroom for the async ratio margin.
fn output_capacity_frames(chunk_in_frames: usize, f_ratio: f64) -> usize {
    let scaled = (chunk_in_frames as f64 * f_ratio * 1.1).ceil() as usize;
    scaled.max(chunk_in_frames * 3) + 16
}
