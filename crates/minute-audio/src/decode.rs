//! Clip decode stage.
//!
//! Uses Symphonia to:
//! - probe the input container/codec
//! - decode every packet into interleaved `f32` samples
//! - fold the result down to a single mono channel
//!
//! Clips are short pre-recorded announcements, so they are decoded fully into memory
//! rather than streamed.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, DecoderOptions};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// A fully decoded mono clip.
#[derive(Clone, Debug)]
pub struct MonoClip {
    pub rate: u32,
    pub samples: Vec<f32>,
}

impl MonoClip {
    /// Best-effort duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.rate == 0 {
            return 0;
        }
        (self.samples.len() as u64).saturating_mul(1000) / u64::from(self.rate)
    }
}

/// Decode the clip at `path`, using its extension as the probe hint.
pub fn decode_file(path: &Path) -> Result<MonoClip> {
    let file = File::open(path).with_context(|| format!("open {:?}", path))?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    decode_media_source(Box::new(file), hint).with_context(|| format!("decode {:?}", path))
}

/// Decode an arbitrary Symphonia [`MediaSource`] into a mono clip.
pub fn decode_media_source(source: Box<dyn MediaSource>, hint: Hint) -> Result<MonoClip> {
    let mss = MediaSourceStream::new(source, Default::default());

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("No default audio track"))?;
    let track_id = track.id;
    let codec_params: CodecParameters = track.codec_params.clone();

    let channels = codec_params
        .channels
        .ok_or_else(|| anyhow!("Unknown channels"))?
        .count();
    let rate = codec_params
        .sample_rate
        .ok_or_else(|| anyhow!("Unknown sample rate"))?;

    let mut decoder =
        symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(_) => break, // EOF
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(_) => continue,
        };

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, *decoded.spec());
        sample_buf.copy_interleaved_ref(decoded);
        downmix_into(&mut samples, sample_buf.samples(), channels);
    }

    tracing::debug!(
        rate_hz = rate,
        source_channels = channels,
        frames = samples.len(),
        "clip decoded"
    );
    Ok(MonoClip { rate, samples })
}

/// Average interleaved frames of `channels` samples into `out`.
fn downmix_into(out: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    let scale = 1.0 / channels as f32;
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() * scale),
    );
}
