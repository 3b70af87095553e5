//! Tone burst ("bang") synthesis.
//!
//! The burst is three 40 ms segments long and carries a 400 Hz sine under an asymmetric
//! envelope: a parabola `1 - (i/n - 1)^2` rising to its peak at `n`, followed past
//! `n + ntau` by a straight line down to zero at the end of the buffer. `ntau` is chosen as
//! `n * (2 - sqrt(3))` so the line starts on the parabola's falling side.

use crate::error::AudioError;

/// Length of one envelope segment in seconds. The buffer spans three of them.
pub const SEGMENT_SECONDS: f64 = 0.040;

/// Carrier frequency in Hz.
pub const TONE_HZ: f64 = 400.0;

/// Owned mono tone burst, synthesized for one output sample rate.
#[derive(Clone, Debug)]
pub struct BangBuffer {
    samples: Vec<f32>,
}

/// Envelope geometry for a given sample rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Segments {
    /// Samples per 40 ms segment.
    n: usize,
    /// Offset past `n` where the linear tail takes over.
    ntau: usize,
    /// Total buffer length, always `3 * n`.
    len: usize,
}

impl Segments {
    fn for_rate(sample_rate: f64) -> Result<Self, AudioError> {
        let n = (SEGMENT_SECONDS * sample_rate).round();
        if !n.is_finite() || n >= usize::MAX as f64 {
            return Err(AudioError::MemoryAllocation);
        }
        let n = n as usize;
        let ntau = (n as f64 * (2.0 - 3.0_f64.sqrt())).round() as usize;
        let len = n.checked_mul(3).ok_or(AudioError::MemoryAllocation)?;
        Ok(Self { n, ntau, len })
    }

    fn tau_index(&self) -> usize {
        self.n + self.ntau
    }

    /// Envelope amplitude at sample `i`.
    fn envelope(&self, i: usize) -> f64 {
        let n = self.n as f64;
        let tau = self.tau_index();
        if i < tau {
            let x = i as f64 / n - 1.0;
            1.0 - x * x
        } else {
            let start = self.ntau as f64 / n;
            let slope = (1.0 - start * start) / (self.len - tau) as f64;
            (self.len - i) as f64 * slope
        }
    }
}

impl BangBuffer {
    /// Synthesize the burst for `sample_rate` Hz.
    ///
    /// Returns [`AudioError::BadSampleRate`] for non-positive or non-finite rates and
    /// [`AudioError::MemoryAllocation`] if the sample storage cannot be reserved.
    pub fn synthesize(sample_rate: f64) -> Result<Self, AudioError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(AudioError::BadSampleRate);
        }
        let seg = Segments::for_rate(sample_rate)?;

        let mut samples = Vec::new();
        samples
            .try_reserve_exact(seg.len)
            .map_err(|_| AudioError::MemoryAllocation)?;

        let omega = 2.0 * std::f64::consts::PI * TONE_HZ / sample_rate;
        samples.extend((0..seg.len).map(|i| {
            let value = seg.envelope(i) * (omega * i as f64).sin();
            value as f32
        }));

        tracing::debug!(
            rate_hz = sample_rate,
            samples = seg.len,
            tail_from = seg.tau_index(),
            "tone burst synthesized"
        );
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_is_three_segments_for_common_rates() {
        for (rate, n) in [
            (8_000.0, 320),
            (11_025.0, 441),
            (22_050.0, 882),
            (44_100.0, 1764),
            (48_000.0, 1920),
            (96_000.0, 3840),
        ] {
            let bang = BangBuffer::synthesize(rate).unwrap();
            assert_eq!(bang.len(), 3 * n, "rate {rate}");
        }
    }

    #[test]
    fn length_rounds_fractional_segments() {
        // 0.04 * 12_345 = 493.8
        assert_eq!(BangBuffer::synthesize(12_345.0).unwrap().len(), 3 * 494);
        // 0.04 * 1_001 = 40.04
        assert_eq!(BangBuffer::synthesize(1_001.0).unwrap().len(), 3 * 40);
    }

    #[test]
    fn tiny_rate_yields_empty_buffer() {
        let bang = BangBuffer::synthesize(10.0).unwrap();
        assert!(bang.is_empty());
    }

    #[test]
    fn rejects_non_positive_and_non_finite_rates() {
        for rate in [0.0, -48_000.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                BangBuffer::synthesize(rate),
                Err(AudioError::BadSampleRate)
            ));
        }
    }

    #[test]
    fn first_sample_is_silent() {
        let bang = BangBuffer::synthesize(48_000.0).unwrap();
        assert_eq!(bang.samples()[0], 0.0);
    }

    #[test]
    fn samples_stay_within_unit_range() {
        let bang = BangBuffer::synthesize(44_100.0).unwrap();
        assert!(bang.samples().iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn tail_envelope_is_non_negative_and_decaying() {
        let seg = Segments::for_rate(48_000.0).unwrap();
        let tail: Vec<f64> = (seg.tau_index()..seg.len).map(|i| seg.envelope(i)).collect();
        assert!(tail.iter().all(|a| *a >= 0.0));
        assert!(tail.windows(2).all(|w| w[1] < w[0]));
        assert!(*tail.last().unwrap() < 1e-3);
    }

    #[test]
    fn envelope_peaks_at_first_segment_boundary() {
        let seg = Segments::for_rate(48_000.0).unwrap();
        assert_eq!(seg.envelope(0), 0.0);
        assert_eq!(seg.envelope(seg.n), 1.0);
        let peak = (0..seg.len)
            .max_by(|a, b| seg.envelope(*a).total_cmp(&seg.envelope(*b)))
            .unwrap();
        assert_eq!(peak, seg.n);
    }

    #[test]
    fn tail_joins_parabola_without_a_step() {
        let seg = Segments::for_rate(44_100.0).unwrap();
        let tau = seg.tau_index();
        let before = seg.envelope(tau - 1);
        let at = seg.envelope(tau);
        assert!((before - at).abs() < 0.01, "{before} vs {at}");
    }

    #[test]
    fn segment_geometry_at_48k() {
        let seg = Segments::for_rate(48_000.0).unwrap();
        assert_eq!(seg.n, 1920);
        // 1920 * (2 - sqrt(3)) = 514.46
        assert_eq!(seg.ntau, 514);
        assert_eq!(seg.tau_index(), 2434);
        assert_eq!(seg.len, 5760);
    }

    #[test]
    fn samples_follow_envelope_times_carrier() {
        let rate = 48_000.0;
        let bang = BangBuffer::synthesize(rate).unwrap();
        let seg = Segments::for_rate(rate).unwrap();
        let omega = 2.0 * std::f64::consts::PI * TONE_HZ / rate;
        for i in [1, 30, seg.n, seg.tau_index(), seg.len - 1] {
            let expected = (seg.envelope(i) * (omega * i as f64).sin()) as f32;
            assert_eq!(bang.samples()[i], expected, "index {i}");
        }
    }
}
