//! Amplitude envelope summarization for voice-message waveforms.

use thiserror::Error;

/// Target envelope resolution: ten bins per second of audio.
const BINS_PER_SECOND: f64 = 10.0;
/// Hard cap on bin count, bounding the encoded attachment size.
const MAX_BINS: usize = 256;
/// Preferred floor on bin count for clips with enough samples to fill it.
const BIN_FLOOR: usize = 32;
/// Bin count of the flat placeholder envelope.
const PLACEHOLDER_BINS: usize = 9;

/// Amplitude envelope of one clip: per-time-slice loudness bytes plus the
/// decoder-reported duration. Chat clients draw the bins as the waveform
/// preview next to the play button.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// Normalized loudness per time slice, 1 to 256 entries.
    pub bins: Vec<u8>,
    /// Clip duration in seconds, carried through to the attachment.
    pub duration_seconds: f64,
}

impl Envelope {
    /// Flat placeholder substituted when envelope computation is skipped:
    /// nine zero bins and a nominal one-second duration.
    pub fn placeholder() -> Self {
        Self {
            bins: vec![0; PLACEHOLDER_BINS],
            duration_seconds: 1.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("invalid clip duration: {0} (must be finite and non-negative)")]
    InvalidDuration(f64),
}

/// Summarize a clip into its amplitude envelope.
///
/// The clip is cut into up to 256 equal windows (ten per second, floored at
/// 32 when enough samples exist) and each window's RMS becomes one bin on a
/// 0-255 scale. Bins are then rescaled toward full range; the cubic easing
/// term weakens that boost for very quiet clips so near-silence is not
/// inflated into a full-scale waveform.
///
/// Non-finite samples contribute zero energy. A negative or non-finite
/// `duration_seconds` is a caller bug and is rejected.
pub fn summarize(samples: &[f32], duration_seconds: f64) -> Result<Envelope, EnvelopeError> {
    if !duration_seconds.is_finite() || duration_seconds < 0.0 {
        return Err(EnvelopeError::InvalidDuration(duration_seconds));
    }

    let bin_count = select_bin_count(samples.len(), duration_seconds);
    let samples_per_bin = samples.len() / bin_count;

    // Windows past bin_count * samples_per_bin are the division remainder
    // and carry no bin.
    let mut raw = vec![0u32; bin_count];
    if samples_per_bin > 0 {
        for (bin, window) in raw.iter_mut().zip(samples.chunks_exact(samples_per_bin)) {
            let energy: f64 = window
                .iter()
                .map(|&s| {
                    let s = if s.is_finite() { s as f64 } else { 0.0 };
                    s * s
                })
                .sum();
            let rms = (energy / samples_per_bin as f64).sqrt();
            *bin = (rms * 255.0) as u32;
        }
    }

    let max_bin = raw.iter().copied().max().unwrap_or(0);
    let ratio = if max_bin == 0 {
        1.0
    } else {
        let loudness = max_bin as f64 / 255.0;
        1.0 + (255.0 / max_bin as f64 - 1.0) * (100.0 * loudness.powi(3)).min(1.0)
    };

    // Out-of-range input produces raw bins above 255 and a ratio below 1,
    // so the final clamp only ever trims rounding spill.
    let bins = raw
        .iter()
        .map(|&r| (r as f64 * ratio) as u32)
        .map(|b| b.min(255) as u8)
        .collect();

    Ok(Envelope {
        bins,
        duration_seconds,
    })
}

/// Ten bins per second, floored at min(32, sample count), capped at 256,
/// and never zero even for an empty clip.
fn select_bin_count(sample_count: usize, duration_seconds: f64) -> usize {
    let target = (duration_seconds * BINS_PER_SECOND) as usize;
    let lower_bound = sample_count.min(BIN_FLOOR);
    target.clamp(lower_bound, MAX_BINS).max(1)
}
