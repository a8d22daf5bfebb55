//! Audio buffer processing: concatenation, down-mix, peak normalization,
//! and resampling to the transcription model's required rate.

use rubato::{FftFixedIn, Resampler};
use thiserror::Error;

/// Sample rate required by the transcription model.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Normalization ceiling: 95% of full scale.
pub const PEAK_CEILING: f32 = 0.95;

/// One block of interleaved f32 samples delivered by the capture stream.
/// The channel count is carried by the session's [`DeviceConfig`].
///
/// [`DeviceConfig`]: crate::domain::device::DeviceConfig
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
}

impl AudioChunk {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }
}

/// Error during resampling
#[derive(Debug, Clone, Error)]
#[error("resampling failed: {0}")]
pub struct ResampleError(pub String);

/// Concatenate buffered chunks into one interleaved sample vector.
pub fn concat_chunks(chunks: &[AudioChunk]) -> Vec<f32> {
    let total: usize = chunks.iter().map(|c| c.samples.len()).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in chunks {
        out.extend_from_slice(&chunk.samples);
    }
    out
}

/// Down-mix interleaved multi-channel samples to mono by taking the
/// arithmetic mean across channels. Mono input is returned unchanged.
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Peak-normalize in place to [`PEAK_CEILING`]. Silent input (peak == 0) is
/// left untouched. Applying this twice yields the same peak amplitude.
pub fn normalize_peak(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
    if peak > 0.0 {
        let gain = PEAK_CEILING / peak;
        for s in samples.iter_mut() {
            *s *= gain;
        }
    }
}

/// Resample mono audio from `source_rate` to `target_rate` using an FFT
/// resampler. Returns the input unchanged when the rates already match.
pub fn resample(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, ResampleError> {
    if source_rate == target_rate {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        1024, // Chunk size
        2,    // Sub-chunks
        1,    // Mono
    )
    .map_err(|e| ResampleError(e.to_string()))?;

    let mut output = Vec::with_capacity(output_len);
    let mut input_pos = 0;

    while input_pos < samples.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples.len());
        let mut chunk = samples[input_pos..end_pos].to_vec();

        // Pad the tail so the fixed-input resampler accepts it
        if chunk.len() < frames_needed {
            chunk.resize(frames_needed, 0.0);
        }

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| ResampleError(e.to_string()))?;

        output.extend_from_slice(&resampled[0]);
        input_pos = end_pos;
    }

    output.truncate(output_len);
    Ok(output)
}
