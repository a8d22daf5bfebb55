//! Debug artifact: the last processed recording as a mono 16-bit WAV.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

/// Write mono f32 samples as 16-bit PCM. Best effort at the call site; the
/// caller logs and ignores the error.
pub fn write_debug_wav(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_readable_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.wav");
        let samples = vec![0.0f32, 0.5, -0.5, 1.0, -1.0];

        write_debug_wav(&path, &samples, 16_000).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 5);
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hot.wav");

        write_debug_wav(&path, &[2.0, -2.0], 16_000).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![i16::MAX, -i16::MAX]);
    }
}
