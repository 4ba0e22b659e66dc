//! WAV file I/O for training utterances.

use std::path::Path;

use crate::{Error, Result};

/// Read a WAV file as a mono f32 waveform in [-1, 1].
///
/// Integer and float sample formats are both accepted; multi-channel files
/// are downmixed by averaging channels. Returns `(samples, sample_rate)`.
pub fn read_wav_mono(path: impl AsRef<Path>) -> Result<(Vec<f32>, u32)> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1u32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    if channels == 0 {
        return Err(Error::Audio("zero-channel wav".into()));
    }
    if channels == 1 {
        return Ok((interleaved, sample_rate));
    }

    let mono = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, sample_rate))
}

/// Write mono f32 samples as a WAV file. Used mostly by tests and tooling.
pub fn write_wav(path: impl AsRef<Path>, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Trim leading and trailing samples below `threshold` in absolute value.
///
/// Returns the trimmed slice; an all-silent waveform trims to empty.
pub fn trim_silence(samples: &[f32], threshold: f32) -> &[f32] {
    let start = match samples.iter().position(|s| s.abs() >= threshold) {
        Some(i) => i,
        None => return &[],
    };
    let end = samples
        .iter()
        .rposition(|s| s.abs() >= threshold)
        .unwrap_or(start);
    &samples[start..=end]
}
