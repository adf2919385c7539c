use std::path::Path;

use anyhow::{ensure, Context, Result};
use hound::{SampleFormat, WavReader};

/// Reads a 16-bit PCM WAV file as mono samples, averaging channels if needed.
pub fn read_pcm16<P: AsRef<Path>>(path: P, expected_rate: u32) -> Result<Vec<i16>> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();
    ensure!(
        spec.sample_format == SampleFormat::Int && spec.bits_per_sample == 16,
        "{} must be 16-bit integer PCM (found {} bits, {:?})",
        path.display(),
        spec.bits_per_sample,
        spec.sample_format
    );
    ensure!(
        spec.sample_rate == expected_rate,
        "{} is sampled at {} Hz, expected {} Hz",
        path.display(),
        spec.sample_rate,
        expected_rate
    );

    let interleaved = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to read audio samples")?;

    let channels = spec.channels.max(1) as usize;
    if channels == 1 {
        return Ok(interleaved);
    }
    Ok(interleaved
        .chunks(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect())
}
