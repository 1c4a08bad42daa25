use anyhow::Context;
use hound::{SampleFormat, WavReader, WavWriter};
use std::fs;
use std::path::Path;

pub fn wav_duration_seconds(path: &Path) -> anyhow::Result<f64> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let samples = reader.len();
    let frames = samples as f64 / spec.channels as f64;
    let duration = frames / spec.sample_rate as f64;
    Ok(duration)
}

/// Scale every sample of the WAV at `path` by `gain`, in place.
pub fn apply_gain(path: &Path, gain: f32) -> anyhow::Result<()> {
    let gain = gain.clamp(0.0, 1.0);
    if (gain - 1.0).abs() < f32::EPSILON {
        return Ok(());
    }

    let mut reader = WavReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();
    let tmp_path = path.with_extension("gain.tmp");
    let mut writer = WavWriter::create(&tmp_path, spec)?;

    match spec.sample_format {
        SampleFormat::Float => {
            for s in reader.samples::<f32>() {
                writer.write_sample(s? * gain)?;
            }
        }
        SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            for s in reader.samples::<i32>() {
                let scaled = (s? as f32 * gain).round().clamp(-max - 1.0, max);
                writer.write_sample(scaled as i32)?;
            }
        }
    }
    writer.finalize()?;
    drop(reader);
    fs::rename(&tmp_path, path)?;
    Ok(())
}
