//! Uncompressed PCM WAV input/output via `hound`.

use std::path::Path;

use crate::error::InputError;

fn read_error(path: &Path, err: hound::Error) -> InputError {
    InputError::ReadFailed {
        reason: format!("error reading {}: {err}", path.display()),
    }
}

/// Decode a PCM WAV file to mono `f32` samples in [-1, 1].
///
/// Integer (16/24/32-bit) and float layouts are accepted; multi-channel
/// files are averaged down to one channel. Returns `(samples, sample_rate)`.
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32), InputError> {
    let mut reader = hound::WavReader::open(path).map_err(|err| InputError::OpenFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(InputError::UnsupportedFormat {
            reason: format!("{} has zero channels", path.display()),
        });
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(|err| read_error(path, err)))
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) - 1) as f32;
            match spec.bits_per_sample {
                16 => reader
                    .samples::<i16>()
                    .map(|sample| {
                        sample
                            .map(|v| v as f32 / max)
                            .map_err(|err| read_error(path, err))
                    })
                    .collect::<Result<Vec<f32>, _>>()?,
                24 | 32 => reader
                    .samples::<i32>()
                    .map(|sample| {
                        sample
                            .map(|v| v as f32 / max)
                            .map_err(|err| read_error(path, err))
                    })
                    .collect::<Result<Vec<f32>, _>>()?,
                bits => {
                    return Err(InputError::UnsupportedFormat {
                        reason: format!(
                            "unsupported bits_per_sample={} for {}",
                            bits,
                            path.display()
                        ),
                    })
                }
            }
        }
    };

    if spec.channels == 1 {
        return Ok((samples, spec.sample_rate));
    }

    let channels = spec.channels as usize;
    let mut mono = Vec::with_capacity(samples.len() / channels);
    for chunk in samples.chunks(channels) {
        let sum: f32 = chunk.iter().copied().sum();
        mono.push(sum / channels as f32);
    }

    Ok((mono, spec.sample_rate))
}

/// Write mono 32-bit float PCM.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), InputError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(|err| InputError::OpenFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|err| InputError::WriteFailed {
                reason: format!("error writing {}: {err}", path.display()),
            })?;
    }

    writer.finalize().map_err(|err| InputError::WriteFailed {
        reason: format!("error finalizing {}: {err}", path.display()),
    })
}
