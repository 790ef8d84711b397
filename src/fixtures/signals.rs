//! Synthetic test signals.
//!
//! A signal is a sequence of parts rendered back to back. Parts parse from
//! compact `kind:args` strings so fixtures can be described on the command
//! line:
//! - `tone:<hz>:<secs>[:<amplitude>]`
//! - `rest:<secs>`
//! - `noise:<secs>[:<amplitude>]`

use std::f32::consts::PI;
use std::str::FromStr;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::InputError;

const DEFAULT_AMPLITUDE: f32 = 0.5;

/// Seed used when the caller does not pick one.
pub const DEFAULT_NOISE_SEED: u64 = 0x5A5A_FFF0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalPart {
    Tone {
        frequency_hz: f32,
        secs: f32,
        amplitude: f32,
    },
    Rest {
        secs: f32,
    },
    Noise {
        secs: f32,
        amplitude: f32,
    },
}

impl SignalPart {
    pub fn secs(&self) -> f32 {
        match *self {
            SignalPart::Tone { secs, .. }
            | SignalPart::Rest { secs }
            | SignalPart::Noise { secs, .. } => secs,
        }
    }

    fn sample_count(&self, sample_rate: u32) -> usize {
        (self.secs() * sample_rate as f32).round() as usize
    }
}

fn invalid(spec: &str, reason: &str) -> InputError {
    InputError::InvalidFixture {
        reason: format!("'{}': {}", spec, reason),
    }
}

fn parse_number(spec: &str, field: &str, value: &str) -> Result<f32, InputError> {
    let parsed: f32 = value
        .parse()
        .map_err(|_| invalid(spec, &format!("{} '{}' is not a number", field, value)))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(invalid(spec, &format!("{} must be finite and >= 0", field)));
    }
    Ok(parsed)
}

impl FromStr for SignalPart {
    type Err = InputError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = spec.split(':').map(str::trim).collect();
        let amplitude = |index: usize| -> Result<f32, InputError> {
            match fields.get(index) {
                Some(value) => parse_number(spec, "amplitude", value),
                None => Ok(DEFAULT_AMPLITUDE),
            }
        };

        match fields.as_slice() {
            ["tone", hz, secs] | ["tone", hz, secs, _] => {
                let frequency_hz = parse_number(spec, "frequency", hz)?;
                if frequency_hz == 0.0 {
                    return Err(invalid(spec, "frequency must be > 0"));
                }
                Ok(SignalPart::Tone {
                    frequency_hz,
                    secs: parse_number(spec, "duration", secs)?,
                    amplitude: amplitude(3)?,
                })
            }
            ["rest", secs] => Ok(SignalPart::Rest {
                secs: parse_number(spec, "duration", secs)?,
            }),
            ["noise", secs] | ["noise", secs, _] => Ok(SignalPart::Noise {
                secs: parse_number(spec, "duration", secs)?,
                amplitude: amplitude(2)?,
            }),
            _ => Err(invalid(
                spec,
                "expected tone:<hz>:<secs>[:<amp>], rest:<secs> or noise:<secs>[:<amp>]",
            )),
        }
    }
}

/// Render `parts` back to back; noise is reproducible for a given `seed`.
pub fn render(parts: &[SignalPart], sample_rate: u32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let total: usize = parts.iter().map(|p| p.sample_count(sample_rate)).sum();
    let mut samples = Vec::with_capacity(total);

    for part in parts {
        let count = part.sample_count(sample_rate);
        match *part {
            SignalPart::Tone {
                frequency_hz,
                amplitude,
                ..
            } => {
                let step = 2.0 * PI * frequency_hz / sample_rate as f32;
                samples.extend((0..count).map(|i| amplitude * (step * i as f32).sin()));
            }
            SignalPart::Rest { .. } => samples.extend(std::iter::repeat(0.0).take(count)),
            SignalPart::Noise { amplitude, .. } => {
                samples.extend((0..count).map(|_| rng.gen_range(-amplitude..=amplitude)));
            }
        }
    }

    samples
}
