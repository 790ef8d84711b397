//! Pitch conversion - Hz, MIDI numbers and note names
//!
//! Uses twelve-tone equal temperament with A4 = 440 Hz = MIDI 69.

/// Sharp-spelled note names indexed by pitch class (C = 0)
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Fixed-Do solfège syllables indexed by pitch class
pub const SOLFEGE_NAMES: [&str; 12] = [
    "Do", "Do#", "Re", "Re#", "Mi", "Fa", "Fa#", "Sol", "Sol#", "La", "La#", "Si",
];

const A4_HZ: f32 = 440.0;
const A4_MIDI: f32 = 69.0;

/// Convert a frequency to a fractional MIDI number
///
/// Returns `None` for absent input: NaN, infinities, zero and negative values.
pub fn hz_to_midi(hz: f32) -> Option<f32> {
    if !hz.is_finite() || hz <= 0.0 {
        return None;
    }
    Some(A4_MIDI + 12.0 * (hz / A4_HZ).log2())
}

pub fn midi_to_hz(midi: f32) -> f32 {
    A4_HZ * 2.0_f32.powf((midi - A4_MIDI) / 12.0)
}

fn rounded(midi: f32) -> i32 {
    midi.round() as i32
}

/// Scientific pitch name, e.g. `60.0 -> "C4"`, `69.0 -> "A4"`
pub fn midi_to_note_name(midi: f32) -> String {
    let m = rounded(midi);
    let name = NOTE_NAMES[m.rem_euclid(12) as usize];
    format!("{}{}", name, m.div_euclid(12) - 1)
}

/// Solfège syllable without octave, e.g. `60.0 -> "Do"`
pub fn midi_to_solfege(midi: f32) -> &'static str {
    SOLFEGE_NAMES[rounded(midi).rem_euclid(12) as usize]
}

/// Deviation from the nearest equal-tempered semitone in cents (-50..=50)
pub fn cents_offset(hz: f32) -> Option<f32> {
    let midi = hz_to_midi(hz)?;
    Some((midi - midi.round()) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pitches() {
        assert_eq!(hz_to_midi(440.0), Some(69.0));
        assert!((hz_to_midi(261.6256).unwrap() - 60.0).abs() < 1e-3);
        assert!((midi_to_hz(69.0) - 440.0).abs() < 1e-3);
        assert!((midi_to_hz(57.0) - 220.0).abs() < 1e-3);
    }

    #[test]
    fn test_absent_frequencies() {
        assert_eq!(hz_to_midi(0.0), None);
        assert_eq!(hz_to_midi(-110.0), None);
        assert_eq!(hz_to_midi(f32::NAN), None);
        assert_eq!(hz_to_midi(f32::INFINITY), None);
    }

    #[test]
    fn test_round_trip() {
        for hz in [27.5_f32, 55.0, 123.47, 440.0, 1000.0, 4186.0] {
            let back = midi_to_hz(hz_to_midi(hz).unwrap());
            assert!((back - hz).abs() / hz < 1e-4, "{} -> {}", hz, back);
        }
    }

    #[test]
    fn test_note_names() {
        assert_eq!(midi_to_note_name(60.0), "C4");
        assert_eq!(midi_to_note_name(69.0), "A4");
        assert_eq!(midi_to_note_name(61.0), "C#4");
        assert_eq!(midi_to_note_name(59.6), "C4");
        assert_eq!(midi_to_note_name(0.0), "C-1");
        assert_eq!(midi_to_note_name(-1.0), "B-2");
    }

    #[test]
    fn test_solfege() {
        assert_eq!(midi_to_solfege(60.0), "Do");
        assert_eq!(midi_to_solfege(67.0), "Sol");
        assert_eq!(midi_to_solfege(71.0), "Si");
        assert_eq!(midi_to_solfege(-2.0), "La#");
    }

    #[test]
    fn test_cents_offset() {
        assert!(cents_offset(440.0).unwrap().abs() < 1e-3);
        // 445 Hz is ~19.56 cents sharp of A4
        let cents = cents_offset(445.0).unwrap();
        assert!((cents - 19.56).abs() < 0.1);
        assert_eq!(cents_offset(0.0), None);
    }
}
