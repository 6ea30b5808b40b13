// Note-name to MIDI pitch mapping.
//
// The engine names notes in scientific pitch notation (`"C4"`, `"Eb5"`,
// `"F#3"`) because that is what the synth backend accepts. MIDI output
// needs numbers: C4 is 60, each octave is 12 semitones, and any number of
// sharps (`#`) or flats (`b`) may follow the letter.

/// Semitone offset from C for a natural note letter.
fn letter_pc(letter: char) -> Option<i32> {
    match letter.to_ascii_uppercase() {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// MIDI key number for `name`, or `None` if it does not parse or falls
/// outside 0..=127.
pub fn midi_pitch(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let mut semitone = letter_pc(chars.next()?)?;
    let rest = chars.as_str();
    let octave_start = rest.find(|c: char| c != '#' && c != 'b').unwrap_or(rest.len());
    let (accidentals, octave) = rest.split_at(octave_start);
    for acc in accidentals.chars() {
        semitone += if acc == '#' { 1 } else { -1 };
    }
    let octave: i32 = octave.parse().ok()?;
    let key = octave.checked_add(1)?.checked_mul(12)?.checked_add(semitone)?;
    u8::try_from(key).ok().filter(|&k| k <= 127)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scales_map_to_expected_keys() {
        let low: Vec<u8> = ["C4", "Eb4", "F4", "G4", "Bb4"]
            .iter()
            .map(|n| midi_pitch(n).unwrap())
            .collect();
        assert_eq!(low, vec![60, 63, 65, 67, 70]);
        assert_eq!(midi_pitch("Bb5"), Some(82));
    }

    #[test]
    fn sharps_flats_and_negative_octaves() {
        assert_eq!(midi_pitch("F#3"), Some(54));
        assert_eq!(midi_pitch("Cb4"), Some(59));
        assert_eq!(midi_pitch("C##4"), Some(62));
        assert_eq!(midi_pitch("C-1"), Some(0));
        assert_eq!(midi_pitch("G9"), Some(127));
    }

    #[test]
    fn garbage_and_out_of_range_are_rejected() {
        assert_eq!(midi_pitch(""), None);
        assert_eq!(midi_pitch("H4"), None);
        assert_eq!(midi_pitch("C"), None);
        assert_eq!(midi_pitch("Cb-1"), None);
        assert_eq!(midi_pitch("A9"), None);
        assert_eq!(midi_pitch("C2147483647"), None);
        assert_eq!(midi_pitch("C-2147483648"), None);
    }

    #[test]
    fn enharmonic_spellings_agree() {
        assert_eq!(midi_pitch("D#4"), midi_pitch("Eb4"));
        assert_eq!(midi_pitch("A#5"), midi_pitch("Bb5"));
        assert_eq!(midi_pitch("E#4"), midi_pitch("F4"));
        assert_eq!(midi_pitch("c4"), Some(60));
    }
}
