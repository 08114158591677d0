//! Pitch-class arithmetic: note names, transposition, interval naming.

use serde::{Deserialize, Serialize};

use crate::{HarmonyError, Result};

/// Pitch class 0–11 (C=0, C#=1, ...).
pub type PitchClass = u8;

const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Short interval names indexed by semitone distance.
const INTERVAL_NAMES: [&str; 12] = [
    "P1", "m2", "M2", "m3", "M3", "P4", "TT", "P5", "m6", "M6", "m7", "M7",
];

/// Accidental preference when rendering pitch classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spelling {
    Sharps,
    Flats,
}

/// Consonance class of an interval (mod 12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consonance {
    Perfect,
    Imperfect,
    Dissonant,
}

pub fn note_name(pitch_class: PitchClass, spelling: Spelling) -> &'static str {
    let idx = (pitch_class % 12) as usize;
    match spelling {
        Spelling::Sharps => NOTE_NAMES_SHARP[idx],
        Spelling::Flats => NOTE_NAMES_FLAT[idx],
    }
}

/// Transpose a pitch class by any number of semitones, wrapping mod 12.
pub fn transpose(pitch_class: PitchClass, semitones: i32) -> PitchClass {
    (pitch_class as i32 + semitones).rem_euclid(12) as PitchClass
}

/// Ascending semitone distance from `from` to `to`, in 0..12.
pub fn interval_between(from: PitchClass, to: PitchClass) -> u8 {
    (to as i32 - from as i32).rem_euclid(12) as u8
}

pub fn interval_name(semitones: u8) -> &'static str {
    INTERVAL_NAMES[(semitones % 12) as usize]
}

pub fn consonance(semitones: u8) -> Consonance {
    match semitones % 12 {
        0 | 5 | 7 => Consonance::Perfect,
        3 | 4 | 8 | 9 => Consonance::Imperfect,
        _ => Consonance::Dissonant,
    }
}

/// Parse a leading note name ("C", "F#", "Bb", dataset-style "Cs").
///
/// Returns the pitch class and the number of bytes consumed so callers can
/// continue parsing the rest of a chord symbol.
pub fn parse_note_prefix(input: &str) -> Result<(PitchClass, usize)> {
    let bytes = input.as_bytes();
    let Some(&letter) = bytes.first() else {
        return Err(HarmonyError::InvalidNote(input.to_string()));
    };

    let base: i32 = match letter.to_ascii_uppercase() {
        b'C' => 0,
        b'D' => 2,
        b'E' => 4,
        b'F' => 5,
        b'G' => 7,
        b'A' => 9,
        b'B' => 11,
        _ => return Err(HarmonyError::InvalidNote(input.to_string())),
    };

    let (accidental, consumed) = match bytes.get(1) {
        Some(b'#') => (1, 2),
        Some(b'b') => (-1, 2),
        // "s" only reads as sharp when it cannot start "sus".
        Some(b's') if !input[1..].starts_with("sus") => (1, 2),
        _ => (0, 1),
    };

    Ok(((base + accidental).rem_euclid(12) as PitchClass, consumed))
}

/// Parse a complete note name with nothing trailing.
pub fn parse_note(name: &str) -> Result<PitchClass> {
    let trimmed = name.trim();
    let (pc, consumed) = parse_note_prefix(trimmed)?;
    if consumed != trimmed.len() {
        return Err(HarmonyError::InvalidNote(name.to_string()));
    }
    Ok(pc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_wraps_both_directions() {
        assert_eq!(transpose(11, 1), 0);
        assert_eq!(transpose(0, -1), 11);
        assert_eq!(transpose(7, 7), 2);
    }

    #[test]
    fn interval_between_is_ascending() {
        assert_eq!(interval_between(7, 0), 5);
        assert_eq!(interval_between(0, 7), 7);
        assert_eq!(interval_name(interval_between(0, 6)), "TT");
    }

    #[test]
    fn consonance_lookup() {
        assert_eq!(consonance(7), Consonance::Perfect);
        assert_eq!(consonance(4), Consonance::Imperfect);
        assert_eq!(consonance(6), Consonance::Dissonant);
        assert_eq!(consonance(19), Consonance::Perfect);
    }

    #[test]
    fn parse_note_names() {
        assert_eq!(parse_note("C").unwrap(), 0);
        assert_eq!(parse_note("F#").unwrap(), 6);
        assert_eq!(parse_note("Bb").unwrap(), 10);
        assert_eq!(parse_note("Cs").unwrap(), 1);
        assert_eq!(parse_note("Cb").unwrap(), 11);
        assert!(parse_note("H").is_err());
        assert!(parse_note("C#x").is_err());
    }

    #[test]
    fn sus_is_not_a_sharp() {
        assert_eq!(parse_note_prefix("Csus4").unwrap(), (0, 1));
        assert_eq!(parse_note_prefix("Cssus4").unwrap(), (1, 2));
    }

    #[test]
    fn spelling_picks_table() {
        assert_eq!(note_name(10, Spelling::Flats), "Bb");
        assert_eq!(note_name(10, Spelling::Sharps), "A#");
    }
}
