use serde::{Deserialize, Serialize};

use crate::chord::{Chord, ChordQuality};
use crate::note::{self, PitchClass, Spelling};
use crate::{HarmonyError, Result};

/// Major pitch classes conventionally spelled with flats.
const FLAT_KEY_ROOTS: [PitchClass; 6] = [1, 3, 5, 6, 8, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    Major,
    /// Natural minor (aeolian).
    Minor,
}

impl ScaleType {
    pub fn intervals(&self) -> [u8; 7] {
        match self {
            ScaleType::Major => [0, 2, 4, 5, 7, 9, 11],
            ScaleType::Minor => [0, 2, 3, 5, 7, 8, 10],
        }
    }

    /// Diatonic triad quality on each scale degree.
    pub fn triad_qualities(&self) -> [ChordQuality; 7] {
        use ChordQuality::*;
        match self {
            ScaleType::Major => [Major, Minor, Minor, Major, Major, Minor, Diminished],
            ScaleType::Minor => [Minor, Diminished, Major, Minor, Minor, Major, Major],
        }
    }

    /// The parallel mode used for borrowed-chord detection.
    pub fn parallel(&self) -> ScaleType {
        match self {
            ScaleType::Major => ScaleType::Minor,
            ScaleType::Minor => ScaleType::Major,
        }
    }
}

impl std::str::FromStr for ScaleType {
    type Err = HarmonyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" | "ionian" | "maj" => Ok(ScaleType::Major),
            "minor" | "natural_minor" | "natural-minor" | "aeolian" | "min" => {
                Ok(ScaleType::Minor)
            }
            other => Err(HarmonyError::UnknownScale(other.to_string())),
        }
    }
}

impl std::fmt::Display for ScaleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleType::Major => write!(f, "major"),
            ScaleType::Minor => write!(f, "minor"),
        }
    }
}

/// A tonic plus scale type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub tonic: PitchClass,
    pub scale: ScaleType,
}

impl Key {
    pub fn new(tonic: PitchClass, scale: ScaleType) -> Self {
        Self {
            tonic: tonic % 12,
            scale,
        }
    }

    /// Parse from a tonic name and scale name, e.g. `("Bb", "minor")`.
    pub fn parse(tonic: &str, scale: &str) -> Result<Self> {
        Ok(Self::new(note::parse_note(tonic)?, scale.parse()?))
    }

    /// Flats for flat-side keys; minor keys follow their relative major.
    pub fn spelling(&self) -> Spelling {
        let relative_major = match self.scale {
            ScaleType::Major => self.tonic,
            ScaleType::Minor => note::transpose(self.tonic, 3),
        };
        if FLAT_KEY_ROOTS.contains(&relative_major) {
            Spelling::Flats
        } else {
            Spelling::Sharps
        }
    }

    pub fn tonic_name(&self) -> &'static str {
        note::note_name(self.tonic, self.spelling())
    }

    /// Pitch class on a scale degree (1–7).
    pub fn degree_root(&self, degree: u8) -> PitchClass {
        let idx = (degree.clamp(1, 7) - 1) as usize;
        note::transpose(self.tonic, self.scale.intervals()[idx] as i32)
    }

    /// Scale degree (1–7) of a pitch class, if it is in the scale.
    pub fn degree_of(&self, pitch_class: PitchClass) -> Option<u8> {
        let offset = note::interval_between(self.tonic, pitch_class);
        self.scale
            .intervals()
            .iter()
            .position(|&i| i == offset)
            .map(|idx| idx as u8 + 1)
    }

    pub fn scale_mask(&self) -> u16 {
        mask_for(self.tonic, self.scale)
    }

    /// Mask of the parallel-mode scale on the same tonic.
    pub fn parallel_mask(&self) -> u16 {
        mask_for(self.tonic, self.scale.parallel())
    }

    /// Mask of the major scale on this tonic, regardless of scale type.
    pub fn major_mask(&self) -> u16 {
        mask_for(self.tonic, ScaleType::Major)
    }

    pub fn contains(&self, pitch_class: PitchClass) -> bool {
        self.scale_mask() & (1 << (pitch_class % 12)) != 0
    }

    /// True when every chord tone is in the scale.
    pub fn contains_chord(&self, chord: &Chord) -> bool {
        chord.pitch_class_mask() & !self.scale_mask() == 0
    }

    pub fn tonic_chord(&self) -> Chord {
        Chord::new(self.tonic, self.scale.triad_qualities()[0])
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.tonic_name(), self.scale)
    }
}

fn mask_for(tonic: PitchClass, scale: ScaleType) -> u16 {
    scale
        .intervals()
        .iter()
        .fold(0u16, |mask, &i| mask | (1 << note::transpose(tonic, i as i32)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keys() {
        let key = Key::parse("Bb", "minor").unwrap();
        assert_eq!(key.tonic, 10);
        assert_eq!(key.scale, ScaleType::Minor);
        assert!(matches!(
            Key::parse("C", "lydian"),
            Err(HarmonyError::UnknownScale(_))
        ));
    }

    #[test]
    fn degrees_round_trip() {
        let key = Key::parse("A", "minor").unwrap();
        for degree in 1..=7 {
            assert_eq!(key.degree_of(key.degree_root(degree)), Some(degree));
        }
        assert_eq!(key.degree_of(1), None);
    }

    #[test]
    fn spelling_follows_key_side() {
        assert_eq!(Key::parse("F", "major").unwrap().spelling(), Spelling::Flats);
        assert_eq!(Key::parse("D", "minor").unwrap().spelling(), Spelling::Flats);
        assert_eq!(Key::parse("E", "minor").unwrap().spelling(), Spelling::Sharps);
        assert_eq!(Key::parse("C", "major").unwrap().spelling(), Spelling::Sharps);
    }

    #[test]
    fn contains_chord() {
        let key = Key::parse("C", "major").unwrap();
        assert!(key.contains_chord(&"Dm".parse().unwrap()));
        assert!(!key.contains_chord(&"D7".parse().unwrap()));
        assert_eq!(key.tonic_chord(), "C".parse().unwrap());
    }

    #[test]
    fn parallel_mask_differs_by_three_tones() {
        let key = Key::parse("C", "major").unwrap();
        let borrowed = key.parallel_mask() & !key.scale_mask();
        assert_eq!(borrowed.count_ones(), 3);
    }
}
