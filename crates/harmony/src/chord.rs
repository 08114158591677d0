use serde::{Deserialize, Serialize};

use crate::note::{self, PitchClass, Spelling};
use crate::{HarmonyError, Result};

/// The closed set of chord qualities the engine reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Major7,
    Minor7,
    Dominant7,
    Diminished7,
    HalfDiminished7,
    Sus2,
    Sus4,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 11] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::Major7,
        ChordQuality::Minor7,
        ChordQuality::Dominant7,
        ChordQuality::Diminished7,
        ChordQuality::HalfDiminished7,
        ChordQuality::Sus2,
        ChordQuality::Sus4,
    ];

    /// Suffix for chord symbol display
    pub fn suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::HalfDiminished7 => "m7b5",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
        }
    }

    /// Intervals above the root, in semitones.
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Major7 => &[0, 4, 7, 11],
            ChordQuality::Minor7 => &[0, 3, 7, 10],
            ChordQuality::Dominant7 => &[0, 4, 7, 10],
            ChordQuality::Diminished7 => &[0, 3, 6, 9],
            ChordQuality::HalfDiminished7 => &[0, 3, 6, 10],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
        }
    }

    /// Parse a quality suffix, accepting the common alternate spellings.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let quality = match suffix {
            "" | "maj" | "M" => ChordQuality::Major,
            "m" | "min" | "-" => ChordQuality::Minor,
            "dim" | "°" | "o" => ChordQuality::Diminished,
            "aug" | "+" => ChordQuality::Augmented,
            "maj7" | "M7" | "Δ7" | "Δ" => ChordQuality::Major7,
            "m7" | "min7" | "-7" => ChordQuality::Minor7,
            "7" | "dom7" => ChordQuality::Dominant7,
            "dim7" | "°7" | "o7" => ChordQuality::Diminished7,
            "m7b5" | "ø" | "ø7" | "min7b5" => ChordQuality::HalfDiminished7,
            "sus2" => ChordQuality::Sus2,
            "sus4" | "sus" => ChordQuality::Sus4,
            _ => return None,
        };
        Some(quality)
    }

    /// Lower-case roman numerals for chords with a minor third.
    pub fn is_minor_family(&self) -> bool {
        matches!(
            self,
            ChordQuality::Minor
                | ChordQuality::Minor7
                | ChordQuality::Diminished
                | ChordQuality::Diminished7
                | ChordQuality::HalfDiminished7
        )
    }

    pub fn is_diminished(&self) -> bool {
        matches!(self, ChordQuality::Diminished | ChordQuality::Diminished7)
    }
}

impl std::fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChordQuality::Major => "major",
            ChordQuality::Minor => "minor",
            ChordQuality::Diminished => "diminished",
            ChordQuality::Augmented => "augmented",
            ChordQuality::Major7 => "major7",
            ChordQuality::Minor7 => "minor7",
            ChordQuality::Dominant7 => "dominant7",
            ChordQuality::Diminished7 => "diminished7",
            ChordQuality::HalfDiminished7 => "half_diminished7",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
        };
        f.write_str(name)
    }
}

/// A chord as a value: root pitch class plus quality.
///
/// Equality is enharmonic; "C#" and "Db" parse to the same `Chord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Chord {
    pub root: PitchClass,
    pub quality: ChordQuality,
}

impl Chord {
    pub fn new(root: PitchClass, quality: ChordQuality) -> Self {
        Self {
            root: root % 12,
            quality,
        }
    }

    pub fn intervals(&self) -> &'static [u8] {
        self.quality.intervals()
    }

    /// Chord tones as pitch classes, root first.
    pub fn notes(&self) -> Vec<PitchClass> {
        self.intervals()
            .iter()
            .map(|&i| note::transpose(self.root, i as i32))
            .collect()
    }

    /// Bitmask over the 12 pitch classes: bit i set means pitch class i sounds.
    pub fn pitch_class_mask(&self) -> u16 {
        self.notes().iter().fold(0u16, |mask, &pc| mask | (1 << pc))
    }

    pub fn contains(&self, pitch_class: PitchClass) -> bool {
        self.pitch_class_mask() & (1 << (pitch_class % 12)) != 0
    }

    pub fn shared_tones(&self, other: &Chord) -> u32 {
        (self.pitch_class_mask() & other.pitch_class_mask()).count_ones()
    }

    /// True if any two chord tones sit exactly six semitones apart.
    pub fn has_tritone(&self) -> bool {
        let mask = self.pitch_class_mask();
        (0..12u8).any(|pc| mask & (1 << pc) != 0 && mask & (1 << ((pc + 6) % 12)) != 0)
    }

    pub fn transpose(&self, semitones: i32) -> Self {
        Self::new(note::transpose(self.root, semitones), self.quality)
    }

    pub fn symbol(&self, spelling: Spelling) -> String {
        format!("{}{}", note::note_name(self.root, spelling), self.quality.suffix())
    }
}

impl std::str::FromStr for Chord {
    type Err = HarmonyError;

    /// Parse "Dm", "A7", "C#dim7", "Bbmaj7", "Fsus4".
    ///
    /// Slash-bass suffixes ("C/G") are ignored; the chord is its upper part.
    fn from_str(symbol: &str) -> Result<Self> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(HarmonyError::EmptySymbol);
        }
        let upper = symbol.split('/').next().unwrap_or(symbol);
        let (root, consumed) = note::parse_note_prefix(upper)?;
        let suffix = &upper[consumed..];
        let quality =
            ChordQuality::from_suffix(suffix).ok_or_else(|| HarmonyError::UnknownQuality {
                symbol: symbol.to_string(),
                suffix: suffix.to_string(),
            })?;
        Ok(Chord::new(root, quality))
    }
}

impl std::fmt::Display for Chord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.symbol(Spelling::Sharps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chord(s: &str) -> Chord {
        s.parse().unwrap()
    }

    #[test]
    fn parses_common_symbols() {
        assert_eq!(chord("Dm"), Chord::new(2, ChordQuality::Minor));
        assert_eq!(chord("A7"), Chord::new(9, ChordQuality::Dominant7));
        assert_eq!(chord("C#dim7"), Chord::new(1, ChordQuality::Diminished7));
        assert_eq!(chord("Bbmaj7"), Chord::new(10, ChordQuality::Major7));
        assert_eq!(chord("FM7"), Chord::new(5, ChordQuality::Major7));
        assert_eq!(chord("Bm7b5"), Chord::new(11, ChordQuality::HalfDiminished7));
        assert_eq!(chord("Gsus4"), Chord::new(7, ChordQuality::Sus4));
        assert_eq!(chord("C/G"), Chord::new(0, ChordQuality::Major));
    }

    #[test]
    fn enharmonic_symbols_are_equal() {
        assert_eq!(chord("C#m"), chord("Dbm"));
    }

    #[test]
    fn unknown_quality_is_an_error() {
        let err = "Cadd9".parse::<Chord>().unwrap_err();
        assert!(matches!(err, HarmonyError::UnknownQuality { .. }));
        assert_eq!("".parse::<Chord>().unwrap_err(), HarmonyError::EmptySymbol);
        assert!(matches!("Xm".parse::<Chord>(), Err(HarmonyError::InvalidNote(_))));
    }

    #[test]
    fn notes_and_mask() {
        let g7 = chord("G7");
        assert_eq!(g7.notes(), vec![7, 11, 2, 5]);
        assert!(g7.contains(5));
        assert!(!g7.contains(0));
        assert_eq!(g7.shared_tones(&chord("C")), 1);
    }

    #[test]
    fn tritone_detection() {
        assert!(chord("G7").has_tritone());
        assert!(chord("Bdim").has_tritone());
        assert!(!chord("C").has_tritone());
        assert!(!chord("Am7").has_tritone());
    }

    #[test]
    fn symbol_respects_spelling() {
        let c = Chord::new(10, ChordQuality::Minor7);
        assert_eq!(c.symbol(Spelling::Flats), "Bbm7");
        assert_eq!(c.symbol(Spelling::Sharps), "A#m7");
        assert_eq!(c.to_string(), "A#m7");
    }
}
