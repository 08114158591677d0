//! Roman numerals as data.
//!
//! The display string ("V/ii", "vii°7/V", "bVII") is a projection; logic
//! reads the fields.

use serde::{Deserialize, Serialize};

use crate::chord::ChordQuality;

const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
}

impl HarmonicFunction {
    pub fn for_degree(degree: u8) -> Self {
        match degree {
            2 | 4 => HarmonicFunction::Subdominant,
            5 | 7 => HarmonicFunction::Dominant,
            _ => HarmonicFunction::Tonic,
        }
    }
}

impl std::fmt::Display for HarmonicFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarmonicFunction::Tonic => write!(f, "tonic"),
            HarmonicFunction::Subdominant => write!(f, "subdominant"),
            HarmonicFunction::Dominant => write!(f, "dominant"),
        }
    }
}

/// What a numeral is applied to, for secondary and passing chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub degree: u8,
    pub quality: ChordQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RomanRole {
    /// A chord named directly by its degree, possibly with an accidental.
    Plain,
    /// V7 of the target degree.
    SecondaryDominant { target: Target },
    /// Leading-tone diminished seventh of the target degree.
    PassingDiminished { target: Target },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RomanNumeral {
    /// Scale degree 1–7 of the chord root (for plain numerals).
    pub degree: u8,
    /// -1 flat, 0 natural, +1 sharp relative to the scale degree.
    pub accidental: i8,
    pub quality: ChordQuality,
    pub role: RomanRole,
}

impl RomanNumeral {
    pub fn plain(degree: u8, accidental: i8, quality: ChordQuality) -> Self {
        Self {
            degree,
            accidental,
            quality,
            role: RomanRole::Plain,
        }
    }

    pub fn secondary_dominant(target: Target) -> Self {
        Self {
            degree: 5,
            accidental: 0,
            quality: ChordQuality::Dominant7,
            role: RomanRole::SecondaryDominant { target },
        }
    }

    pub fn passing_diminished(target: Target) -> Self {
        Self {
            degree: 7,
            accidental: 0,
            quality: ChordQuality::Diminished7,
            role: RomanRole::PassingDiminished { target },
        }
    }

    /// The degree written before any slash; applied chords reduce to it.
    pub fn base_degree(&self) -> u8 {
        self.degree
    }

    pub fn is_secondary_dominant(&self) -> bool {
        matches!(self.role, RomanRole::SecondaryDominant { .. })
    }

    pub fn is_passing_diminished(&self) -> bool {
        matches!(self.role, RomanRole::PassingDiminished { .. })
    }
}

fn numeral(degree: u8, quality: ChordQuality) -> String {
    let base = NUMERALS[(degree.clamp(1, 7) - 1) as usize];
    if quality.is_minor_family() {
        base.to_lowercase()
    } else {
        base.to_string()
    }
}

fn quality_mark(quality: ChordQuality) -> &'static str {
    match quality {
        ChordQuality::Diminished => "°",
        ChordQuality::Diminished7 => "°7",
        ChordQuality::HalfDiminished7 => "ø7",
        ChordQuality::Augmented => "+",
        ChordQuality::Major7 => "maj7",
        ChordQuality::Minor7 | ChordQuality::Dominant7 => "7",
        ChordQuality::Sus2 => "sus2",
        ChordQuality::Sus4 => "sus4",
        ChordQuality::Major | ChordQuality::Minor => "",
    }
}

impl std::fmt::Display for RomanNumeral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.role {
            RomanRole::Plain => {
                let accidental = match self.accidental {
                    a if a < 0 => "b",
                    a if a > 0 => "#",
                    _ => "",
                };
                write!(
                    f,
                    "{}{}{}",
                    accidental,
                    numeral(self.degree, self.quality),
                    quality_mark(self.quality)
                )
            }
            RomanRole::SecondaryDominant { target } => {
                write!(f, "V/{}", numeral(target.degree, target.quality))
            }
            RomanRole::PassingDiminished { target } => {
                write!(f, "vii°7/{}", numeral(target.degree, target.quality))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_numerals() {
        assert_eq!(RomanNumeral::plain(2, 0, ChordQuality::Minor).to_string(), "ii");
        assert_eq!(RomanNumeral::plain(7, 0, ChordQuality::Diminished).to_string(), "vii°");
        assert_eq!(RomanNumeral::plain(7, -1, ChordQuality::Major).to_string(), "bVII");
        assert_eq!(RomanNumeral::plain(5, 0, ChordQuality::Dominant7).to_string(), "V7");
    }

    #[test]
    fn applied_numerals() {
        let v_of_v = RomanNumeral::secondary_dominant(Target {
            degree: 5,
            quality: ChordQuality::Major,
        });
        assert_eq!(v_of_v.to_string(), "V/V");
        assert_eq!(v_of_v.base_degree(), 5);

        let passing = RomanNumeral::passing_diminished(Target {
            degree: 2,
            quality: ChordQuality::Minor,
        });
        assert_eq!(passing.to_string(), "vii°7/ii");
        assert!(passing.is_passing_diminished());
        assert_eq!(passing.base_degree(), 7);
    }

    #[test]
    fn functions_by_degree() {
        assert_eq!(HarmonicFunction::for_degree(1), HarmonicFunction::Tonic);
        assert_eq!(HarmonicFunction::for_degree(4), HarmonicFunction::Subdominant);
        assert_eq!(HarmonicFunction::for_degree(7), HarmonicFunction::Dominant);
    }
}
