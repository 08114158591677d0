use harmony::{ChordQuality, Key, ProgressionNode};
use serde::{Deserialize, Serialize};

/// Harmonic color of a candidate relative to the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorClass {
    Diatonic,
    SecondaryDominant,
    Borrowed,
    DiminishedPassing,
    ChromaticOther,
}

/// Per-class weights applied by the candidate scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorWeights {
    pub pattern: f64,
    pub transition: f64,
    pub color_bonus: f64,
}

impl ColorClass {
    pub const ALL: [ColorClass; 5] = [
        ColorClass::Diatonic,
        ColorClass::SecondaryDominant,
        ColorClass::Borrowed,
        ColorClass::DiminishedPassing,
        ColorClass::ChromaticOther,
    ];

    pub fn weights(&self) -> ColorWeights {
        let (pattern, transition, color_bonus) = match self {
            ColorClass::Diatonic => (0.5, 0.5, 0.3),
            ColorClass::SecondaryDominant => (0.35, 0.65, 0.15),
            ColorClass::Borrowed => (0.4, 0.6, 0.1),
            ColorClass::DiminishedPassing => (0.1, 0.9, 0.0),
            ColorClass::ChromaticOther => (0.1, 0.9, 0.0),
        };
        ColorWeights {
            pattern,
            transition,
            color_bonus,
        }
    }
}

impl std::fmt::Display for ColorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorClass::Diatonic => write!(f, "diatonic"),
            ColorClass::SecondaryDominant => write!(f, "secondary_dominant"),
            ColorClass::Borrowed => write!(f, "borrowed"),
            ColorClass::DiminishedPassing => write!(f, "diminished_passing"),
            ColorClass::ChromaticOther => write!(f, "chromatic_other"),
        }
    }
}

/// Classify a node, first matching rule wins:
/// diminished passing, secondary dominant, borrowed, diatonic, chromatic.
pub fn classify_color(node: &ProgressionNode, key: &Key) -> ColorClass {
    let chord = &node.chord;
    let mask = chord.pitch_class_mask();
    let scale = key.scale_mask();
    let root_bit = 1u16 << chord.root;

    let diminished = matches!(
        chord.quality,
        ChordQuality::Diminished | ChordQuality::Diminished7
    );
    if diminished && (node.roman.is_passing_diminished() || key.major_mask() & root_bit == 0) {
        return ColorClass::DiminishedPassing;
    }

    if node.roman.is_secondary_dominant()
        || (chord.quality == ChordQuality::Dominant7 && !key.contains(chord.root))
    {
        return ColorClass::SecondaryDominant;
    }

    if mask & key.parallel_mask() & !scale != 0 {
        return ColorClass::Borrowed;
    }

    if mask & !scale == 0 {
        return ColorClass::Diatonic;
    }

    ColorClass::ChromaticOther
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony::{build_progression_map, infer_node};

    fn key() -> Key {
        Key::parse("C", "major").unwrap()
    }

    fn class_of(symbol: &str) -> ColorClass {
        let map = build_progression_map(key());
        let node = match map.node_by_symbol(symbol) {
            Some(node) => node.clone(),
            None => infer_node(&symbol.parse().unwrap(), &key()),
        };
        classify_color(&node, &key())
    }

    #[test]
    fn diatonic_chords() {
        for symbol in ["C", "Dm", "Em", "F", "G", "Am"] {
            assert_eq!(class_of(symbol), ColorClass::Diatonic, "{symbol}");
        }
    }

    #[test]
    fn leading_tone_triad_is_diatonic() {
        // B is in C major, and Bdim is not a passing chord
        assert_eq!(class_of("Bdim"), ColorClass::Diatonic);
    }

    #[test]
    fn applied_and_passing_chords() {
        assert_eq!(class_of("D7"), ColorClass::SecondaryDominant);
        assert_eq!(class_of("C7"), ColorClass::SecondaryDominant);
        assert_eq!(class_of("C#dim7"), ColorClass::DiminishedPassing);
        assert_eq!(class_of("F#dim7"), ColorClass::DiminishedPassing);
    }

    #[test]
    fn modal_mixture_is_borrowed() {
        // Bb, Eb and Ab all come from C minor
        assert_eq!(class_of("Bb"), ColorClass::Borrowed);
        assert_eq!(class_of("Fm"), ColorClass::Borrowed);
        assert_eq!(class_of("Ab"), ColorClass::Borrowed);
    }

    #[test]
    fn outside_both_modes_is_chromatic() {
        // F# and C# are in neither C major nor C minor
        assert_eq!(class_of("D"), ColorClass::ChromaticOther);
        assert_eq!(class_of("A"), ColorClass::ChromaticOther);
    }

    #[test]
    fn weights_table() {
        let w = ColorClass::SecondaryDominant.weights();
        assert_eq!((w.pattern, w.transition, w.color_bonus), (0.35, 0.65, 0.15));
        assert_eq!(ColorClass::ChromaticOther.weights().color_bonus, 0.0);
    }
}
