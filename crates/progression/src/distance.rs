use harmony::{Chord, Key};

const ROOT_OUTSIDE: f64 = 1.0;
const TONE_OUTSIDE: f64 = 0.5;
const TRITONE: f64 = 0.5;

/// How far a chord sits from the key. 0.0 for a tritone-free diatonic chord.
pub fn harmonic_distance(chord: &Chord, key: &Key) -> f64 {
    let mut distance = 0.0;
    if !key.contains(chord.root) {
        distance += ROOT_OUTSIDE;
    }
    let outside = (chord.pitch_class_mask() & !key.scale_mask()).count_ones();
    distance += TONE_OUTSIDE * outside as f64;
    if chord.has_tritone() {
        distance += TRITONE;
    }
    distance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(symbol: &str) -> f64 {
        harmonic_distance(&symbol.parse().unwrap(), &Key::parse("C", "major").unwrap())
    }

    #[test]
    fn diatonic_triads_are_zero() {
        for symbol in ["C", "Dm", "Em", "F", "G", "Am"] {
            assert_eq!(distance(symbol), 0.0, "{symbol}");
        }
    }

    #[test]
    fn tritone_counts_even_in_key() {
        assert_eq!(distance("Bdim"), 0.5);
        assert_eq!(distance("G7"), 0.5);
    }

    #[test]
    fn each_outside_tone_adds_half() {
        // Cm: Eb is the only outside tone, root is in scale
        assert_eq!(distance("Cm"), 0.5);
        // D: F# outside
        assert_eq!(distance("D"), distance("Dm") + 0.5);
        // Bb: root outside plus Bb itself
        assert_eq!(distance("Bb"), 1.5);
    }
}
