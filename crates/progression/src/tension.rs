//! Tension levels and the arc bonus for resolving or building tension.

use harmony::{ChordQuality, HarmonicFunction, Key, ProgressionNode};
use serde::{Deserialize, Serialize};

use crate::distance::harmonic_distance;

/// Paths shorter than this are still "early" and may build tension.
const EARLY_PATH_LEN: usize = 3;
const RESOLUTION_REWARD: f64 = 0.2;
const BUILD_REWARD: f64 = 0.1;
const DISTANCE_FACTOR: f64 = 0.1;

/// Tension of a node in a key, in [0, 1].
pub fn tension_level(node: &ProgressionNode, key: &Key) -> f64 {
    let base = match node.function {
        HarmonicFunction::Tonic => 0.0,
        HarmonicFunction::Subdominant => 0.3,
        HarmonicFunction::Dominant => 0.7,
    };
    let quality = match node.chord.quality {
        ChordQuality::Dominant7 => 0.2,
        ChordQuality::Diminished | ChordQuality::Diminished7 => 0.3,
        ChordQuality::Augmented => 0.25,
        ChordQuality::HalfDiminished7 => 0.2,
        _ => 0.0,
    };
    let distance = harmonic_distance(&node.chord, key) * DISTANCE_FACTOR;
    (base + quality + distance).clamp(0.0, 1.0)
}

/// Reward for the tension change of a move.
///
/// Resolving (negative delta) always earns a bonus; building tension only
/// does while the path is short.
pub fn tension_arc_bonus(delta: f64, path_len: usize) -> f64 {
    if delta < 0.0 {
        delta.abs() * RESOLUTION_REWARD
    } else if delta > 0.0 && path_len < EARLY_PATH_LEN {
        delta * BUILD_REWARD
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TensionReading {
    pub level: f64,
    pub delta: f64,
    pub arc_bonus: f64,
}

/// Tension of `candidate` after `current`, given the path length so far.
pub fn tension_between(
    current: &ProgressionNode,
    candidate: &ProgressionNode,
    key: &Key,
    path_len: usize,
) -> TensionReading {
    let level = tension_level(candidate, key);
    let delta = level - tension_level(current, key);
    TensionReading {
        level,
        delta,
        arc_bonus: tension_arc_bonus(delta, path_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony::build_progression_map;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn levels_by_function_and_quality() {
        let key = Key::parse("C", "major").unwrap();
        let map = build_progression_map(key);
        let level = |s: &str| tension_level(map.node_by_symbol(s).unwrap(), &key);

        assert_eq!(level("C"), 0.0);
        assert!(close(level("F"), 0.3));
        assert!(close(level("G"), 0.7));
        // dominant + dim quality + tritone distance 0.5 * 0.1
        assert!(close(level("Bdim"), 1.0));
        // D7: dominant 0.7 + 0.2 + (F# outside 0.5 + tritone 0.5) * 0.1
        assert!(close(level("D7"), 1.0));
    }

    #[test]
    fn resolution_always_rewarded() {
        assert!(close(tension_arc_bonus(-0.7, 10), 0.14));
    }

    #[test]
    fn building_only_rewarded_early() {
        assert!(close(tension_arc_bonus(0.5, 1), 0.05));
        assert_eq!(tension_arc_bonus(0.5, 3), 0.0);
        assert_eq!(tension_arc_bonus(0.0, 0), 0.0);
    }

    #[test]
    fn reading_for_dominant_to_tonic() {
        let key = Key::parse("C", "major").unwrap();
        let map = build_progression_map(key);
        let reading = tension_between(
            map.node_by_symbol("G").unwrap(),
            map.node_by_symbol("C").unwrap(),
            &key,
            2,
        );
        assert_eq!(reading.level, 0.0);
        assert!(close(reading.delta, -0.7));
        assert!(close(reading.arc_bonus, 0.14));
    }
}
