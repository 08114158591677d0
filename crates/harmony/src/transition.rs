use crate::chord::{Chord, ChordQuality};
use crate::note;

/// Edges weaker than this are not materialized in a progression map.
pub const EDGE_THRESHOLD: f64 = 0.2;

const DESCENDING_FIFTH: f64 = 0.35;
const ASCENDING_FIFTH: f64 = 0.25;
const SHARED_TONE: f64 = 0.12;
const DOMINANT_RESOLUTION: f64 = 0.25;
const DIMINISHED_RESOLUTION: f64 = 0.3;
const SUBDOMINANT_TO_DOMINANT: f64 = 0.18;
const RELATIVE_MOTION: f64 = 0.15;
const STEP_MOTION: f64 = 0.08;
const MODAL_INTERCHANGE: f64 = 0.12;
const CHROMATIC_APPROACH: f64 = 0.1;

/// How natural a move from `from` to `to` sounds, in [0, 1].
///
/// A weighted sum of root-motion, common-tone, and resolution bonuses,
/// clamped at 1.0. Hybrid scoring relies on these exact weights.
pub fn calculate_transition_strength(from: &Chord, to: &Chord) -> f64 {
    let interval = note::interval_between(from.root, to.root);
    let mut strength = 0.0;

    match interval {
        5 => strength += DESCENDING_FIFTH,
        7 => strength += ASCENDING_FIFTH,
        _ => {}
    }

    strength += SHARED_TONE * from.shared_tones(to) as f64;

    if interval == 5 && matches!(from.quality, ChordQuality::Major | ChordQuality::Dominant7) {
        strength += DOMINANT_RESOLUTION;
    }

    if from.quality.is_diminished() && interval == 1 {
        strength += DIMINISHED_RESOLUTION;
    }

    if from.quality == ChordQuality::Major && to.quality == ChordQuality::Major && interval == 2 {
        strength += SUBDOMINANT_TO_DOMINANT;
    }

    if from.quality == ChordQuality::Minor && to.quality == ChordQuality::Major && interval == 3 {
        strength += RELATIVE_MOTION;
    }

    if matches!(interval, 1 | 2 | 10 | 11) {
        strength += STEP_MOTION;
    }

    if interval == 0 && from.quality != to.quality {
        strength += MODAL_INTERCHANGE;
    }

    if interval == 1 {
        strength += CHROMATIC_APPROACH;
    }

    strength.min(1.0)
}
