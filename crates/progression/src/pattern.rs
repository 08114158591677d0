//! Matching a path's degree sequence against well-known progressions.
//!
//! The last 5, 3 and 2 degrees of the path are compared against every
//! template, both as the template's opening (prefix) and anywhere inside
//! it (contained). Each template contributes only its single best match,
//! so a path that fits one template several ways is not over-counted.

use harmony::{ChordId, NodeLookup};
use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;
const PREFIX_MULTIPLIER: f64 = 1.0;
const CONTAINED_MULTIPLIER: f64 = 0.55;

/// Window sizes and their weights, longest first.
const WINDOWS: [(usize, f64); 3] = [(5, 1.0), (3, 0.6), (2, 0.3)];

/// A named progression as scale degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionTemplate {
    pub name: &'static str,
    pub degrees: &'static [u8],
}

pub const TEMPLATES: &[ProgressionTemplate] = &[
    ProgressionTemplate { name: "I-IV-V-I", degrees: &[1, 4, 5, 1] },
    ProgressionTemplate { name: "ii-V-I", degrees: &[2, 5, 1] },
    ProgressionTemplate { name: "I-V-vi-IV", degrees: &[1, 5, 6, 4] },
    ProgressionTemplate { name: "vi-IV-I-V", degrees: &[6, 4, 1, 5] },
    ProgressionTemplate { name: "I-vi-IV-V", degrees: &[1, 6, 4, 5] },
    ProgressionTemplate { name: "I-IV-vi-V", degrees: &[1, 4, 6, 5] },
    ProgressionTemplate {
        name: "12-bar blues",
        degrees: &[1, 1, 1, 1, 4, 4, 1, 1, 5, 4, 1, 5],
    },
    ProgressionTemplate { name: "Pachelbel", degrees: &[1, 5, 6, 3, 4, 1, 4, 5] },
    ProgressionTemplate { name: "Andalusian", degrees: &[1, 7, 6, 5] },
    ProgressionTemplate { name: "circle of fifths", degrees: &[6, 2, 5, 1] },
    ProgressionTemplate { name: "I-vi-ii-V", degrees: &[1, 6, 2, 5] },
    ProgressionTemplate { name: "iii-vi-ii-V", degrees: &[3, 6, 2, 5] },
    ProgressionTemplate { name: "I-bVII-IV", degrees: &[1, 7, 4] },
    ProgressionTemplate { name: "plagal", degrees: &[4, 1] },
    ProgressionTemplate { name: "authentic", degrees: &[5, 1] },
    ProgressionTemplate { name: "deceptive", degrees: &[5, 6] },
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    /// Sum of per-template best scores.
    pub raw: f64,
    /// Saturating normalization of `raw`, in [0, 1).
    pub normalized: f64,
    /// Share of `raw` contributed by the best template.
    pub confidence: f64,
    /// Templates that matched, best first.
    pub matched: Vec<String>,
}

impl PatternMatch {
    pub fn is_match(&self) -> bool {
        self.raw > 0.0
    }
}

/// Scale degrees of a path, read from each node's roman numeral.
///
/// Applied chords count as their base degree (V/V is 5). Ids the lookup
/// cannot resolve are skipped.
pub fn degree_sequence<L: NodeLookup + ?Sized>(path: &[ChordId], lookup: &L) -> Vec<u8> {
    path.iter()
        .filter_map(|id| lookup.lookup(id))
        .map(|node| node.roman.base_degree())
        .collect()
}

/// Best score of one window against one template, 0.0 if it does not fit.
fn window_score(window: &[u8], template: &ProgressionTemplate, weight: f64) -> f64 {
    let degrees = template.degrees;
    if window.len() > degrees.len() {
        return 0.0;
    }
    if degrees.starts_with(window) {
        return weight * PREFIX_MULTIPLIER;
    }
    if degrees.windows(window.len()).any(|slice| slice == window) {
        return weight * CONTAINED_MULTIPLIER;
    }
    0.0
}

/// Match a degree sequence against every template.
pub fn match_degrees(degrees: &[u8]) -> PatternMatch {
    let mut scored: Vec<(&'static str, f64)> = Vec::new();

    for template in TEMPLATES {
        let best = WINDOWS
            .iter()
            .filter(|(size, _)| degrees.len() >= *size)
            .map(|(size, weight)| window_score(&degrees[degrees.len() - size..], template, *weight))
            .fold(0.0, f64::max);
        if best > 0.0 {
            scored.push((template.name, best));
        }
    }

    if scored.is_empty() {
        return PatternMatch::default();
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let raw: f64 = scored.iter().map(|(_, s)| s).sum();
    let best = scored[0].1;
    let confidence = best / (raw + EPSILON);
    let normalized = 1.0 - (-raw * confidence).exp();

    PatternMatch {
        raw,
        normalized,
        confidence,
        matched: scored.into_iter().map(|(name, _)| name.to_string()).collect(),
    }
}

/// Match the degree sequence of a path of chord ids.
pub fn match_path<L: NodeLookup + ?Sized>(path: &[ChordId], lookup: &L) -> PatternMatch {
    match_degrees(&degree_sequence(path, lookup))
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony::{build_progression_map, Key, ProgressionMap};

    fn c_major() -> ProgressionMap {
        build_progression_map(Key::parse("C", "major").unwrap())
    }

    fn ids(symbols: &[&str]) -> Vec<ChordId> {
        symbols.iter().map(|s| ChordId::from(*s)).collect()
    }

    #[test]
    fn single_chord_is_too_short() {
        let result = match_path(&ids(&["C"]), &c_major());
        assert!(!result.is_match());
        assert_eq!(result, PatternMatch::default());
    }

    #[test]
    fn two_chords_match_as_prefix() {
        let result = match_path(&ids(&["C", "F"]), &c_major());
        assert!(result.matched.iter().any(|n| n == "I-IV-V-I"));
        // prefix of I-IV-V-I and I-IV-vi-V, contained in the blues
        assert!(result.raw >= 0.3 * 2.0);
        assert!(result.normalized > 0.0 && result.normalized < 1.0);
    }

    #[test]
    fn empty_path_is_all_zero() {
        assert_eq!(match_degrees(&[]), PatternMatch::default());
    }

    #[test]
    fn secondary_dominant_reads_as_five() {
        // D7 is V/V: degree 5, so C -> D7 looks like I -> V
        let map = c_major();
        assert_eq!(degree_sequence(&ids(&["C", "D7"]), &map), vec![1, 5]);
        let result = match_path(&ids(&["C", "D7"]), &map);
        assert!(result.matched.iter().any(|n| n == "I-V-vi-IV"));
    }

    #[test]
    fn per_template_best_only() {
        // ii-V-I matches as a 3-window prefix (0.6) and the 2-window [5,1]
        // is contained (0.3 * 0.55); only 0.6 counts for ii-V-I
        let result = match_degrees(&[2, 5, 1]);
        assert_eq!(result.matched[0], "ii-V-I");
        let ii_v_i = window_score(&[2, 5, 1], &TEMPLATES[1], 0.6);
        assert_eq!(ii_v_i, 0.6);
        let expected_raw = 0.6 * 0.55 // circle of fifths: [2,5,1] contained
            + 0.6 // ii-V-I prefix
            + 0.3 * 0.55 // I-IV-V-I contains [5,1]
            + 0.3; // authentic prefix [5,1]
        assert!((result.raw - expected_raw).abs() < 1e-9, "raw {}", result.raw);
    }

    #[test]
    fn confidence_is_share_of_best() {
        let result = match_degrees(&[5, 6]);
        // deceptive prefix 0.3, I-V-vi-IV and Pachelbel contain [5,6]
        assert!((result.raw - (0.3 + 0.165 + 0.165)).abs() < 1e-9);
        assert!((result.confidence - 0.3 / result.raw).abs() < 1e-6);
        assert_eq!(result.matched[0], "deceptive");
    }
}
