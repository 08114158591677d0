//! Candidate scorer: every heuristic signal for one move, combined into an
//! explainable breakdown.

use std::collections::{BTreeMap, HashSet};

use harmony::{
    calculate_transition_strength, ChordId, Key, NodeLookup, ProgressionMap, ProgressionNode,
    EDGE_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::color::{classify_color, ColorClass};
use crate::distance::harmonic_distance;
use crate::pattern::{degree_sequence, match_degrees};
use crate::tension::tension_between;

const DISTANCE_WEIGHT: f64 = 0.1;
const ARC_WEIGHT: f64 = 0.15;

/// Corpus-derived figures attached by the hybrid scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalScore {
    /// Corpus probability, or the estimate used when the corpus has none.
    pub probability: f64,
    pub frequency: f64,
    pub friction: f64,
    /// Boost from matched n-gram patterns or higher-order context.
    pub contextual: f64,
    pub hybrid: f64,
    /// False when probability and friction are fallback estimates.
    pub attested: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub pattern_raw: f64,
    pub pattern_normalized: f64,
    pub pattern_confidence: f64,
    pub transition_strength: f64,
    pub color: ColorClass,
    pub harmonic_distance: f64,
    pub tension_level: f64,
    pub tension_delta: f64,
    pub tension_arc_bonus: f64,
    pub pattern_weight: f64,
    pub transition_weight: f64,
    pub color_bonus: f64,
    pub total: f64,
    pub matched_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistical: Option<StatisticalScore>,
}

impl ScoreBreakdown {
    /// Sum of the weighted sub-scores; `total` always equals this.
    pub fn weighted_sum(&self) -> f64 {
        self.pattern_normalized * self.pattern_weight
            + self.transition_strength * self.transition_weight
            + self.color_bonus
            + (1.0 / (1.0 + self.harmonic_distance)) * DISTANCE_WEIGHT
            + self.tension_arc_bonus * ARC_WEIGHT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub node: ProgressionNode,
    pub breakdown: ScoreBreakdown,
}

impl ScoredCandidate {
    pub fn id(&self) -> &ChordId {
        &self.node.id
    }

    pub fn total(&self) -> f64 {
        self.breakdown.total
    }
}

/// Score one move from `current` to `candidate`.
///
/// `path` is the progression so far, ending at `current`; the candidate is
/// appended for pattern matching.
pub fn score_transition<L: NodeLookup + ?Sized>(
    key: &Key,
    lookup: &L,
    current: &ProgressionNode,
    candidate: &ProgressionNode,
    strength: f64,
    path: &[ChordId],
) -> ScoreBreakdown {
    let mut degrees = degree_sequence(path, lookup);
    degrees.push(candidate.roman.base_degree());
    let pattern = match_degrees(&degrees);

    let color = classify_color(candidate, key);
    let weights = color.weights();
    let distance = harmonic_distance(&candidate.chord, key);
    let tension = tension_between(current, candidate, key, path.len());

    let mut breakdown = ScoreBreakdown {
        pattern_raw: pattern.raw,
        pattern_normalized: pattern.normalized,
        pattern_confidence: pattern.confidence,
        transition_strength: strength,
        color,
        harmonic_distance: distance,
        tension_level: tension.level,
        tension_delta: tension.delta,
        tension_arc_bonus: tension.arc_bonus,
        pattern_weight: weights.pattern,
        transition_weight: weights.transition,
        color_bonus: weights.color_bonus,
        total: 0.0,
        matched_patterns: pattern.matched,
        statistical: None,
    };
    breakdown.total = breakdown.weighted_sum();
    breakdown
}

/// Outgoing moves from a node: the map's edges when the node belongs to the
/// map, otherwise strengths computed against every map node.
fn outgoing(map: &ProgressionMap, current: &ProgressionNode) -> Vec<(ChordId, f64)> {
    if let Some(native) = map.node_for_chord(&current.chord) {
        return map
            .edges_from(&native.id)
            .map(|e| (e.to.clone(), e.strength))
            .collect();
    }

    map.nodes
        .iter()
        .filter(|n| n.chord != current.chord)
        .filter_map(|n| {
            let strength = calculate_transition_strength(&current.chord, &n.chord);
            (strength >= EDGE_THRESHOLD).then(|| (n.id.clone(), strength))
        })
        .collect()
}

/// Score every map candidate reachable from `current`.
///
/// Sorted by total descending, ties by chord id; each destination appears
/// once with its best score.
pub fn score_candidates<L: NodeLookup + ?Sized>(
    map: &ProgressionMap,
    lookup: &L,
    current: &ChordId,
    path: &[ChordId],
) -> Vec<ScoredCandidate> {
    let Some(current_node) = lookup.lookup(current) else {
        warn!(chord = %current, "cannot score candidates for unknown chord");
        return Vec::new();
    };

    let mut candidates: Vec<ScoredCandidate> = outgoing(map, current_node)
        .into_iter()
        .filter_map(|(to, strength)| {
            let node = map.node(&to)?;
            let breakdown = score_transition(&map.key, lookup, current_node, node, strength, path);
            Some(ScoredCandidate {
                node: node.clone(),
                breakdown,
            })
        })
        .collect();

    sort_candidates(&mut candidates);

    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.node.id.clone()));

    debug!(
        chord = %current,
        path_len = path.len(),
        candidates = candidates.len(),
        "scored harmonic candidates"
    );
    candidates
}

pub(crate) fn sort_candidates(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| {
        b.total()
            .total_cmp(&a.total())
            .then_with(|| a.node.id.cmp(&b.node.id))
    });
}

/// Candidates grouped by color class, each group keeping score order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedCandidates {
    pub groups: BTreeMap<ColorClass, Vec<ScoredCandidate>>,
}

impl CategorizedCandidates {
    pub fn get(&self, color: ColorClass) -> &[ScoredCandidate] {
        self.groups.get(&color).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn group_by_color(candidates: &[ScoredCandidate]) -> CategorizedCandidates {
    let mut groups: BTreeMap<ColorClass, Vec<ScoredCandidate>> = BTreeMap::new();
    for candidate in candidates {
        groups
            .entry(candidate.breakdown.color)
            .or_default()
            .push(candidate.clone());
    }
    CategorizedCandidates { groups }
}
