//! Hybrid scoring: harmonic candidates blended with corpus statistics.
//!
//! Every harmonic candidate survives. Candidates the corpus has never seen
//! after the current chord get an estimated probability capped well below
//! any attested one, so they rank after attested moves of similar harmonic
//! quality. Chords the corpus suggests but the map cannot reach are
//! inferred into synthetic candidates.

use std::collections::HashSet;

use chordstats::notation::parse_corpus_symbol;
use chordstats::{ChordPattern, RecommendationSet, StatRecommendation};
use harmony::{
    calculate_transition_strength, infer_node, Chord, ChordId, Key, NodeLookup, ProgressionNode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidate::{score_transition, ScoreBreakdown, ScoredCandidate, StatisticalScore};

/// Weight of an n-gram match by the length of the path suffix it matched.
fn pattern_confidence(prefix_len: usize) -> f64 {
    match prefix_len {
        3 => 1.0,
        2 => 0.6,
        1 => 0.2,
        _ => 0.0,
    }
}

/// Weight of the Markov probability as context when no pattern matched.
fn order_confidence(order: u8) -> f64 {
    match order {
        3 => 1.0,
        2 => 0.7,
        _ => 0.0,
    }
}

/// Blend weights for the hybrid score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridWeights {
    pub statistical: f64,
    pub harmonic: f64,
    pub voice_leading: f64,
    pub friction: f64,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            statistical: 0.4,
            harmonic: 0.3,
            voice_leading: 0.2,
            friction: 0.1,
        }
    }
}

/// Stand-in figures for candidates without corpus data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    pub estimated_probability_cap: f64,
    pub neutral_friction: f64,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            estimated_probability_cap: 0.01,
            neutral_friction: 0.5,
        }
    }
}

/// One genre's corpus view of the current position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalContext {
    pub recommendations: RecommendationSet,
    /// Patterns found per matched suffix length (1..=3).
    pub patterns: Vec<(usize, Vec<ChordPattern>)>,
}

impl StatisticalContext {
    fn recommendation_for(&self, chord: &Chord) -> Option<&StatRecommendation> {
        self.recommendations
            .recommendations
            .iter()
            .find(|r| parse_corpus_symbol(&r.chord).as_ref() == Some(chord))
    }

    /// Sum of pattern frequencies whose next chord is `chord`.
    fn pattern_boost(&self, chord: &Chord) -> f64 {
        self.patterns
            .iter()
            .map(|(prefix_len, patterns)| {
                let weight = pattern_confidence(*prefix_len);
                patterns
                    .iter()
                    .filter(|p| {
                        p.chords
                            .get(*prefix_len)
                            .and_then(|next| parse_corpus_symbol(next))
                            .as_ref()
                            == Some(chord)
                    })
                    .map(|p| p.frequency * weight)
                    .sum::<f64>()
            })
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridCandidate {
    pub node: ProgressionNode,
    pub breakdown: ScoreBreakdown,
    /// Suggested by the corpus only; not reachable through the map.
    pub synthetic: bool,
}

impl HybridCandidate {
    pub fn id(&self) -> &ChordId {
        &self.node.id
    }

    fn stats(&self) -> Option<&StatisticalScore> {
        self.breakdown.statistical.as_ref()
    }

    pub fn hybrid_score(&self) -> f64 {
        self.stats().map(|s| s.hybrid).unwrap_or(0.0)
    }

    pub fn contextual(&self) -> f64 {
        self.stats().map(|s| s.contextual).unwrap_or(0.0)
    }

    pub fn probability(&self) -> f64 {
        self.stats().map(|s| s.probability).unwrap_or(0.0)
    }

    pub fn frequency(&self) -> f64 {
        self.stats().map(|s| s.frequency).unwrap_or(0.0)
    }
}

/// The blended score itself.
pub fn hybrid_score(
    probability: f64,
    harmonic_total: f64,
    strength: f64,
    friction: f64,
    weights: &HybridWeights,
) -> f64 {
    probability * weights.statistical
        + harmonic_norm(harmonic_total) * weights.harmonic
        + strength * weights.voice_leading
        + (1.0 - friction) * weights.friction
}

fn harmonic_norm(total: f64) -> f64 {
    (total / 2.0).min(1.0)
}

fn enrich(
    breakdown: &mut ScoreBreakdown,
    chord: &Chord,
    stats: &StatisticalContext,
    weights: &HybridWeights,
    fallback: &FallbackPolicy,
) {
    let rec = stats.recommendation_for(chord);
    let (probability, frequency, friction) = match rec {
        Some(r) => (r.probability, r.frequency, r.friction),
        None => (
            harmonic_norm(breakdown.total) * fallback.estimated_probability_cap,
            0.0,
            fallback.neutral_friction,
        ),
    };

    let mut contextual = stats.pattern_boost(chord);
    if contextual == 0.0 {
        if let Some(r) = rec {
            contextual = r.probability * order_confidence(stats.recommendations.order_used);
        }
    }

    let hybrid = hybrid_score(
        probability,
        breakdown.total,
        breakdown.transition_strength,
        friction,
        weights,
    );

    breakdown.statistical = Some(StatisticalScore {
        probability,
        frequency,
        friction,
        contextual,
        hybrid,
        attested: rec.is_some(),
    });
}

/// Blend one genre's statistics into the harmonic candidates of `current`.
///
/// Output is sorted by hybrid score descending, then contextual score
/// descending, then chord id.
#[allow(clippy::too_many_arguments)]
pub fn score_hybrid<L: NodeLookup + ?Sized>(
    key: &Key,
    lookup: &L,
    current: &ProgressionNode,
    path: &[ChordId],
    harmonic: &[ScoredCandidate],
    stats: &StatisticalContext,
    weights: &HybridWeights,
    fallback: &FallbackPolicy,
) -> Vec<HybridCandidate> {
    let mut out: Vec<HybridCandidate> = harmonic
        .iter()
        .map(|c| {
            let mut breakdown = c.breakdown.clone();
            enrich(&mut breakdown, &c.node.chord, stats, weights, fallback);
            HybridCandidate {
                node: c.node.clone(),
                breakdown,
                synthetic: false,
            }
        })
        .collect();

    let mut present: HashSet<Chord> = harmonic.iter().map(|c| c.node.chord).collect();
    present.insert(current.chord);

    for rec in &stats.recommendations.recommendations {
        let Some(chord) = parse_corpus_symbol(&rec.chord) else {
            debug!(symbol = %rec.chord, "skipping unparseable corpus chord");
            continue;
        };
        if !present.insert(chord) {
            continue;
        }

        let id = ChordId::for_chord(&chord, key.spelling());
        let node = lookup
            .lookup(&id)
            .cloned()
            .unwrap_or_else(|| infer_node(&chord, key));
        let strength = calculate_transition_strength(&current.chord, &chord);
        let mut breakdown = score_transition(key, lookup, current, &node, strength, path);
        enrich(&mut breakdown, &chord, stats, weights, fallback);
        out.push(HybridCandidate {
            node,
            breakdown,
            synthetic: true,
        });
    }

    out.sort_by(|a, b| {
        b.hybrid_score()
            .total_cmp(&a.hybrid_score())
            .then_with(|| b.contextual().total_cmp(&a.contextual()))
            .then_with(|| a.node.id.cmp(&b.node.id))
    });
    out
}
