//! Per-genre canonical/spicy split of hybrid candidates.

use serde::{Deserialize, Serialize};

use crate::hybrid::HybridCandidate;

/// Summary of candidates' corpus frequencies for one genre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyDistribution {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
}

/// Relative rarity of a frequency within a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RarityLabel {
    Common,
    Typical,
    Rare,
}

impl std::fmt::Display for RarityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RarityLabel::Common => write!(f, "common"),
            RarityLabel::Typical => write!(f, "typical"),
            RarityLabel::Rare => write!(f, "rare"),
        }
    }
}

/// Linear-interpolated percentile of sorted values, `q` in [0, 1].
fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

fn sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.into_iter().collect();
    v.sort_by(f64::total_cmp);
    v
}

impl FrequencyDistribution {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let v = sorted(values.iter().copied());
        Self {
            min: v[0],
            max: v[v.len() - 1],
            mean: v.iter().sum::<f64>() / v.len() as f64,
            median: percentile(&v, 0.5),
            p25: percentile(&v, 0.25),
            p75: percentile(&v, 0.75),
        }
    }

    pub fn rarity(&self, frequency: f64) -> RarityLabel {
        if frequency >= self.p75 {
            RarityLabel::Common
        } else if frequency < self.p25 {
            RarityLabel::Rare
        } else {
            RarityLabel::Typical
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenreCandidates {
    pub genre: String,
    /// Markov order the recommender answered with, 0 for none.
    pub order_used: u8,
    pub canonical: Vec<HybridCandidate>,
    pub spicy: Vec<HybridCandidate>,
    pub distribution: FrequencyDistribution,
}

impl GenreCandidates {
    pub fn all(&self) -> impl Iterator<Item = &HybridCandidate> {
        self.canonical.iter().chain(self.spicy.iter())
    }

    pub fn rarity(&self, candidate: &HybridCandidate) -> RarityLabel {
        self.distribution.rarity(candidate.frequency())
    }
}

/// Split hybrid candidates at the median probability.
///
/// Candidates at or above the median are canonical; the rest are spicy.
/// Input order (hybrid rank) is preserved within each bucket.
pub fn categorize(
    genre: impl Into<String>,
    candidates: Vec<HybridCandidate>,
    order_used: u8,
) -> GenreCandidates {
    let distribution = FrequencyDistribution::from_values(
        &candidates.iter().map(|c| c.frequency()).collect::<Vec<_>>(),
    );
    let median_probability = percentile(&sorted(candidates.iter().map(|c| c.probability())), 0.5);

    let (canonical, spicy): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| c.probability() >= median_probability);

    GenreCandidates {
        genre: genre.into(),
        order_used,
        canonical,
        spicy,
        distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{ScoreBreakdown, StatisticalScore};
    use crate::color::ColorClass;
    use harmony::{build_progression_map, Key};
    use pretty_assertions::assert_eq;

    fn candidate(symbol: &str, probability: f64, frequency: f64) -> HybridCandidate {
        let map = build_progression_map(Key::parse("C", "major").unwrap());
        let node = map.node_by_symbol(symbol).unwrap().clone();
        HybridCandidate {
            node,
            breakdown: ScoreBreakdown {
                pattern_raw: 0.0,
                pattern_normalized: 0.0,
                pattern_confidence: 0.0,
                transition_strength: 0.5,
                color: ColorClass::Diatonic,
                harmonic_distance: 0.0,
                tension_level: 0.0,
                tension_delta: 0.0,
                tension_arc_bonus: 0.0,
                pattern_weight: 0.5,
                transition_weight: 0.5,
                color_bonus: 0.3,
                total: 0.65,
                matched_patterns: Vec::new(),
                statistical: Some(StatisticalScore {
                    probability,
                    frequency,
                    friction: 0.0,
                    contextual: 0.0,
                    hybrid: probability,
                    attested: true,
                }),
            },
            synthetic: false,
        }
    }

    #[test]
    fn percentiles_interpolate() {
        let d = FrequencyDistribution::from_values(&[0.4, 0.1, 0.3, 0.2]);
        assert_eq!(d.min, 0.1);
        assert_eq!(d.max, 0.4);
        assert!((d.mean - 0.25).abs() < 1e-12);
        assert!((d.median - 0.25).abs() < 1e-12);
        assert!((d.p25 - 0.175).abs() < 1e-12);
        assert!((d.p75 - 0.325).abs() < 1e-12);
    }

    #[test]
    fn split_at_median_probability() {
        let out = categorize(
            "pop",
            vec![
                candidate("G", 0.5, 0.3),
                candidate("F", 0.3, 0.2),
                candidate("Am", 0.1, 0.05),
                candidate("Em", 0.05, 0.01),
            ],
            1,
        );
        let ids = |v: &[HybridCandidate]| v.iter().map(|c| c.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids(&out.canonical), vec!["G", "F"]);
        assert_eq!(ids(&out.spicy), vec!["Am", "Em"]);
        assert_eq!(out.genre, "pop");
    }

    #[test]
    fn single_candidate_is_canonical() {
        let out = categorize("jazz", vec![candidate("Dm", 0.2, 0.1)], 2);
        assert_eq!(out.canonical.len(), 1);
        assert!(out.spicy.is_empty());
        assert_eq!(out.distribution.median, 0.1);
    }

    #[test]
    fn empty_input() {
        let out = categorize("rock", Vec::new(), 0);
        assert!(out.all().next().is_none());
        assert_eq!(out.distribution, FrequencyDistribution::default());
    }

    #[test]
    fn rarity_labels() {
        let d = FrequencyDistribution::from_values(&[0.4, 0.1, 0.3, 0.2]);
        assert_eq!(d.rarity(0.4), RarityLabel::Common);
        assert_eq!(d.rarity(0.25), RarityLabel::Typical);
        assert_eq!(d.rarity(0.1), RarityLabel::Rare);
    }
}
