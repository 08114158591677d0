//! Trained corpus model: multi-order Markov transitions and n-gram patterns.
//!
//! Loaded from the JSON files exported by the corpus pipeline:
//! - `markov_model.json`: `{transitions, bigram_transitions,
//!   trigram_transitions, chord_frequencies, genre_totals}`, where each
//!   transition table is `genre -> context -> next chord -> probability`
//!   and higher-order contexts are chords joined by `|`.
//! - `patterns.json` (optional): `genre -> length -> [pattern]`.
//!
//! Queries back off from the most specific context (order 3) to the
//! current chord alone (order 1).

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::notation;
use crate::{
    ChordPattern, RecommendationSet, Result, StatRecommendation, StatisticalRecommender,
    StatsError,
};

const MARKOV_FILE: &str = "markov_model.json";
const PATTERNS_FILE: &str = "patterns.json";

/// Separator for higher-order context keys ("G|Am").
const CONTEXT_SEP: &str = "|";

/// Transitions below this probability are not recommended.
const MIN_PROBABILITY: f64 = 0.001;

/// Frequency scaling for friction: a chord at 10% of a genre is frictionless.
const FRICTION_SENSITIVITY: f64 = 10.0;

/// context -> next chord -> probability
type ContextTable = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Debug, Clone, Default, Deserialize)]
struct MarkovTables {
    transitions: BTreeMap<String, ContextTable>,
    #[serde(default)]
    bigram_transitions: BTreeMap<String, ContextTable>,
    #[serde(default)]
    trigram_transitions: BTreeMap<String, ContextTable>,
    #[serde(default)]
    chord_frequencies: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    genre_totals: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct PatternEntry {
    chords: Vec<String>,
    #[serde(default)]
    count: u64,
    frequency: f64,
}

/// genre -> pattern length -> patterns
type PatternTable = BTreeMap<String, BTreeMap<usize, Vec<ChordPattern>>>;

/// Read-only view of the trained corpus model.
#[derive(Debug, Clone, Default)]
pub struct CorpusModel {
    markov: MarkovTables,
    patterns: PatternTable,
}

impl CorpusModel {
    /// Load `markov_model.json` and, if present, `patterns.json` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let markov_path = dir.join(MARKOV_FILE);
        if !markov_path.exists() {
            return Err(StatsError::MissingModel(markov_path));
        }

        let markov: MarkovTables = read_json(&markov_path)?;

        let patterns_path = dir.join(PATTERNS_FILE);
        let patterns = if patterns_path.exists() {
            let raw: BTreeMap<String, BTreeMap<String, Vec<PatternEntry>>> =
                read_json(&patterns_path)?;
            pattern_table(raw)
        } else {
            warn!(path = %patterns_path.display(), "patterns not found, pattern matching disabled");
            PatternTable::new()
        };

        let model = Self { markov, patterns };
        info!(
            dir = %dir.display(),
            genres = model.markov.transitions.len(),
            pattern_genres = model.patterns.len(),
            "loaded corpus model"
        );
        Ok(model)
    }

    /// Build from JSON strings (the same shapes as the files on disk).
    pub fn from_json(markov: &str, patterns: Option<&str>) -> serde_json::Result<Self> {
        let markov: MarkovTables = serde_json::from_str(markov)?;
        let patterns = match patterns {
            Some(raw) => pattern_table(serde_json::from_str(raw)?),
            None => PatternTable::new(),
        };
        Ok(Self { markov, patterns })
    }

    pub fn genre_names(&self) -> Vec<String> {
        self.markov.transitions.keys().cloned().collect()
    }

    /// Number of progressions the genre was trained on.
    pub fn genre_total(&self, genre: &str) -> Option<u64> {
        self.markov.genre_totals.get(genre).copied()
    }

    /// Relative frequency of a chord in a genre, 0.0 when unseen.
    pub fn chord_frequency(&self, chord: &str, genre: &str) -> f64 {
        let Some(table) = self.markov.chord_frequencies.get(genre) else {
            return 0.0;
        };
        table
            .get(chord)
            .or_else(|| notation::alternate_spelling(chord).and_then(|alt| table.get(&alt)))
            .copied()
            .unwrap_or(0.0)
    }

    /// Rarity of a chord in a genre: 0.0 very common, 1.0 unseen.
    pub fn friction(&self, chord: &str, genre: &str) -> f64 {
        let frequency = self.chord_frequency(chord, genre);
        if frequency == 0.0 {
            return 1.0;
        }
        1.0 - (frequency * FRICTION_SENSITIVITY).min(1.0)
    }

    /// Next-chord recommendations with trigram -> bigram -> unigram backoff.
    pub fn recommend(
        &self,
        from: &str,
        genre: &str,
        top_n: usize,
        context: &[String],
    ) -> RecommendationSet {
        let Some((table, order_used)) = self.backoff_table(from, genre, context) else {
            debug!(from, genre, "no transitions for chord");
            return RecommendationSet::default();
        };

        let mut recommendations: Vec<StatRecommendation> = table
            .iter()
            .filter(|(_, &p)| p >= MIN_PROBABILITY)
            .map(|(chord, &probability)| StatRecommendation {
                chord: chord.clone(),
                probability,
                frequency: self.chord_frequency(chord, genre),
                friction: self.friction(chord, genre),
            })
            .collect();

        recommendations.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then_with(|| a.chord.cmp(&b.chord))
        });
        recommendations.truncate(top_n);

        RecommendationSet {
            recommendations,
            order_used,
        }
    }

    fn backoff_table(
        &self,
        from: &str,
        genre: &str,
        context: &[String],
    ) -> Option<(&BTreeMap<String, f64>, u8)> {
        let spellings: Vec<String> = std::iter::once(from.to_string())
            .chain(notation::alternate_spelling(from))
            .collect();

        for current in &spellings {
            if context.len() >= 2 {
                let key = [
                    context[context.len() - 2].as_str(),
                    context[context.len() - 1].as_str(),
                    current.as_str(),
                ]
                .join(CONTEXT_SEP);
                if let Some(table) = lookup(&self.markov.trigram_transitions, genre, &key) {
                    return Some((table, 3));
                }
            }

            if let Some(previous) = context.last() {
                let key = [previous.as_str(), current.as_str()].join(CONTEXT_SEP);
                if let Some(table) = lookup(&self.markov.bigram_transitions, genre, &key) {
                    return Some((table, 2));
                }
            }
        }

        spellings
            .iter()
            .find_map(|current| lookup(&self.markov.transitions, genre, current))
            .map(|table| (table, 1))
    }

    /// Patterns starting with `prefix`, of length `prefix.len()..=max_length`,
    /// most frequent first.
    pub fn patterns_with_prefix(
        &self,
        prefix: &[String],
        genre: &str,
        max_length: usize,
    ) -> Vec<ChordPattern> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let Some(by_length) = self.patterns.get(genre) else {
            return Vec::new();
        };

        let mut matches: Vec<ChordPattern> = by_length
            .range(prefix.len()..=max_length.max(prefix.len()))
            .flat_map(|(_, patterns)| patterns.iter())
            .filter(|p| p.chords.starts_with(prefix))
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            b.frequency
                .total_cmp(&a.frequency)
                .then_with(|| a.chords.cmp(&b.chords))
        });
        matches
    }
}

fn lookup<'a>(
    tables: &'a BTreeMap<String, ContextTable>,
    genre: &str,
    key: &str,
) -> Option<&'a BTreeMap<String, f64>> {
    tables.get(genre).and_then(|contexts| contexts.get(key))
}

fn pattern_table(raw: BTreeMap<String, BTreeMap<String, Vec<PatternEntry>>>) -> PatternTable {
    let mut table = PatternTable::new();
    for (genre, lengths) in raw {
        for (length, entries) in lengths {
            let Ok(length) = length.parse::<usize>() else {
                warn!(genre = %genre, length = %length, "skipping pattern group with bad length");
                continue;
            };
            table.entry(genre.clone()).or_default().entry(length).or_default().extend(
                entries.into_iter().map(|e| ChordPattern {
                    chords: e.chords,
                    count: e.count,
                    frequency: e.frequency,
                }),
            );
        }
    }
    table
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path).map_err(|source| StatsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| StatsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl StatisticalRecommender for CorpusModel {
    async fn genres(&self) -> Result<Vec<String>> {
        Ok(self.genre_names())
    }

    async fn recommendations(
        &self,
        from: &str,
        genre: &str,
        top_n: usize,
        context: &[String],
    ) -> Result<RecommendationSet> {
        Ok(self.recommend(from, genre, top_n, context))
    }

    async fn find_patterns(
        &self,
        prefix: &[String],
        genre: &str,
        max_length: usize,
    ) -> Result<Vec<ChordPattern>> {
        Ok(self.patterns_with_prefix(prefix, genre, max_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MARKOV: &str = r#"{
        "transitions": {
            "pop": {
                "C": {"G": 0.5, "Am": 0.3, "F": 0.1999, "Db": 0.0005},
                "G": {"Am": 0.6, "C": 0.4},
                "C#m": {"A": 1.0}
            },
            "rock": {
                "C": {"F": 0.7, "Bb": 0.3}
            }
        },
        "bigram_transitions": {
            "pop": {"F|C": {"G": 0.9, "F": 0.1}}
        },
        "trigram_transitions": {
            "pop": {"Am|F|C": {"G": 1.0}}
        },
        "chord_frequencies": {
            "pop": {"C": 0.3, "G": 0.25, "Am": 0.05, "F": 0.2}
        },
        "genre_totals": {"pop": 1200, "rock": 1000}
    }"#;

    const PATTERNS: &str = r#"{
        "pop": {
            "2": [{"chords": ["C", "G"], "count": 40, "frequency": 0.04, "genre": "pop"}],
            "3": [
                {"chords": ["C", "G", "Am"], "count": 30, "frequency": 0.03, "genre": "pop"},
                {"chords": ["F", "C", "G"], "count": 50, "frequency": 0.05, "genre": "pop"}
            ],
            "4": [{"chords": ["C", "G", "Am", "F"], "count": 60, "frequency": 0.06, "genre": "pop"}]
        }
    }"#;

    fn model() -> CorpusModel {
        CorpusModel::from_json(MARKOV, Some(PATTERNS)).unwrap()
    }

    #[test]
    fn unigram_recommendations_sorted_and_filtered() {
        let set = model().recommend("C", "pop", 10, &[]);
        assert_eq!(set.order_used, 1);
        let chords: Vec<_> = set.recommendations.iter().map(|r| r.chord.as_str()).collect();
        // Db is below the minimum probability
        assert_eq!(chords, vec!["G", "Am", "F"]);
        assert_eq!(set.recommendations[0].frequency, 0.25);
    }

    #[test]
    fn backoff_prefers_longest_context() {
        let m = model();
        let trigram = m.recommend("C", "pop", 5, &["Am".into(), "F".into()]);
        assert_eq!(trigram.order_used, 3);
        assert_eq!(trigram.recommendations.len(), 1);

        let bigram = m.recommend("C", "pop", 5, &["G".into(), "F".into()]);
        assert_eq!(bigram.order_used, 2);
        assert_eq!(bigram.recommendations[0].chord, "G");
        assert_eq!(bigram.recommendations[0].probability, 0.9);

        let unigram = m.recommend("C", "pop", 5, &["Em".into()]);
        assert_eq!(unigram.order_used, 1);
    }

    #[test]
    fn unknown_genre_or_chord_is_empty() {
        let m = model();
        assert!(m.recommend("C", "jazz", 5, &[]).is_empty());
        assert!(m.recommend("F#dim", "pop", 5, &[]).is_empty());
    }

    #[test]
    fn enharmonic_lookup() {
        let set = model().recommend("Dbm", "pop", 5, &[]);
        assert_eq!(set.recommendations[0].chord, "A");
    }

    #[test]
    fn friction_scales_with_frequency() {
        let m = model();
        assert_eq!(m.friction("C", "pop"), 0.0);
        assert!((m.friction("Am", "pop") - 0.5).abs() < 1e-9);
        assert_eq!(m.friction("E", "pop"), 1.0);
        assert_eq!(m.friction("C", "rock"), 1.0);
    }

    #[test]
    fn patterns_match_prefix_by_frequency() {
        let m = model();
        let found = m.patterns_with_prefix(&["C".into(), "G".into()], "pop", 4);
        let chords: Vec<_> = found.iter().map(|p| p.chords.join("-")).collect();
        assert_eq!(chords, vec!["C-G-Am-F", "C-G", "C-G-Am"]);

        let capped = m.patterns_with_prefix(&["C".into(), "G".into()], "pop", 3);
        assert_eq!(capped.len(), 2);
        assert!(m.patterns_with_prefix(&[], "pop", 4).is_empty());
    }

    #[test]
    fn genres_are_sorted() {
        assert_eq!(model().genre_names(), vec!["pop", "rock"]);
        assert_eq!(model().genre_total("pop"), Some(1200));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MARKOV_FILE), MARKOV).unwrap();
        let model = CorpusModel::load(dir.path()).unwrap();
        assert!(model.patterns_with_prefix(&["C".into()], "pop", 4).is_empty());
        assert_eq!(model.recommend("G", "pop", 1, &[]).recommendations.len(), 1);
    }

    #[test]
    fn load_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CorpusModel::load(dir.path()),
            Err(StatsError::MissingModel(_))
        ));
    }

    #[tokio::test]
    async fn trait_delegates_to_model() {
        let m = model();
        let rec: &dyn StatisticalRecommender = &m;
        assert_eq!(rec.genres().await.unwrap(), vec!["pop", "rock"]);
        let set = rec.recommendations("G", "pop", 1, &[]).await.unwrap();
        assert_eq!(set.recommendations[0].chord, "Am");
    }
}
