//! Printable view of one expanded node.

use std::fmt::Write;

use chordstats::RecommendationCategory;
use progression::{ColorClass, GenreCandidates, HybridCandidate, RarityLabel, ScoredCandidate};
use serde::Serialize;
use trunk::{ExplorerState, TrunkNodeId};

#[derive(Debug, Serialize)]
pub struct SuggestReport {
    pub key: String,
    pub path: Vec<String>,
    pub harmonic: Vec<HarmonicRow>,
    pub genres: Vec<GenreReport>,
}

#[derive(Debug, Serialize)]
pub struct HarmonicRow {
    pub chord: String,
    pub roman: String,
    pub color: ColorClass,
    pub score: f64,
    pub strength: f64,
    pub patterns: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GenreReport {
    pub genre: String,
    pub order_used: u8,
    pub canonical: Vec<HybridRow>,
    pub spicy: Vec<HybridRow>,
}

#[derive(Debug, Serialize)]
pub struct HybridRow {
    pub chord: String,
    pub roman: String,
    pub hybrid: f64,
    pub probability: f64,
    pub friction: f64,
    pub rarity: RarityLabel,
    pub category: RecommendationCategory,
    pub corpus_only: bool,
}

impl From<&ScoredCandidate> for HarmonicRow {
    fn from(c: &ScoredCandidate) -> Self {
        Self {
            chord: c.id().to_string(),
            roman: c.node.roman.to_string(),
            color: c.breakdown.color,
            score: c.total(),
            strength: c.breakdown.transition_strength,
            patterns: c.breakdown.matched_patterns.clone(),
        }
    }
}

impl HybridRow {
    fn new(genre: &GenreCandidates, c: &HybridCandidate) -> Self {
        let friction = c
            .breakdown
            .statistical
            .as_ref()
            .map_or(1.0, |s| s.friction);
        Self {
            chord: c.id().to_string(),
            roman: c.node.roman.to_string(),
            hybrid: c.hybrid_score(),
            probability: c.probability(),
            friction,
            rarity: genre.rarity(c),
            category: RecommendationCategory::classify(c.probability(), friction),
            corpus_only: c.synthetic,
        }
    }
}

impl GenreReport {
    fn new(genre: &GenreCandidates, top: usize) -> Self {
        let rows = |list: &[HybridCandidate]| -> Vec<HybridRow> {
            list.iter()
                .take(top)
                .map(|c| HybridRow::new(genre, c))
                .collect()
        };
        Self {
            genre: genre.genre.clone(),
            order_used: genre.order_used,
            canonical: rows(genre.canonical.as_slice()),
            spicy: rows(genre.spicy.as_slice()),
        }
    }
}

impl SuggestReport {
    /// `None` until `node` has been expanded.
    pub fn from_snapshot(state: &ExplorerState, node: TrunkNodeId, top: usize) -> Option<Self> {
        let key = state.key()?;
        let candidates = state.candidates(node)?;
        Some(Self {
            key: key.to_string(),
            path: state
                .chord_path(node)
                .iter()
                .map(ToString::to_string)
                .collect(),
            harmonic: candidates
                .legacy
                .iter()
                .take(top)
                .map(HarmonicRow::from)
                .collect(),
            genres: candidates
                .by_genre
                .iter()
                .map(|g| GenreReport::new(g, top))
                .collect(),
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}: {}", self.key, self.path.join(" -> "));

        let _ = writeln!(out, "\nharmonic");
        for row in &self.harmonic {
            let _ = writeln!(
                out,
                "  {:<8} {:<8} {:<20} {:>6.3}  strength {:.2}  {}",
                row.chord,
                row.roman,
                row.color.to_string(),
                row.score,
                row.strength,
                row.patterns.join(", ")
            );
        }

        for genre in &self.genres {
            let _ = writeln!(out, "\n{} (order {})", genre.genre, genre.order_used);
            for (label, rows) in [("canonical", &genre.canonical), ("spicy", &genre.spicy)] {
                let _ = writeln!(out, "  {label}");
                for row in rows {
                    let _ = writeln!(
                        out,
                        "    {:<8} {:<8} {:>6.3}  p={:.3}  {:<8} {}{}",
                        row.chord,
                        row.roman,
                        row.hybrid,
                        row.probability,
                        row.rarity.to_string(),
                        row.category,
                        if row.corpus_only { "  (corpus)" } else { "" }
                    );
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chordstats::EmptyRecommender;
    use harmony::Key;
    use std::sync::Arc;
    use trunk::{ExplorerSettings, TrunkExplorer};

    async fn expanded_head() -> (TrunkExplorer, TrunkNodeId) {
        let settings = ExplorerSettings {
            genres: vec!["pop".to_string()],
            ..ExplorerSettings::default()
        };
        let explorer = TrunkExplorer::new(Arc::new(EmptyRecommender), settings);
        explorer.initialize(Key::parse("C", "major").unwrap());
        let head = explorer.snapshot().heads().next().unwrap().id;
        assert!(explorer.expand_node(head).await);
        (explorer, head)
    }

    #[tokio::test]
    async fn report_requires_expansion() {
        let (explorer, _) = expanded_head().await;
        let root = explorer.snapshot().root().unwrap().id;
        assert!(SuggestReport::from_snapshot(&explorer.snapshot(), root, 5).is_none());
    }

    #[tokio::test]
    async fn report_lists_harmonic_and_genre_rows() {
        let (explorer, head) = expanded_head().await;
        let report = SuggestReport::from_snapshot(&explorer.snapshot(), head, 3).unwrap();

        assert_eq!(report.key, "C major");
        assert_eq!(report.path.len(), 2);
        assert_eq!(report.path[0], "C");
        assert!(report.harmonic.len() <= 3 && !report.harmonic.is_empty());

        let pop = &report.genres[0];
        assert_eq!(pop.genre, "pop");
        assert_eq!(pop.order_used, 0);
        // no corpus data: only map candidates, at neutral friction
        assert!(!pop.canonical.is_empty());
        assert!(pop
            .canonical
            .iter()
            .chain(&pop.spicy)
            .all(|r| !r.corpus_only && r.friction == 0.5 && r.probability <= 0.01));

        let text = report.render();
        assert!(text.starts_with("C major: C -> "));
        assert!(text.contains("pop (order 0)"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["genres"][0]["genre"], "pop");
        assert_eq!(json["harmonic"].as_array().unwrap().len(), report.harmonic.len());
    }
}
