//! Corpus statistics for chord recommendation.
//!
//! The recommendation engine treats corpus statistics as an external,
//! read-only service behind [`StatisticalRecommender`]. This crate defines
//! that seam and ships two implementations:
//!
//! - [`CorpusModel`]: the trained multi-order Markov table and n-gram pattern
//!   table, loaded from the JSON files the training pipeline exports.
//! - [`EmptyRecommender`]: no model loaded; every query is empty, so callers
//!   fall back to harmonic-only scoring.
//!
//! Chord symbols crossing this boundary are in corpus notation; see
//! [`notation`] for conversion to and from [`harmony::Chord`].

pub mod corpus;
pub mod notation;

pub use corpus::CorpusModel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Errors from loading or querying corpus statistics.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("Failed to read model file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse model file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Markov model not found at {0}")]
    MissingModel(PathBuf),
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// One statistically-attested next chord.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecommendation {
    /// Chord symbol in corpus notation.
    pub chord: String,
    /// Transition probability from the queried context.
    pub probability: f64,
    /// Relative frequency of the chord in the genre.
    pub frequency: f64,
    /// Rarity: 0.0 common, 1.0 unseen.
    pub friction: f64,
}

impl StatRecommendation {
    pub fn category(&self) -> RecommendationCategory {
        RecommendationCategory::classify(self.probability, self.friction)
    }
}

/// Recommendations plus the Markov order whose context produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<StatRecommendation>,
    /// 1 = current chord only, 2 = one chord of context, 3 = two chords.
    /// 0 when nothing was found.
    pub order_used: u8,
}

impl RecommendationSet {
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// A frequently occurring chord n-gram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordPattern {
    pub chords: Vec<String>,
    #[serde(default)]
    pub count: u64,
    pub frequency: f64,
}

/// Coarse label for how adventurous a recommendation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    Common,
    Interesting,
    Adventurous,
}

impl RecommendationCategory {
    pub fn classify(probability: f64, friction: f64) -> Self {
        if probability > 0.05 && friction < 0.3 {
            RecommendationCategory::Common
        } else if probability < 0.01 || friction > 0.7 {
            RecommendationCategory::Adventurous
        } else {
            RecommendationCategory::Interesting
        }
    }
}

impl std::fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendationCategory::Common => write!(f, "common"),
            RecommendationCategory::Interesting => write!(f, "interesting"),
            RecommendationCategory::Adventurous => write!(f, "adventurous"),
        }
    }
}

/// Genre-scoped corpus statistics.
///
/// Implementations are read-only and may be queried concurrently for
/// different genres. An empty result means "no data", not an error.
#[async_trait]
pub trait StatisticalRecommender: Send + Sync {
    /// Genres the model has data for, in a stable order.
    async fn genres(&self) -> Result<Vec<String>>;

    /// Next-chord recommendations after `from`.
    ///
    /// `context` holds the chords preceding `from`, most recent last; the
    /// model may use up to two of them.
    async fn recommendations(
        &self,
        from: &str,
        genre: &str,
        top_n: usize,
        context: &[String],
    ) -> Result<RecommendationSet>;

    /// Patterns of up to `max_length` chords beginning with `prefix`.
    async fn find_patterns(
        &self,
        prefix: &[String],
        genre: &str,
        max_length: usize,
    ) -> Result<Vec<ChordPattern>>;
}

/// Stand-in when no trained model is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRecommender;

#[async_trait]
impl StatisticalRecommender for EmptyRecommender {
    async fn genres(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn recommendations(
        &self,
        _from: &str,
        _genre: &str,
        _top_n: usize,
        _context: &[String],
    ) -> Result<RecommendationSet> {
        Ok(RecommendationSet::default())
    }

    async fn find_patterns(
        &self,
        _prefix: &[String],
        _genre: &str,
        _max_length: usize,
    ) -> Result<Vec<ChordPattern>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_probability_and_friction() {
        assert_eq!(
            RecommendationCategory::classify(0.2, 0.1),
            RecommendationCategory::Common
        );
        assert_eq!(
            RecommendationCategory::classify(0.005, 0.1),
            RecommendationCategory::Adventurous
        );
        assert_eq!(
            RecommendationCategory::classify(0.2, 0.9),
            RecommendationCategory::Adventurous
        );
        assert_eq!(
            RecommendationCategory::classify(0.03, 0.5),
            RecommendationCategory::Interesting
        );
    }

    #[tokio::test]
    async fn empty_recommender_has_nothing() {
        let rec = EmptyRecommender;
        assert!(rec.genres().await.unwrap().is_empty());
        let set = rec.recommendations("C", "pop", 10, &[]).await.unwrap();
        assert!(set.is_empty());
        assert_eq!(set.order_used, 0);
        assert!(rec.find_patterns(&["C".into()], "pop", 4).await.unwrap().is_empty());
    }
}
