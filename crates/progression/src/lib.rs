//! Candidate scoring for chord progressions.
//!
//! Four heuristic signals are computed for every move out of the current
//! chord:
//!
//! - [`color`]: how the candidate colors the key (diatonic, borrowed, ...),
//!   which also picks the weights for the other signals
//! - [`distance`]: how far the candidate sits outside the scale
//! - [`tension`]: tension level and whether the move resolves or builds it
//! - [`pattern`]: how well the path plus candidate fits known progressions
//!
//! [`candidate`] combines them with transition strength into a
//! [`ScoreBreakdown`]. [`hybrid`] blends that with one genre's corpus
//! statistics, and [`genre`] splits the result into canonical and spicy
//! choices.

pub mod candidate;
pub mod color;
pub mod distance;
pub mod genre;
pub mod hybrid;
pub mod pattern;
pub mod tension;

pub use candidate::{
    group_by_color, score_candidates, score_transition, CategorizedCandidates, ScoreBreakdown,
    ScoredCandidate, StatisticalScore,
};
pub use color::{classify_color, ColorClass, ColorWeights};
pub use distance::harmonic_distance;
pub use genre::{categorize, FrequencyDistribution, GenreCandidates, RarityLabel};
pub use hybrid::{
    hybrid_score, score_hybrid, FallbackPolicy, HybridCandidate, HybridWeights,
    StatisticalContext,
};
pub use pattern::{match_degrees, match_path, PatternMatch, ProgressionTemplate, TEMPLATES};
pub use tension::{tension_arc_bonus, tension_level, TensionReading};
