//! Candidate generation for `expand_node`.
//!
//! Reads one snapshot and never touches the tree; the explorer decides
//! whether the result still applies when it comes back.

use chordstats::notation::corpus_symbol;
use chordstats::StatisticalRecommender;
use futures::future::join_all;
use harmony::{ChordId, Key, ProgressionNode};
use progression::{
    categorize, group_by_color, score_candidates, score_hybrid, GenreCandidates,
    ScoredCandidate, StatisticalContext,
};
use tracing::{debug, warn};

use crate::node::TrunkNodeId;
use crate::registry::NodeRegistry;
use crate::settings::ExplorerSettings;
use crate::state::{ExplorerState, NodeCandidates};

/// Longest chord suffix used as a pattern prefix.
const MAX_PATTERN_PREFIX: usize = 3;

/// Everything one genre query needs, borrowed from the snapshot.
struct Position<'a> {
    key: Key,
    registry: &'a NodeRegistry,
    current: &'a ProgressionNode,
    path: &'a [ChordId],
    symbols: &'a [String],
    harmonic: &'a [ScoredCandidate],
}

/// Harmonic candidates for `id`, plus one hybrid split per genre.
///
/// Returns `None` when the node or its chord cannot be resolved.
pub(crate) async fn build_candidates(
    recommender: &dyn StatisticalRecommender,
    settings: &ExplorerSettings,
    state: &ExplorerState,
    id: TrunkNodeId,
) -> Option<NodeCandidates> {
    let map = state.map()?;
    let tree = state.node(id)?;
    let current = state.resolve_chord(&tree.chord)?;
    let path = state.chord_path(id);

    let legacy = score_candidates(map, state.registry(), &tree.chord, &path);
    let categorized = group_by_color(&legacy);

    let symbols: Vec<String> = path
        .iter()
        .filter_map(|chord| state.resolve_chord(chord))
        .map(|node| corpus_symbol(&node.chord))
        .collect();

    let genres = if settings.genres.is_empty() {
        recommender.genres().await.unwrap_or_else(|e| {
            warn!(error = %e, "listing genres failed, using harmonic candidates only");
            Vec::new()
        })
    } else {
        settings.genres.clone()
    };

    let position = Position {
        key: map.key,
        registry: state.registry(),
        current,
        path: &path,
        symbols: &symbols,
        harmonic: &legacy,
    };
    let by_genre = join_all(
        genres
            .iter()
            .map(|genre| genre_candidates(recommender, settings, &position, genre)),
    )
    .await;

    debug!(
        node = %id,
        chord = %tree.chord,
        harmonic = legacy.len(),
        genres = by_genre.len(),
        "built candidates"
    );

    Some(NodeCandidates {
        legacy,
        categorized,
        by_genre,
    })
}

async fn genre_candidates(
    recommender: &dyn StatisticalRecommender,
    settings: &ExplorerSettings,
    position: &Position<'_>,
    genre: &str,
) -> GenreCandidates {
    let stats = statistical_context(recommender, settings, position.symbols, genre).await;
    let order_used = stats.recommendations.order_used;

    let hybrid = score_hybrid(
        &position.key,
        position.registry,
        position.current,
        position.path,
        position.harmonic,
        &stats,
        &settings.weights,
        &settings.fallback,
    );

    debug!(
        genre = %genre,
        order_used,
        recommendations = stats.recommendations.recommendations.len(),
        candidates = hybrid.len(),
        "scored genre candidates"
    );
    categorize(genre, hybrid, order_used)
}

/// Recommendations after the last chord of `symbols`, and patterns that
/// continue its last three, two, and one chords.
async fn statistical_context(
    recommender: &dyn StatisticalRecommender,
    settings: &ExplorerSettings,
    symbols: &[String],
    genre: &str,
) -> StatisticalContext {
    let Some((from, context)) = symbols.split_last() else {
        return StatisticalContext::default();
    };

    let recommendations = recommender
        .recommendations(from, genre, settings.recommendations_per_genre, context)
        .await
        .unwrap_or_else(|e| {
            warn!(genre = %genre, chord = %from, error = %e, "recommendation query failed");
            Default::default()
        });

    let mut patterns = Vec::new();
    for prefix_len in (1..=MAX_PATTERN_PREFIX.min(symbols.len())).rev() {
        let prefix = &symbols[symbols.len() - prefix_len..];
        let max_length = settings.pattern_max_length.max(prefix_len + 1);
        match recommender.find_patterns(prefix, genre, max_length).await {
            Ok(found) if !found.is_empty() => patterns.push((prefix_len, found)),
            Ok(_) => {}
            Err(e) => warn!(genre = %genre, prefix_len, error = %e, "pattern query failed"),
        }
    }

    StatisticalContext {
        recommendations,
        patterns,
    }
}
