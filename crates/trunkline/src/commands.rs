use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chordstats::{CorpusModel, EmptyRecommender, StatisticalRecommender, StatsError};
use harmony::{build_progression_map, Chord, ChordId, Key};
use tracing::{debug, info, warn};
use trunk::{ExplorerSettings, TrunkExplorer, TrunkNodeId};
use trunkconf::{ConfigSources, TrunkConfig};

use crate::report::SuggestReport;

pub struct SuggestRequest {
    pub key: Key,
    /// Chords after the tonic.
    pub path: Vec<String>,
    pub genres: Vec<String>,
    pub top: usize,
    pub json: bool,
}

pub fn map(key: Key, json: bool) -> Result<()> {
    let map = build_progression_map(key);

    if json {
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    println!("{} ({} nodes, {} edges)", key, map.nodes.len(), map.edges.len());
    for node in &map.nodes {
        let targets: Vec<String> = map
            .edges_from(&node.id)
            .map(|e| format!("{} {:.2}", e.to, e.strength))
            .collect();
        println!(
            "  {:<8} {:<8} {:<12} {:<18} -> {}",
            node.id.to_string(),
            node.roman.to_string(),
            node.function.to_string(),
            format!("{:?}", node.category),
            targets.join(", ")
        );
    }
    Ok(())
}

pub async fn suggest(config: &TrunkConfig, request: SuggestRequest) -> Result<()> {
    let recommender = load_recommender(&config.paths.model_dir)?;

    let mut settings = ExplorerSettings::from(config);
    if !request.genres.is_empty() {
        settings.genres = request.genres;
    }

    let explorer = TrunkExplorer::new(recommender, settings);
    let mut current = explorer.initialize(request.key);
    for symbol in &request.path {
        current = step(&explorer, current, symbol)?;
    }

    if !explorer.expand_node(current).await {
        bail!("Could not expand {}", request.path.last().map_or("the tonic", |s| s.as_str()));
    }

    let snapshot = explorer.snapshot();
    let report = SuggestReport::from_snapshot(&snapshot, current, request.top)
        .context("Expanded node has no cached candidates")?;

    if request.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }
    Ok(())
}

pub fn config(config: &TrunkConfig, sources: Option<&ConfigSources>) {
    if let Some(sources) = sources {
        for file in &sources.files {
            println!("# loaded {}", file.display());
        }
        for var in &sources.env_overrides {
            println!("# override {var}");
        }
        println!();
    }
    print!("{}", config.to_toml());
}

/// The trained model if one is installed, otherwise harmonic-only scoring.
fn load_recommender(dir: &Path) -> Result<Arc<dyn StatisticalRecommender>> {
    match CorpusModel::load(dir) {
        Ok(model) => Ok(Arc::new(model)),
        Err(StatsError::MissingModel(path)) => {
            warn!(path = %path.display(), "no corpus model, suggestions are harmonic only");
            Ok(Arc::new(EmptyRecommender))
        }
        Err(e) => Err(e).context("Failed to load corpus model"),
    }
}

/// Move one chord down the path, reusing an existing child when the chord
/// is already there.
///
/// At the root every trunk may be taken; the last trunk (the weakest head)
/// makes room for the requested chord.
fn step(explorer: &TrunkExplorer, parent: TrunkNodeId, symbol: &str) -> Result<TrunkNodeId> {
    let wanted: Chord = symbol
        .parse()
        .with_context(|| format!("Invalid chord in path: {symbol}"))?;

    let snapshot = explorer.snapshot();
    let existing = snapshot.children(parent).find(|child| {
        snapshot
            .resolve_chord(&child.chord)
            .is_some_and(|node| node.chord == wanted)
    });
    if let Some(child) = existing {
        debug!(node = %child.id, chord = %child.chord, "path reuses existing node");
        return Ok(child.id);
    }

    let is_root = snapshot.node(parent).is_some_and(|n| n.is_root());
    if is_root && snapshot.children(parent).count() >= explorer.settings().max_trunks {
        if let Some(weakest) = snapshot.children(parent).max_by_key(|n| n.trunk) {
            info!(chord = %weakest.chord, "replacing weakest trunk");
            explorer.delete_node(weakest.id);
        }
    }

    explorer
        .select_candidate(parent, &ChordId::from(symbol))
        .with_context(|| format!("Cannot extend the path with {symbol}"))
}
