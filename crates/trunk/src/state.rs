//! Immutable explorer snapshots and the pure transitions between them.
//!
//! Every mutating operation builds a new [`ExplorerState`] from the current
//! one. Large shared parts (the map, the registry, cached candidate sets)
//! sit behind `Arc`s, so a transition clones only what it touches.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use harmony::{
    calculate_transition_strength, infer_node, Chord, ChordId, Key, ProgressionMap,
    ProgressionNode,
};
use progression::{
    score_candidates, score_transition, CategorizedCandidates, ColorClass, GenreCandidates,
    ScoreBreakdown, ScoredCandidate,
};
use serde::Serialize;

use crate::node::{Movement, TrunkEdge, TrunkNode, TrunkNodeId};
use crate::registry::NodeRegistry;
use crate::TrunkError;

/// Candidate sets cached for one tree node by `expand_node`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeCandidates {
    /// Harmonic candidates, best first.
    pub legacy: Vec<ScoredCandidate>,
    /// The same candidates grouped by color class.
    pub categorized: CategorizedCandidates,
    /// Hybrid-scored canonical/spicy splits, one per genre.
    pub by_genre: Vec<GenreCandidates>,
}

impl NodeCandidates {
    fn entries(&self) -> impl Iterator<Item = (&ProgressionNode, &ScoreBreakdown)> {
        self.legacy
            .iter()
            .map(|c| (&c.node, &c.breakdown))
            .chain(
                self.by_genre
                    .iter()
                    .flat_map(|g| g.all())
                    .map(|c| (&c.node, &c.breakdown)),
            )
    }

    fn node(&self, id: &ChordId) -> Option<&ProgressionNode> {
        self.entries().map(|(n, _)| n).find(|n| &n.id == id)
    }

    fn node_for_chord(&self, chord: &Chord) -> Option<&ProgressionNode> {
        self.entries().map(|(n, _)| n).find(|n| &n.chord == chord)
    }

    fn breakdown(&self, id: &ChordId) -> Option<&ScoreBreakdown> {
        self.entries().find(|(n, _)| &n.id == id).map(|(_, b)| b)
    }

    pub fn is_empty(&self) -> bool {
        self.legacy.is_empty() && self.by_genre.iter().all(|g| g.all().next().is_none())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExplorerState {
    map: Option<Arc<ProgressionMap>>,
    nodes: BTreeMap<TrunkNodeId, TrunkNode>,
    edges: Vec<TrunkEdge>,
    candidates: BTreeMap<TrunkNodeId, Arc<NodeCandidates>>,
    registry: Arc<NodeRegistry>,
    muted: BTreeSet<TrunkNodeId>,
    practice: Option<TrunkNodeId>,
    next_id: u64,
}

impl ExplorerState {
    pub fn key(&self) -> Option<Key> {
        self.map.as_ref().map(|m| m.key)
    }

    pub fn map(&self) -> Option<&ProgressionMap> {
        self.map.as_deref()
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TrunkNode> {
        self.nodes.values()
    }

    pub fn node(&self, id: TrunkNodeId) -> Option<&TrunkNode> {
        self.nodes.get(&id)
    }

    pub fn edges(&self) -> &[TrunkEdge] {
        &self.edges
    }

    pub fn edge_to(&self, id: TrunkNodeId) -> Option<&TrunkEdge> {
        self.edges.iter().find(|e| e.to == id)
    }

    pub fn root(&self) -> Option<&TrunkNode> {
        self.nodes.values().find(|n| n.is_root())
    }

    pub fn children(&self, id: TrunkNodeId) -> impl Iterator<Item = &TrunkNode> {
        self.nodes.values().filter(move |n| n.parent == Some(id))
    }

    pub fn heads(&self) -> impl Iterator<Item = &TrunkNode> {
        self.nodes.values().filter(|n| n.is_trunk_head())
    }

    pub fn leaves(&self) -> impl Iterator<Item = &TrunkNode> {
        self.nodes.values().filter(|n| n.is_leaf)
    }

    pub fn candidates(&self, id: TrunkNodeId) -> Option<&NodeCandidates> {
        self.candidates.get(&id).map(Arc::as_ref)
    }

    pub fn muted(&self) -> &BTreeSet<TrunkNodeId> {
        &self.muted
    }

    pub fn is_muted(&self, id: TrunkNodeId) -> bool {
        self.muted.contains(&id)
    }

    pub fn in_practice_mode(&self) -> bool {
        self.practice.is_some()
    }

    pub fn practice_target(&self) -> Option<TrunkNodeId> {
        self.practice
    }

    /// Nodes from the root down to `id`, inclusive. Empty if `id` is unknown.
    pub fn path_to(&self, id: TrunkNodeId) -> Vec<&TrunkNode> {
        let mut path = Vec::new();
        let mut cursor = self.nodes.get(&id);
        while let Some(node) = cursor {
            path.push(node);
            cursor = node.parent.and_then(|p| self.nodes.get(&p));
        }
        path.reverse();
        path
    }

    /// Chord ids from the root down to `id`.
    pub fn chord_path(&self, id: TrunkNodeId) -> Vec<ChordId> {
        self.path_to(id).into_iter().map(|n| n.chord.clone()).collect()
    }

    /// Root-to-leaf path for playback and practice, skipping muted nodes.
    pub fn playable_path(&self, leaf: TrunkNodeId) -> Vec<&TrunkNode> {
        self.path_to(leaf)
            .into_iter()
            .filter(|n| !self.muted.contains(&n.id))
            .collect()
    }

    /// Resolve a chord id through the registry, then the map.
    pub fn resolve_chord(&self, id: &ChordId) -> Option<&ProgressionNode> {
        self.registry
            .get(id)
            .or_else(|| self.map.as_ref().and_then(|m| m.node(id)))
    }

    /// Resolve a selection target: registry, map, the parent's cached
    /// candidates, then an enharmonic match in any of those.
    fn resolve_destination(
        &self,
        id: &ChordId,
        cached: Option<&NodeCandidates>,
    ) -> Option<ProgressionNode> {
        if let Some(node) = self
            .resolve_chord(id)
            .or_else(|| cached.and_then(|c| c.node(id)))
        {
            return Some(node.clone());
        }

        let chord: Chord = id.as_str().parse().ok()?;
        self.registry
            .find_chord(&chord)
            .or_else(|| self.map.as_ref().and_then(|m| m.node_for_chord(&chord)))
            .or_else(|| cached.and_then(|c| c.node_for_chord(&chord)))
            .cloned()
    }

    fn require(&self, id: TrunkNodeId) -> Result<&TrunkNode, TrunkError> {
        self.nodes.get(&id).ok_or(TrunkError::UnknownNode(id))
    }

    fn subtree(&self, id: TrunkNodeId) -> BTreeSet<TrunkNodeId> {
        let mut removed = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if removed.insert(current) {
                stack.extend(self.children(current).map(|c| c.id));
            }
        }
        removed
    }

    fn free_trunk(&self, root: TrunkNodeId, max_trunks: usize) -> Option<usize> {
        let used: BTreeSet<usize> = self.children(root).filter_map(|n| n.trunk).collect();
        (0..max_trunks).find(|t| !used.contains(t))
    }

    fn allocate(&mut self) -> TrunkNodeId {
        let id = TrunkNodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a leaf under `parent` with the edge that reaches it.
    fn attach(
        &mut self,
        parent: TrunkNodeId,
        trunk: Option<usize>,
        destination: &ProgressionNode,
        breakdown: ScoreBreakdown,
    ) -> TrunkNodeId {
        let id = self.allocate();
        let depth = self.nodes.get(&parent).map(|p| p.depth + 1).unwrap_or(1);
        let chromatic = self
            .key()
            .map(|k| !k.contains_chord(&destination.chord))
            .unwrap_or(false);

        if let Some(p) = self.nodes.get_mut(&parent) {
            p.is_leaf = false;
        }
        self.nodes.insert(
            id,
            TrunkNode {
                id,
                chord: destination.id.clone(),
                trunk,
                depth,
                parent: Some(parent),
                is_leaf: true,
            },
        );
        self.edges.push(TrunkEdge {
            from: parent,
            to: id,
            movement: Movement::from(destination.function),
            strength: breakdown.transition_strength,
            chromatic,
            matched_patterns: breakdown.matched_patterns.clone(),
            breakdown: Some(breakdown),
        });
        id
    }

    /// Fresh session for `map`: new registry, a root on the tonic, and up to
    /// `max_trunks` heads on distinct roots. Node ids keep counting.
    pub(crate) fn initialized(
        &self,
        map: ProgressionMap,
        max_trunks: usize,
    ) -> (ExplorerState, TrunkNodeId) {
        let key = map.key;
        let root_node = map
            .tonic_node()
            .cloned()
            .unwrap_or_else(|| infer_node(&key.tonic_chord(), &key));
        let mut registry = NodeRegistry::from_map(&map);
        registry.register(root_node.clone());

        let heads = select_heads(&map, &registry, &root_node, max_trunks);

        let mut next = ExplorerState {
            map: Some(Arc::new(map)),
            registry: Arc::new(registry),
            next_id: self.next_id,
            ..Default::default()
        };

        let root = next.allocate();
        next.nodes.insert(
            root,
            TrunkNode {
                id: root,
                chord: root_node.id.clone(),
                trunk: None,
                depth: 0,
                parent: None,
                is_leaf: true,
            },
        );
        for (lane, head) in heads.into_iter().enumerate() {
            next.attach(root, Some(lane), &head.node, head.breakdown);
        }
        (next, root)
    }

    pub(crate) fn with_selection(
        &self,
        parent: TrunkNodeId,
        chord: &ChordId,
        max_trunks: usize,
    ) -> Result<(ExplorerState, TrunkNodeId), TrunkError> {
        let map = self.map.as_ref().ok_or(TrunkError::NotInitialized)?;
        let parent_tree = self.require(parent)?;
        let parent_node = self
            .resolve_chord(&parent_tree.chord)
            .cloned()
            .ok_or_else(|| TrunkError::UnresolvedChord(parent_tree.chord.clone()))?;

        let cached = self.candidates(parent);
        let destination = self
            .resolve_destination(chord, cached)
            .ok_or_else(|| TrunkError::UnresolvedChord(chord.clone()))?;

        if self.children(parent).any(|c| c.chord == destination.id) {
            return Err(TrunkError::DuplicateChild {
                parent,
                chord: destination.id,
            });
        }

        let trunk = if parent_tree.is_root() {
            Some(
                self.free_trunk(parent, max_trunks)
                    .ok_or(TrunkError::NoFreeTrunk(max_trunks))?,
            )
        } else {
            parent_tree.trunk
        };

        let breakdown = match cached.and_then(|c| c.breakdown(&destination.id)) {
            Some(b) => b.clone(),
            None => {
                let strength =
                    calculate_transition_strength(&parent_node.chord, &destination.chord);
                score_transition(
                    &map.key,
                    self.registry.as_ref(),
                    &parent_node,
                    &destination,
                    strength,
                    &self.chord_path(parent),
                )
            }
        };

        let mut next = self.clone();
        Arc::make_mut(&mut next.registry).register(destination.clone());
        next.candidates.remove(&parent);
        let id = next.attach(parent, trunk, &destination, breakdown);
        Ok((next, id))
    }

    pub(crate) fn with_deletion(&self, id: TrunkNodeId) -> Result<ExplorerState, TrunkError> {
        let node = self.require(id)?;
        let Some(parent) = node.parent else {
            return Err(TrunkError::RootImmutable);
        };

        let removed = self.subtree(id);
        let mut next = self.clone();
        next.nodes.retain(|k, _| !removed.contains(k));
        next.edges
            .retain(|e| !removed.contains(&e.from) && !removed.contains(&e.to));
        next.candidates.retain(|k, _| !removed.contains(k));
        next.muted.retain(|k| !removed.contains(k));
        if next.practice.is_some_and(|p| removed.contains(&p)) {
            next.practice = None;
        }

        if next.children(parent).next().is_none() {
            if let Some(p) = next.nodes.get_mut(&parent) {
                p.is_leaf = true;
            }
        }
        Ok(next)
    }

    /// Cache candidates on a leaf and register their synthetic nodes.
    pub(crate) fn with_candidates(
        &self,
        id: TrunkNodeId,
        candidates: NodeCandidates,
    ) -> Result<ExplorerState, TrunkError> {
        if !self.require(id)?.is_leaf {
            return Err(TrunkError::NotLeaf(id));
        }

        let mut next = self.clone();
        let registry = Arc::make_mut(&mut next.registry);
        for candidate in candidates.by_genre.iter().flat_map(|g| g.all()) {
            if candidate.node.synthetic {
                registry.register(candidate.node.clone());
            }
        }
        next.candidates.insert(id, Arc::new(candidates));
        Ok(next)
    }

    pub(crate) fn with_mute_toggled(&self, id: TrunkNodeId) -> Result<ExplorerState, TrunkError> {
        self.require(id)?;
        let mut next = self.clone();
        if !next.muted.remove(&id) {
            next.muted.insert(id);
        }
        Ok(next)
    }

    pub(crate) fn with_practice(&self, leaf: TrunkNodeId) -> Result<ExplorerState, TrunkError> {
        if !self.require(leaf)?.is_leaf {
            return Err(TrunkError::NotLeaf(leaf));
        }
        let mut next = self.clone();
        next.practice = Some(leaf);
        Ok(next)
    }

    pub(crate) fn without_practice(&self) -> ExplorerState {
        let mut next = self.clone();
        next.practice = None;
        next
    }
}

/// Best candidate per root pitch class (the tonic's root excluded),
/// diatonic first, then by score, then by chord id.
fn select_heads(
    map: &ProgressionMap,
    registry: &NodeRegistry,
    root: &ProgressionNode,
    max_trunks: usize,
) -> Vec<ScoredCandidate> {
    let path = vec![root.id.clone()];
    let scored = score_candidates(map, registry, &root.id, &path);

    // `scored` is best-first, so the first candidate per root wins.
    let mut best: BTreeMap<u8, ScoredCandidate> = BTreeMap::new();
    for candidate in scored {
        if candidate.node.chord.root == root.chord.root {
            continue;
        }
        best.entry(candidate.node.chord.root).or_insert(candidate);
    }

    let mut heads: Vec<ScoredCandidate> = best.into_values().collect();
    heads.sort_by(|a, b| {
        let a_outside = a.breakdown.color != ColorClass::Diatonic;
        let b_outside = b.breakdown.color != ColorClass::Diatonic;
        a_outside
            .cmp(&b_outside)
            .then_with(|| b.total().total_cmp(&a.total()))
            .then_with(|| a.node.id.cmp(&b.node.id))
    });
    heads.truncate(max_trunks);
    heads
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony::build_progression_map;
    use pretty_assertions::assert_eq;

    fn c_major_state() -> ExplorerState {
        let map = build_progression_map(Key::parse("C", "major").unwrap());
        ExplorerState::default().initialized(map, 5).0
    }

    fn first_head(state: &ExplorerState) -> TrunkNodeId {
        state.heads().next().unwrap().id
    }

    #[test]
    fn initialize_builds_root_and_distinct_heads() {
        let state = c_major_state();
        let root = state.root().unwrap();
        assert_eq!(root.chord.as_str(), "C");
        assert!(root.trunk.is_none());

        let heads: Vec<_> = state.heads().collect();
        assert!(!heads.is_empty() && heads.len() <= 5);
        let roots: BTreeSet<u8> = heads
            .iter()
            .map(|h| state.resolve_chord(&h.chord).unwrap().chord.root)
            .collect();
        assert_eq!(roots.len(), heads.len());
        assert!(!roots.contains(&0));

        let lanes: Vec<_> = heads.iter().filter_map(|h| h.trunk).collect();
        assert_eq!(lanes, (0..heads.len()).collect::<Vec<_>>());
        assert_eq!(state.edges().len(), heads.len());
    }

    #[test]
    fn diatonic_heads_come_first() {
        let state = c_major_state();
        let colors: Vec<bool> = state
            .heads()
            .map(|h| {
                state.edge_to(h.id).unwrap().breakdown.as_ref().unwrap().color
                    == ColorClass::Diatonic
            })
            .collect();
        let first_outside = colors.iter().position(|d| !d).unwrap_or(colors.len());
        assert!(colors[first_outside..].iter().all(|d| !d));
    }

    #[test]
    fn select_then_delete_round_trip() {
        let state = c_major_state();
        let head = first_head(&state);
        let before_nodes = state.nodes().count();
        let before_edges = state.edges().len();

        let (selected, child) = state.with_selection(head, &"C".into(), 5).unwrap();
        assert!(!selected.node(head).unwrap().is_leaf);
        let child_node = selected.node(child).unwrap();
        assert_eq!(child_node.depth, 2);
        assert_eq!(child_node.trunk, selected.node(head).unwrap().trunk);
        assert!(child_node.is_leaf);
        assert_eq!(selected.nodes().count(), before_nodes + 1);

        let deleted = selected.with_deletion(child).unwrap();
        assert!(deleted.node(head).unwrap().is_leaf);
        assert_eq!(deleted.nodes().count(), before_nodes);
        assert_eq!(deleted.edges().len(), before_edges);
    }

    #[test]
    fn duplicate_child_rejected() {
        let state = c_major_state();
        let head = first_head(&state);
        let (state, _) = state.with_selection(head, &"C".into(), 5).unwrap();
        assert!(matches!(
            state.with_selection(head, &"C".into(), 5),
            Err(TrunkError::DuplicateChild { .. })
        ));
    }

    #[test]
    fn enharmonic_destination_resolves() {
        let state = c_major_state();
        let head = first_head(&state);
        // Db is spelled C# in C major; C#dim7 is a map node
        let (state, child) = state.with_selection(head, &"Dbdim7".into(), 5).unwrap();
        assert_eq!(state.node(child).unwrap().chord.as_str(), "C#dim7");
    }

    #[test]
    fn unresolvable_destination_rejected() {
        let state = c_major_state();
        let head = first_head(&state);
        assert_eq!(
            state.with_selection(head, &"Ebaug".into(), 5).unwrap_err(),
            TrunkError::UnresolvedChord("Ebaug".into())
        );
    }

    #[test]
    fn root_selection_needs_free_trunk() {
        let state = c_major_state();
        let root = state.root().unwrap().id;
        let heads = state.heads().count();
        assert!(matches!(
            state.with_selection(root, &"Bdim".into(), heads),
            Err(TrunkError::NoFreeTrunk(_)) | Err(TrunkError::DuplicateChild { .. })
        ));

        let first = state.heads().next().unwrap().id;
        let state = state.with_deletion(first).unwrap();
        let freed = ExplorerState::free_trunk(&state, root, heads);
        assert_eq!(freed, Some(0));
    }

    #[test]
    fn deleting_root_is_rejected() {
        let state = c_major_state();
        let root = state.root().unwrap().id;
        assert_eq!(state.with_deletion(root).unwrap_err(), TrunkError::RootImmutable);
    }

    #[test]
    fn delete_removes_subtree_and_practice() {
        let state = c_major_state();
        let head = first_head(&state);
        let (state, child) = state.with_selection(head, &"C".into(), 5).unwrap();
        let (state, grandchild) = state.with_selection(child, &"F".into(), 5).unwrap();
        let state = state.with_practice(grandchild).unwrap();
        let state = state.with_mute_toggled(child).unwrap();

        let state = state.with_deletion(child).unwrap();
        assert!(state.node(child).is_none());
        assert!(state.node(grandchild).is_none());
        assert!(!state.in_practice_mode());
        assert!(state.muted().is_empty());
        assert!(state.edges().iter().all(|e| e.to != child && e.from != child));
        // registry is append-only
        assert!(state.registry().contains(&"F".into()));
    }

    #[test]
    fn practice_requires_leaf() {
        let state = c_major_state();
        let root = state.root().unwrap().id;
        assert_eq!(state.with_practice(root).unwrap_err(), TrunkError::NotLeaf(root));
    }

    #[test]
    fn playable_path_skips_muted() {
        let state = c_major_state();
        let head = first_head(&state);
        let (state, child) = state.with_selection(head, &"C".into(), 5).unwrap();
        let state = state.with_mute_toggled(head).unwrap();

        let chords: Vec<_> = state
            .playable_path(child)
            .iter()
            .map(|n| n.chord.to_string())
            .collect();
        assert_eq!(chords, vec!["C", "C"]);
        assert_eq!(state.chord_path(child).len(), 3);

        let state = state.with_mute_toggled(head).unwrap();
        assert!(!state.is_muted(head));
    }

    #[test]
    fn ids_keep_counting_across_sessions() {
        let state = c_major_state();
        let highest = state.nodes().map(|n| n.id).max().unwrap();
        let map = build_progression_map(Key::parse("A", "minor").unwrap());
        let (next, root) = state.initialized(map, 5);
        assert!(next.nodes().all(|n| n.id > highest));
        assert_eq!(next.root().unwrap().id, root);
        assert_eq!(next.node(root).unwrap().chord.as_str(), "Am");
    }
}
