use std::collections::BTreeMap;

use harmony::{Chord, ChordId, NodeLookup, ProgressionMap, ProgressionNode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Every chord node materialized in a session, by chord id.
///
/// Append-only: map nodes are seeded on `initialize`, synthetic nodes are
/// added as the corpus suggests them, and nothing is removed when tree
/// nodes are deleted. Bounded by the chord space (12 roots, 11 qualities).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRegistry {
    nodes: BTreeMap<ChordId, ProgressionNode>,
}

impl NodeRegistry {
    pub fn from_map(map: &ProgressionMap) -> Self {
        let nodes = map
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.clone()))
            .collect();
        Self { nodes }
    }

    /// Add a node unless its id is already known. Returns true if added.
    ///
    /// Existing entries are never replaced, so a node's chord and roman
    /// numeral stay fixed once registered.
    pub fn register(&mut self, node: ProgressionNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        debug!(chord = %node.id, synthetic = node.synthetic, "registered node");
        self.nodes.insert(node.id.clone(), node);
        true
    }

    pub fn get(&self, id: &ChordId) -> Option<&ProgressionNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &ChordId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Find a node by enharmonic chord equality.
    pub fn find_chord(&self, chord: &Chord) -> Option<&ProgressionNode> {
        self.nodes.values().find(|n| &n.chord == chord)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgressionNode> {
        self.nodes.values()
    }
}

impl NodeLookup for NodeRegistry {
    fn lookup(&self, id: &ChordId) -> Option<&ProgressionNode> {
        self.get(id)
    }
}
