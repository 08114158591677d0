use harmony::{ChordId, HarmonicFunction};
use progression::ScoreBreakdown;
use serde::{Deserialize, Serialize};

/// Identity of a node in the exploration tree.
///
/// Allocated monotonically per explorer and never reused, even across
/// `initialize` calls, so stale handles can never alias a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrunkNodeId(pub u64);

impl std::fmt::Display for TrunkNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrunkNode {
    pub id: TrunkNodeId,
    pub chord: ChordId,
    /// Exploration lane; `None` for the shared root.
    pub trunk: Option<usize>,
    pub depth: usize,
    pub parent: Option<TrunkNodeId>,
    pub is_leaf: bool,
}

impl TrunkNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_trunk_head(&self) -> bool {
        self.depth == 1
    }
}

/// Harmonic movement of an edge, from the destination's function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    ToTonic,
    ToSubdominant,
    ToDominant,
}

impl From<HarmonicFunction> for Movement {
    fn from(function: HarmonicFunction) -> Self {
        match function {
            HarmonicFunction::Tonic => Movement::ToTonic,
            HarmonicFunction::Subdominant => Movement::ToSubdominant,
            HarmonicFunction::Dominant => Movement::ToDominant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrunkEdge {
    pub from: TrunkNodeId,
    pub to: TrunkNodeId,
    pub movement: Movement,
    pub strength: f64,
    /// Destination has a tone outside the scale.
    pub chromatic: bool,
    pub matched_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}
