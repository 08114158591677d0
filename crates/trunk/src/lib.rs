//! Trunk explorer: a tree of chord progressions grown from one tonic.
//!
//! A session starts with [`TrunkExplorer::initialize`], which builds the
//! key's progression map and plants a root on the tonic with up to
//! `max_trunks` heads, each the best move to a distinct chord root. From
//! there the caller expands leaves (harmonic plus per-genre corpus
//! candidates), selects candidates to grow a path, deletes subtrees, mutes
//! nodes, and picks a leaf to practice.
//!
//! State lives in immutable [`ExplorerState`] snapshots published through a
//! `tokio::sync::watch` channel. Readers never block writers and always see
//! a consistent tree.

pub mod explorer;
mod expand;
pub mod node;
pub mod registry;
pub mod settings;
pub mod state;

use harmony::ChordId;

pub use explorer::TrunkExplorer;
pub use node::{Movement, TrunkEdge, TrunkNode, TrunkNodeId};
pub use registry::NodeRegistry;
pub use settings::ExplorerSettings;
pub use state::{ExplorerState, NodeCandidates};

/// Why a tree mutation was rejected. Rejected mutations leave the state
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrunkError {
    #[error("explorer has not been initialized")]
    NotInitialized,

    #[error("no tree node {0}")]
    UnknownNode(TrunkNodeId),

    #[error("the root node cannot be deleted")]
    RootImmutable,

    #[error("node {0} is not a leaf")]
    NotLeaf(TrunkNodeId),

    #[error("cannot resolve chord {0}")]
    UnresolvedChord(ChordId),

    #[error("node {parent} already has a {chord} child")]
    DuplicateChild { parent: TrunkNodeId, chord: ChordId },

    #[error("all {0} trunks are in use")]
    NoFreeTrunk(usize),
}

pub type Result<T> = std::result::Result<T, TrunkError>;
