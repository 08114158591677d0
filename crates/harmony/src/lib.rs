//! Harmony primitives and progression maps.
//!
//! This crate is the leaf layer of Trunkline: pitch-class arithmetic, chord
//! qualities, scales and keys, roman numerals, and the progression map
//! builder that turns a key into a graph of candidate chords connected by
//! transition-strength edges.
//!
//! # Example
//!
//! ```
//! use harmony::{build_progression_map, Key};
//!
//! let key = Key::parse("C", "major").unwrap();
//! let map = build_progression_map(key);
//!
//! let dominant = map.node_by_symbol("G").unwrap();
//! assert_eq!(dominant.roman.to_string(), "V");
//! assert!(map.edges_from(&dominant.id).any(|e| e.to.as_str() == "C"));
//! ```

pub mod chord;
pub mod map;
pub mod note;
pub mod roman;
pub mod scale;
pub mod transition;

pub use chord::{Chord, ChordQuality};
pub use map::{
    build_progression_map, infer_node, ChordId, NodeCategory, NodeLookup, ProgressionEdge,
    ProgressionMap, ProgressionNode,
};
pub use note::{Consonance, PitchClass, Spelling};
pub use roman::{HarmonicFunction, RomanNumeral, RomanRole};
pub use scale::{Key, ScaleType};
pub use transition::{calculate_transition_strength, EDGE_THRESHOLD};

/// Errors from parsing static harmonic input.
///
/// These indicate a programming or input error (an unknown quality suffix,
/// a scale name we do not model), not a runtime data problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarmonyError {
    #[error("empty chord symbol")]
    EmptySymbol,

    #[error("invalid note name: {0:?}")]
    InvalidNote(String),

    #[error("unknown chord quality {suffix:?} in {symbol:?}")]
    UnknownQuality { symbol: String, suffix: String },

    #[error("unknown scale type: {0:?}")]
    UnknownScale(String),
}

pub type Result<T> = std::result::Result<T, HarmonyError>;
