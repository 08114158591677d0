//! Progression map: every candidate chord for a key and the transition
//! strengths between them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chord::{Chord, ChordQuality};
use crate::note::{self, Spelling};
use crate::roman::{HarmonicFunction, RomanNumeral, RomanRole, Target};
use crate::scale::{Key, ScaleType};
use crate::transition::{calculate_transition_strength, EDGE_THRESHOLD};

/// Degrees that receive a secondary dominant.
const SECONDARY_TARGETS: [u8; 5] = [2, 3, 4, 5, 6];
/// Degrees approached by a diminished seventh from a half-step below.
const PASSING_TARGETS: [u8; 2] = [2, 5];

/// Canonical chord symbol used as node identity ("Dm", "A7", "C#dim7").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChordId(String);

impl ChordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn for_chord(chord: &Chord, spelling: Spelling) -> Self {
        Self(chord.symbol(spelling))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::borrow::Borrow<str> for ChordId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Diatonic,
    SecondaryDominant,
    DiminishedPassing,
    Borrowed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionNode {
    pub id: ChordId,
    pub chord: Chord,
    pub roman: RomanNumeral,
    pub function: HarmonicFunction,
    pub category: NodeCategory,
    /// Qualities this chord can be extended to without changing its role.
    pub extensions: Vec<ChordQuality>,
    /// Fabricated from corpus statistics rather than built with the map.
    #[serde(default)]
    pub synthetic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionEdge {
    pub from: ChordId,
    pub to: ChordId,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionMap {
    pub key: Key,
    pub nodes: Vec<ProgressionNode>,
    pub edges: Vec<ProgressionEdge>,
}

/// Resolve chord ids to nodes.
///
/// Implemented by the map itself and by session registries that also hold
/// synthetic nodes.
pub trait NodeLookup {
    fn lookup(&self, id: &ChordId) -> Option<&ProgressionNode>;
}

impl NodeLookup for ProgressionMap {
    fn lookup(&self, id: &ChordId) -> Option<&ProgressionNode> {
        self.node(id)
    }
}

impl ProgressionMap {
    pub fn node(&self, id: &ChordId) -> Option<&ProgressionNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_by_symbol(&self, symbol: &str) -> Option<&ProgressionNode> {
        self.nodes.iter().find(|n| n.id.as_str() == symbol)
    }

    /// Find a node by enharmonic chord equality rather than spelling.
    pub fn node_for_chord(&self, chord: &Chord) -> Option<&ProgressionNode> {
        self.nodes.iter().find(|n| &n.chord == chord)
    }

    pub fn tonic_node(&self) -> Option<&ProgressionNode> {
        self.node_for_chord(&self.key.tonic_chord())
    }

    pub fn edges_from<'a>(
        &'a self,
        id: &'a ChordId,
    ) -> impl Iterator<Item = &'a ProgressionEdge> + 'a {
        self.edges.iter().filter(move |e| &e.from == id)
    }

    pub fn edge(&self, from: &ChordId, to: &ChordId) -> Option<&ProgressionEdge> {
        self.edges.iter().find(|e| &e.from == from && &e.to == to)
    }
}

/// Build the full candidate graph for a key.
///
/// Pure: the same key always yields the same nodes and edges in the same
/// order.
pub fn build_progression_map(key: Key) -> ProgressionMap {
    let spelling = key.spelling();
    let qualities = key.scale.triad_qualities();
    let mut nodes: Vec<ProgressionNode> = Vec::new();

    for degree in 1..=7u8 {
        let quality = qualities[(degree - 1) as usize];
        let chord = Chord::new(key.degree_root(degree), quality);
        let function = HarmonicFunction::for_degree(degree);
        nodes.push(ProgressionNode {
            id: ChordId::for_chord(&chord, spelling),
            chord,
            roman: RomanNumeral::plain(degree, 0, quality),
            function,
            category: NodeCategory::Diatonic,
            extensions: extensions_for(quality, function),
            synthetic: false,
        });
    }

    for degree in SECONDARY_TARGETS {
        let target = Target {
            degree,
            quality: qualities[(degree - 1) as usize],
        };
        let chord = Chord::new(
            note::transpose(key.degree_root(degree), 7),
            ChordQuality::Dominant7,
        );
        push_unique(
            &mut nodes,
            ProgressionNode {
                id: ChordId::for_chord(&chord, spelling),
                chord,
                roman: RomanNumeral::secondary_dominant(target),
                function: HarmonicFunction::Dominant,
                category: NodeCategory::SecondaryDominant,
                extensions: Vec::new(),
                synthetic: false,
            },
        );
    }

    for degree in PASSING_TARGETS {
        let target = Target {
            degree,
            quality: qualities[(degree - 1) as usize],
        };
        let chord = Chord::new(
            note::transpose(key.degree_root(degree), -1),
            ChordQuality::Diminished7,
        );
        push_unique(
            &mut nodes,
            ProgressionNode {
                id: ChordId::for_chord(&chord, spelling),
                chord,
                roman: RomanNumeral::passing_diminished(target),
                function: HarmonicFunction::Dominant,
                category: NodeCategory::DiminishedPassing,
                extensions: Vec::new(),
                synthetic: false,
            },
        );
    }

    let mut edges = Vec::new();
    for (i, from) in nodes.iter().enumerate() {
        for (j, to) in nodes.iter().enumerate() {
            if i == j {
                continue;
            }
            let strength = calculate_transition_strength(&from.chord, &to.chord);
            if strength >= EDGE_THRESHOLD {
                edges.push(ProgressionEdge {
                    from: from.id.clone(),
                    to: to.id.clone(),
                    strength,
                });
            }
        }
    }

    debug!(
        key = %key,
        nodes = nodes.len(),
        edges = edges.len(),
        "built progression map"
    );

    ProgressionMap { key, nodes, edges }
}

fn push_unique(nodes: &mut Vec<ProgressionNode>, node: ProgressionNode) {
    if nodes.iter().any(|n| n.id == node.id) {
        return;
    }
    nodes.push(node);
}

fn extensions_for(quality: ChordQuality, function: HarmonicFunction) -> Vec<ChordQuality> {
    match (quality, function) {
        (ChordQuality::Major, HarmonicFunction::Dominant) => {
            vec![ChordQuality::Dominant7, ChordQuality::Sus4]
        }
        (ChordQuality::Major, _) => {
            vec![ChordQuality::Major7, ChordQuality::Sus2, ChordQuality::Sus4]
        }
        (ChordQuality::Minor, _) => vec![ChordQuality::Minor7],
        (ChordQuality::Diminished, _) => {
            vec![ChordQuality::HalfDiminished7, ChordQuality::Diminished7]
        }
        _ => Vec::new(),
    }
}

/// Infer a node for a chord the map does not contain.
///
/// Used for chords known only from corpus statistics. Roman numeral,
/// function, and category come from the chord's relation to the key:
/// dominant sevenths resolving to degrees 2–6 read as secondary dominants,
/// diminished sevenths a half-step under a scale tone as passing chords,
/// anything else by its (possibly altered) root degree.
pub fn infer_node(chord: &Chord, key: &Key) -> ProgressionNode {
    let qualities = key.scale.triad_qualities();
    let in_scale = key.contains(chord.root);

    let applied_target = |root_offset: i32| {
        key.degree_of(note::transpose(chord.root, root_offset))
            .map(|degree| Target {
                degree,
                quality: qualities[(degree - 1) as usize],
            })
    };

    let roman = match chord.quality {
        ChordQuality::Dominant7 => match applied_target(5) {
            Some(target) if SECONDARY_TARGETS.contains(&target.degree) => {
                RomanNumeral::secondary_dominant(target)
            }
            _ => plain_numeral(chord, key),
        },
        ChordQuality::Diminished7 => match applied_target(1) {
            Some(target) => RomanNumeral::passing_diminished(target),
            None => plain_numeral(chord, key),
        },
        ChordQuality::Diminished if !in_scale => match applied_target(1) {
            Some(target) => RomanNumeral::passing_diminished(target),
            None => plain_numeral(chord, key),
        },
        _ => plain_numeral(chord, key),
    };

    let function = match roman.role {
        RomanRole::SecondaryDominant { .. } | RomanRole::PassingDiminished { .. } => {
            HarmonicFunction::Dominant
        }
        RomanRole::Plain if roman.accidental == 0 => HarmonicFunction::for_degree(roman.degree),
        RomanRole::Plain if chord.quality == ChordQuality::Dominant7 => HarmonicFunction::Dominant,
        RomanRole::Plain => HarmonicFunction::Subdominant,
    };

    let category = match roman.role {
        RomanRole::SecondaryDominant { .. } => NodeCategory::SecondaryDominant,
        RomanRole::PassingDiminished { .. } => NodeCategory::DiminishedPassing,
        RomanRole::Plain if key.contains_chord(chord) => NodeCategory::Diatonic,
        RomanRole::Plain => NodeCategory::Borrowed,
    };

    ProgressionNode {
        id: ChordId::for_chord(chord, key.spelling()),
        chord: *chord,
        roman,
        function,
        category,
        extensions: extensions_for(chord.quality, function),
        synthetic: true,
    }
}

/// Degree plus accidental for a root. Chromatic roots in major keys read as
/// lowered degrees (bVII), in minor keys as raised ones (#VI).
fn plain_numeral(chord: &Chord, key: &Key) -> RomanNumeral {
    if let Some(degree) = key.degree_of(chord.root) {
        return RomanNumeral::plain(degree, 0, chord.quality);
    }

    let flat = key
        .degree_of(note::transpose(chord.root, 1))
        .map(|d| RomanNumeral::plain(d, -1, chord.quality));
    let sharp = key
        .degree_of(note::transpose(chord.root, -1))
        .map(|d| RomanNumeral::plain(d, 1, chord.quality));

    let preferred = match key.scale {
        ScaleType::Major => flat.or(sharp),
        ScaleType::Minor => sharp.or(flat),
    };
    // Every chromatic pitch class neighbours a scale tone in both modes.
    preferred.unwrap_or_else(|| RomanNumeral::plain(1, 0, chord.quality))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn c_major() -> ProgressionMap {
        build_progression_map(Key::parse("C", "major").unwrap())
    }

    #[test]
    fn c_major_diatonic_set() {
        let map = c_major();
        let expected = [
            ("C", "I", ChordQuality::Major),
            ("Dm", "ii", ChordQuality::Minor),
            ("Em", "iii", ChordQuality::Minor),
            ("F", "IV", ChordQuality::Major),
            ("G", "V", ChordQuality::Major),
            ("Am", "vi", ChordQuality::Minor),
            ("Bdim", "vii°", ChordQuality::Diminished),
        ];
        for (symbol, roman, quality) in expected {
            let node = map.node_by_symbol(symbol).unwrap_or_else(|| panic!("missing {symbol}"));
            assert_eq!(node.roman.to_string(), roman);
            assert_eq!(node.chord.quality, quality);
            assert_eq!(node.category, NodeCategory::Diatonic);
        }
    }

    #[test]
    fn secondary_dominant_of_five_is_d7() {
        let map = c_major();
        let d7 = map.node_by_symbol("D7").unwrap();
        assert_eq!(d7.roman.to_string(), "V/V");
        assert_eq!(d7.category, NodeCategory::SecondaryDominant);
        assert_eq!(d7.function, HarmonicFunction::Dominant);

        let secondaries: Vec<_> = map
            .nodes
            .iter()
            .filter(|n| n.category == NodeCategory::SecondaryDominant)
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(secondaries, vec!["A7", "B7", "C7", "D7", "E7"]);
    }

    #[test]
    fn passing_diminished_into_ii() {
        let map = c_major();
        let passing = map.node_by_symbol("C#dim7").unwrap();
        assert_eq!(passing.roman.to_string(), "vii°7/ii");
        assert_eq!(passing.category, NodeCategory::DiminishedPassing);
        assert!(map.node_by_symbol("F#dim7").is_some());
        assert_eq!(map.nodes.len(), 14);
    }

    #[test]
    fn map_is_deterministic() {
        for tonic in 0..12 {
            for scale in [ScaleType::Major, ScaleType::Minor] {
                let key = Key::new(tonic, scale);
                assert_eq!(build_progression_map(key), build_progression_map(key));
            }
        }
    }

    #[test]
    fn edges_are_bounded_and_loop_free() {
        let map = c_major();
        for edge in &map.edges {
            assert_ne!(edge.from, edge.to);
            assert!(edge.strength >= EDGE_THRESHOLD && edge.strength <= 1.0);
        }
        let g7_like = map.edge(&"G".into(), &"C".into()).unwrap();
        assert!(g7_like.strength > 0.35);
    }

    #[test]
    fn minor_key_uses_flat_spelling() {
        let map = build_progression_map(Key::parse("C", "minor").unwrap());
        let symbols: Vec<_> = map.nodes.iter().take(7).map(|n| n.id.as_str()).collect();
        assert_eq!(symbols, vec!["Cm", "Ddim", "Eb", "Fm", "Gm", "Ab", "Bb"]);
    }

    #[test]
    fn infer_borrowed_flat_seven() {
        let key = Key::parse("C", "major").unwrap();
        let node = infer_node(&"Bb".parse().unwrap(), &key);
        assert_eq!(node.roman.to_string(), "bVII");
        assert_eq!(node.category, NodeCategory::Borrowed);
        assert_eq!(node.function, HarmonicFunction::Subdominant);
        assert!(node.synthetic);
    }

    #[test]
    fn infer_applied_chords() {
        let key = Key::parse("C", "major").unwrap();
        let e7 = infer_node(&"E7".parse().unwrap(), &key);
        assert_eq!(e7.roman.to_string(), "V/vi");
        assert_eq!(e7.category, NodeCategory::SecondaryDominant);

        let g7 = infer_node(&"G7".parse().unwrap(), &key);
        assert_eq!(g7.roman.to_string(), "V7");
        assert_eq!(g7.category, NodeCategory::Diatonic);
        assert_eq!(g7.function, HarmonicFunction::Dominant);

        let gsharp = infer_node(&"G#dim7".parse().unwrap(), &key);
        assert_eq!(gsharp.roman.to_string(), "vii°7/vi");
        assert_eq!(gsharp.category, NodeCategory::DiminishedPassing);
    }
}
