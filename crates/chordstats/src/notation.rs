//! Corpus chord notation.
//!
//! The training dataset spells sharps with an `s` ("Cs", "Fsmin7") and
//! qualities as words ("min", "maj7", "no3d"). The exported model stores the
//! simplified form this module produces ("C#", "F#m7", "F#5"), and the
//! engine converts its own chords into that form for queries.

use harmony::note::{self, Spelling};
use harmony::{Chord, ChordQuality};

/// Normalize a dataset chord spelling to the simplified corpus form.
///
/// Unparseable input is returned unchanged so odd dataset entries still
/// round-trip as opaque symbols.
pub fn normalize_symbol(raw: &str) -> String {
    let upper = raw.split('/').next().unwrap_or(raw);
    let Ok((root, consumed)) = note::parse_note_prefix(upper) else {
        return raw.to_string();
    };

    // Dataset flats stay flats; everything else reads as sharps.
    let spelling = if upper.as_bytes().get(1) == Some(&b'b') {
        Spelling::Flats
    } else {
        Spelling::Sharps
    };
    let root_name = note::note_name(root, spelling);
    format!("{}{}", root_name, normalize_quality(&upper[consumed..]))
}

fn normalize_quality(quality: &str) -> String {
    if quality.is_empty() {
        return String::new();
    }
    if quality.to_lowercase().contains("no3d") {
        return "5".to_string();
    }
    if let Some(rest) = quality.strip_prefix("min") {
        return match rest {
            "7" => "m7".to_string(),
            "maj7" => "mM7".to_string(),
            "7b5" => "m7b5".to_string(),
            r if r.starts_with("add") => format!("m{r}"),
            _ => "m".to_string(),
        };
    }
    if let Some(rest) = quality.strip_prefix("dim") {
        return if rest == "7" { "dim7" } else { "dim" }.to_string();
    }
    if quality.starts_with("aug") {
        return "aug".to_string();
    }
    if quality.starts_with("sus") {
        return quality.to_string();
    }
    if let Some(rest) = quality.strip_prefix("maj") {
        return match rest {
            "7" => "M7".to_string(),
            "9" => "M9".to_string(),
            _ => String::new(),
        };
    }
    quality.to_string()
}

/// Render a chord the way the exported model spells it.
pub fn corpus_symbol(chord: &Chord) -> String {
    let suffix = match chord.quality {
        ChordQuality::Major => "",
        ChordQuality::Minor => "m",
        ChordQuality::Diminished => "dim",
        ChordQuality::Augmented => "aug",
        ChordQuality::Major7 => "M7",
        ChordQuality::Minor7 => "m7",
        ChordQuality::Dominant7 => "7",
        ChordQuality::Diminished7 => "dim7",
        ChordQuality::HalfDiminished7 => "m7b5",
        ChordQuality::Sus2 => "sus2",
        ChordQuality::Sus4 => "sus4",
    };
    format!("{}{}", note::note_name(chord.root, Spelling::Sharps), suffix)
}

/// Parse a corpus symbol into a chord the engine can reason about.
///
/// Qualities outside the engine's closed set (power chords, ninths,
/// add-chords) yield `None`.
pub fn parse_corpus_symbol(symbol: &str) -> Option<Chord> {
    symbol.parse().ok()
}

/// The same symbol with its root spelled the other way ("C#m" <-> "Dbm").
pub fn alternate_spelling(symbol: &str) -> Option<String> {
    let (root, consumed) = note::parse_note_prefix(symbol).ok()?;
    if consumed < 2 {
        return None;
    }
    let spelling = match symbol.as_bytes().get(1) {
        Some(b'b') => Spelling::Sharps,
        _ => Spelling::Flats,
    };
    Some(format!("{}{}", note::note_name(root, spelling), &symbol[consumed..]))
}
