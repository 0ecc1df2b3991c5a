//! Core data model for the milon Hebrew lexical dictionary.
//!
//! Shared types used by the parsers, the vector backends, and the lookup
//! engine: lexical entries with their step-wise builder, the dictionary
//! keyed by vowel-stripped normal form, grammatical gender classification,
//! and small vector math helpers.

pub mod normalize;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ─── Gender ─────────────────────────────────────────────────────

/// Grammatical gender derived from a secondary-lexicon pos annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

/// Raw classification outcome of a pos annotation string.
///
/// `Ambiguous` stays distinct from `Unknown` so the caller can log the
/// conflicting signal before collapsing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderSignal {
    Male,
    Female,
    Ambiguous,
    Unknown,
}

impl GenderSignal {
    /// Collapse the signal into a `Gender`. Ambiguous resolves to Unknown.
    pub fn resolve(self) -> Gender {
        match self {
            GenderSignal::Male => Gender::Male,
            GenderSignal::Female => Gender::Female,
            GenderSignal::Ambiguous | GenderSignal::Unknown => Gender::Unknown,
        }
    }
}

/// Classify a secondary-lexicon pos string into a gender signal.
///
/// A string marks male when it equals "m" or contains "m." or ".m", and
/// female under the symmetric "f" patterns. Matching both is Ambiguous.
/// Matching neither ("du.", "pl." and similar annotations) is Unknown.
pub fn classify_gender(pos: &str) -> GenderSignal {
    let male = pos == "m" || pos.contains("m.") || pos.contains(".m");
    let female = pos == "f" || pos.contains("f.") || pos.contains(".f");
    match (male, female) {
        (true, true) => GenderSignal::Ambiguous,
        (true, false) => GenderSignal::Male,
        (false, true) => GenderSignal::Female,
        (false, false) => GenderSignal::Unknown,
    }
}

// ─── Lexical entries ────────────────────────────────────────────

/// Field of a lexical entry that the source document may omit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Headword,
    PartOfSpeech,
    Definition,
}

impl MissingField {
    pub fn as_str(self) -> &'static str {
        match self {
            MissingField::Headword => "headword",
            MissingField::PartOfSpeech => "part of speech",
            MissingField::Definition => "definition",
        }
    }
}

/// One candidate sense of a Hebrew headword.
///
/// `normalized` is always derived from `surface`: only `EntryBuilder`
/// constructs entries and it computes the key itself. Every other field
/// may be absent when the source entry omitted it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalEntry {
    /// Source document id, used only for diagnostics.
    pub id: String,
    /// Headword as written, with vowel points.
    pub surface: Option<String>,
    /// Vowel-stripped surface form, the dictionary key.
    pub normalized: Option<String>,
    /// Transliteration of the headword.
    pub pronunciation: Option<String>,
    /// Lowercased English definition.
    pub gloss: Option<String>,
    /// Source-vocabulary part-of-speech tag ("n", "v", "a", ...).
    pub pos: Option<String>,
    /// Gender derived from the cross-referenced secondary entry, None
    /// when no cross-reference resolved.
    pub gender: Option<Gender>,
}

impl LexicalEntry {
    pub fn builder(id: impl Into<String>) -> EntryBuilder {
        EntryBuilder::new(id)
    }

    /// Every non-derived field is present. Advisory only; incomplete
    /// entries stay in the dictionary.
    pub fn is_complete(&self) -> bool {
        self.surface.is_some()
            && self.pronunciation.is_some()
            && self.gloss.is_some()
            && self.pos.is_some()
    }
}

/// Step-wise entry constructor keeping the missing-vs-present distinction
/// explicit: `missing_fields` enumerates what the source omitted before
/// the entry is sealed.
#[derive(Debug, Default)]
pub struct EntryBuilder {
    id: String,
    surface: Option<String>,
    pronunciation: Option<String>,
    gloss: Option<String>,
    pos: Option<String>,
    gender: Option<Gender>,
}

impl EntryBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn headword(mut self, surface: impl Into<String>) -> Self {
        self.surface = Some(surface.into());
        self
    }

    pub fn pronunciation(mut self, xlit: impl Into<String>) -> Self {
        self.pronunciation = Some(xlit.into());
        self
    }

    /// Definition text; stored lowercased.
    pub fn gloss(mut self, gloss: &str) -> Self {
        self.gloss = Some(gloss.to_lowercase());
        self
    }

    pub fn pos(mut self, pos: impl Into<String>) -> Self {
        self.pos = Some(pos.into());
        self
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    /// The warned-about source sub-elements that are still absent.
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.surface.is_none() {
            missing.push(MissingField::Headword);
        }
        if self.pos.is_none() {
            missing.push(MissingField::PartOfSpeech);
        }
        if self.gloss.is_none() {
            missing.push(MissingField::Definition);
        }
        missing
    }

    /// Seal the entry, deriving the normalized key from the surface form.
    pub fn build(self) -> LexicalEntry {
        let normalized = self.surface.as_deref().map(normalize::strip_nikud);
        LexicalEntry {
            id: self.id,
            surface: self.surface,
            normalized,
            pronunciation: self.pronunciation,
            gloss: self.gloss,
            pos: self.pos,
            gender: self.gender,
        }
    }
}

// ─── Dictionary ─────────────────────────────────────────────────

/// Dictionary keyed by vowel-stripped normal form.
///
/// Candidate lists preserve source document order; downstream tie-breaking
/// relies on it. Built once, then handed around by shared reference.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Dictionary {
    entries: HashMap<String, Vec<LexicalEntry>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under the entry's derived key. Returns false and leaves the
    /// dictionary untouched when the key is missing or empty.
    pub fn insert(&mut self, entry: LexicalEntry) -> bool {
        match entry.normalized.as_deref() {
            Some(key) if !key.is_empty() => {
                self.entries.entry(key.to_string()).or_default().push(entry);
                true
            }
            _ => false,
        }
    }

    /// Candidate senses under a normalized key, in source order.
    pub fn candidates(&self, key: &str) -> Option<&[LexicalEntry]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of distinct normalized keys.
    pub fn distinct_keys(&self) -> usize {
        self.entries.len()
    }

    /// Total number of entries across all keys.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─── Vector utilities ───────────────────────────────────────────

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn norm(a: &[f32]) -> f32 {
    a.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity; 0.0 when either vector has near-zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let d = norm(a) * norm(b);
    if d > 1e-10 {
        dot(a, b) / d
    } else {
        0.0
    }
}
