//! Best-sense selection: pick, among the candidate senses of a Hebrew
//! headword, the one whose English gloss sits closest to a supplied
//! English word in a sense-qualified embedding space.
//!
//! Word vectors do not deal with multiple word senses on their own, so
//! every vector request is qualified by the candidate's part of speech
//! mapped into the provider's tag vocabulary.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use milon_core::{Dictionary, LexicalEntry};
use milon_vectors::SenseVectors;

// ─── Pos tag mapping ────────────────────────────────────────────

/// Maps source-lexicon pos tags onto the embedding provider's tag
/// vocabulary. Source tags are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct PosTagMap {
    map: HashMap<String, String>,
}

impl Default for PosTagMap {
    /// The lexical-index tag set mapped onto universal-style tags.
    fn default() -> Self {
        let mut map = HashMap::new();
        for (source, provider) in [
            ("a", "ADJ"),
            ("adv", "ADV"),
            ("v", "VERB"),
            ("conj", "CONJ"),
            ("inj", "INTJ"),
            ("n", "NOUN"),
            ("prt", "PART"),
            ("pron", "PRON"),
        ] {
            map.insert(source.to_string(), provider.to_string());
        }
        Self { map }
    }
}

impl PosTagMap {
    /// Provider tag for a source tag, or None for unmapped tags.
    pub fn resolve(&self, source_tag: &str) -> Option<&str> {
        self.map.get(&source_tag.to_lowercase()).map(String::as_str)
    }

    /// Add or override a mapping.
    pub fn insert(&mut self, source_tag: &str, provider_tag: &str) {
        self.map
            .insert(source_tag.to_lowercase(), provider_tag.to_string());
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

// ─── Errors ─────────────────────────────────────────────────────

/// Lookup failures the caller must tell apart from "no candidate scored
/// above the floor".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("headword key '{0}' is not in the dictionary")]
    UnknownKey(String),
}

// ─── Sense lookup ───────────────────────────────────────────────

/// Bundles the immutable dictionary with an embedding backend and a tag
/// mapping for repeated best-sense lookups.
pub struct SenseLookup<'a> {
    dictionary: &'a Dictionary,
    vectors: &'a dyn SenseVectors,
    tag_map: PosTagMap,
}

impl<'a> SenseLookup<'a> {
    pub fn new(dictionary: &'a Dictionary, vectors: &'a dyn SenseVectors) -> Self {
        Self {
            dictionary,
            vectors,
            tag_map: PosTagMap::default(),
        }
    }

    pub fn with_tag_map(
        dictionary: &'a Dictionary,
        vectors: &'a dyn SenseVectors,
        tag_map: PosTagMap,
    ) -> Self {
        Self {
            dictionary,
            vectors,
            tag_map,
        }
    }

    /// Select the candidate sense of `hebrew_key` whose gloss best matches
    /// `english_gloss` in the embedding space.
    ///
    /// `hebrew_key` must already be vowel-stripped. A key absent from the
    /// dictionary is an error, distinct from `Ok(None)` which means the
    /// key exists but no candidate produced a positive similarity.
    /// Candidates with an unmapped pos or a sense term the backend does
    /// not know are skipped, never failing the whole selection. Score
    /// ties keep the earliest candidate in source order.
    pub fn select_best_sense(
        &self,
        hebrew_key: &str,
        english_gloss: &str,
    ) -> Result<Option<&'a LexicalEntry>, LookupError> {
        let candidates = self
            .dictionary
            .candidates(hebrew_key)
            .ok_or_else(|| LookupError::UnknownKey(hebrew_key.to_string()))?;

        let mut max_similarity = 0.0f32;
        let mut best: Option<&LexicalEntry> = None;

        for candidate in candidates {
            let provider_tag = match candidate.pos.as_deref().and_then(|p| self.tag_map.resolve(p)) {
                Some(tag) => tag,
                None => {
                    warn!(
                        "unrecognized or missing pos {:?} for entry '{}', skipping",
                        candidate.pos, candidate.id
                    );
                    continue;
                }
            };

            let gloss = match candidate.gloss.as_deref() {
                Some(g) => g,
                None => {
                    warn!("entry '{}' has no gloss to compare, skipping", candidate.id);
                    continue;
                }
            };

            let query = match self.vectors.vector(english_gloss, provider_tag) {
                Some(v) => v,
                None => {
                    debug!(
                        "no vector for '{}|{}', entry '{}' left unscored",
                        english_gloss, provider_tag, candidate.id
                    );
                    continue;
                }
            };
            let sense = match self.vectors.vector(gloss, provider_tag) {
                Some(v) => v,
                None => {
                    debug!(
                        "no vector for '{}|{}', entry '{}' left unscored",
                        gloss, provider_tag, candidate.id
                    );
                    continue;
                }
            };

            let similarity = self.vectors.similarity(&query, &sense);
            if similarity > max_similarity {
                max_similarity = similarity;
                best = Some(candidate);
            }
        }

        Ok(best)
    }
}
