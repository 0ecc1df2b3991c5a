//! Pluggable sense-vector backends.
//!
//! Any embedding source implements `SenseVectors`. Current backends:
//! `FileVectors` (pre-computed JSON file), `OllamaVectors` (local Ollama
//! API). A sense is a term qualified by the provider's pos tag, keyed as
//! "term|TAG".

mod file_vectors;
mod ollama;

pub use file_vectors::FileVectors;
pub use ollama::OllamaVectors;

use thiserror::Error;

/// Failures constructing or loading a backend. Lookup misses are not
/// errors; `vector` returns None for senses the backend does not know.
#[derive(Debug, Error)]
pub enum VectorsError {
    #[error("cannot read vectors file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed vectors file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ollama backend: {0}")]
    Ollama(String),
}

/// Compose the sense-qualified lookup key for a term and a provider tag.
pub fn sense_key(term: &str, pos_tag: &str) -> String {
    format!("{}|{}", term, pos_tag)
}

/// Pluggable sense-qualified embedding backend trait.
///
/// The trait is object-safe and uses `&self` (sync). Backends needing
/// mutation (e.g. memoizing API responses) use interior mutability.
pub trait SenseVectors {
    /// Vector for a sense-qualified term. None when the backend does not
    /// know the term under that tag.
    fn vector(&self, term: &str, pos_tag: &str) -> Option<Vec<f32>>;

    /// Similarity between two vectors. Backends default to cosine.
    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        milon_core::cosine_similarity(a, b)
    }

    /// Membership check for a sense-qualified term.
    fn contains(&self, term: &str, pos_tag: &str) -> bool {
        self.vector(term, pos_tag).is_some()
    }

    /// Human-readable backend name (for logging/reports).
    fn name(&self) -> &str;

    /// Number of senses the backend currently holds (0 if unknown).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
