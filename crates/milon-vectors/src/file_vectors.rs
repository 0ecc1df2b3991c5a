//! FileVectors: sense vectors backed by a pre-computed JSON file.
//!
//! Format: `HashMap<String, Vec<f32>>` keyed by "term|TAG", produced
//! offline from any embedding model.

use std::collections::HashMap;
use std::path::Path;

use crate::{sense_key, SenseVectors, VectorsError};

pub struct FileVectors {
    vectors: HashMap<String, Vec<f32>>,
}

impl FileVectors {
    /// Load from a JSON vectors file.
    pub fn load(path: &Path) -> Result<Self, VectorsError> {
        let content = std::fs::read_to_string(path)?;
        let vectors: HashMap<String, Vec<f32>> = serde_json::from_str(&content)?;
        Ok(Self { vectors })
    }

    /// An empty backend (useful for testing).
    pub fn empty() -> Self {
        Self {
            vectors: HashMap::new(),
        }
    }

    /// Build from already-keyed vectors (useful for testing).
    pub fn from_map(vectors: HashMap<String, Vec<f32>>) -> Self {
        Self { vectors }
    }
}

impl SenseVectors for FileVectors {
    fn vector(&self, term: &str, pos_tag: &str) -> Option<Vec<f32>> {
        self.vectors.get(&sense_key(term, pos_tag)).cloned()
    }

    fn name(&self) -> &str {
        "FileVectors"
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_and_lookup() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pure|ADJ": [1.0, 0.0], "purity|NOUN": [0.0, 1.0]}}"#).unwrap();

        let vectors = FileVectors::load(file.path()).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.vector("pure", "ADJ"), Some(vec![1.0, 0.0]));
        assert!(vectors.contains("purity", "NOUN"));
        assert_eq!(vectors.vector("pure", "NOUN"), None);
    }

    #[test]
    fn test_malformed_file_fails_to_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(FileVectors::load(file.path()), Err(VectorsError::Json(_))));
    }

    #[test]
    fn test_empty_backend() {
        let vectors = FileVectors::empty();
        assert!(vectors.is_empty());
        assert_eq!(vectors.vector("pure", "ADJ"), None);
    }

    #[test]
    fn test_default_similarity_is_cosine() {
        let vectors = FileVectors::empty();
        assert!((vectors.similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(vectors.similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }
}
