//! OllamaVectors: sense vectors served by a local Ollama instance.
//!
//! Calls the /api/embeddings endpoint once per sense term. An in-memory
//! memo cache keeps each sense at one API call per session, misses
//! included.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{sense_key, SenseVectors, VectorsError};

// ─── Ollama API types ───────────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingsRequest {
    model: String,
    prompt: String,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Option<Vec<f32>>,
}

// ─── OllamaVectors ──────────────────────────────────────────────

/// Embedding backend using a local Ollama instance.
///
/// Implements `SenseVectors` with interior mutability (`RefCell`) so that
/// `vector(&self, ...)` can update the memo cache and session counters.
pub struct OllamaVectors {
    /// Ollama API base URL (e.g. "http://localhost:11434").
    base_url: String,
    /// Embedding model name (e.g. "nomic-embed-text").
    model: String,
    /// Memoized results, misses cached as None.
    memory: RefCell<HashMap<String, Option<Vec<f32>>>>,
    /// Stats: API calls made this session.
    api_calls: RefCell<usize>,
    /// Stats: memo cache hits this session.
    memory_hits: RefCell<usize>,
    /// Stats: failed API calls this session.
    failures: RefCell<usize>,
}

impl OllamaVectors {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            memory: RefCell::new(HashMap::new()),
            api_calls: RefCell::new(0),
            memory_hits: RefCell::new(0),
            failures: RefCell::new(0),
        }
    }

    /// Check that Ollama is reachable and the model is available.
    /// Call this before a long batch run to fail fast.
    pub fn check_health(&self) -> Result<(), VectorsError> {
        let url = format!("{}/api/tags", self.base_url);
        let mut resp = ureq::get(&url)
            .call()
            .map_err(|e| VectorsError::Ollama(format!("cannot reach Ollama at {}: {}", self.base_url, e)))?;

        let body: serde_json::Value = resp
            .body_mut()
            .read_json()
            .map_err(|e| VectorsError::Ollama(format!("bad response from Ollama: {}", e)))?;

        // The model may be listed as "name" or "name:tag".
        if let Some(models) = body.get("models").and_then(|m| m.as_array()) {
            let found = models
                .iter()
                .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                .any(|name| {
                    name.starts_with(&self.model)
                        || self.model.starts_with(name.split(':').next().unwrap_or(""))
                });
            if !found {
                return Err(VectorsError::Ollama(format!(
                    "model '{}' not found on {}",
                    self.model, self.base_url
                )));
            }
        }
        Ok(())
    }

    /// Log session statistics.
    pub fn log_stats(&self) {
        debug!(
            "ollama vectors session: {} API calls, {} memory hits, {} failures",
            self.api_calls.borrow(),
            self.memory_hits.borrow(),
            self.failures.borrow(),
        );
    }

    /// One embeddings API call. Failures read as a vocabulary miss.
    fn embed(&self, key: &str) -> Option<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingsRequest {
            model: self.model.clone(),
            prompt: key.to_string(),
        };

        let mut resp = match ureq::post(&url).send_json(&request) {
            Ok(r) => r,
            Err(e) => {
                warn!("ollama embeddings call failed for '{}': {}", key, e);
                *self.failures.borrow_mut() += 1;
                return None;
            }
        };

        let parsed: EmbeddingsResponse = match resp.body_mut().read_json() {
            Ok(p) => p,
            Err(e) => {
                warn!("unparseable embeddings response for '{}': {}", key, e);
                *self.failures.borrow_mut() += 1;
                return None;
            }
        };

        *self.api_calls.borrow_mut() += 1;
        match parsed.embedding {
            Some(v) if !v.is_empty() => Some(v),
            _ => None,
        }
    }
}

impl SenseVectors for OllamaVectors {
    fn vector(&self, term: &str, pos_tag: &str) -> Option<Vec<f32>> {
        let key = sense_key(term, pos_tag);
        if let Some(cached) = self.memory.borrow().get(&key) {
            *self.memory_hits.borrow_mut() += 1;
            return cached.clone();
        }
        let result = self.embed(&key);
        self.memory.borrow_mut().insert(key, result.clone());
        result
    }

    fn name(&self) -> &str {
        "OllamaVectors"
    }

    fn len(&self) -> usize {
        self.memory.borrow().len()
    }
}
