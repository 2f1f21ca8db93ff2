//! Deterministic hash-based embedder for tests and the CLI.

use std::hash::{DefaultHasher, Hash, Hasher};

use super::{Embedder, EmbedderError};
use crate::store::normalize;

/// Embeds text as a unit vector derived from word hashes.
///
/// Texts sharing words land closer together than unrelated texts, which is
/// enough structure to exercise retrieval without a real model.
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 384 }
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut embedding = vec![0.0f32; self.dimensions];

        // Each word contributes to a few hash-selected components, so word
        // overlap translates into vector similarity.
        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            for shift in [0u64, 16, 32, 48] {
                let slot = ((h >> shift) as usize) % self.dimensions;
                let sign = if (h >> shift) & 1 == 0 { 1.0 } else { -1.0 };
                embedding[slot] += sign;
            }
        }

        // Empty or whitespace-only text still gets a stable non-zero vector
        if embedding.iter().all(|v| *v == 0.0) {
            embedding[0] = 1.0;
        }

        normalize(&mut embedding);
        Ok(embedding)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
