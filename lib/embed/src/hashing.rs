//! Deterministic feature-hashing text embedder.
//!
//! Word unigrams and character trigrams are hashed into a fixed number of
//! buckets. Texts sharing vocabulary land close in cosine space, which is
//! enough for offline runs, demos and tests without a remote model.

use crate::provider::EmbeddingProvider;
use shelfscout_core::Result;
use xxhash_rust::xxh3::xxh3_64;

pub const DEFAULT_HASHING_DIM: usize = 256;

#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dim: usize,
}

impl HashingEmbeddingProvider {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    /// Bucket for a feature. xxh3 output is fixed across builds, so stored
    /// vectors stay comparable with freshly embedded queries.
    fn bucket(&self, feature: &str) -> usize {
        (xxh3_64(feature.as_bytes()) % self.dim as u64) as usize
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        let normalized = text.to_lowercase();

        for word in normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            // Words contribute more than their trigrams
            vector[self.bucket(word)] += 2.0;

            let padded: Vec<char> = format!(" {word} ").chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                vector[self.bucket(&trigram)] += 1.0;
            }
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for v in &mut vector {
                *v /= magnitude;
            }
        }
        vector
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIM)
    }
}

impl EmbeddingProvider for HashingEmbeddingProvider {
    fn model(&self) -> &str {
        "feature-hashing"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }
}
