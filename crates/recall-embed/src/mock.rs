//! Mock embedder for tests: deterministic vectors, no network.

use recall_types::{EmbedError, Embedder};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const DIM: usize = 384;

/// Deterministic embedder: the vector is seeded from the text hash and
/// normalized, so identical texts embed identically across runs.
pub struct MockEmbedder;

impl MockEmbedder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Embedder for MockEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            let mut state = hasher.finish() | 1;
            let mut v = Vec::with_capacity(DIM);
            for _ in 0..DIM {
                // xorshift64 keeps the sequence cheap and reproducible.
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let x = (state >> 40) as f32 / (1u32 << 24) as f32;
                v.push(x * 2.0 - 1.0);
            }
            let norm: f64 = v.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
            if norm > 0.0 {
                for x in &mut v {
                    *x = (*x as f64 / norm) as f32;
                }
            }
            out.push(v);
        }
        Ok(out)
    }
}

/// Embedder that always fails, for exercising degraded paths.
pub struct UnavailableEmbedder;

#[async_trait::async_trait]
impl Embedder for UnavailableEmbedder {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Err(EmbedError::Unavailable("mock provider offline".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_texts_embed_identically() {
        let embedder = MockEmbedder::new();
        let a = embedder.embed("same text").await.unwrap();
        let b = embedder.embed("same text").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DIM);
    }

    #[tokio::test]
    async fn different_texts_embed_differently() {
        let embedder = MockEmbedder::new();
        let a = embedder.embed("alpha").await.unwrap();
        let b = embedder.embed("beta").await.unwrap();
        assert_ne!(a, b);
    }
}
