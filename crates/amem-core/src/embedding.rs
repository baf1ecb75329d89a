//! Embedding provider abstraction.
//!
//! The store embeds each note's rich text once, at creation, and embeds
//! queries at retrieval time. Both must go through the same provider so that
//! distances are meaningful.
//!
//! The production provider is [`ModelEmbeddingProvider`](crate::model_adapter::ModelEmbeddingProvider),
//! a wrapper around the local Candle model in `amem-model`. There is no silent
//! fallback: if the model is missing, opening the store fails with an
//! actionable error.

use crate::errors::AmemError;

/// Trait for embedding providers.
pub trait EmbeddingProvider: Send + Sync {
    /// Provider or model name, for logs and errors.
    fn name(&self) -> &str;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    ///
    /// Must be deterministic for a fixed model: the same text yields the
    /// same vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, AmemError>;
}

/// Deterministic pseudo-embedding of `text`, L2-normalized.
///
/// Used by test doubles; similar strings do not get similar vectors.
#[cfg(test)]
pub(crate) fn hash_to_embedding(text: &str, dimension: usize) -> Vec<f32> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let mut state = hasher.finish();

    let mut embedding = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let value = ((state >> 33) as f32 / (u32::MAX as f32 / 2.0)) - 1.0;
        embedding.push(value);
    }

    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }
    embedding
}
