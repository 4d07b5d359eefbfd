//! Embedding client abstraction and the built-in deterministic encoder.
//!
//! Embedding computation is CPU-bound, so the built-in client runs batch encodes on the
//! blocking worker pool rather than on the async request loop.

use crate::config::get_config;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
}

/// Interface implemented by embedding backends.
///
/// Implementations must preserve input order: the vector at position `i` embeds the text at
/// position `i`.
#[async_trait]
pub trait EmbeddingClient {
    /// Produce an embedding vector for each supplied chunk of text.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;
}

/// Deterministic bag-of-words embedding client.
///
/// Each lowercase whitespace token is hashed into a vector slot and the result is
/// L2-normalized, so cosine similarity approximates token overlap. Read-only after
/// construction and safe for concurrent use.
pub struct HashedBowClient;

impl HashedBowClient {
    /// Construct a new deterministic embedding client instance.
    pub const fn new() -> Self {
        Self
    }

    fn encode(text: &str, dimension: usize) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; dimension];

        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let slot = (hasher.finish() as usize) % dimension;
            embedding[slot] += 1.0;
        }

        let norm = embedding
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();

        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

impl Default for HashedBowClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingClient for HashedBowClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        let dimension = get_config().embedding_dimension;

        if dimension == 0 {
            return Err(EmbeddingClientError::GenerationFailed(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }

        if texts.is_empty() {
            return Err(EmbeddingClientError::GenerationFailed(
                "no texts provided".to_string(),
            ));
        }

        tracing::debug!(batch = texts.len(), dimension, "Generating embeddings");

        // Encoding is CPU-bound; keep it off the async request loop.
        tokio::task::spawn_blocking(move || {
            texts
                .into_iter()
                .map(|text| Self::encode(&text, dimension))
                .collect()
        })
        .await
        .map_err(|err| EmbeddingClientError::GenerationFailed(err.to_string()))
    }
}

/// Build an embedding client suitable for the current configuration.
pub fn get_embedding_client() -> Box<dyn EmbeddingClient + Send + Sync> {
    Box::new(HashedBowClient::new())
}
