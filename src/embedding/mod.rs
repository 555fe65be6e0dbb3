//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait, the [`RemoteProvider`] HTTP
//! client, and the [`cache::EmbeddingCache`] snapshot built over the corpus
//! before the server accepts traffic.

pub mod cache;
pub mod remote;

pub use cache::EmbeddingCache;
pub use remote::RemoteProvider;

use async_trait::async_trait;
use thiserror::Error;

/// A dense embedding vector.
pub type Embedding = Vec<f32>;

/// Errors from the embedding provider seam. A failed embedding surfaces as
/// one of these variants, never as a zero-filled vector.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Transport-level failure (connect, timeout, body).
    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("embedding service returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body could not be interpreted as a vector.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    /// The vector had the wrong number of dimensions.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl EmbeddingError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Status { status, .. } => {
                *status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Self::InvalidResponse(_) | Self::DimensionMismatch { .. } => false,
        }
    }
}

/// Trait for embedding text into vectors.
///
/// Implementations produce vectors of exactly `dimensions()` length. The
/// trait is object-safe so a fake provider can be injected in tests.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize;
}
