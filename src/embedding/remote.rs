//! HTTP embedding provider.
//!
//! Talks to an external embedding service: request `{"inputs": text}`,
//! response either a flat vector or a batch-of-one which gets unwrapped.
//! Transient failures are retried with exponential backoff; every attempt
//! carries the client-level timeout so a slow remote cannot hang a request.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Embedding, EmbeddingError, EmbeddingProvider};
use crate::config::EmbeddingConfig;

pub struct RemoteProvider {
    client: reqwest::Client,
    endpoint: String,
    dimensions: usize,
    max_retries: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a str,
}

/// The service returns either `[f32, ...]` or `[[f32, ...]]` (batch of one).
#[derive(Deserialize)]
#[serde(untagged)]
enum EmbedResponse {
    Flat(Vec<f32>),
    Batch(Vec<Vec<f32>>),
}

impl RemoteProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        anyhow::ensure!(
            !config.endpoint.trim().is_empty(),
            "embedding endpoint must not be empty"
        );
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("failed to build embedding HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            dimensions: config.dimensions,
            max_retries: config.max_retries.max(1),
        })
    }

    /// One request/response cycle, no retries.
    async fn request(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { inputs: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingError::Status { status, body });
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|err| EmbeddingError::InvalidResponse(err.to_string()))?;

        let vector = match parsed {
            EmbedResponse::Flat(vector) => vector,
            EmbedResponse::Batch(mut batch) => {
                if batch.len() != 1 {
                    return Err(EmbeddingError::InvalidResponse(format!(
                        "expected a batch of one vector, got {}",
                        batch.len()
                    )));
                }
                batch.remove(0)
            }
        };

        if vector.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteProvider {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut attempt = 0usize;
        loop {
            match self.request(text).await {
                Ok(vector) => return Ok(vector),
                Err(err) if err.is_transient() && attempt + 1 < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %err, "transient embedding failure, retrying");
                    tokio::time::sleep(retry_backoff(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(250 * (1 << capped))
}
