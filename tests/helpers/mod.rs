#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use topical::config::TopicalConfig;
use topical::corpus::{Corpus, Post};
use topical::embedding::{Embedding, EmbeddingError, EmbeddingProvider};

/// Test dimensionality — small enough to write fixtures by hand. The
/// dimension is configured, not baked into the pipeline.
pub const DIMS: usize = 8;

pub fn post(id: u64, title: &str) -> Post {
    Post {
        id,
        title: title.to_string(),
        created_at: "2025-01-15".to_string(),
        url: None,
    }
}

/// The two-post corpus used across the integration tests.
pub fn test_corpus() -> Corpus {
    Corpus::from_posts(vec![
        post(1, "Assignment 1 deadline"),
        post(2, "GA5 clarification"),
    ])
}

/// Deterministic embedding with a unit spike at `seed % DIMS`. Distinct
/// seeds give orthogonal vectors.
pub fn spike(seed: usize) -> Embedding {
    let mut v = vec![0.0f32; DIMS];
    v[seed % DIMS] = 1.0;
    v
}

/// Fake provider with a fixed text -> vector table. Unknown text fails the
/// way a broken remote would, which makes partial outages easy to stage.
pub struct StaticProvider {
    vectors: HashMap<String, Embedding>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self {
            vectors: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: Embedding) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for StaticProvider {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| EmbeddingError::InvalidResponse(format!("no canned vector for {text:?}")))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

/// Provider that always fails, simulating a full outage.
pub struct FailingProvider;

#[async_trait]
impl EmbeddingProvider for FailingProvider {
    async fn embed(&self, _text: &str) -> Result<Embedding, EmbeddingError> {
        Err(EmbeddingError::InvalidResponse("provider outage".to_string()))
    }

    fn dimensions(&self) -> usize {
        DIMS
    }
}

/// Provider that knows every title in [`test_corpus`].
pub fn corpus_provider() -> Arc<dyn EmbeddingProvider> {
    Arc::new(
        StaticProvider::new()
            .with("Assignment 1 deadline", spike(0))
            .with("GA5 clarification", spike(3)),
    )
}

/// Config with every path pointed into `dir` and test dimensionality.
pub fn test_config(dir: &Path) -> TopicalConfig {
    let mut config = TopicalConfig::default();
    config.embedding.dimensions = DIMS;
    config.embedding.cache_path = dir.join("cache.json").to_string_lossy().into_owned();
    config.corpus.posts_path = dir.join("posts.json").to_string_lossy().into_owned();
    config.uploads.dir = dir.join("uploads").to_string_lossy().into_owned();
    config
}
