//! Embedding cache for the corpus.
//!
//! One entry per post, in corpus order. Entries that failed to embed are
//! recorded as invalid and excluded from ranking rather than zero-filled.
//! The cache is built (or loaded from its snapshot) before the server starts
//! accepting requests and is never mutated afterward.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{Embedding, EmbeddingProvider};
use crate::config::EmbeddingConfig;
use crate::corpus::Corpus;

/// A corpus post's cached vector. `None` marks an entry whose embedding
/// failed or did not validate.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub post_id: u64,
    pub vector: Option<Embedding>,
}

/// Positionally-aligned embedding vectors for the whole corpus.
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    entries: Vec<CacheEntry>,
}

impl EmbeddingCache {
    pub fn from_entries(entries: Vec<CacheEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that can participate in ranking.
    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|e| e.vector.is_some()).count()
    }

    /// Load the snapshot if it exists and matches the corpus, otherwise embed
    /// every title and persist the result. Either way the returned cache has
    /// exactly one entry per corpus post.
    pub async fn load_or_build(
        corpus: &Corpus,
        provider: Arc<dyn EmbeddingProvider>,
        path: &Path,
        config: &EmbeddingConfig,
    ) -> Result<Self> {
        if path.exists() {
            match Self::load(path, corpus, config.dimensions) {
                Ok(Some(cache)) => {
                    tracing::info!(
                        path = %path.display(),
                        entries = cache.len(),
                        "loaded embedding cache snapshot"
                    );
                    return Ok(cache);
                }
                Ok(None) => {
                    tracing::warn!(
                        path = %path.display(),
                        "cache snapshot does not match corpus size, rebuilding"
                    );
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read cache snapshot, rebuilding");
                }
            }
        }

        let cache = Self::build(corpus, provider, config).await;
        cache.save(path)?;
        Ok(cache)
    }

    /// Embed every corpus title with a bounded number of in-flight requests.
    /// Per-title failures become invalid entries; they never abort the build.
    pub async fn build(
        corpus: &Corpus,
        provider: Arc<dyn EmbeddingProvider>,
        config: &EmbeddingConfig,
    ) -> Self {
        let mut entries: Vec<CacheEntry> = corpus
            .posts()
            .iter()
            .map(|post| CacheEntry {
                post_id: post.id,
                vector: None,
            })
            .collect();

        let expected_dims = config.dimensions;
        let semaphore = Arc::new(Semaphore::new(config.build_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (idx, post) in corpus.posts().iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let provider = Arc::clone(&provider);
            let title = post.title.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                (idx, provider.embed(&title).await)
            });
        }

        let pb = ProgressBar::new(entries.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {pos}/{len} titles embedded")
                .expect("valid template")
                .progress_chars("##-"),
        );

        while let Some(joined) = tasks.join_next().await {
            let (idx, result) = joined.expect("embed task panicked");
            match result {
                Ok(vector) if vector.len() == expected_dims => {
                    entries[idx].vector = Some(vector);
                }
                Ok(vector) => {
                    tracing::warn!(
                        post_id = entries[idx].post_id,
                        expected = expected_dims,
                        actual = vector.len(),
                        "embedding has wrong dimensionality, entry marked invalid"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        post_id = entries[idx].post_id,
                        error = %err,
                        "failed to embed title, entry marked invalid"
                    );
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        Self { entries }
    }

    /// Read a snapshot. Returns `Ok(None)` when the entry count does not
    /// match the corpus (stale snapshot, caller should rebuild). Vectors with
    /// the wrong dimensionality are demoted to invalid entries.
    pub fn load(
        path: impl AsRef<Path>,
        corpus: &Corpus,
        dimensions: usize,
    ) -> Result<Option<Self>> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read cache snapshot at {}", path.display()))?;
        let vectors: Vec<Option<Embedding>> =
            serde_json::from_str(&contents).context("failed to parse cache snapshot JSON")?;

        if vectors.len() != corpus.len() {
            return Ok(None);
        }

        let entries = corpus
            .posts()
            .iter()
            .zip(vectors)
            .map(|(post, vector)| {
                let vector = match vector {
                    Some(v) if v.len() == dimensions => Some(v),
                    Some(v) => {
                        tracing::warn!(
                            post_id = post.id,
                            expected = dimensions,
                            actual = v.len(),
                            "snapshot vector has wrong dimensionality, entry marked invalid"
                        );
                        None
                    }
                    None => None,
                };
                CacheEntry {
                    post_id: post.id,
                    vector,
                }
            })
            .collect();

        Ok(Some(Self { entries }))
    }

    /// Persist the snapshot atomically (tmp file + rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let vectors: Vec<Option<&Embedding>> =
            self.entries.iter().map(|e| e.vector.as_ref()).collect();
        let contents =
            serde_json::to_string(&vectors).context("failed to serialize cache snapshot")?;

        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, contents)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path).context("failed to rename cache snapshot into place")?;

        tracing::info!(path = %path.display(), entries = self.len(), "cache snapshot saved");
        Ok(())
    }
}
