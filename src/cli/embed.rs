use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::TopicalConfig;
use crate::corpus::Corpus;
use crate::embedding::{EmbeddingCache, EmbeddingProvider, RemoteProvider};

/// Build the embedding cache snapshot ahead of serving.
pub async fn embed(config: &TopicalConfig, force: bool) -> Result<()> {
    let corpus = Corpus::load(config.resolved_posts_path())
        .context("failed to load corpus — run `topical scrape` first")?;
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(RemoteProvider::new(&config.embedding)?);
    let cache_path = config.resolved_cache_path();

    let cache = if force {
        let cache = EmbeddingCache::build(&corpus, provider, &config.embedding).await;
        cache.save(&cache_path)?;
        cache
    } else {
        EmbeddingCache::load_or_build(&corpus, provider, &cache_path, &config.embedding).await?
    };

    println!(
        "Cache ready: {} entries ({} valid) at {}",
        cache.len(),
        cache.valid_count(),
        cache_path.display()
    );
    Ok(())
}
