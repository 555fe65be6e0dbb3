use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::TopicalConfig;
use crate::corpus::Corpus;
use crate::embedding::{EmbeddingCache, EmbeddingProvider, RemoteProvider};
use crate::rank;

/// Run a one-off question from the terminal.
pub async fn ask(config: &TopicalConfig, question: &str) -> Result<()> {
    let corpus = Corpus::load(config.resolved_posts_path())
        .context("failed to load corpus — run `topical scrape` first")?;
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(RemoteProvider::new(&config.embedding)?);
    let cache = EmbeddingCache::load_or_build(
        &corpus,
        Arc::clone(&provider),
        &config.resolved_cache_path(),
        &config.embedding,
    )
    .await?;

    let embedding = provider
        .embed(question)
        .await
        .context("failed to embed question")?;

    let matches = rank::rank(&embedding, &cache, config.retrieval.top_k);
    if matches.is_empty() {
        println!("No matching topics found.");
        return Ok(());
    }

    println!("Top {} match(es):\n", matches.len());
    for (i, m) in matches.iter().enumerate() {
        if let Some(post) = corpus.get(m.post_id) {
            println!("  {}. {} (score: {:.4})", i + 1, post.title, m.score);
            println!("     {}", post.topic_url(&config.corpus.base_url));
            println!();
        }
    }

    Ok(())
}
