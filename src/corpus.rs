//! The fixed forum-post corpus searched against.
//!
//! Loaded once at startup from the JSON file produced by `topical scrape`.
//! Post order in the file is significant: the embedding cache snapshot is
//! aligned positionally to it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A single forum post record, identified by its topic id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub created_at: String,
    /// Explicit topic URL. When absent, derived from the forum base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Post {
    /// The topic URL, falling back to `{base_url}/t/{id}` when not stored.
    pub fn topic_url(&self, base_url: &str) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("{}/t/{}", base_url.trim_end_matches('/'), self.id),
        }
    }
}

/// Ordered, immutable set of posts with an id lookup index.
#[derive(Debug, Clone)]
pub struct Corpus {
    posts: Vec<Post>,
    by_id: HashMap<u64, usize>,
}

impl Corpus {
    pub fn from_posts(posts: Vec<Post>) -> Self {
        let by_id = posts
            .iter()
            .enumerate()
            .map(|(idx, post)| (post.id, idx))
            .collect();
        Self { posts, by_id }
    }

    /// Load the corpus from a JSON file. A missing or malformed file is an
    /// error: the service cannot run without its corpus.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read corpus file at {}", path.display()))?;
        let posts: Vec<Post> =
            serde_json::from_str(&contents).context("failed to parse corpus JSON")?;
        Ok(Self::from_posts(posts))
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, id: u64) -> Option<&Post> {
        self.by_id.get(&id).map(|&idx| &self.posts[idx])
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
