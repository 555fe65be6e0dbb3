use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TopicalConfig {
    pub server: ServerConfig,
    pub corpus: CorpusConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub uploads: UploadsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CorpusConfig {
    pub posts_path: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub build_concurrency: usize,
    pub cache_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UploadsConfig {
    pub dir: String,
}

impl Default for TopicalConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            corpus: CorpusConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            uploads: UploadsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            log_level: "info".into(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        let posts_path = default_topical_dir()
            .join("posts.json")
            .to_string_lossy()
            .into_owned();
        Self {
            posts_path,
            base_url: "https://discourse.onlinedegree.iitm.ac.in".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_path = default_topical_dir()
            .join("cache.json")
            .to_string_lossy()
            .into_owned();
        Self {
            endpoint: "http://127.0.0.1:8081/embed".into(),
            dimensions: 384,
            timeout_secs: 30,
            max_retries: 3,
            build_concurrency: 4,
            cache_path,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 2 }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        let dir = default_topical_dir()
            .join("uploads")
            .to_string_lossy()
            .into_owned();
        Self { dir }
    }
}

/// Returns `~/.topical/`
pub fn default_topical_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".topical")
}

/// Returns the default config file path: `~/.topical/config.toml`
pub fn default_config_path() -> PathBuf {
    default_topical_dir().join("config.toml")
}

impl TopicalConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            TopicalConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (TOPICAL_POSTS, TOPICAL_CACHE, TOPICAL_EMBED_URL, TOPICAL_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TOPICAL_POSTS") {
            self.corpus.posts_path = val;
        }
        if let Ok(val) = std::env::var("TOPICAL_CACHE") {
            self.embedding.cache_path = val;
        }
        if let Ok(val) = std::env::var("TOPICAL_EMBED_URL") {
            self.embedding.endpoint = val;
        }
        if let Ok(val) = std::env::var("TOPICAL_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the corpus file path, expanding `~` if needed.
    pub fn resolved_posts_path(&self) -> PathBuf {
        expand_tilde(&self.corpus.posts_path)
    }

    /// Resolve the embedding cache snapshot path, expanding `~` if needed.
    pub fn resolved_cache_path(&self) -> PathBuf {
        expand_tilde(&self.embedding.cache_path)
    }

    /// Resolve the uploads directory, expanding `~` if needed.
    pub fn resolved_uploads_dir(&self) -> PathBuf {
        expand_tilde(&self.uploads.dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
