//! HTTP server and the `/api/` question-answering handler.
//!
//! All process-wide state lives in [`AppState`], constructed once at startup
//! after the corpus is loaded and the embedding cache is ready. The listener
//! is only bound after that point, so no request can observe a cache that is
//! still building.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::config::TopicalConfig;
use crate::corpus::Corpus;
use crate::embedding::{EmbeddingCache, EmbeddingProvider, RemoteProvider};
use crate::rank;

/// Shared read-only request state.
#[derive(Clone)]
pub struct AppState {
    corpus: Arc<Corpus>,
    cache: Arc<EmbeddingCache>,
    provider: Arc<dyn EmbeddingProvider>,
    config: Arc<TopicalConfig>,
}

impl AppState {
    pub fn new(
        corpus: Arc<Corpus>,
        cache: Arc<EmbeddingCache>,
        provider: Arc<dyn EmbeddingProvider>,
        config: Arc<TopicalConfig>,
    ) -> Self {
        Self {
            corpus,
            cache,
            provider,
            config,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub question: Option<String>,
    /// Base64 image payload, with or without a `data:<mime>;base64,` prefix.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Load the corpus, get the embedding cache ready, then serve until ctrl-c.
pub async fn serve(config: TopicalConfig) -> Result<()> {
    let corpus = Corpus::load(config.resolved_posts_path())
        .context("failed to load corpus — run `topical scrape` first")?;
    tracing::info!(posts = corpus.len(), "corpus loaded");

    let provider: Arc<dyn EmbeddingProvider> = Arc::new(RemoteProvider::new(&config.embedding)?);

    let cache = EmbeddingCache::load_or_build(
        &corpus,
        Arc::clone(&provider),
        &config.resolved_cache_path(),
        &config.embedding,
    )
    .await?;
    tracing::info!(
        entries = cache.len(),
        valid = cache.valid_count(),
        "embedding cache ready"
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(
        Arc::new(corpus),
        Arc::new(cache),
        provider,
        Arc::new(config),
    );

    let router = Router::new()
        .route("/api/", post(answer))
        .route("/healthz", get(healthz))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}/api/");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `POST /api/` — embed the question, rank it against the cached corpus
/// vectors, and return the top matches as links.
pub async fn answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, (StatusCode, Json<ErrorBody>)> {
    let question = match request.question.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => return Err(bad_request("Question is required")),
    };

    // Image handling is decoupled from the answer path: a bad payload is
    // logged and the question is still answered from the text alone.
    if let Some(payload) = request.image.as_deref() {
        match store_upload(&state.config.resolved_uploads_dir(), payload).await {
            Ok(path) => tracing::debug!(path = %path.display(), "stored uploaded image"),
            Err(err) => tracing::warn!(error = %err, "failed to store uploaded image"),
        }
    }

    let query_embedding = state.provider.embed(&question).await.map_err(|err| {
        tracing::error!(error = %err, "failed to embed question");
        service_error(err.to_string())
    })?;

    let matches = rank::rank(&query_embedding, &state.cache, state.config.retrieval.top_k);

    let links: Vec<Link> = matches
        .iter()
        .filter_map(|m| state.corpus.get(m.post_id))
        .map(|post| Link {
            url: post.topic_url(&state.config.corpus.base_url),
            text: post.title.clone(),
        })
        .collect();

    let answer = if links.is_empty() {
        format!("I couldn't find any related forum topics for your question: '{question}'")
    } else {
        format!("Here's what I found based on your question: '{question}'")
    };

    Ok(Json(AnswerResponse { answer, links }))
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn service_error(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Decode a base64 image payload and write it under a collision-resistant
/// (UUIDv7) filename. Returns the stored path.
async fn store_upload(dir: &Path, payload: &str) -> Result<PathBuf> {
    let (mime, data) = split_data_uri(payload);
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .context("invalid base64 image payload")?;

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create uploads dir {}", dir.display()))?;

    let filename = format!("{}.{}", uuid::Uuid::now_v7(), extension_for(mime));
    let path = dir.join(filename);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("failed to write upload to {}", path.display()))?;

    Ok(path)
}

/// Split an optional `data:<mime>;base64,` prefix off the payload.
fn split_data_uri(payload: &str) -> (Option<&str>, &str) {
    if let Some(rest) = payload.strip_prefix("data:") {
        if let Some((meta, data)) = rest.split_once(',') {
            let mime = meta.split(';').next().filter(|m| !m.is_empty());
            return (mime, data);
        }
    }
    (None, payload)
}

fn extension_for(mime: Option<&str>) -> &'static str {
    match mime {
        Some("image/png") => "png",
        Some("image/jpeg") => "jpg",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        _ => "bin",
    }
}
