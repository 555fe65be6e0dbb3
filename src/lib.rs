//! Semantic Q&A over a scraped forum corpus.
//!
//! `topical` answers questions by embedding them and ranking the result
//! against precomputed embeddings of forum topic titles using cosine
//! similarity. The corpus is produced once by the scraper; embeddings come
//! from an external embedding service and are cached to disk so the corpus
//! is only embedded once.
//!
//! # Architecture
//!
//! - **Corpus**: an ordered JSON file of `(id, title, created_at)` records,
//!   loaded into memory at startup
//! - **Embeddings**: remote HTTP embedding service (one call per title at
//!   build time, one per question at request time), snapshot cached on disk
//! - **Ranking**: cosine similarity, top-k (default 2)
//! - **Transport**: plain HTTP JSON (`POST /api/`) via axum
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`corpus`] — The fixed post corpus and its id index
//! - [`embedding`] — Provider trait, remote HTTP client, and the on-disk cache
//! - [`rank`] — Cosine similarity and top-k selection
//! - [`scrape`] — One-shot forum scraper producing the corpus file
//! - [`server`] — HTTP server and the `/api/` handler

pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod rank;
pub mod scrape;
pub mod server;
