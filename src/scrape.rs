//! One-shot corpus scraper for the forum's `latest.json` API.
//!
//! Paginates from page 1, keeps topics created inside the date window, and
//! stops at the first page with no topics or none inside the window. Page
//! fetch errors end the crawl rather than aborting it; the corpus is whatever
//! was collected up to that point.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::corpus::Post;

/// Polite delay between page fetches.
const PAGE_DELAY: Duration = Duration::from_secs(1);

/// Inclusive topic-creation-date window.
#[derive(Debug, Clone, Copy)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        anyhow::ensure!(start <= end, "window start {start} is after end {end}");
        Ok(Self { start, end })
    }

    fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Deserialize)]
struct LatestPage {
    #[serde(default)]
    topic_list: Option<TopicList>,
}

#[derive(Debug, Deserialize)]
struct TopicList {
    #[serde(default)]
    topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
struct Topic {
    id: u64,
    title: String,
    created_at: String,
}

/// Crawl all pages and collect posts inside the window.
pub async fn scrape_all(
    client: &reqwest::Client,
    base_url: &str,
    window: &DateWindow,
) -> Vec<Post> {
    let mut page = 1u32;
    let mut all_posts = Vec::new();

    loop {
        tracing::info!(page, "fetching topic page");
        let topics = fetch_page(client, base_url, page).await;
        if topics.is_empty() {
            break;
        }
        let batch = filter_by_window(topics, window);
        if batch.is_empty() {
            break;
        }
        all_posts.extend(batch);
        page += 1;
        tokio::time::sleep(PAGE_DELAY).await;
    }

    all_posts
}

/// Scrape and write the corpus file (pretty JSON, tmp + rename).
pub async fn scrape_to_file(
    base_url: &str,
    window: &DateWindow,
    out_path: &Path,
) -> Result<usize> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build scraper HTTP client")?;

    let posts = scrape_all(&client, base_url, window).await;

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let contents =
        serde_json::to_string_pretty(&posts).context("failed to serialize corpus")?;
    let tmp_path = out_path.with_extension("tmp");
    std::fs::write(&tmp_path, contents)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, out_path).context("failed to rename corpus file into place")?;

    Ok(posts.len())
}

/// Fetch one page of topics. Any failure is logged and treated as the end of
/// the feed, matching a crawl that simply ran out of pages.
async fn fetch_page(client: &reqwest::Client, base_url: &str, page: u32) -> Vec<Topic> {
    let url = format!("{}/latest.json?page={page}", base_url.trim_end_matches('/'));
    match request_page(client, &url).await {
        Ok(topics) => topics,
        Err(err) => {
            tracing::warn!(page, error = %err, "page fetch failed, stopping crawl");
            Vec::new()
        }
    }
}

async fn request_page(client: &reqwest::Client, url: &str) -> Result<Vec<Topic>> {
    let response = client.get(url).send().await?.error_for_status()?;
    let parsed: LatestPage = response.json().await?;
    Ok(parsed.topic_list.map(|list| list.topics).unwrap_or_default())
}

fn filter_by_window(topics: Vec<Topic>, window: &DateWindow) -> Vec<Post> {
    topics
        .into_iter()
        .filter_map(|topic| {
            let date = parse_created_at(&topic.created_at)?;
            if !window.contains(date) {
                return None;
            }
            Some(Post {
                id: topic.id,
                title: topic.title,
                created_at: date.to_string(),
                url: None,
            })
        })
        .collect()
}

/// Topics carry RFC 3339 timestamps; plain dates are accepted too. Anything
/// else skips the topic.
fn parse_created_at(raw: &str) -> Option<NaiveDate> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}
