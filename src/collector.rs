use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use feed_rs::parser;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::{Config, SourceConfig};
use crate::db::{Database, NewArticle};

const FETCH_TIMEOUT_SECS: u64 = 10;
const MAX_ENTRIES_PER_SOURCE: usize = 20;
const MAX_DESCRIPTION_CHARS: usize = 300;

// Several regional publishers reject non-browser user agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed parsing failed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

/// Per-region outcome of a collection run, serialized into the
/// `collections.details` column.
#[derive(Debug, Clone, Serialize)]
pub struct RegionReport {
    pub sources_ok: usize,
    pub sources_total: usize,
    pub articles_nouveaux: u64,
    pub articles_total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectSummary {
    pub sources_total: usize,
    pub sources_ok: usize,
    pub articles_nouveaux: u64,
    pub duration_secs: f64,
}

pub struct Collector {
    client: Client,
    db: Arc<Database>,
    config: Arc<Config>,
    collecting: Arc<RwLock<bool>>,
}

impl Collector {
    pub fn new(db: Arc<Database>, config: Arc<Config>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/rss+xml, application/xml, text/xml, */*"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("fr-FR,fr;q=0.9,en;q=0.8"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            db,
            config,
            collecting: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn is_collecting(&self) -> bool {
        *self.collecting.read().await
    }

    /// Run a full collection over every configured source. Returns `None`
    /// when a run is already in flight.
    pub async fn collect_all(&self) -> anyhow::Result<Option<CollectSummary>> {
        // Check if already collecting
        {
            let mut collecting = self.collecting.write().await;
            if *collecting {
                info!("Collection already in progress, skipping");
                return Ok(None);
            }
            *collecting = true;
        }

        let result = self.do_collect_all().await;

        // Clear collecting flag
        {
            let mut collecting = self.collecting.write().await;
            *collecting = false;
        }

        result.map(Some)
    }

    async fn do_collect_all(&self) -> anyhow::Result<CollectSummary> {
        let start = Instant::now();
        let sources_total = self.config.total_sources();
        info!(
            "Starting collection: {} sources across {} regions",
            sources_total,
            self.config.regions.len()
        );

        let mut sources_ok = 0;
        let mut total_new = 0;
        let mut details: HashMap<String, RegionReport> = HashMap::new();

        for region in &self.config.regions {
            let mut region_articles = Vec::new();
            let mut region_ok = 0;

            for source in &region.sources {
                match self.fetch_source(source, &region.name).await {
                    Ok(articles) => {
                        sources_ok += 1;
                        region_ok += 1;
                        region_articles.extend(articles);
                    }
                    Err(e) => {
                        error!("Failed to collect '{}' ({}): {}", source.name, source.url, e);
                    }
                }
            }

            let new_count = self.db.insert_articles(&region_articles).await?;
            total_new += new_count;
            info!(
                "{}: {}/{} sources OK, {} new articles",
                region.name,
                region_ok,
                region.sources.len(),
                new_count
            );

            details.insert(
                region.name.clone(),
                RegionReport {
                    sources_ok: region_ok,
                    sources_total: region.sources.len(),
                    articles_nouveaux: new_count,
                    articles_total: region_articles.len(),
                },
            );
        }

        let details_json = serde_json::to_string(&details).ok();
        self.db
            .record_collection(
                sources_total as i64,
                sources_ok as i64,
                total_new as i64,
                details_json.as_deref(),
            )
            .await?;

        let duration = start.elapsed();
        info!(
            "Collection finished in {:.1}s: {}/{} sources OK, {} new articles",
            duration.as_secs_f64(),
            sources_ok,
            sources_total,
            total_new
        );

        Ok(CollectSummary {
            sources_total,
            sources_ok,
            articles_nouveaux: total_new,
            duration_secs: duration.as_secs_f64(),
        })
    }

    async fn fetch_source(
        &self,
        source: &SourceConfig,
        region: &str,
    ) -> Result<Vec<NewArticle>, FetchError> {
        info!("Fetching {} ({}): {}", source.name, region, source.url);

        let response = self
            .client
            .get(&source.url)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;

        let parsed = parser::parse(&bytes[..])?;

        let mut articles = Vec::new();
        for entry in parsed.entries.into_iter().take(MAX_ENTRIES_PER_SOURCE) {
            let title = entry
                .title
                .as_ref()
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default();

            let link = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .unwrap_or_default();

            if title.is_empty() || link.is_empty() {
                warn!("Skipping entry without title or link in '{}'", source.name);
                continue;
            }

            let description = entry
                .summary
                .as_ref()
                .map(|t| clean_description(&t.content))
                .filter(|d| !d.is_empty());

            // Fall back to the feed update date, then to the collection time
            let published = entry
                .published
                .or(entry.updated)
                .unwrap_or_else(Utc::now);

            articles.push(NewArticle {
                title,
                url: link,
                description,
                source: source.name.clone(),
                region: region.to_string(),
                published: Some(published),
            });
        }

        info!("{}: {} articles fetched", source.name, articles.len());
        Ok(articles)
    }
}

/// Strip markup and decode the handful of entities regional feeds actually
/// emit, then cap the length for storage.
pub fn clean_description(raw: &str) -> String {
    let text = strip_tags(raw)
        .replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    truncate_chars(text.trim(), MAX_DESCRIPTION_CHARS)
}

pub fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

pub async fn start_background_collect(collector: Arc<Collector>, interval_minutes: u64) {
    let interval = Duration::from_secs(interval_minutes * 60);

    // Do initial collection
    info!("Starting initial collection");
    if let Err(e) = collector.collect_all().await {
        error!("Initial collection failed: {}", e);
    }

    // Then schedule periodic runs
    loop {
        tokio::time::sleep(interval).await;
        info!("Starting scheduled collection");
        if let Err(e) = collector.collect_all().await {
            error!("Scheduled collection failed: {}", e);
        }
    }
}
