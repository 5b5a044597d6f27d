//! JSON API consumed by external clients, kept wire-compatible with the
//! historical endpoints (French field names).

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::{Article, ARTICLES_PER_VIEW, SEARCH_RESULT_LIMIT};
use crate::routes::AppState;

/// API failures collapse into a single JSON error shape.
pub struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("API error: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "message": self.0.to_string() })),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

#[derive(Debug, Serialize)]
pub struct Stats {
    pub total_articles: i64,
    pub total_sources: usize,
    #[serde(rename = "sources_actives")]
    pub active_sources: i64,
    pub total_regions: i64,
    #[serde(rename = "derniere_collecte")]
    pub last_collection: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegionSummary {
    pub id: String,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "nb_articles")]
    pub article_count: i64,
    #[serde(rename = "nb_sources")]
    pub source_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ArticleList {
    pub articles: Vec<Article>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub articles: Vec<Article>,
    pub total: usize,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<Stats>, ApiError> {
    let total_articles = state.db.article_count().await?;
    let active_sources = state.db.active_source_count().await?;
    let total_regions = state.db.region_count().await?;
    let last = state.db.last_collection().await?;

    Ok(Json(Stats {
        total_articles,
        total_sources: state.config.total_sources(),
        active_sources,
        total_regions,
        last_collection: last.map(|run| run.ran_at),
    }))
}

pub async fn top_articles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ArticleList>, ApiError> {
    let articles = state.db.top_articles(ARTICLES_PER_VIEW).await?;
    Ok(Json(ArticleList { articles }))
}

pub async fn regions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RegionSummary>>, ApiError> {
    let mut summaries = Vec::new();
    for region in &state.config.regions {
        let article_count = state.db.article_count_for_region(&region.name).await?;
        summaries.push(RegionSummary {
            id: region.slug(),
            name: region.name.clone(),
            article_count,
            source_count: region.sources.len(),
        });
    }
    Ok(Json(summaries))
}

pub async fn region_articles(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let Some(region) = state.config.region_by_slug(&slug) else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Région non trouvée" })),
        )
            .into_response());
    };

    let articles = state
        .db
        .articles_for_region(&region.name, ARTICLES_PER_VIEW)
        .await?;
    Ok(Json(ArticleList { articles }).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub region: Option<String>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(json!({ "articles": [] })).into_response());
    }

    let articles = state
        .db
        .search_articles(q, query.region.as_deref(), SEARCH_RESULT_LIMIT)
        .await?;
    let total = articles.len();

    Ok(Json(SearchResults { articles, total }).into_response())
}

pub async fn collect(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let message = if state.collector.is_collecting().await {
        "Collecte déjà en cours"
    } else {
        "Collecte démarrée"
    };

    // The guard inside the collector makes a duplicate trigger a no-op
    let collector = state.collector.clone();
    tokio::spawn(async move {
        let _ = collector.collect_all().await;
    });

    Ok(Json(json!({ "status": "success", "message": message })))
}
