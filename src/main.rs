mod api;
mod collector;
mod config;
mod db;
mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::collector::{start_background_collect, Collector};
use crate::config::Config;
use crate::db::Database;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pqr_news=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load("sources.toml")?;
    info!(
        "Loaded {} sources across {} regions",
        config.total_sources(),
        config.regions.len()
    );

    // Initialize database
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:pqr_news.db?mode=rwc".to_string());
    let db = Database::new(&database_url).await?;
    db.initialize().await?;
    info!("Database initialized");

    let db = Arc::new(db);
    let config = Arc::new(config);

    // Create collector
    let collector = Arc::new(Collector::new(db.clone(), config.clone()));

    // Start background collection task
    let bg_collector = collector.clone();
    let collect_interval = config.collect_interval;
    tokio::spawn(async move {
        start_background_collect(bg_collector, collect_interval).await;
    });

    // Create app state
    let state = Arc::new(AppState {
        db: db.clone(),
        collector: collector.clone(),
        config: config.clone(),
    });

    // Build router
    let app = Router::new()
        .route("/", get(routes::index))
        .route("/view/top", get(routes::view_top))
        .route("/view/regions", get(routes::view_regions))
        .route("/view/regions/:slug", get(routes::view_region))
        .route("/view/search", get(routes::view_search))
        .route("/view/stats", get(routes::view_stats))
        .route("/collect", post(routes::collect_start))
        .route("/collect/status", get(routes::collect_status))
        .route("/health", get(routes::health))
        .route("/api/stats", get(api::stats))
        .route("/api/articles/top", get(api::top_articles))
        .route("/api/regions", get(api::regions))
        .route("/api/regions/:slug/articles", get(api::region_articles))
        .route("/api/search", get(api::search))
        .route("/api/collect", post(api::collect))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server starting on http://localhost:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
