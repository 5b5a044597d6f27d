use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::collector::Collector;
use crate::config::Config;
use crate::db::{Article, Database, ARTICLES_PER_VIEW, SEARCH_RESULT_LIMIT};

/// Display cap for the description block on an article card. The collector
/// already caps stored descriptions at 300 chars; cards show less.
const CARD_DESCRIPTION_CHARS: usize = 200;

pub struct AppState {
    pub db: Arc<Database>,
    pub collector: Arc<Collector>,
    pub config: Arc<Config>,
}

/// Which screen the content container currently shows. Top and Search share
/// the news tab; Regions and Region share the regions tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Top,
    Regions,
    Region,
    Search,
}

impl View {
    pub fn news_active(&self) -> bool {
        matches!(self, View::Top | View::Search)
    }

    pub fn regions_active(&self) -> bool {
        matches!(self, View::Regions | View::Region)
    }
}

/// Render model for one article card.
#[derive(Debug, Clone)]
pub struct ArticleView {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub source: String,
    pub region: String,
    pub published_label: String,
}

impl ArticleView {
    pub fn from_article(article: Article, now: DateTime<Utc>) -> Self {
        let description = article
            .description
            .filter(|d| !d.is_empty())
            .map(|d| truncate_for_card(&d));

        Self {
            title: article.title,
            url: article.url,
            description,
            source: article.source,
            region: article.region,
            published_label: relative_time(article.published.as_deref(), now),
        }
    }
}

/// Render model for one region card.
#[derive(Debug, Clone)]
pub struct RegionCardView {
    pub slug: String,
    pub name: String,
    pub articles_label: String,
    pub sources_label: String,
}

fn truncate_for_card(text: &str) -> String {
    if text.chars().count() <= CARD_DESCRIPTION_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(CARD_DESCRIPTION_CHARS).collect();
    truncated.push_str("...");
    truncated
}

/// Human label for a publication date: relative below a week, absolute
/// beyond, "Date inconnue" when missing or unparseable.
pub fn relative_time(published: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = published else {
        return "Date inconnue".to_string();
    };
    let Ok(date) = DateTime::parse_from_rfc3339(raw) else {
        return "Date inconnue".to_string();
    };
    let date = date.with_timezone(&Utc);

    let hours = (now - date).num_hours();
    if hours < 1 {
        return "Il y a moins d'1h".to_string();
    }
    if hours < 24 {
        return format!("Il y a {}h", hours);
    }
    let days = hours / 24;
    if days < 7 {
        return format!("Il y a {} jour{}", days, if days > 1 { "s" } else { "" });
    }
    format_date(date)
}

pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%d/%m/%Y %H:%M").to_string()
}

/// "Dernière collecte" label for the stats bar.
pub fn last_collection_label(ran_at: Option<&str>) -> String {
    match ran_at.and_then(|raw| DateTime::parse_from_rfc3339(raw).ok()) {
        Some(date) => format_date(date.with_timezone(&Utc)),
        None => "Jamais".to_string(),
    }
}

pub fn article_count_label(count: usize) -> String {
    let s = if count > 1 { "s" } else { "" };
    format!("{} article{} trouvé{}", count, s, s)
}

pub fn result_count_label(count: usize) -> String {
    let s = if count > 1 { "s" } else { "" };
    format!("{} résultat{} trouvé{}", count, s, s)
}

pub fn count_noun(count: i64, noun: &str) -> String {
    let s = if count > 1 { "s" } else { "" };
    format!("{} {}{}", count, noun, s)
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: View,
    pub collecting: bool,
}

#[derive(Template)]
#[template(path = "stats.html")]
pub struct StatsTemplate {
    pub stats_text: String,
    pub last_update: String,
}

#[derive(Template)]
#[template(path = "top_articles.html")]
pub struct TopArticlesTemplate {
    pub view: View,
    pub articles: Vec<ArticleView>,
    pub count_label: String,
}

#[derive(Template)]
#[template(path = "regions.html")]
pub struct RegionsTemplate {
    pub view: View,
    pub regions: Vec<RegionCardView>,
}

#[derive(Template)]
#[template(path = "region_articles.html")]
pub struct RegionArticlesTemplate {
    pub view: View,
    pub region_name: String,
    pub articles: Vec<ArticleView>,
    pub count_label: String,
}

#[derive(Template)]
#[template(path = "search_results.html")]
pub struct SearchResultsTemplate {
    pub view: View,
    pub query: String,
    pub articles: Vec<ArticleView>,
    pub count_label: String,
}

#[derive(Template)]
#[template(path = "search_prompt.html")]
pub struct SearchPromptTemplate {
    pub view: View,
}

#[derive(Template)]
#[template(path = "collect_button.html")]
pub struct CollectButtonTemplate {
    pub collecting: bool,
}

#[derive(Template)]
#[template(path = "article_card.html")]
pub struct ArticleCardTemplate {
    pub article: ArticleView,
}

#[derive(Template)]
#[template(path = "region_card.html")]
pub struct RegionCardTemplate {
    pub region: RegionCardView,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

/// Single catch path for view handlers: the static error panel with a 500.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("View error: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(
                r#"<div class="empty-state error"><h3>Erreur de chargement</h3><p>Impossible de charger le contenu</p></div>"#
                    .to_string(),
            ),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

// Route handlers
pub async fn index() -> impl IntoResponse {
    HtmlTemplate(IndexTemplate {
        view: View::Top,
        collecting: false,
    })
}

pub async fn view_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let total_articles = state.db.article_count().await?;
    let active_sources = state.db.active_source_count().await?;
    let last = state.db.last_collection().await?;

    let stats_text = format!(
        "{} articles • {}/{} sources actives",
        total_articles,
        active_sources,
        state.config.total_sources()
    );
    let last_update = last_collection_label(last.as_ref().map(|run| run.ran_at.as_str()));

    Ok(HtmlTemplate(StatsTemplate {
        stats_text,
        last_update,
    }))
}

pub async fn view_top(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let articles: Vec<ArticleView> = state
        .db
        .top_articles(ARTICLES_PER_VIEW)
        .await?
        .into_iter()
        .map(|a| ArticleView::from_article(a, now))
        .collect();

    let count_label = article_count_label(articles.len());
    Ok(HtmlTemplate(TopArticlesTemplate {
        view: View::Top,
        articles,
        count_label,
    }))
}

pub async fn view_regions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let mut regions = Vec::new();
    for region in &state.config.regions {
        let article_count = state.db.article_count_for_region(&region.name).await?;
        regions.push(RegionCardView {
            slug: region.slug(),
            name: region.name.clone(),
            articles_label: count_noun(article_count, "article"),
            sources_label: count_noun(region.sources.len() as i64, "source"),
        });
    }

    Ok(HtmlTemplate(RegionsTemplate {
        view: View::Regions,
        regions,
    }))
}

pub async fn view_region(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let region = state
        .config
        .region_by_slug(&slug)
        .ok_or_else(|| anyhow::anyhow!("Unknown region: {}", slug))?;

    let now = Utc::now();
    let articles: Vec<ArticleView> = state
        .db
        .articles_for_region(&region.name, ARTICLES_PER_VIEW)
        .await?
        .into_iter()
        .map(|a| ArticleView::from_article(a, now))
        .collect();

    let count_label = article_count_label(articles.len());
    Ok(HtmlTemplate(RegionArticlesTemplate {
        view: View::Region,
        region_name: region.name.clone(),
        articles,
        count_label,
    }))
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

pub async fn view_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    let query = params.q.trim().to_string();
    if query.is_empty() {
        return Ok(HtmlTemplate(SearchPromptTemplate { view: View::Search }).into_response());
    }

    let now = Utc::now();
    let articles: Vec<ArticleView> = state
        .db
        .search_articles(&query, None, SEARCH_RESULT_LIMIT)
        .await?
        .into_iter()
        .map(|a| ArticleView::from_article(a, now))
        .collect();

    let count_label = result_count_label(articles.len());
    Ok(HtmlTemplate(SearchResultsTemplate {
        view: View::Search,
        query,
        articles,
        count_label,
    })
    .into_response())
}

pub async fn collect_start(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    // Spawn the collection; the collector guard makes a second trigger a no-op
    let collector = state.collector.clone();
    tokio::spawn(async move {
        let _ = collector.collect_all().await;
    });

    Ok(HtmlTemplate(CollectButtonTemplate { collecting: true }))
}

pub async fn collect_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let collecting = state.collector.is_collecting().await;
    Ok(HtmlTemplate(CollectButtonTemplate { collecting }))
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewArticle;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, post},
        Router,
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const TEST_CONFIG: &str = r#"
        [[regions]]
        name = "Bretagne"

        [[regions.sources]]
        name = "Le Télégramme"
        url = "https://www.letelegramme.fr/rss.xml"

        [[regions.sources]]
        name = "Ouest-France Bretagne"
        url = "https://www.ouest-france.fr/rss-en-continu.xml"

        [[regions]]
        name = "Grand Est"

        [[regions.sources]]
        name = "L'Union"
        url = "https://www.lunion.fr/rss"
    "#;

    async fn create_test_app() -> (Router, Arc<Database>) {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.initialize().await.unwrap();
        let db = Arc::new(db);

        let config = Arc::new(Config::from_str(TEST_CONFIG).unwrap());
        let collector = Arc::new(Collector::new(db.clone(), config.clone()));
        let state = Arc::new(AppState {
            db: db.clone(),
            collector,
            config,
        });

        let app = Router::new()
            .route("/", get(index))
            .route("/view/top", get(view_top))
            .route("/view/regions", get(view_regions))
            .route("/view/regions/:slug", get(view_region))
            .route("/view/search", get(view_search))
            .route("/view/stats", get(view_stats))
            .route("/collect", post(collect_start))
            .route("/collect/status", get(collect_status))
            .route("/health", get(health))
            .with_state(state);

        (app, db)
    }

    async fn seed_articles(db: &Database) {
        for i in 1..=5 {
            let article = NewArticle {
                title: format!("Article breton {}", i),
                url: format!("https://bzh.example.com/{}", i),
                description: Some("Une dépêche régionale".to_string()),
                source: "Le Télégramme".to_string(),
                region: "Bretagne".to_string(),
                published: Some(Utc::now() - chrono::Duration::hours(i)),
            };
            db.insert_article(&article).await.unwrap();
        }
    }

    async fn body_string(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn sample_view(description: Option<&str>) -> ArticleView {
        ArticleView {
            title: "Un titre".to_string(),
            url: "https://exemple.fr/article".to_string(),
            description: description.map(|d| d.to_string()),
            source: "Journal".to_string(),
            region: "Bretagne".to_string(),
            published_label: "Il y a 2h".to_string(),
        }
    }

    mod time_label_tests {
        use super::*;
        use chrono::Duration;

        #[test]
        fn test_missing_date() {
            assert_eq!(relative_time(None, Utc::now()), "Date inconnue");
        }

        #[test]
        fn test_unparseable_date() {
            assert_eq!(relative_time(Some("hier"), Utc::now()), "Date inconnue");
        }

        #[test]
        fn test_under_one_hour() {
            let now = Utc::now();
            let date = (now - Duration::minutes(30)).to_rfc3339();
            assert_eq!(relative_time(Some(&date), now), "Il y a moins d'1h");
        }

        #[test]
        fn test_hours() {
            let now = Utc::now();
            let date = (now - Duration::hours(5)).to_rfc3339();
            assert_eq!(relative_time(Some(&date), now), "Il y a 5h");
        }

        #[test]
        fn test_single_day() {
            let now = Utc::now();
            let date = (now - Duration::hours(30)).to_rfc3339();
            assert_eq!(relative_time(Some(&date), now), "Il y a 1 jour");
        }

        #[test]
        fn test_several_days() {
            let now = Utc::now();
            let date = (now - Duration::days(3)).to_rfc3339();
            assert_eq!(relative_time(Some(&date), now), "Il y a 3 jours");
        }

        #[test]
        fn test_older_than_a_week_is_absolute() {
            let now = Utc::now();
            let date = (now - Duration::days(30)).to_rfc3339();
            let label = relative_time(Some(&date), now);
            assert!(label.contains('/'), "expected absolute date, got {}", label);
        }

        #[test]
        fn test_last_collection_label_never() {
            assert_eq!(last_collection_label(None), "Jamais");
        }

        #[test]
        fn test_last_collection_label_formats_date() {
            let label = last_collection_label(Some("2024-12-09T12:30:00+00:00"));
            assert_eq!(label, "09/12/2024 12:30");
        }
    }

    mod count_label_tests {
        use super::*;

        #[test]
        fn test_singular() {
            assert_eq!(article_count_label(1), "1 article trouvé");
            assert_eq!(result_count_label(1), "1 résultat trouvé");
        }

        #[test]
        fn test_plural() {
            assert_eq!(article_count_label(12), "12 articles trouvés");
            assert_eq!(result_count_label(2), "2 résultats trouvés");
        }

        #[test]
        fn test_zero_is_singular() {
            assert_eq!(article_count_label(0), "0 article trouvé");
        }

        #[test]
        fn test_count_noun() {
            assert_eq!(count_noun(1, "source"), "1 source");
            assert_eq!(count_noun(5, "source"), "5 sources");
        }
    }

    mod view_state_tests {
        use super::*;

        #[test]
        fn test_news_tab_views() {
            assert!(View::Top.news_active());
            assert!(View::Search.news_active());
            assert!(!View::Top.regions_active());
            assert!(!View::Search.regions_active());
        }

        #[test]
        fn test_regions_tab_views() {
            assert!(View::Regions.regions_active());
            assert!(View::Region.regions_active());
            assert!(!View::Regions.news_active());
            assert!(!View::Region.news_active());
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_article_card_with_description() {
            let html = ArticleCardTemplate {
                article: sample_view(Some("Une description")),
            }
            .render()
            .unwrap();

            assert!(html.contains("Une description"));
            assert!(html.contains(r#"class="description""#));
            assert!(html.contains("https://exemple.fr/article"));
        }

        #[test]
        fn test_article_card_without_description_omits_block() {
            let html = ArticleCardTemplate {
                article: sample_view(None),
            }
            .render()
            .unwrap();

            assert!(!html.contains(r#"class="description""#));
            assert!(html.contains("Un titre"));
        }

        #[test]
        fn test_article_card_escapes_html() {
            let mut article = sample_view(None);
            article.title = "<script>alert(1)</script>".to_string();

            let html = ArticleCardTemplate { article }.render().unwrap();
            assert!(!html.contains("<script>"));
        }

        #[test]
        fn test_empty_top_view_shows_empty_state() {
            let html = TopArticlesTemplate {
                view: View::Top,
                articles: vec![],
                count_label: article_count_label(0),
            }
            .render()
            .unwrap();

            assert!(html.contains("Aucun article disponible"));
        }

        #[test]
        fn test_top_view_nav_highlights_news_tab() {
            let html = TopArticlesTemplate {
                view: View::Top,
                articles: vec![sample_view(None)],
                count_label: article_count_label(1),
            }
            .render()
            .unwrap();

            assert!(html.contains(r#"class="nav-btn active" hx-get="/view/top""#));
            assert!(html.contains(r#"class="nav-btn" hx-get="/view/regions""#));
        }

        #[test]
        fn test_regions_view_nav_highlights_regions_tab() {
            let html = RegionsTemplate {
                view: View::Regions,
                regions: vec![],
            }
            .render()
            .unwrap();

            assert!(html.contains(r#"class="nav-btn" hx-get="/view/top""#));
            assert!(html.contains(r#"class="nav-btn active" hx-get="/view/regions""#));
        }

        #[test]
        fn test_empty_search_results() {
            let html = SearchResultsTemplate {
                view: View::Search,
                query: "volcan".to_string(),
                articles: vec![],
                count_label: result_count_label(0),
            }
            .render()
            .unwrap();

            assert!(html.contains("Aucun résultat"));
            assert!(html.contains("volcan"));
        }

        #[test]
        fn test_empty_region_shows_empty_state() {
            let html = RegionArticlesTemplate {
                view: View::Region,
                region_name: "Corse".to_string(),
                articles: vec![],
                count_label: article_count_label(0),
            }
            .render()
            .unwrap();

            assert!(html.contains("Aucun article trouvé pour cette région"));
            assert!(html.contains("Corse"));
        }

        #[test]
        fn test_collect_button_idle() {
            let html = CollectButtonTemplate { collecting: false }.render().unwrap();
            assert!(html.contains(r#"hx-post="/collect""#));
            assert!(!html.contains("disabled"));
        }

        #[test]
        fn test_collect_button_collecting_polls_status() {
            let html = CollectButtonTemplate { collecting: true }.render().unwrap();
            assert!(html.contains(r#"hx-get="/collect/status""#));
            assert!(html.contains("disabled"));
        }
    }

    mod article_view_tests {
        use super::*;

        fn stored_article(description: Option<&str>) -> Article {
            Article {
                id: 1,
                title: "Titre".to_string(),
                url: "https://exemple.fr".to_string(),
                description: description.map(|d| d.to_string()),
                source: "Journal".to_string(),
                region: "Corse".to_string(),
                published: None,
                collected_at: None,
            }
        }

        #[test]
        fn test_long_description_truncated_for_card() {
            let long = "à".repeat(250);
            let view = ArticleView::from_article(stored_article(Some(&long)), Utc::now());

            let description = view.description.unwrap();
            assert!(description.ends_with("..."));
            assert_eq!(description.chars().count(), 203);
        }

        #[test]
        fn test_empty_description_becomes_none() {
            let view = ArticleView::from_article(stored_article(Some("")), Utc::now());
            assert!(view.description.is_none());
        }

        #[test]
        fn test_missing_date_label() {
            let view = ArticleView::from_article(stored_article(None), Utc::now());
            assert_eq!(view.published_label, "Date inconnue");
        }
    }

    mod route_tests {
        use super::*;

        #[tokio::test]
        async fn test_index_page() {
            let (app, _db) = create_test_app().await;

            let response = app
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_string(response).await;
            assert!(body.contains(r#"id="content""#));
            assert!(body.contains(r#"id="search-input""#));
        }

        #[tokio::test]
        async fn test_view_top_lists_articles() {
            let (app, db) = create_test_app().await;
            seed_articles(&db).await;

            let response = app
                .oneshot(Request::builder().uri("/view/top").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_string(response).await;
            assert!(body.contains("Article breton 1"));
            assert!(body.contains("5 articles trouvés"));
        }

        #[tokio::test]
        async fn test_view_top_empty_state() {
            let (app, _db) = create_test_app().await;

            let response = app
                .oneshot(Request::builder().uri("/view/top").body(Body::empty()).unwrap())
                .await
                .unwrap();

            let body = body_string(response).await;
            assert!(body.contains("Aucun article disponible"));
        }

        #[tokio::test]
        async fn test_view_regions_lists_configured_regions() {
            let (app, _db) = create_test_app().await;

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/view/regions")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_string(response).await;
            assert!(body.contains("Bretagne"));
            assert!(body.contains("Grand Est"));
            assert!(body.contains("2 sources"));
        }

        #[tokio::test]
        async fn test_view_region_by_slug() {
            let (app, db) = create_test_app().await;
            seed_articles(&db).await;

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/view/regions/bretagne")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_string(response).await;
            assert!(body.contains("Article breton"));
        }

        #[tokio::test]
        async fn test_view_region_unknown_slug() {
            let (app, _db) = create_test_app().await;

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/view/regions/atlantide")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = body_string(response).await;
            assert!(body.contains("Erreur de chargement"));
        }

        #[tokio::test]
        async fn test_view_search_with_results() {
            let (app, db) = create_test_app().await;
            seed_articles(&db).await;

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/view/search?q=breton")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_string(response).await;
            assert!(body.contains("Article breton"));
            assert!(body.contains("5 résultats trouvés"));
        }

        #[tokio::test]
        async fn test_view_search_empty_query_prompts() {
            let (app, _db) = create_test_app().await;

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/view/search?q=")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_string(response).await;
            assert!(body.contains("Veuillez saisir un terme de recherche"));
        }

        #[tokio::test]
        async fn test_view_stats() {
            let (app, db) = create_test_app().await;
            seed_articles(&db).await;

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/view/stats")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_string(response).await;
            assert!(body.contains("5 articles"));
            assert!(body.contains("1/3 sources actives"));
            assert!(body.contains("Jamais"));
        }

        #[tokio::test]
        async fn test_collect_returns_collecting_button() {
            let (app, _db) = create_test_app().await;

            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/collect")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_string(response).await;
            assert!(body.contains("Collecte en cours"));
        }

        #[tokio::test]
        async fn test_collect_status_idle() {
            let (app, _db) = create_test_app().await;

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/collect/status")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = body_string(response).await;
            assert!(body.contains("Actualiser"));
        }

        #[tokio::test]
        async fn test_health_endpoint() {
            let (app, _db) = create_test_app().await;

            let response = app
                .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(&body[..], b"OK");
        }
    }

    mod search_params_tests {
        use super::*;

        #[test]
        fn test_search_params_default_query() {
            let params: SearchParams = serde_urlencoded::from_str("").unwrap();
            assert_eq!(params.q, "");
        }

        #[test]
        fn test_search_params_with_query() {
            let params: SearchParams = serde_urlencoded::from_str("q=orage").unwrap();
            assert_eq!(params.q, "orage");
        }
    }
}
