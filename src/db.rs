use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, SqlitePool};

/// Maximum number of articles returned by the list views
pub const ARTICLES_PER_VIEW: i64 = 100;
/// Maximum number of search results
pub const SEARCH_RESULT_LIMIT: i64 = 50;

/// A stored article. The wire format keeps the historical French keys.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Article {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(rename = "titre")]
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub source: String,
    pub region: String,
    #[serde(rename = "date_publication")]
    pub published: Option<String>,
    #[serde(rename = "date_collecte")]
    pub collected_at: Option<String>,
}

/// An article about to be inserted, as produced by the collector.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub source: String,
    pub region: String,
    pub published: Option<DateTime<Utc>>,
}

/// One recorded collection run.
#[derive(Debug, Clone, FromRow)]
pub struct CollectionRun {
    pub id: i64,
    pub ran_at: String,
    pub sources_total: i64,
    pub sources_ok: i64,
    pub new_articles: i64,
    pub details: Option<String>,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                description TEXT,
                source TEXT NOT NULL,
                region TEXT NOT NULL,
                published TEXT,
                collected_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                id INTEGER PRIMARY KEY,
                ran_at TEXT NOT NULL,
                sources_total INTEGER NOT NULL,
                sources_ok INTEGER NOT NULL,
                new_articles INTEGER NOT NULL,
                details TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_articles_region
            ON articles(region)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_articles_published
            ON articles(published DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a single article. Returns true if the row was new; duplicate
    /// URLs are silently ignored.
    pub async fn insert_article(&self, article: &NewArticle) -> anyhow::Result<bool> {
        let published = article.published.map(|p| p.to_rfc3339());
        let collected_at = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO articles
            (title, url, description, source, region, published, collected_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.title)
        .bind(&article.url)
        .bind(&article.description)
        .bind(&article.source)
        .bind(&article.region)
        .bind(published)
        .bind(collected_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert a batch of articles, returning how many were actually new.
    pub async fn insert_articles(&self, articles: &[NewArticle]) -> anyhow::Result<u64> {
        let mut new_count = 0;
        for article in articles {
            if self.insert_article(article).await? {
                new_count += 1;
            }
        }
        Ok(new_count)
    }

    pub async fn top_articles(&self, limit: i64) -> anyhow::Result<Vec<Article>> {
        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT * FROM articles
            ORDER BY published DESC NULLS LAST, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(articles)
    }

    pub async fn articles_for_region(
        &self,
        region: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<Article>> {
        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT * FROM articles
            WHERE region = ?
            ORDER BY published DESC NULLS LAST, id DESC
            LIMIT ?
            "#,
        )
        .bind(region)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(articles)
    }

    /// Substring search over title, description and source, optionally
    /// restricted to a region.
    pub async fn search_articles(
        &self,
        query: &str,
        region: Option<&str>,
        limit: i64,
    ) -> anyhow::Result<Vec<Article>> {
        let pattern = format!("%{}%", query);

        let articles = match region {
            Some(region) => {
                sqlx::query_as::<_, Article>(
                    r#"
                    SELECT * FROM articles
                    WHERE (title LIKE ? OR description LIKE ? OR source LIKE ?)
                      AND region = ?
                    ORDER BY published DESC NULLS LAST, id DESC
                    LIMIT ?
                    "#,
                )
                .bind(&pattern)
                .bind(&pattern)
                .bind(&pattern)
                .bind(region)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Article>(
                    r#"
                    SELECT * FROM articles
                    WHERE title LIKE ? OR description LIKE ? OR source LIKE ?
                    ORDER BY published DESC NULLS LAST, id DESC
                    LIMIT ?
                    "#,
                )
                .bind(&pattern)
                .bind(&pattern)
                .bind(&pattern)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(articles)
    }

    pub async fn article_count(&self) -> anyhow::Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    pub async fn article_count_for_region(&self, region: &str) -> anyhow::Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles WHERE region = ?")
            .bind(region)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// Number of sources that have produced at least one article.
    pub async fn active_source_count(&self) -> anyhow::Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(DISTINCT source) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    pub async fn region_count(&self) -> anyhow::Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(DISTINCT region) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    pub async fn record_collection(
        &self,
        sources_total: i64,
        sources_ok: i64,
        new_articles: i64,
        details: Option<&str>,
    ) -> anyhow::Result<()> {
        let ran_at = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO collections (ran_at, sources_total, sources_ok, new_articles, details)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&ran_at)
        .bind(sources_total)
        .bind(sources_ok)
        .bind(new_articles)
        .bind(details)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn last_collection(&self) -> anyhow::Result<Option<CollectionRun>> {
        let run = sqlx::query_as::<_, CollectionRun>(
            "SELECT * FROM collections ORDER BY ran_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(run)
    }
}
