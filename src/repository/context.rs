//! Store context for managing connections and repository access.
//!
//! The Store is the entry point for all database operations. It holds the
//! connection factory, the snapshot policy applied by ingestion, and the
//! tracing span that store-side events are reported under.

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::fetch_log::FetchLogRepository;
use super::pool::{DieselError, SqlitePool};
use super::ranking::RankingRepository;
use super::ranking_type::RankingTypeRepository;
use super::site::SiteRepository;
use crate::models::SnapshotPolicy;

/// Store context. Cheap to clone.
///
/// # Example
/// ```ignore
/// let store = Store::new(&db_path);
/// store.init_schema().await?;
/// let sites = store.sites().get_active().await?;
/// ```
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    policy: SnapshotPolicy,
    span: tracing::Span,
}

impl Store {
    /// Create a store from a database file path.
    pub fn new(db_path: &Path) -> Self {
        Self::with_pool(SqlitePool::from_path(db_path))
    }

    /// Create a store from a `sqlite:` URL or plain path.
    pub fn from_url(url: &str) -> Self {
        Self::with_pool(SqlitePool::new(url))
    }

    fn with_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            policy: SnapshotPolicy::default(),
            span: tracing::Span::none(),
        }
    }

    /// Use a different snapshot policy for ingest writes.
    pub fn with_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attach the span that ingest runs against this store nest under.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn policy(&self) -> SnapshotPolicy {
        self.policy
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Get the underlying connection factory.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn sites(&self) -> SiteRepository {
        SiteRepository::new(self.pool.clone())
    }

    pub fn ranking_types(&self) -> RankingTypeRepository {
        RankingTypeRepository::new(self.pool.clone())
    }

    pub fn rankings(&self) -> RankingRepository {
        RankingRepository::new(self.pool.clone())
    }

    pub fn fetch_logs(&self) -> FetchLogRepository {
        FetchLogRepository::new(self.pool.clone())
    }

    /// Create tables and indexes if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS sites (
                site_id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_name TEXT NOT NULL,
                site_url TEXT NOT NULL,
                site_code TEXT NOT NULL UNIQUE,
                fetch_type TEXT NOT NULL,
                api_url TEXT,
                description TEXT,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ranking_types (
                ranking_type_id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL,
                type_name TEXT NOT NULL,
                type_code TEXT NOT NULL,
                type_url TEXT,
                description TEXT,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(site_id, type_code),
                FOREIGN KEY (site_id) REFERENCES sites(site_id)
            );

            CREATE TABLE IF NOT EXISTS rankings (
                ranking_id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL,
                ranking_type_id INTEGER NOT NULL,
                fetch_date TEXT NOT NULL,
                book_id TEXT,
                rank INTEGER NOT NULL CHECK (rank > 0),
                title TEXT NOT NULL,
                author TEXT,
                book_url TEXT,
                category TEXT,
                indicator_value TEXT,
                indicator_unit TEXT,
                cover_url TEXT,
                latest_chapter TEXT,
                creation_status INTEGER,
                extra_data TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (site_id) REFERENCES sites(site_id),
                FOREIGN KEY (ranking_type_id) REFERENCES ranking_types(ranking_type_id)
            );

            CREATE TABLE IF NOT EXISTS fetch_logs (
                log_id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_id INTEGER NOT NULL,
                fetch_time TEXT NOT NULL,
                status TEXT NOT NULL,
                message TEXT,
                items_fetched INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (site_id) REFERENCES sites(site_id)
            );

            CREATE INDEX IF NOT EXISTS idx_rankings_site_date ON rankings(site_id, fetch_date);
            CREATE INDEX IF NOT EXISTS idx_rankings_type_date ON rankings(ranking_type_id, fetch_date);
            CREATE INDEX IF NOT EXISTS idx_rankings_book ON rankings(book_id);
            CREATE INDEX IF NOT EXISTS idx_fetch_logs_site ON fetch_logs(site_id, fetch_time);
            "#,
        )
        .await
    }
}
