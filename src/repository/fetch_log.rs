//! Append-only fetch activity log.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{FetchLogRecord, NewFetchLog};
use super::pool::{DieselError, SqlitePool};
use super::util::parse_datetime;
use crate::models::{FetchLog, FetchStatus};
use crate::schema::fetch_logs;

impl From<FetchLogRecord> for FetchLog {
    fn from(record: FetchLogRecord) -> Self {
        FetchLog {
            id: record.log_id,
            site_id: record.site_id,
            fetch_time: parse_datetime(&record.fetch_time),
            status: FetchStatus::from_str(&record.status).unwrap_or(FetchStatus::Failure),
            message: record.message,
            items_fetched: i64::from(record.items_fetched),
        }
    }
}

/// Fetch log repository.
#[derive(Clone)]
pub struct FetchLogRepository {
    pool: SqlitePool,
}

impl FetchLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one log row.
    pub async fn append(
        &self,
        site_id: i32,
        status: FetchStatus,
        message: &str,
        items_fetched: usize,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();
        let items = i32::try_from(items_fetched).unwrap_or(i32::MAX);

        diesel::insert_into(fetch_logs::table)
            .values(NewFetchLog {
                site_id,
                fetch_time: &now,
                status: status.as_str(),
                message: Some(message),
                items_fetched: items,
            })
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Append a log row, reporting a storage failure through tracing instead
    /// of the caller. Returns whether the row was written.
    pub async fn record(
        &self,
        site_id: i32,
        status: FetchStatus,
        message: &str,
        items_fetched: usize,
    ) -> bool {
        match self.append(site_id, status, message, items_fetched).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    site_id,
                    status = status.as_str(),
                    items_fetched,
                    "Failed to write fetch log ({}): {}",
                    message,
                    e
                );
                false
            }
        }
    }

    /// Most recent log rows, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<FetchLog>, DieselError> {
        let mut conn = self.pool.get().await?;

        fetch_logs::table
            .order(fetch_logs::log_id.desc())
            .limit(limit)
            .select(FetchLogRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(FetchLog::from).collect())
    }

    /// Log rows for one site, newest first.
    pub async fn for_site(&self, site_id: i32, limit: i64) -> Result<Vec<FetchLog>, DieselError> {
        let mut conn = self.pool.get().await?;

        fetch_logs::table
            .filter(fetch_logs::site_id.eq(site_id))
            .order(fetch_logs::log_id.desc())
            .limit(limit)
            .select(FetchLogRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(FetchLog::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seed_site, test_store};

    #[tokio::test]
    async fn test_append_and_read_newest_first() {
        let (store, _dir) = test_store().await;
        let site_id = seed_site(&store, "siteA").await;
        let logs = store.fetch_logs();

        logs.append(site_id, FetchStatus::Failure, "fetch returned no data", 0)
            .await
            .unwrap();
        assert!(logs.record(site_id, FetchStatus::Success, "saved 3 items", 3).await);

        let recent = logs.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].status, FetchStatus::Success);
        assert_eq!(recent[0].items_fetched, 3);
        assert_eq!(recent[1].message.as_deref(), Some("fetch returned no data"));

        assert_eq!(logs.for_site(site_id, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_swallows_storage_errors() {
        let (store, _dir) = test_store().await;
        // No such site: the foreign key rejects the row
        assert!(!store.fetch_logs().record(999, FetchStatus::Failure, "x", 0).await);
        assert!(store.fetch_logs().recent(10).await.unwrap().is_empty());
    }
}
