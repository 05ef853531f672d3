//! Site repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{NewSite, SiteRecord};
use super::pool::{DieselError, SqlitePool};
use super::util::{flag, parse_datetime};
use crate::models::{FetchType, Site};
use crate::schema::sites;

/// Convert a database record to a domain model.
impl From<SiteRecord> for Site {
    fn from(record: SiteRecord) -> Self {
        Site {
            id: record.site_id,
            fetch_type: FetchType::from_str(&record.fetch_type).unwrap_or(FetchType::Html),
            code: record.site_code,
            name: record.site_name,
            url: record.site_url,
            api_url: record.api_url.filter(|u| !u.is_empty()),
            description: record.description,
            active: flag(record.active),
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// Descriptive fields of a site, as seeded from configuration.
#[derive(Debug, Clone, Copy)]
pub struct SiteFields<'a> {
    pub name: &'a str,
    pub url: &'a str,
    pub fetch_type: FetchType,
    pub api_url: Option<&'a str>,
    pub description: Option<&'a str>,
}

/// Site repository.
#[derive(Clone)]
pub struct SiteRepository {
    pool: SqlitePool,
}

impl SiteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a site unless its code already exists; return its ID either way.
    ///
    /// Existing rows are left untouched, so a site's identity never changes
    /// after it is first seeded.
    pub async fn upsert(&self, code: &str, fields: SiteFields<'_>) -> Result<i32, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();

        diesel::insert_or_ignore_into(sites::table)
            .values(NewSite {
                site_name: fields.name,
                site_url: fields.url,
                site_code: code,
                fetch_type: fields.fetch_type.as_str(),
                api_url: fields.api_url,
                description: fields.description,
                active: 1,
                created_at: &now,
                updated_at: &now,
            })
            .execute(&mut conn)
            .await?;

        sites::table
            .filter(sites::site_code.eq(code))
            .select(sites::site_id)
            .first::<i32>(&mut conn)
            .await
    }

    /// Activate or deactivate a site. Returns false if the code is unknown.
    pub async fn set_active(&self, code: &str, active: bool) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();

        let rows = diesel::update(sites::table.filter(sites::site_code.eq(code)))
            .set((
                sites::active.eq(i32::from(active)),
                sites::updated_at.eq(&now),
            ))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// Get a site by ID.
    pub async fn get(&self, id: i32) -> Result<Option<Site>, DieselError> {
        let mut conn = self.pool.get().await?;

        sites::table
            .find(id)
            .select(SiteRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Site::from))
    }

    /// Get a site by its stable code, active or not.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Site>, DieselError> {
        let mut conn = self.pool.get().await?;

        sites::table
            .filter(sites::site_code.eq(code))
            .select(SiteRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Site::from))
    }

    /// Get all active sites in insertion order.
    pub async fn get_active(&self) -> Result<Vec<Site>, DieselError> {
        let mut conn = self.pool.get().await?;

        sites::table
            .filter(sites::active.eq(1))
            .order(sites::site_id.asc())
            .select(SiteRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Site::from).collect())
    }

    /// Get all sites.
    pub async fn get_all(&self) -> Result<Vec<Site>, DieselError> {
        let mut conn = self.pool.get().await?;

        sites::table
            .order(sites::site_id.asc())
            .select(SiteRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Site::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_store;

    fn fields<'a>(name: &'a str) -> SiteFields<'a> {
        SiteFields {
            name,
            url: "https://example.com/",
            fetch_type: FetchType::Html,
            api_url: None,
            description: Some("example"),
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let (store, _dir) = test_store().await;
        let repo = store.sites();

        let first = repo.upsert("siteA", fields("Site A")).await.unwrap();
        let second = repo.upsert("siteA", fields("Renamed")).await.unwrap();
        assert_eq!(first, second);

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        // Insert-or-ignore keeps the original row
        assert_eq!(all[0].name, "Site A");
    }

    #[tokio::test]
    async fn test_deactivated_sites_are_not_active() {
        let (store, _dir) = test_store().await;
        let repo = store.sites();

        repo.upsert("a", fields("A")).await.unwrap();
        repo.upsert("b", fields("B")).await.unwrap();
        assert!(repo.set_active("b", false).await.unwrap());
        assert!(!repo.set_active("missing", false).await.unwrap());

        let active = repo.get_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "a");

        let b = repo.get_by_code("b").await.unwrap().unwrap();
        assert!(!b.active);
        assert_eq!(repo.get(b.id).await.unwrap().unwrap().code, "b");
    }
}
