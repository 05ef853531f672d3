//! Ranking type registry.
//!
//! Types are discovered at ingest time: the first time an adapter reports a
//! code for a site, a row is created; later sightings refresh the display
//! fields in place so the identifier never changes.

use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use super::diesel_models::{NewRankingType, RankingTypeRecord};
use super::pool::{DieselError, SqliteConn, SqlitePool};
use super::util::{flag, non_empty};
use crate::models::RankingType;
use crate::schema::ranking_types;

impl From<RankingTypeRecord> for RankingType {
    fn from(record: RankingTypeRecord) -> Self {
        RankingType {
            id: record.ranking_type_id,
            site_id: record.site_id,
            code: record.type_code,
            name: record.type_name,
            url: non_empty(record.type_url),
            description: non_empty(record.description),
            active: flag(record.active),
        }
    }
}

/// Display fields reported for a ranking type.
#[derive(Debug, Clone, Copy)]
pub struct TypeFields<'a> {
    pub name: &'a str,
    pub url: Option<&'a str>,
    pub description: Option<&'a str>,
}

/// Resolve a type code to its identifier, creating or refreshing the row.
///
/// Runs on a caller-supplied connection so it can join an ingest transaction.
pub async fn resolve_or_create(
    conn: &mut SqliteConn,
    site_id: i32,
    code: &str,
    fields: TypeFields<'_>,
) -> Result<i32, DieselError> {
    let now = Utc::now().to_rfc3339();

    diesel::insert_into(ranking_types::table)
        .values(NewRankingType {
            site_id,
            type_name: fields.name,
            type_code: code,
            type_url: fields.url,
            description: fields.description,
            active: 1,
            created_at: &now,
            updated_at: &now,
        })
        .on_conflict((ranking_types::site_id, ranking_types::type_code))
        .do_update()
        .set((
            ranking_types::type_name.eq(excluded(ranking_types::type_name)),
            ranking_types::type_url.eq(excluded(ranking_types::type_url)),
            ranking_types::description.eq(excluded(ranking_types::description)),
            ranking_types::updated_at.eq(excluded(ranking_types::updated_at)),
        ))
        .execute(conn)
        .await?;

    ranking_types::table
        .filter(ranking_types::site_id.eq(site_id))
        .filter(ranking_types::type_code.eq(code))
        .select(ranking_types::ranking_type_id)
        .first::<i32>(conn)
        .await
}

/// Ranking type repository.
#[derive(Clone)]
pub struct RankingTypeRepository {
    pool: SqlitePool,
}

impl RankingTypeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve a type code on a fresh connection.
    pub async fn resolve_or_create(
        &self,
        site_id: i32,
        code: &str,
        fields: TypeFields<'_>,
    ) -> Result<i32, DieselError> {
        let mut conn = self.pool.get().await?;
        resolve_or_create(&mut conn, site_id, code, fields).await
    }

    /// Register a preset type without touching an existing row.
    pub async fn seed(
        &self,
        site_id: i32,
        code: &str,
        fields: TypeFields<'_>,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();

        diesel::insert_or_ignore_into(ranking_types::table)
            .values(NewRankingType {
                site_id,
                type_name: fields.name,
                type_code: code,
                type_url: fields.url,
                description: fields.description,
                active: 1,
                created_at: &now,
                updated_at: &now,
            })
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Look up a type by its code within a site.
    pub async fn get_by_code(
        &self,
        site_id: i32,
        code: &str,
    ) -> Result<Option<RankingType>, DieselError> {
        let mut conn = self.pool.get().await?;

        ranking_types::table
            .filter(ranking_types::site_id.eq(site_id))
            .filter(ranking_types::type_code.eq(code))
            .select(RankingTypeRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(RankingType::from))
    }

    /// All types registered for a site, ordered by name.
    pub async fn get_for_site(&self, site_id: i32) -> Result<Vec<RankingType>, DieselError> {
        let mut conn = self.pool.get().await?;

        ranking_types::table
            .filter(ranking_types::site_id.eq(site_id))
            .order(ranking_types::type_name.asc())
            .select(RankingTypeRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(RankingType::from).collect())
    }
}
