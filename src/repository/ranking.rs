//! Ranking entry storage and scoped reads.

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{NewRanking, RankingRecord, RankingTypeRecord, SiteRecord};
use super::pool::{DieselError, SqliteConn, SqlitePool};
use super::util::{format_date, non_empty, parse_date};
use crate::models::{decode_extra, BookRecord, RankingEntry};
use crate::schema::{ranking_types, rankings, sites};

impl From<RankingRecord> for RankingEntry {
    fn from(record: RankingRecord) -> Self {
        let extra = decode_extra(record.extra_data.as_deref()).unwrap_or_default();
        RankingEntry {
            id: record.ranking_id,
            site_id: record.site_id,
            ranking_type_id: record.ranking_type_id,
            fetch_date: parse_date(&record.fetch_date).unwrap_or_default(),
            record: BookRecord {
                rank: record.rank,
                title: record.title,
                author: non_empty(record.author),
                book_id: non_empty(record.book_id),
                book_url: non_empty(record.book_url),
                category: non_empty(record.category),
                indicator_value: non_empty(record.indicator_value),
                indicator_unit: non_empty(record.indicator_unit),
                cover_url: non_empty(record.cover_url),
                latest_chapter: non_empty(record.latest_chapter),
                creation_status: record.creation_status,
                extra,
            },
        }
    }
}

/// Scope of a ranking read. Absent fields do not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub site_id: Option<i32>,
    pub ranking_type_id: Option<i32>,
    pub fetch_date: Option<NaiveDate>,
}

impl EntryFilter {
    pub fn site(site_id: i32) -> Self {
        Self {
            site_id: Some(site_id),
            ..Default::default()
        }
    }

    pub fn ranking_type(site_id: i32, ranking_type_id: i32) -> Self {
        Self {
            site_id: Some(site_id),
            ranking_type_id: Some(ranking_type_id),
            fetch_date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.fetch_date = Some(date);
        self
    }
}

/// A stored entry together with the site and type it belongs to.
#[derive(Debug, Clone)]
pub struct ScopedEntry {
    pub site_code: String,
    pub site_name: String,
    pub type_code: String,
    pub type_name: String,
    pub entry: RankingEntry,
}

/// Insert one entry. Failures are logged and reported as `false`.
pub async fn insert_entry(
    conn: &mut SqliteConn,
    site_id: i32,
    ranking_type_id: i32,
    fetch_date: NaiveDate,
    book: &BookRecord,
) -> bool {
    let date = format_date(fetch_date);
    let extra = book.extra_json();
    let now = Utc::now().to_rfc3339();

    let result = diesel::insert_into(rankings::table)
        .values(NewRanking {
            site_id,
            ranking_type_id,
            fetch_date: &date,
            book_id: book.book_id.as_deref(),
            rank: book.rank,
            title: &book.title,
            author: book.author.as_deref(),
            book_url: book.book_url.as_deref(),
            category: book.category.as_deref(),
            indicator_value: book.indicator_value.as_deref(),
            indicator_unit: book.indicator_unit.as_deref(),
            cover_url: book.cover_url.as_deref(),
            latest_chapter: book.latest_chapter.as_deref(),
            creation_status: book.creation_status,
            extra_data: extra.as_deref(),
            created_at: &now,
        })
        .execute(conn)
        .await;

    match result {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(
                site_id,
                ranking_type_id,
                rank = book.rank,
                title = %book.title,
                "Failed to save ranking entry: {}",
                e
            );
            false
        }
    }
}

/// Remove the snapshot for one (site, type, date).
pub async fn delete_snapshot(
    conn: &mut SqliteConn,
    site_id: i32,
    ranking_type_id: i32,
    fetch_date: NaiveDate,
) -> Result<usize, DieselError> {
    let date = format_date(fetch_date);
    diesel::delete(
        rankings::table
            .filter(rankings::site_id.eq(site_id))
            .filter(rankings::ranking_type_id.eq(ranking_type_id))
            .filter(rankings::fetch_date.eq(date)),
    )
    .execute(conn)
    .await
}

/// Ranking entry repository (read side).
#[derive(Clone)]
pub struct RankingRepository {
    pool: SqlitePool,
}

impl RankingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Entries matching a scope, ordered by site then type then rank. Codes
    /// break ties between equal display names so each site and type stays
    /// contiguous.
    pub async fn entries(&self, filter: EntryFilter) -> Result<Vec<ScopedEntry>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = rankings::table
            .inner_join(
                ranking_types::table
                    .on(rankings::ranking_type_id.eq(ranking_types::ranking_type_id)),
            )
            .inner_join(sites::table.on(rankings::site_id.eq(sites::site_id)))
            .select((
                RankingRecord::as_select(),
                RankingTypeRecord::as_select(),
                SiteRecord::as_select(),
            ))
            .order((
                sites::site_name.asc(),
                sites::site_code.asc(),
                ranking_types::type_name.asc(),
                ranking_types::type_code.asc(),
                rankings::rank.asc(),
                rankings::ranking_id.asc(),
            ))
            .into_boxed();

        if let Some(site_id) = filter.site_id {
            query = query.filter(rankings::site_id.eq(site_id));
        }
        if let Some(type_id) = filter.ranking_type_id {
            query = query.filter(rankings::ranking_type_id.eq(type_id));
        }
        if let Some(date) = filter.fetch_date {
            query = query.filter(rankings::fetch_date.eq(format_date(date)));
        }

        let rows: Vec<(RankingRecord, RankingTypeRecord, SiteRecord)> =
            query.load(&mut conn).await?;

        Ok(rows
            .into_iter()
            .map(|(ranking, ty, site)| ScopedEntry {
                site_code: site.site_code,
                site_name: site.site_name,
                type_code: ty.type_code,
                type_name: ty.type_name,
                entry: RankingEntry::from(ranking),
            })
            .collect())
    }

    /// Most recent fetch date with data in a scope. The date filter is ignored.
    pub async fn max_date(&self, filter: EntryFilter) -> Result<Option<NaiveDate>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = rankings::table
            .select(diesel::dsl::max(rankings::fetch_date))
            .into_boxed();

        if let Some(site_id) = filter.site_id {
            query = query.filter(rankings::site_id.eq(site_id));
        }
        if let Some(type_id) = filter.ranking_type_id {
            query = query.filter(rankings::ranking_type_id.eq(type_id));
        }

        let latest: Option<String> = query.first(&mut conn).await?;
        Ok(latest.as_deref().and_then(parse_date))
    }

    /// Number of rows stored for a scope.
    pub async fn count(&self, filter: EntryFilter) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = rankings::table.count().into_boxed();

        if let Some(site_id) = filter.site_id {
            query = query.filter(rankings::site_id.eq(site_id));
        }
        if let Some(type_id) = filter.ranking_type_id {
            query = query.filter(rankings::ranking_type_id.eq(type_id));
        }
        if let Some(date) = filter.fetch_date {
            query = query.filter(rankings::fetch_date.eq(format_date(date)));
        }

        query.get_result(&mut conn).await
    }
}
