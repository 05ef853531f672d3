//! Ranking reads with date fallback.
//!
//! Every query first looks at the requested date. When the scope has no rows
//! for that day, the most recent date with data is used instead and reported
//! in the result. A scope that has never had data yields an empty result.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{ExtraFields, RankingEntry, Site};
use crate::repository::{DieselError, EntryFilter, ScopedEntry, Store};

/// Error from a ranking query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("site '{0}' not found")]
    SiteNotFound(String),

    #[error("ranking type '{type_code}' not found for site '{site_code}'")]
    TypeNotFound { site_code: String, type_code: String },

    #[error("database error: {0}")]
    Database(#[from] DieselError),
}

/// Thin projection used by the overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    pub rank: i32,
    pub book_id: Option<String>,
}

/// Full record detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDetail {
    pub rank: i32,
    pub title: String,
    pub author: Option<String>,
    pub book_id: Option<String>,
    pub book_url: Option<String>,
    pub category: Option<String>,
    pub indicator_value: Option<String>,
    pub indicator_unit: Option<String>,
    pub cover_url: Option<String>,
    pub latest_chapter: Option<String>,
    pub creation_status: Option<i32>,
    /// Decoded extension bag, `null` when absent or unreadable.
    pub extra_data: Option<ExtraFields>,
}

impl From<RankingEntry> for BookDetail {
    fn from(entry: RankingEntry) -> Self {
        let record = entry.record;
        Self {
            rank: record.rank,
            title: record.title,
            author: record.author,
            book_id: record.book_id,
            book_url: record.book_url,
            category: record.category,
            indicator_value: record.indicator_value,
            indicator_unit: record.indicator_unit,
            cover_url: record.cover_url,
            latest_chapter: record.latest_chapter,
            creation_status: record.creation_status,
            extra_data: (!record.extra.is_empty()).then_some(record.extra),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeSummary {
    pub type_name: String,
    pub type_code: String,
    pub fetch_date: NaiveDate,
    pub books: Vec<BookSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteSummary {
    pub site_name: String,
    pub site_code: String,
    /// Keyed by type code.
    pub rankings: BTreeMap<String, TypeSummary>,
}

/// Every site's rankings for one date.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub fetch_date: NaiveDate,
    pub sites: Vec<SiteSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeDetail {
    pub type_name: String,
    pub type_code: String,
    pub fetch_date: NaiveDate,
    pub books: Vec<BookDetail>,
}

/// One site's rankings for one date, grouped by type.
#[derive(Debug, Clone, Serialize)]
pub struct SiteRankings {
    pub site_name: String,
    pub site_code: String,
    pub fetch_date: NaiveDate,
    pub rankings: Vec<TypeDetail>,
}

/// One ranking list for one date.
#[derive(Debug, Clone, Serialize)]
pub struct RankingList {
    pub site_name: String,
    pub site_code: String,
    pub type_name: String,
    pub type_code: String,
    pub fetch_date: NaiveDate,
    pub books: Vec<BookDetail>,
}

/// Read-only ranking queries.
#[derive(Clone)]
pub struct RankingService {
    store: Store,
}

impl RankingService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Active sites.
    pub async fn sites(&self) -> Result<Vec<Site>, QueryError> {
        Ok(self.store.sites().get_active().await?)
    }

    /// All sites' rankings, reduced to rank and book id.
    pub async fn overview(&self, date: NaiveDate) -> Result<Overview, QueryError> {
        let (fetch_date, rows) = self.load(EntryFilter::default(), date).await?;

        let mut sites: Vec<SiteSummary> = Vec::new();
        for row in rows {
            if sites.last().map_or(true, |s| s.site_code != row.site_code) {
                sites.push(SiteSummary {
                    site_name: row.site_name,
                    site_code: row.site_code,
                    rankings: BTreeMap::new(),
                });
            }
            let Some(site) = sites.last_mut() else {
                continue;
            };

            site.rankings
                .entry(row.type_code.clone())
                .or_insert_with(|| TypeSummary {
                    type_name: row.type_name,
                    type_code: row.type_code,
                    fetch_date: row.entry.fetch_date,
                    books: Vec::new(),
                })
                .books
                .push(BookSummary {
                    rank: row.entry.record.rank,
                    book_id: row.entry.record.book_id,
                });
        }

        Ok(Overview { fetch_date, sites })
    }

    /// One site's rankings with full detail.
    pub async fn site_rankings(
        &self,
        site_code: &str,
        date: NaiveDate,
    ) -> Result<SiteRankings, QueryError> {
        let site = self.site(site_code).await?;
        let (fetch_date, rows) = self.load(EntryFilter::site(site.id), date).await?;

        let mut rankings: Vec<TypeDetail> = Vec::new();
        for row in rows {
            match rankings.last_mut() {
                Some(ty) if ty.type_code == row.type_code => {
                    ty.books.push(BookDetail::from(row.entry));
                }
                _ => rankings.push(TypeDetail {
                    type_name: row.type_name,
                    type_code: row.type_code,
                    fetch_date: row.entry.fetch_date,
                    books: vec![BookDetail::from(row.entry)],
                }),
            }
        }

        Ok(SiteRankings {
            site_name: site.name,
            site_code: site.code,
            fetch_date,
            rankings,
        })
    }

    /// One ranking list, ordered by rank.
    pub async fn type_rankings(
        &self,
        site_code: &str,
        type_code: &str,
        date: NaiveDate,
    ) -> Result<RankingList, QueryError> {
        let site = self.site(site_code).await?;
        let ranking_type = self
            .store
            .ranking_types()
            .get_by_code(site.id, type_code)
            .await?
            .ok_or_else(|| QueryError::TypeNotFound {
                site_code: site_code.to_string(),
                type_code: type_code.to_string(),
            })?;

        let filter = EntryFilter::ranking_type(site.id, ranking_type.id);
        let (fetch_date, rows) = self.load(filter, date).await?;

        Ok(RankingList {
            site_name: site.name,
            site_code: site.code,
            type_name: ranking_type.name,
            type_code: ranking_type.code,
            fetch_date,
            books: rows
                .into_iter()
                .map(|row| BookDetail::from(row.entry))
                .collect(),
        })
    }

    async fn site(&self, code: &str) -> Result<Site, QueryError> {
        self.store
            .sites()
            .get_by_code(code)
            .await?
            .ok_or_else(|| QueryError::SiteNotFound(code.to_string()))
    }

    /// Rows for a scope at `date`, falling back to the scope's latest date.
    async fn load(
        &self,
        filter: EntryFilter,
        date: NaiveDate,
    ) -> Result<(NaiveDate, Vec<ScopedEntry>), QueryError> {
        let rankings = self.store.rankings();

        let rows = rankings.entries(filter.on(date)).await?;
        if !rows.is_empty() {
            return Ok((date, rows));
        }

        match rankings.max_date(filter).await? {
            Some(latest) if latest != date => {
                tracing::debug!(requested = %date, %latest, "No rows for date, using latest");
                Ok((latest, rankings.entries(filter.on(latest)).await?))
            }
            _ => Ok((date, rows)),
        }
    }
}
