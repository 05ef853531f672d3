//! Diesel ORM models for database tables.
//!
//! Records mirror the table layout exactly; conversion into domain models
//! lives next to the repository that loads them.

use diesel::prelude::*;

use crate::schema;

/// Site record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::sites)]
#[diesel(primary_key(site_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SiteRecord {
    pub site_id: i32,
    pub site_name: String,
    pub site_url: String,
    pub site_code: String,
    pub fetch_type: String,
    pub api_url: Option<String>,
    pub description: Option<String>,
    pub active: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// New site for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::sites)]
pub struct NewSite<'a> {
    pub site_name: &'a str,
    pub site_url: &'a str,
    pub site_code: &'a str,
    pub fetch_type: &'a str,
    pub api_url: Option<&'a str>,
    pub description: Option<&'a str>,
    pub active: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Ranking type record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::ranking_types)]
#[diesel(primary_key(ranking_type_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RankingTypeRecord {
    pub ranking_type_id: i32,
    pub site_id: i32,
    pub type_name: String,
    pub type_code: String,
    pub type_url: Option<String>,
    pub description: Option<String>,
    pub active: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// New ranking type for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::ranking_types)]
pub struct NewRankingType<'a> {
    pub site_id: i32,
    pub type_name: &'a str,
    pub type_code: &'a str,
    pub type_url: Option<&'a str>,
    pub description: Option<&'a str>,
    pub active: i32,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Ranking entry record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::rankings)]
#[diesel(primary_key(ranking_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RankingRecord {
    pub ranking_id: i32,
    pub site_id: i32,
    pub ranking_type_id: i32,
    pub fetch_date: String,
    pub book_id: Option<String>,
    pub rank: i32,
    pub title: String,
    pub author: Option<String>,
    pub book_url: Option<String>,
    pub category: Option<String>,
    pub indicator_value: Option<String>,
    pub indicator_unit: Option<String>,
    pub cover_url: Option<String>,
    pub latest_chapter: Option<String>,
    pub creation_status: Option<i32>,
    pub extra_data: Option<String>,
    pub created_at: String,
}

/// New ranking entry for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::rankings)]
pub struct NewRanking<'a> {
    pub site_id: i32,
    pub ranking_type_id: i32,
    pub fetch_date: &'a str,
    pub book_id: Option<&'a str>,
    pub rank: i32,
    pub title: &'a str,
    pub author: Option<&'a str>,
    pub book_url: Option<&'a str>,
    pub category: Option<&'a str>,
    pub indicator_value: Option<&'a str>,
    pub indicator_unit: Option<&'a str>,
    pub cover_url: Option<&'a str>,
    pub latest_chapter: Option<&'a str>,
    pub creation_status: Option<i32>,
    pub extra_data: Option<&'a str>,
    pub created_at: &'a str,
}

/// Fetch log record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::fetch_logs)]
#[diesel(primary_key(log_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FetchLogRecord {
    pub log_id: i32,
    pub site_id: i32,
    pub fetch_time: String,
    pub status: String,
    pub message: Option<String>,
    pub items_fetched: i32,
}

/// New fetch log for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::fetch_logs)]
pub struct NewFetchLog<'a> {
    pub site_id: i32,
    pub fetch_time: &'a str,
    pub status: &'a str,
    pub message: Option<&'a str>,
    pub items_fetched: i32,
}
