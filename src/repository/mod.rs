//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM on SQLite through diesel-async.

mod context;
mod diesel_models;
pub mod fetch_log;
pub mod pool;
pub mod ranking;
pub mod ranking_type;
pub mod site;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::Store;
pub use fetch_log::FetchLogRepository;
pub use pool::{DieselError, SqliteConn, SqlitePool};
pub use ranking::{EntryFilter, RankingRepository, ScopedEntry};
pub use ranking_type::{RankingTypeRepository, TypeFields};
pub use site::{SiteFields, SiteRepository};
