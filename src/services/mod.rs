//! Service layer for booklist business logic.
//!
//! This module contains domain logic separated from UI concerns.
//! Services are used by the CLI and the read API.

pub mod ingest;
pub mod rankings;
pub mod seed;

pub use ingest::{run_cycle, run_ingest, run_ingest_with, CycleOutcome, IngestReport, SiteReport};
pub use rankings::{
    BookDetail, BookSummary, Overview, QueryError, RankingList, RankingService, SiteRankings,
};
pub use seed::seed_sites;
