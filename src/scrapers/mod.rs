//! Site adapters: per-source fetching and normalization.
//!
//! Every source implements [`SiteAdapter`]. `fetch` does network I/O only,
//! `process` turns the raw payload into canonical [`BookRecord`]s grouped
//! by ranking-type code, and `fetch_and_save` runs the shared ingest cycle.

pub mod ciweimao;
pub mod fanqie;
mod html;
mod http_client;
pub mod normalize;
pub mod qidian;
pub mod registry;

pub use http_client::HttpClient;
pub use normalize::{normalize_records, RawRecord};
pub use registry::{adapter_for, is_supported, AdapterOptions, ADAPTERS};

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{BookRecord, Site};
use crate::repository::Store;

/// Error from an adapter's fetch step.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("credential file {path}: {message}")]
    Credential { path: String, message: String },

    #[error("no adapter registered for site '{0}'")]
    UnknownSite(String),
}

impl AdapterError {
    /// Whether another attempt might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(_) | Self::Decode(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Credential { .. } | Self::UnknownSite(_) => false,
        }
    }
}

/// Unprocessed data returned by a fetch.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// A page to be parsed.
    Html(String),
    /// A decoded API response.
    Json(serde_json::Value),
}

/// One ranking list as it appears on a source, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawSection {
    pub name: String,
    pub url: Option<String>,
    pub records: Vec<RawRecord>,
}

/// A normalized ranking list, ready to persist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingGroup {
    /// Display name registered for the type.
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub records: Vec<BookRecord>,
}

/// Normalized output of `process`, keyed by ranking-type code.
pub type ProcessedRankings = BTreeMap<String, RankingGroup>;

/// A ranking source.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// The site this adapter writes for.
    fn site(&self) -> &Site;

    /// Retrieve raw data. `Ok(None)` means the source had nothing usable.
    async fn fetch(&self) -> Result<Option<RawPayload>, AdapterError>;

    /// Turn a payload into ranking groups. Must not fail on unfamiliar shapes;
    /// returns `None` only when the payload is not something this adapter reads.
    fn process(&self, payload: RawPayload) -> Option<ProcessedRankings>;

    /// Fetch, process and persist one snapshot, logging the outcome.
    async fn fetch_and_save(&self, store: &Store, fetch_date: NaiveDate) -> bool {
        crate::services::ingest::run_cycle(self, store, fetch_date)
            .await
            .is_success()
    }
}
