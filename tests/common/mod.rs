//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::{tempdir, TempDir};

use booklist::models::{BookRecord, FetchType, Site};
use booklist::repository::{SiteFields, Store};
use booklist::scrapers::{AdapterError, ProcessedRankings, RankingGroup, RawPayload, SiteAdapter};

/// Fresh store with schema in a temporary directory.
pub async fn test_store() -> (Store, TempDir) {
    let dir = tempdir().unwrap();
    let store = Store::new(&dir.path().join("booklist.db"));
    store.init_schema().await.unwrap();
    (store, dir)
}

pub async fn add_site(store: &Store, code: &str) -> Site {
    store
        .sites()
        .upsert(
            code,
            SiteFields {
                name: code,
                url: "https://example.com/",
                fetch_type: FetchType::Html,
                api_url: None,
                description: None,
            },
        )
        .await
        .unwrap();
    store.sites().get_by_code(code).await.unwrap().unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// One ranking type with the given ranks, titled "<code> #<rank>".
pub fn groups(type_code: &str, ranks: &[i32]) -> ProcessedRankings {
    let mut groups = ProcessedRankings::new();
    groups.insert(
        type_code.to_string(),
        RankingGroup {
            name: type_code.to_string(),
            records: ranks
                .iter()
                .map(|&rank| {
                    let mut book = BookRecord::new(rank, format!("{} #{}", type_code, rank));
                    book.book_id = Some(format!("{}-{}", type_code, rank));
                    book
                })
                .collect(),
            ..Default::default()
        },
    );
    groups
}

/// What a scripted adapter does when run.
#[derive(Clone)]
pub enum Script {
    /// Fetch succeeds and processing yields these groups.
    Groups(ProcessedRankings),
    /// Fetch reports no data.
    NoData,
    /// Fetch fails with a non-transient error.
    FetchError,
    /// Processing panics.
    Panic,
}

pub struct ScriptedAdapter {
    pub site: Site,
    pub script: Script,
}

#[async_trait]
impl SiteAdapter for ScriptedAdapter {
    fn site(&self) -> &Site {
        &self.site
    }

    async fn fetch(&self) -> Result<Option<RawPayload>, AdapterError> {
        match self.script {
            Script::NoData => Ok(None),
            Script::FetchError => Err(AdapterError::Status {
                status: 403,
                url: self.site.url.clone(),
            }),
            _ => Ok(Some(RawPayload::Html("<html></html>".to_string()))),
        }
    }

    fn process(&self, _payload: RawPayload) -> Option<ProcessedRankings> {
        match &self.script {
            Script::Groups(groups) => Some(groups.clone()),
            Script::Panic => panic!("unexpected page layout"),
            _ => None,
        }
    }
}
