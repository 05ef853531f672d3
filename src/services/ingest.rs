//! Ingestion orchestrator.
//!
//! One pass walks the active sites in order. For each site the adapter is
//! fetched, processed and persisted inside a single transaction, then the
//! outcome is written to the fetch log. Nothing that goes wrong for one
//! site, including a panic inside an adapter, stops the pass.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;

use chrono::NaiveDate;
use diesel_async::AsyncConnection;
use futures::FutureExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::models::{FetchStatus, Site, SnapshotPolicy};
use crate::repository::ranking::{delete_snapshot, insert_entry};
use crate::repository::ranking_type::{resolve_or_create, TypeFields};
use crate::repository::{DieselError, Store};
use crate::scrapers::{adapter_for, AdapterError, AdapterOptions, ProcessedRankings, SiteAdapter};

pub const NO_FETCH_DATA: &str = "fetch returned no data";
pub const NO_PROCESSED_DATA: &str = "processing produced no data";

/// How one site's run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Snapshot committed; `items` rows were written.
    Saved { items: usize },
    /// The fetch yielded nothing usable.
    NoData,
    /// The payload produced no ranking groups.
    Empty,
    /// The run was aborted by an error.
    Failed(String),
    /// No adapter could be selected. Not written to the fetch log.
    Skipped(String),
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    pub fn items(&self) -> usize {
        match self {
            Self::Saved { items } => *items,
            _ => 0,
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved { items } => write!(f, "saved {} items", items),
            Self::NoData => f.write_str(NO_FETCH_DATA),
            Self::Empty => f.write_str(NO_PROCESSED_DATA),
            Self::Failed(message) => write!(f, "failed: {}", message),
            Self::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

/// Outcome of one site within a pass.
#[derive(Debug, Clone)]
pub struct SiteReport {
    pub site_code: String,
    pub outcome: CycleOutcome,
}

/// Summary of an ingestion pass.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub run_id: Uuid,
    pub fetch_date: NaiveDate,
    pub sites: Vec<SiteReport>,
}

impl IngestReport {
    pub fn succeeded(&self) -> usize {
        self.sites.iter().filter(|s| s.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.sites
            .iter()
            .filter(|s| {
                !s.outcome.is_success() && !matches!(s.outcome, CycleOutcome::Skipped(_))
            })
            .count()
    }

    pub fn total_items(&self) -> usize {
        self.sites.iter().map(|s| s.outcome.items()).sum()
    }

    pub fn outcome(&self, site_code: &str) -> Option<&CycleOutcome> {
        self.sites
            .iter()
            .find(|s| s.site_code == site_code)
            .map(|s| &s.outcome)
    }
}

/// Fetch, process and persist one snapshot for an adapter's site.
///
/// Every outcome except `Skipped` leaves exactly one fetch log row.
pub async fn run_cycle<A: SiteAdapter + ?Sized>(
    adapter: &A,
    store: &Store,
    fetch_date: NaiveDate,
) -> CycleOutcome {
    let site = adapter.site();
    let span = tracing::info_span!(parent: store.span(), "site", code = %site.code);

    async move {
        let outcome = match adapter.fetch().await {
            Ok(Some(payload)) => match adapter.process(payload) {
                Some(groups) if groups.values().any(|g| !g.records.is_empty()) => {
                    match persist(store, site.id, fetch_date, &groups).await {
                        Ok(items) => CycleOutcome::Saved { items },
                        Err(e) => CycleOutcome::Failed(format!("persist failed: {}", e)),
                    }
                }
                _ => CycleOutcome::Empty,
            },
            Ok(None) => CycleOutcome::NoData,
            Err(e) => CycleOutcome::Failed(format!("fetch failed: {}", e)),
        };

        log_outcome(store, site, &outcome).await;
        outcome
    }
    .instrument(span)
    .await
}

/// Write every group in one transaction and return the number of rows saved.
///
/// A group without records leaves that type's stored snapshot untouched.
async fn persist(
    store: &Store,
    site_id: i32,
    fetch_date: NaiveDate,
    groups: &ProcessedRankings,
) -> Result<usize, DieselError> {
    let policy = store.policy();
    let mut conn = store.pool().get().await?;

    conn.transaction(|conn| {
        Box::pin(async move {
            let mut saved = 0;
            for (code, group) in groups {
                let type_id = resolve_or_create(
                    conn,
                    site_id,
                    code,
                    TypeFields {
                        name: &group.name,
                        url: group.url.as_deref(),
                        description: group.description.as_deref(),
                    },
                )
                .await?;

                if group.records.is_empty() {
                    tracing::warn!(type_code = %code, "No records, keeping stored snapshot");
                    continue;
                }

                if policy == SnapshotPolicy::Replace {
                    let removed = delete_snapshot(conn, site_id, type_id, fetch_date).await?;
                    if removed > 0 {
                        tracing::debug!(type_code = %code, removed, "Replacing existing snapshot");
                    }
                }

                let mut type_saved = 0;
                for record in &group.records {
                    if insert_entry(conn, site_id, type_id, fetch_date, record).await {
                        type_saved += 1;
                    }
                }
                tracing::info!(
                    type_code = %code,
                    "Saved {}/{} entries",
                    type_saved,
                    group.records.len()
                );
                saved += type_saved;
            }
            Ok(saved)
        })
    })
    .await
}

async fn log_outcome(store: &Store, site: &Site, outcome: &CycleOutcome) {
    let (status, message) = match outcome {
        CycleOutcome::Saved { items } => {
            tracing::info!(items, "Snapshot saved");
            (FetchStatus::Success, format!("saved {} items", items))
        }
        CycleOutcome::NoData => {
            tracing::warn!("{}", NO_FETCH_DATA);
            (FetchStatus::Failure, NO_FETCH_DATA.to_string())
        }
        CycleOutcome::Empty => {
            tracing::warn!("{}", NO_PROCESSED_DATA);
            (FetchStatus::Failure, NO_PROCESSED_DATA.to_string())
        }
        CycleOutcome::Failed(message) => {
            tracing::error!("{}", message);
            (FetchStatus::Failure, message.clone())
        }
        CycleOutcome::Skipped(_) => return,
    };

    store
        .fetch_logs()
        .record(site.id, status, &message, outcome.items())
        .await;
}

/// Run one pass over the active sites using the built-in adapters.
///
/// When `only` is non-empty, just those site codes are attempted.
pub async fn run_ingest(
    store: &Store,
    options: &AdapterOptions,
    only: &[String],
    fetch_date: NaiveDate,
) -> Result<IngestReport, DieselError> {
    run_ingest_with(store, only, fetch_date, |site| adapter_for(site, options)).await
}

/// Run one pass, building each site's adapter with `resolve`.
pub async fn run_ingest_with<F>(
    store: &Store,
    only: &[String],
    fetch_date: NaiveDate,
    mut resolve: F,
) -> Result<IngestReport, DieselError>
where
    F: FnMut(Site) -> Result<Box<dyn SiteAdapter>, AdapterError>,
{
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("ingest", run_id = %run_id, date = %fetch_date);
    let store = store.clone().with_span(span.clone());

    let mut sites = store.sites().get_active().instrument(span.clone()).await?;
    let mut reports = Vec::new();

    if !only.is_empty() {
        sites.retain(|site| only.contains(&site.code));
        for code in only {
            if !sites.iter().any(|site| &site.code == code) {
                span.in_scope(|| tracing::warn!(site = %code, "Not an active site, skipping"));
                reports.push(SiteReport {
                    site_code: code.clone(),
                    outcome: CycleOutcome::Skipped("not an active site".to_string()),
                });
            }
        }
    }

    span.in_scope(|| tracing::info!(sites = sites.len(), "Starting ingest pass"));

    for site in sites {
        let site_code = site.code.clone();
        let outcome = run_site(&store, site, fetch_date, &mut resolve).await;
        reports.push(SiteReport { site_code, outcome });
    }

    let report = IngestReport {
        run_id,
        fetch_date,
        sites: reports,
    };
    span.in_scope(|| {
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            items = report.total_items(),
            "Ingest pass finished"
        )
    });
    Ok(report)
}

async fn run_site<F>(
    store: &Store,
    site: Site,
    fetch_date: NaiveDate,
    resolve: &mut F,
) -> CycleOutcome
where
    F: FnMut(Site) -> Result<Box<dyn SiteAdapter>, AdapterError>,
{
    let site_id = site.id;
    let code = site.code.clone();

    let adapter = match resolve(site) {
        Ok(adapter) => adapter,
        Err(AdapterError::UnknownSite(_)) => {
            store
                .span()
                .in_scope(|| tracing::warn!(site = %code, "No adapter for site, skipping"));
            return CycleOutcome::Skipped("no adapter registered".to_string());
        }
        Err(e) => {
            let message = format!("adapter setup failed: {}", e);
            store
                .span()
                .in_scope(|| tracing::error!(site = %code, "{}", message));
            store
                .fetch_logs()
                .record(site_id, FetchStatus::Failure, &message, 0)
                .await;
            return CycleOutcome::Failed(message);
        }
    };

    match AssertUnwindSafe(run_cycle(adapter.as_ref(), store, fetch_date))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(panic) => {
            let message = format!("adapter panicked: {}", panic_message(panic.as_ref()));
            store
                .span()
                .in_scope(|| tracing::error!(site = %code, "{}", message));
            store
                .fetch_logs()
                .record(site_id, FetchStatus::Failure, &message, 0)
                .await;
            CycleOutcome::Failed(message)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookRecord;
    use crate::repository::test_support::{seed_site, test_store};
    use crate::repository::EntryFilter;
    use crate::scrapers::{RankingGroup, RawPayload};
    use async_trait::async_trait;

    struct StubAdapter {
        site: Site,
        payload: Option<RawPayload>,
        groups: Option<ProcessedRankings>,
    }

    #[async_trait]
    impl SiteAdapter for StubAdapter {
        fn site(&self) -> &Site {
            &self.site
        }

        async fn fetch(&self) -> Result<Option<RawPayload>, AdapterError> {
            Ok(self.payload.clone())
        }

        fn process(&self, _payload: RawPayload) -> Option<ProcessedRankings> {
            self.groups.clone()
        }
    }

    fn group(ranks: &[i32]) -> ProcessedRankings {
        let mut groups = ProcessedRankings::new();
        groups.insert(
            "weekly".to_string(),
            RankingGroup {
                name: "Weekly".to_string(),
                records: ranks
                    .iter()
                    .map(|&r| BookRecord::new(r, format!("Book {}", r)))
                    .collect(),
                ..Default::default()
            },
        );
        groups
    }

    async fn stub(store: &Store, payload: bool, groups: Option<ProcessedRankings>) -> StubAdapter {
        seed_site(store, "siteA").await;
        let site = store.sites().get_by_code("siteA").await.unwrap().unwrap();
        StubAdapter {
            site,
            payload: payload.then(|| RawPayload::Html(String::new())),
            groups,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn test_empty_fetch_logs_failure() {
        let (store, _dir) = test_store().await;
        let adapter = stub(&store, false, None).await;

        assert!(!adapter.fetch_and_save(&store, day()).await);

        let logs = store.fetch_logs().recent(5).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, FetchStatus::Failure);
        assert_eq!(logs[0].message.as_deref(), Some(NO_FETCH_DATA));
        assert_eq!(logs[0].items_fetched, 0);
    }

    #[tokio::test]
    async fn test_empty_process_logs_failure() {
        let (store, _dir) = test_store().await;
        let adapter = stub(&store, true, Some(ProcessedRankings::new())).await;

        assert_eq!(run_cycle(&adapter, &store, day()).await, CycleOutcome::Empty);
        let logs = store.fetch_logs().recent(5).await.unwrap();
        assert_eq!(logs[0].message.as_deref(), Some(NO_PROCESSED_DATA));
    }

    #[tokio::test]
    async fn test_bad_record_is_skipped_and_count_is_accurate() {
        let (store, _dir) = test_store().await;
        // Rank 0 violates the CHECK constraint
        let adapter = stub(&store, true, Some(group(&[1, 0, 3]))).await;

        let outcome = run_cycle(&adapter, &store, day()).await;
        assert_eq!(outcome, CycleOutcome::Saved { items: 2 });

        let logs = store.fetch_logs().recent(1).await.unwrap();
        assert_eq!(logs[0].status, FetchStatus::Success);
        assert_eq!(logs[0].items_fetched, 2);
        assert_eq!(
            store
                .rankings()
                .count(EntryFilter::default())
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_replace_policy_keeps_one_snapshot() {
        let (store, _dir) = test_store().await;
        let adapter = stub(&store, true, Some(group(&[1, 2]))).await;

        run_cycle(&adapter, &store, day()).await;
        run_cycle(&adapter, &store, day()).await;

        let filter = EntryFilter::default().on(day());
        assert_eq!(store.rankings().count(filter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_rerun_keeps_snapshot() {
        let (store, _dir) = test_store().await;
        let mut adapter = stub(&store, true, Some(group(&[1, 2, 3]))).await;
        run_cycle(&adapter, &store, day()).await;

        adapter.groups = Some(group(&[]));
        assert_eq!(run_cycle(&adapter, &store, day()).await, CycleOutcome::Empty);

        let filter = EntryFilter::default().on(day());
        assert_eq!(store.rankings().count(filter).await.unwrap(), 3);
        let logs = store.fetch_logs().recent(1).await.unwrap();
        assert_eq!(logs[0].status, FetchStatus::Failure);
        assert_eq!(logs[0].message.as_deref(), Some(NO_PROCESSED_DATA));
    }

    #[tokio::test]
    async fn test_empty_group_keeps_its_snapshot_beside_fresh_one() {
        let (store, _dir) = test_store().await;
        let mut adapter = stub(&store, true, Some(group(&[1, 2, 3]))).await;
        run_cycle(&adapter, &store, day()).await;

        let mut groups = group(&[]);
        groups.insert(
            "monthly".to_string(),
            RankingGroup {
                name: "Monthly".to_string(),
                records: vec![BookRecord::new(1, "Other")],
                ..Default::default()
            },
        );
        adapter.groups = Some(groups);
        assert_eq!(
            run_cycle(&adapter, &store, day()).await,
            CycleOutcome::Saved { items: 1 }
        );

        let filter = EntryFilter::default().on(day());
        assert_eq!(store.rankings().count(filter).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_append_policy_accumulates() {
        let (store, _dir) = test_store().await;
        let store = store.with_policy(SnapshotPolicy::Append);
        let adapter = stub(&store, true, Some(group(&[1, 2]))).await;

        run_cycle(&adapter, &store, day()).await;
        run_cycle(&adapter, &store, day()).await;

        let filter = EntryFilter::default().on(day());
        assert_eq!(store.rankings().count(filter).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_unknown_code_is_skipped_without_log() {
        let (store, _dir) = test_store().await;
        seed_site(&store, "mystery").await;

        let report = run_ingest(&store, &AdapterOptions::default(), &[], day())
            .await
            .unwrap();

        assert!(matches!(
            report.outcome("mystery"),
            Some(CycleOutcome::Skipped(_))
        ));
        assert!(store.fetch_logs().recent(5).await.unwrap().is_empty());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(CycleOutcome::Saved { items: 3 }.to_string(), "saved 3 items");
        assert_eq!(CycleOutcome::NoData.to_string(), NO_FETCH_DATA);
    }
}
