//! End-to-end ingestion passes with scripted adapters.

mod common;

use booklist::models::{FetchStatus, SnapshotPolicy};
use booklist::repository::EntryFilter;
use booklist::scrapers::{AdapterError, SiteAdapter};
use booklist::services::{run_ingest_with, CycleOutcome, RankingService};

use common::{add_site, date, groups, test_store, Script, ScriptedAdapter};

fn resolver(
    scripts: Vec<(&'static str, Script)>,
) -> impl FnMut(booklist::models::Site) -> Result<Box<dyn SiteAdapter>, AdapterError> {
    move |site| {
        let script = scripts
            .iter()
            .find(|(code, _)| *code == site.code)
            .map(|(_, script)| script.clone())
            .ok_or_else(|| AdapterError::UnknownSite(site.code.clone()))?;
        Ok(Box::new(ScriptedAdapter { site, script }) as Box<dyn SiteAdapter>)
    }
}

#[tokio::test]
async fn one_failing_site_does_not_block_the_others() {
    let (store, _dir) = test_store().await;
    for code in ["alpha", "broken", "empty", "panics", "unknown"] {
        add_site(&store, code).await;
    }

    let scripts = vec![
        ("alpha", Script::Groups(groups("weekly", &[1, 2, 3]))),
        ("broken", Script::FetchError),
        ("empty", Script::NoData),
        ("panics", Script::Panic),
    ];

    let report = run_ingest_with(&store, &[], date("2024-01-01"), resolver(scripts))
        .await
        .unwrap();

    assert_eq!(report.sites.len(), 5);
    assert_eq!(report.outcome("alpha"), Some(&CycleOutcome::Saved { items: 3 }));
    assert!(matches!(report.outcome("broken"), Some(CycleOutcome::Failed(_))));
    assert_eq!(report.outcome("empty"), Some(&CycleOutcome::NoData));
    assert!(matches!(report.outcome("panics"), Some(CycleOutcome::Failed(m)) if m.contains("panicked")));
    assert!(matches!(report.outcome("unknown"), Some(CycleOutcome::Skipped(_))));
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 3);

    // One log row per attempted site; the skipped one leaves none
    let logs = store.fetch_logs().recent(10).await.unwrap();
    assert_eq!(logs.len(), 4);
    assert_eq!(
        logs.iter().filter(|l| l.status == FetchStatus::Success).count(),
        1
    );
}

#[tokio::test]
async fn logged_count_matches_rows_persisted() {
    let (store, _dir) = test_store().await;
    let site = add_site(&store, "alpha").await;

    // Rank -1 is rejected by the store; the other two go through
    let scripts = vec![("alpha", Script::Groups(groups("weekly", &[1, -1, 2])))];
    let report = run_ingest_with(&store, &[], date("2024-01-01"), resolver(scripts))
        .await
        .unwrap();

    assert_eq!(report.total_items(), 2);
    let logs = store.fetch_logs().for_site(site.id, 1).await.unwrap();
    assert_eq!(logs[0].items_fetched, 2);
    assert_eq!(
        store.rankings().count(EntryFilter::site(site.id)).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn rerun_replaces_the_days_snapshot() {
    let (store, _dir) = test_store().await;
    let site = add_site(&store, "alpha").await;
    let day = date("2024-01-01");

    for ranks in [&[1, 2, 3][..], &[1, 2][..]] {
        let scripts = vec![("alpha", Script::Groups(groups("weekly", ranks)))];
        run_ingest_with(&store, &[], day, resolver(scripts))
            .await
            .unwrap();
    }

    let filter = EntryFilter::site(site.id).on(day);
    assert_eq!(store.rankings().count(filter).await.unwrap(), 2);

    // The type was registered once
    let types = store.ranking_types().get_for_site(site.id).await.unwrap();
    assert_eq!(types.len(), 1);
}

#[tokio::test]
async fn append_policy_keeps_every_run() {
    let (store, _dir) = test_store().await;
    let store = store.with_policy(SnapshotPolicy::Append);
    let site = add_site(&store, "alpha").await;
    let day = date("2024-01-01");

    for _ in 0..2 {
        let scripts = vec![("alpha", Script::Groups(groups("weekly", &[1, 2])))];
        run_ingest_with(&store, &[], day, resolver(scripts))
            .await
            .unwrap();
    }

    let filter = EntryFilter::site(site.id).on(day);
    assert_eq!(store.rankings().count(filter).await.unwrap(), 4);
}

#[tokio::test]
async fn named_sites_limit_the_pass() {
    let (store, _dir) = test_store().await;
    add_site(&store, "alpha").await;
    add_site(&store, "beta").await;

    let scripts = vec![
        ("alpha", Script::Groups(groups("weekly", &[1]))),
        ("beta", Script::Groups(groups("weekly", &[1]))),
    ];
    let only = vec!["beta".to_string(), "gamma".to_string()];
    let report = run_ingest_with(&store, &only, date("2024-01-01"), resolver(scripts))
        .await
        .unwrap();

    assert!(report.outcome("alpha").is_none());
    assert!(report.outcome("beta").unwrap().is_success());
    assert!(matches!(report.outcome("gamma"), Some(CycleOutcome::Skipped(_))));
}

#[tokio::test]
async fn ingested_data_is_served_with_date_fallback() {
    let (store, _dir) = test_store().await;
    add_site(&store, "siteA").await;

    let scripts = vec![("siteA", Script::Groups(groups("weekly", &[2, 1])))];
    run_ingest_with(&store, &[], date("2024-01-01"), resolver(scripts))
        .await
        .unwrap();

    let service = RankingService::new(store);
    let list = service
        .type_rankings("siteA", "weekly", date("2024-01-02"))
        .await
        .unwrap();

    assert_eq!(list.fetch_date, date("2024-01-01"));
    let ranks: Vec<i32> = list.books.iter().map(|b| b.rank).collect();
    assert_eq!(ranks, vec![1, 2]);
}
