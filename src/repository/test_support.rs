//! Shared fixtures for repository tests.

use tempfile::{tempdir, TempDir};

use super::site::SiteFields;
use super::Store;
use crate::models::FetchType;

/// Fresh store with schema, backed by a temporary directory.
pub async fn test_store() -> (Store, TempDir) {
    let dir = tempdir().unwrap();
    let store = Store::new(&dir.path().join("test.db"));
    store.init_schema().await.unwrap();
    (store, dir)
}

/// Insert a site whose name equals its code.
pub async fn seed_site(store: &Store, code: &str) -> i32 {
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
        .unwrap()
}
