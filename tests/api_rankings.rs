//! Read API over a store populated through the public repository API.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use booklist::models::BookRecord;
use booklist::repository::ranking::insert_entry;
use booklist::repository::{Store, TypeFields};
use booklist::server::{create_router, AppState};

use common::{add_site, date, test_store};

async fn seeded_app() -> (axum::Router, tempfile::TempDir) {
    let (store, dir) = test_store().await;
    let site = add_site(&store, "siteA").await;
    add_site(&store, "siteB").await;

    let weekly = store
        .ranking_types()
        .resolve_or_create(
            site.id,
            "weekly",
            TypeFields {
                name: "周点击榜",
                url: None,
                description: None,
            },
        )
        .await
        .unwrap();

    let mut conn = store.pool().get().await.unwrap();
    for rank in [1, 2] {
        let mut book = BookRecord::new(rank, format!("书 {}", rank));
        book.book_id = Some(format!("{}", 100 + rank));
        book.author = Some("作者".to_string());
        insert_entry(&mut conn, site.id, weekly, date("2024-01-01"), &book).await;
    }

    (create_router(AppState::new(store)), dir)
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn requested_date_without_data_serves_latest() {
    let (app, _dir) = seeded_app().await;

    let (status, json) = get_json(app, "/api/rankings/siteA/weekly?date=2024-01-02").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["fetch_date"], "2024-01-01");
    assert_eq!(json["site_code"], "siteA");
    assert_eq!(json["type_name"], "周点击榜");
    assert_eq!(json["books"].as_array().unwrap().len(), 2);
    assert_eq!(json["books"][0]["rank"], 1);
    assert_eq!(json["books"][0]["author"], "作者");
    assert_eq!(json["books"][0]["extra_data"], Value::Null);
}

#[tokio::test]
async fn site_with_no_data_is_empty_success() {
    let (app, _dir) = seeded_app().await;

    let (status, json) = get_json(app, "/api/rankings/siteB?date=2024-01-05").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["fetch_date"], "2024-01-05");
    assert_eq!(json["rankings"], json!([]));
}

#[tokio::test]
async fn unknown_site_is_not_found() {
    let (app, _dir) = seeded_app().await;

    let (status, json) = get_json(app, "/api/rankings/nosuchsite").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn malformed_date_is_bad_request() {
    let (app, _dir) = seeded_app().await;

    let (status, _) = get_json(app, "/api/rankings?date=2024-13-45").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sites_lists_active_only() {
    let (app, _dir) = seeded_app().await;

    let (status, json) = get_json(app, "/api/sites").await;

    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = json["sites"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["site_code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["siteA", "siteB"]);
}

#[tokio::test]
async fn unreadable_store_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(&dir.path().join("missing").join("booklist.db"));
    let app = create_router(AppState::new(store));

    for uri in ["/api/sites", "/api/rankings", "/api/rankings/siteA/weekly"] {
        let (status, json) = get_json(app.clone(), uri).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
        assert_eq!(json, json!({ "detail": "failed to load ranking data" }));
    }
}
