//! Service banner, health check and site listing.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;

use super::super::error::ApiError;
use super::super::AppState;
use crate::models::Site;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Service banner listing the available endpoints.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "booklist ranking API",
        "endpoints": [
            "/api/sites",
            "/api/rankings",
            "/api/rankings/{site_code}",
            "/api/rankings/{site_code}/{type_code}",
        ],
    }))
}

/// A site as exposed by the API, keyed like its table columns.
#[derive(Debug, Serialize)]
pub struct SiteInfo {
    pub site_id: i32,
    pub site_name: String,
    pub site_url: String,
    pub site_code: String,
    pub fetch_type: &'static str,
    pub api_url: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Site> for SiteInfo {
    fn from(site: Site) -> Self {
        Self {
            site_id: site.id,
            site_name: site.name,
            site_url: site.url,
            site_code: site.code,
            fetch_type: site.fetch_type.as_str(),
            api_url: site.api_url,
            description: site.description,
            active: site.active,
            created_at: site.created_at.to_rfc3339(),
            updated_at: site.updated_at.to_rfc3339(),
        }
    }
}

/// Active sites.
pub async fn api_sites(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let sites: Vec<SiteInfo> = state
        .rankings
        .sites()
        .await?
        .into_iter()
        .map(SiteInfo::from)
        .collect();

    Ok(Json(json!({ "sites": sites })))
}
