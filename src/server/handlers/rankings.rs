//! Ranking read handlers.
//!
//! Each accepts an optional `date=YYYY-MM-DD`; without it the server's local
//! date is used. The response's `fetch_date` is the date actually served,
//! which differs from the request when it fell back to older data.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use super::super::error::ApiError;
use super::super::AppState;

/// Date selection parameters.
#[derive(Debug, Deserialize)]
pub struct DateParams {
    pub date: Option<String>,
}

impl DateParams {
    fn resolve(&self) -> Result<NaiveDate, ApiError> {
        match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                ApiError::bad_request(format!("invalid date '{}', expected YYYY-MM-DD", raw))
            }),
            None => Ok(Local::now().date_naive()),
        }
    }
}

/// Every site's rankings, reduced to rank and book id.
pub async fn api_overview(
    State(state): State<AppState>,
    Query(params): Query<DateParams>,
) -> Result<impl IntoResponse, ApiError> {
    let date = params.resolve()?;
    Ok(Json(state.rankings.overview(date).await?))
}

/// One site's rankings grouped by type.
pub async fn api_site_rankings(
    State(state): State<AppState>,
    Path(site_code): Path<String>,
    Query(params): Query<DateParams>,
) -> Result<impl IntoResponse, ApiError> {
    let date = params.resolve()?;
    Ok(Json(state.rankings.site_rankings(&site_code, date).await?))
}

/// One ranking list.
pub async fn api_type_rankings(
    State(state): State<AppState>,
    Path((site_code, type_code)): Path<(String, String)>,
    Query(params): Query<DateParams>,
) -> Result<impl IntoResponse, ApiError> {
    let date = params.resolve()?;
    Ok(Json(
        state
            .rankings
            .type_rankings(&site_code, &type_code, date)
            .await?,
    ))
}
