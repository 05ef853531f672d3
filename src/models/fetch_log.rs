//! Audit records of adapter runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one adapter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Success,
    Failure,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            _ => None,
        }
    }
}

/// One append-only fetch log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchLog {
    pub id: i32,
    pub site_id: i32,
    pub fetch_time: DateTime<Utc>,
    pub status: FetchStatus,
    pub message: Option<String>,
    pub items_fetched: i64,
}
