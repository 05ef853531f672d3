//! Ranking source sites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a site's rankings are retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchType {
    /// Rankings scraped from an HTML page.
    Html,
    /// Rankings decoded from a JSON endpoint.
    Api,
}

impl FetchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Api => "api",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Some(Self::Html),
            "api" => Some(Self::Api),
            _ => None,
        }
    }
}

/// A ranking source.
///
/// The `code` is the stable key used by adapters, ranking types and the
/// read API. Sites are never deleted, only deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    /// Database row ID.
    pub id: i32,
    pub code: String,
    pub name: String,
    pub url: String,
    pub fetch_type: FetchType,
    pub api_url: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
