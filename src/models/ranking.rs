//! Ranking types and dated ranking entries.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Source-specific fields that have no canonical column.
///
/// Stored verbatim as a JSON object string; no schema is inferred from it.
pub type ExtraFields = BTreeMap<String, serde_json::Value>;

/// A named sub-ranking within a site (e.g. weekly clicks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingType {
    pub id: i32,
    pub site_id: i32,
    /// Stable code, unique per site.
    pub code: String,
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
    pub active: bool,
}

/// One book's normalized position in a ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Position as reported by the source. Ties are kept.
    pub rank: i32,
    pub title: String,
    pub author: Option<String>,
    pub book_id: Option<String>,
    pub book_url: Option<String>,
    pub category: Option<String>,
    /// Click count, vote count, score... stored as given.
    pub indicator_value: Option<String>,
    pub indicator_unit: Option<String>,
    pub cover_url: Option<String>,
    pub latest_chapter: Option<String>,
    pub creation_status: Option<i32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
}

impl BookRecord {
    /// Create a record with only the required fields set.
    pub fn new(rank: i32, title: impl Into<String>) -> Self {
        Self {
            rank,
            title: title.into(),
            ..Default::default()
        }
    }

    /// Serialize the extension bag for storage. Empty bags are stored as NULL.
    pub fn extra_json(&self) -> Option<String> {
        encode_extra(&self.extra)
    }
}

/// What a re-run for an already stored (site, type, date) does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Drop the existing rows for that day before inserting the new ones.
    #[default]
    Replace,
    /// Keep every run's rows side by side.
    Append,
}

impl SnapshotPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Append => "append",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Some(Self::Replace),
            "append" => Some(Self::Append),
            _ => None,
        }
    }
}

/// A stored ranking entry for one fetch date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEntry {
    pub id: i32,
    pub site_id: i32,
    pub ranking_type_id: i32,
    pub fetch_date: NaiveDate,
    pub record: BookRecord,
}

/// Encode an extension bag as a JSON object string.
pub fn encode_extra(extra: &ExtraFields) -> Option<String> {
    if extra.is_empty() {
        return None;
    }
    serde_json::to_string(extra).ok()
}

/// Decode a stored extension bag. Malformed or non-object JSON decodes to `None`.
pub fn decode_extra(raw: Option<&str>) -> Option<ExtraFields> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    serde_json::from_str::<ExtraFields>(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extra_round_trip() {
        let mut extra = ExtraFields::new();
        extra.insert("author_url".to_string(), json!("https://example.com/a/1"));
        extra.insert("update_rate".to_string(), json!({"days": 3, "tags": ["hot", "new"]}));
        extra.insert("special_mark".to_string(), json!(null));

        let encoded = encode_extra(&extra).unwrap();
        let decoded = decode_extra(Some(&encoded)).unwrap();
        assert_eq!(decoded, extra);
    }

    #[test]
    fn test_extra_empty_is_null() {
        assert!(encode_extra(&ExtraFields::new()).is_none());
        assert!(decode_extra(None).is_none());
        assert!(decode_extra(Some("")).is_none());
    }

    #[test]
    fn test_extra_malformed_is_absent() {
        assert!(decode_extra(Some("{not json")).is_none());
        assert!(decode_extra(Some("[1, 2, 3]")).is_none());
        assert!(decode_extra(Some("\"just a string\"")).is_none());
    }
}
