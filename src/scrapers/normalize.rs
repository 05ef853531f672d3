//! Mapping of loosely-typed source records onto [`BookRecord`].

use regex::Regex;
use serde_json::Value;

use crate::models::{BookRecord, ExtraFields};

/// A loosely-typed field bag as produced by a source extractor.
pub type RawRecord = serde_json::Map<String, Value>;

const URL_KEYS: &[&str] = &["url", "book_url"];
const INDICATOR_KEYS: &[&str] = &["indicator_value", "clicks", "votes", "rank_score"];
const COVER_KEYS: &[&str] = &["cover_url", "cover_img", "thumb_url"];

/// Normalize a list of raw records. Records without a usable rank get their
/// 1-based position in the list.
pub fn normalize_records(records: Vec<RawRecord>) -> Vec<BookRecord> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, raw)| normalize(raw, i + 1))
        .collect()
}

/// Normalize one raw record.
pub fn normalize(mut raw: RawRecord, position: usize) -> BookRecord {
    let fallback_rank = i32::try_from(position).unwrap_or(i32::MAX);
    let rank = raw
        .remove("rank")
        .and_then(|v| parse_int(&v))
        .unwrap_or(fallback_rank);

    let title = take_text(&mut raw, &["title"]).unwrap_or_default();
    let book_id = take_text(&mut raw, &["book_id"]);
    let author = take_text(&mut raw, &["author"]);
    let book_url = take_text(&mut raw, URL_KEYS);
    let category = take_text(&mut raw, &["category"]);
    let indicator_value = take_text(&mut raw, INDICATOR_KEYS);
    let indicator_unit = take_text(&mut raw, &["indicator_unit"]);
    let cover_url = take_text(&mut raw, COVER_KEYS);
    let latest_chapter = take_text(&mut raw, &["latest_chapter"]);
    let creation_status = raw.remove("creation_status").and_then(|v| parse_int(&v));

    let extra: ExtraFields = raw.into_iter().collect();

    BookRecord {
        rank,
        title,
        author,
        book_id,
        book_url,
        category,
        indicator_value,
        indicator_unit,
        cover_url,
        latest_chapter,
        creation_status,
        extra,
    }
}

/// Derive missing book IDs from the book URL. Best-effort.
pub fn backfill_book_ids(records: &mut [BookRecord], patterns: &[&Regex]) {
    for record in records.iter_mut().filter(|r| r.book_id.is_none()) {
        let Some(url) = record.book_url.as_deref() else {
            continue;
        };
        record.book_id = patterns
            .iter()
            .find_map(|re| re.captures(url))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
    }
}

/// Remove every alias key and return the first non-empty value.
fn take_text(raw: &mut RawRecord, keys: &[&str]) -> Option<String> {
    let mut found = None;
    for key in keys {
        if let Some(value) = raw.remove(*key) {
            if found.is_none() {
                found = as_text(&value);
            }
        }
    }
    found
}

/// Stringify a scalar. Empty strings and null are absent.
fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn parse_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}
