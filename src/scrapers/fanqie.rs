//! Fanqie: a JSON ranking endpoint that fails intermittently.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::normalize::normalize_records;
use super::{
    AdapterError, AdapterOptions, HttpClient, ProcessedRankings, RankingGroup, RawPayload,
    RawRecord, SiteAdapter,
};
use crate::models::Site;

pub const HOT_LIST_CODE: &str = "hot_list";
pub const HOT_LIST_NAME: &str = "热门榜";

/// Response shapes seen from the endpoint, tried in declaration order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FanqiePayload {
    Wrapped { data: BookList },
    Bare(BookList),
    List(Vec<RawRecord>),
}

#[derive(Debug, Deserialize)]
struct BookList {
    book_list: Vec<RawRecord>,
}

impl FanqiePayload {
    fn into_books(self) -> Vec<RawRecord> {
        match self {
            Self::Wrapped { data } => data.book_list,
            Self::Bare(list) => list.book_list,
            Self::List(books) => books,
        }
    }
}

pub struct FanqieAdapter {
    site: Site,
    client: HttpClient,
    timeout: Duration,
    attempts: u32,
    retry_delay: Duration,
    fallback_url: Option<String>,
}

impl FanqieAdapter {
    pub fn new(site: Site, options: &AdapterOptions) -> Result<Self, AdapterError> {
        let client = HttpClient::new(&site.code, options.timeout, options.user_agent.as_deref())?
            .with_referer("https://fanqienovel.com/")
            .with_accept("application/json, text/plain, */*");
        Ok(Self {
            site,
            client,
            timeout: options.timeout,
            attempts: options.retry_attempts.max(1),
            retry_delay: options.retry_delay,
            fallback_url: options.fanqie_fallback_url.clone(),
        })
    }

    fn endpoint(&self) -> &str {
        self.site.api_url.as_deref().unwrap_or(&self.site.url)
    }

    /// Last resort after the retry budget: one request without custom headers.
    async fn fetch_fallback(&self) -> Option<Value> {
        let url = self.fallback_url.as_deref()?;
        tracing::info!(site = %self.site.code, url, "Trying fallback endpoint");

        let result = match HttpClient::plain(&self.site.code, self.timeout) {
            Ok(client) => client.get_json::<Value>(url).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(site = %self.site.code, "Fallback request failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl SiteAdapter for FanqieAdapter {
    fn site(&self) -> &Site {
        &self.site
    }

    async fn fetch(&self) -> Result<Option<RawPayload>, AdapterError> {
        let url = self.endpoint();

        for attempt in 1..=self.attempts {
            match self.client.get_json::<Value>(url).await {
                Ok(value) => return Ok(Some(RawPayload::Json(value))),
                Err(e) => {
                    tracing::warn!(
                        site = %self.site.code,
                        attempt,
                        attempts = self.attempts,
                        "API request failed: {}",
                        e
                    );
                    if !e.is_transient() {
                        break;
                    }
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Ok(self.fetch_fallback().await.map(RawPayload::Json))
    }

    fn process(&self, payload: RawPayload) -> Option<ProcessedRankings> {
        let RawPayload::Json(value) = payload else {
            tracing::warn!(site = %self.site.code, "Expected a JSON payload");
            return None;
        };

        let books = match serde_json::from_value::<FanqiePayload>(value) {
            Ok(payload) => payload.into_books(),
            Err(_) => {
                tracing::warn!(
                    site = %self.site.code,
                    "Unrecognised response shape, saving an empty list"
                );
                Vec::new()
            }
        };

        let raw = books.into_iter().enumerate().map(|(i, book)| book_record(book, i + 1));
        let records = normalize_records(raw.collect());
        tracing::info!(site = %self.site.code, count = records.len(), "Processed hot list");

        let mut groups = ProcessedRankings::new();
        groups.insert(
            HOT_LIST_CODE.to_string(),
            RankingGroup {
                name: HOT_LIST_NAME.to_string(),
                url: None,
                description: Some(format!("{} {}", self.site.name, HOT_LIST_NAME)),
                records,
            },
        );
        Some(groups)
    }
}

/// Keep the fields worth storing. Rank is the list position.
fn book_record(mut book: RawRecord, position: usize) -> RawRecord {
    let mut record = RawRecord::new();
    record.insert("rank".to_string(), Value::from(position));

    let title = book.remove("book_name").or_else(|| book.remove("title"));
    let cover = book.remove("thumb_url").or_else(|| book.remove("cover_url"));
    let fields = [
        ("book_id", book.remove("book_id")),
        ("title", title),
        ("author", book.remove("author")),
        ("category", book.remove("category")),
        ("creation_status", book.remove("creation_status")),
        ("cover_url", cover),
        ("rank_score", book.remove("rank_score")),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            record.insert(key.to_string(), value);
        }
    }
    record
}
