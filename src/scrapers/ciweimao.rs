//! Ciweimao: one home page carrying three ranking sections.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::html::{attr, children, first, has_class, own_text, put, selector, text_of};
use super::normalize::{backfill_book_ids, normalize_records};
use super::{
    AdapterError, AdapterOptions, HttpClient, ProcessedRankings, RankingGroup, RawPayload,
    RawRecord, SiteAdapter,
};
use crate::models::Site;

static BOOK_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/book/(\d+)").unwrap());

static BOOK_BOX: LazyLock<Selector> = LazyLock::new(|| selector("div.title-box.icon-book"));
static CAT_BOX: LazyLock<Selector> = LazyLock::new(|| selector("div.title-box.icon-cat"));
static H3: LazyLock<Selector> = LazyLock::new(|| selector("h3"));
static H3_LINK: LazyLock<Selector> = LazyLock::new(|| selector("h3 a"));
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| selector("h3.tit a"));
static AUTHOR_LINK: LazyLock<Selector> = LazyLock::new(|| selector("p.author a"));
static NUM: LazyLock<Selector> = LazyLock::new(|| selector("p.num span"));
static COVER: LazyLock<Selector> = LazyLock::new(|| selector("a.img img"));
static DESC: LazyLock<Selector> = LazyLock::new(|| selector("p.desc"));
static TIPS: LazyLock<Selector> = LazyLock::new(|| selector("p.tips"));

/// The sections read from the home page: (type code, heading).
pub const SECTIONS: &[(&str, &str)] = &[
    ("weekly_clicks", "周点击榜"),
    ("monthly_votes", "月票榜"),
    ("new_books", "新书榜"),
];

pub struct CiweimaoAdapter {
    site: Site,
    client: HttpClient,
}

impl CiweimaoAdapter {
    pub fn new(site: Site, options: &AdapterOptions) -> Result<Self, AdapterError> {
        let client = HttpClient::new(&site.code, options.timeout, options.user_agent.as_deref())?;
        Ok(Self { site, client })
    }
}

#[async_trait]
impl SiteAdapter for CiweimaoAdapter {
    fn site(&self) -> &Site {
        &self.site
    }

    async fn fetch(&self) -> Result<Option<RawPayload>, AdapterError> {
        let html = self.client.get_text(&self.site.url).await?;
        if html.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(RawPayload::Html(html)))
    }

    fn process(&self, payload: RawPayload) -> Option<ProcessedRankings> {
        let RawPayload::Html(html) = payload else {
            tracing::warn!(site = %self.site.code, "Expected an HTML page");
            return None;
        };

        let mut sections = extract_sections(&html);
        let mut groups = ProcessedRankings::new();
        for (code, name) in SECTIONS {
            let raw = sections.remove(*code).unwrap_or_default();
            let mut records = normalize_records(raw);
            backfill_book_ids(&mut records, &[&BOOK_ID]);
            groups.insert(
                code.to_string(),
                RankingGroup {
                    name: name.to_string(),
                    url: None,
                    description: Some(format!("{} {}", self.site.name, name)),
                    records,
                },
            );
        }
        Some(groups)
    }
}

/// Parse every section. A section that cannot be read comes back empty.
pub fn extract_sections(html: &str) -> BTreeMap<&'static str, Vec<RawRecord>> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let mut sections = BTreeMap::new();
    sections.insert(
        "weekly_clicks",
        section_or_empty("weekly_clicks", parse_top_list(root, "周点击榜", "clicks")),
    );
    sections.insert(
        "monthly_votes",
        section_or_empty("monthly_votes", parse_top_list(root, "月票榜", "votes")),
    );
    sections.insert(
        "new_books",
        section_or_empty("new_books", parse_new_books(root)),
    );
    sections
}

fn section_or_empty(code: &str, parsed: Option<Vec<RawRecord>>) -> Vec<RawRecord> {
    parsed.unwrap_or_else(|| {
        tracing::warn!(section = code, "Ranking section not found or malformed");
        Vec::new()
    })
}

/// Locate the `ul` that follows a title box with the given heading.
fn section_list<'a>(
    root: ElementRef<'a>,
    boxes: &Selector,
    heading: &str,
) -> Option<ElementRef<'a>> {
    let title_box = root
        .select(boxes)
        .find(|b| first(*b, &H3).is_some_and(|h| text_of(h).contains(heading)))?;
    let container = title_box.parent().and_then(ElementRef::wrap)?;
    children(container, "ul").next()
}

/// Click and vote lists: an expanded first entry followed by compact rows.
fn parse_top_list(
    root: ElementRef<'_>,
    heading: &str,
    indicator_key: &str,
) -> Option<Vec<RawRecord>> {
    let list = section_list(root, &BOOK_BOX, heading)?;
    let records = children(list, "li")
        .enumerate()
        .filter_map(|(i, item)| {
            let parsed = if has_class(item, "top1") {
                parse_top_entry(item, indicator_key)
            } else {
                parse_compact_entry(item, indicator_key)
            };
            skip_malformed(heading, i, parsed)
        })
        .collect();

    Some(records)
}

fn parse_top_entry(item: ElementRef<'_>, indicator_key: &str) -> Option<RawRecord> {
    let link = first(item, &H3_LINK)?;
    let mut record = RawRecord::new();
    record.insert("rank".to_string(), Value::from(1));
    put(&mut record, "title", Some(text_of(link)));
    put(&mut record, "url", Some(attr(link, "href")?));
    if let Some(author) = first(item, &AUTHOR_LINK) {
        put(&mut record, "author", Some(text_of(author)));
        put(&mut record, "author_url", attr(author, "href"));
    }
    put(&mut record, indicator_key, first(item, &NUM).map(text_of));
    put(&mut record, "cover_img", cover(item));
    Some(record)
}

fn parse_compact_entry(item: ElementRef<'_>, indicator_key: &str) -> Option<RawRecord> {
    let link = children(item, "a").next()?;
    let mut record = RawRecord::new();
    put(&mut record, "url", Some(attr(link, "href")?));
    put(&mut record, "title", own_text(link).pop());

    for child in link.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "i" if has_class(child, "icon-top") => {
                put(&mut record, "rank", Some(text_of(child)));
            }
            "b" => {
                let category = text_of(child);
                let category = category.trim_matches(['[', ']']).to_string();
                put(&mut record, "category", Some(category));
            }
            "span" if has_class(child, "num") => {
                put(&mut record, indicator_key, Some(text_of(child)));
            }
            _ => {}
        }
    }
    Some(record)
}

fn skip_malformed(section: &str, index: usize, parsed: Option<RawRecord>) -> Option<RawRecord> {
    if parsed.is_none() {
        tracing::warn!(section, item = index + 1, "Skipping malformed ranking item");
    }
    parsed
}

/// Lazy-loaded cover image.
fn cover(item: ElementRef<'_>) -> Option<String> {
    first(item, &COVER).and_then(|img| attr(img, "data-original"))
}

/// New books: uniform cards, ranked by position.
fn parse_new_books(root: ElementRef<'_>) -> Option<Vec<RawRecord>> {
    let list = section_list(root, &CAT_BOX, "新书榜")?;
    let records = children(list, "li")
        .enumerate()
        .filter_map(|(i, item)| skip_malformed("新书榜", i, parse_new_book(item, i + 1)))
        .collect();

    Some(records)
}

fn parse_new_book(item: ElementRef<'_>, rank: usize) -> Option<RawRecord> {
    let link = first(item, &TITLE_LINK)?;
    let mut record = RawRecord::new();
    record.insert("rank".to_string(), Value::from(rank));
    put(&mut record, "title", Some(text_of(link)));
    put(&mut record, "url", Some(attr(link, "href")?));
    if let Some(author) = first(item, &AUTHOR_LINK) {
        put(&mut record, "author", Some(text_of(author)));
        put(&mut record, "author_url", attr(author, "href"));
    }
    put(&mut record, "latest_chapter", first(item, &DESC).map(text_of));
    put(&mut record, "cover_img", cover(item));
    put(&mut record, "update_rate", first(item, &TIPS).map(text_of));
    Some(record)
}
