//! Qidian: a home page with a variable set of ranking lists.
//!
//! Lists are discovered from the page, so type codes are derived from the
//! list headings rather than fixed up front.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use url::Url;

use super::html::{attr, first, has_class, own_text, put, selector, text_of};
use super::normalize::{backfill_book_ids, normalize_records};
use super::{
    AdapterError, AdapterOptions, HttpClient, ProcessedRankings, RankingGroup, RawPayload,
    RawRecord, RawSection, SiteAdapter,
};
use crate::models::Site;

static PAGE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://www.qidian.com/").unwrap());

static BOOK_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/book/(\d+)").unwrap());
static INFO_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/info/(\d+)").unwrap());

static RANK_LISTS: LazyLock<Selector> =
    LazyLock::new(|| selector("div#rank-list-row div.rank-list"));
static LIST_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h3.wrap-title a"));
static MORE_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a.more"));
static BOOK_ITEMS: LazyLock<Selector> = LazyLock::new(|| selector("div.book-list li"));
static INFO_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("div.book-info h2 a"));
static DIGITAL: LazyLock<Selector> = LazyLock::new(|| selector("div.book-info p.digital"));
static EM: LazyLock<Selector> = LazyLock::new(|| selector("em"));
static CATEGORY: LazyLock<Selector> = LazyLock::new(|| selector("p.author a.type"));
static WRITER: LazyLock<Selector> = LazyLock::new(|| selector("p.author a.writer"));
static COVER: LazyLock<Selector> = LazyLock::new(|| selector("div.book-cover img"));
static NUM_BOX: LazyLock<Selector> = LazyLock::new(|| selector("div.num-box span"));
static NAME: LazyLock<Selector> = LazyLock::new(|| selector("div.name-box a.name"));
static TOTAL: LazyLock<Selector> = LazyLock::new(|| selector("div.name-box i.total"));
static ICON: LazyLock<Selector> = LazyLock::new(|| selector("div.name-box span.iconfont"));

/// Credential file layout: `{"cookie": "..."}`.
#[derive(Debug, Deserialize)]
struct CookieFile {
    #[serde(default)]
    cookie: String,
}

pub struct QidianAdapter {
    site: Site,
    client: HttpClient,
    cookie_file: Option<PathBuf>,
}

impl QidianAdapter {
    pub fn new(site: Site, options: &AdapterOptions) -> Result<Self, AdapterError> {
        let client = HttpClient::new(&site.code, options.timeout, options.user_agent.as_deref())?;
        Ok(Self {
            site,
            client,
            cookie_file: options.qidian_cookie_file.clone(),
        })
    }
}

#[async_trait]
impl SiteAdapter for QidianAdapter {
    fn site(&self) -> &Site {
        &self.site
    }

    async fn fetch(&self) -> Result<Option<RawPayload>, AdapterError> {
        let cookie = match &self.cookie_file {
            Some(path) => load_cookie(path).await?,
            None => None,
        };
        let client = match cookie {
            Some(cookie) => self.client.clone().with_cookie(&cookie),
            None => self.client.clone(),
        };

        let html = client.get_text(&self.site.url).await?;
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

        let mut groups = ProcessedRankings::new();
        for section in extract_lists(&html) {
            let code = type_code(&section.name);
            if code.is_empty() {
                continue;
            }
            if groups.contains_key(&code) {
                tracing::warn!(
                    site = %self.site.code,
                    type_code = %code,
                    list = %section.name,
                    "Duplicate ranking code on page, keeping the first list"
                );
                continue;
            }

            let raw = section.records.into_iter().map(use_rid_rank).collect();
            let mut records = normalize_records(raw);
            backfill_book_ids(&mut records, &[&BOOK_ID, &INFO_ID]);

            groups.insert(
                code,
                RankingGroup {
                    description: Some(format!("{} {}", self.site.name, section.name)),
                    name: section.name,
                    url: section.url,
                    records,
                },
            );
        }
        Some(groups)
    }
}

/// Derive a type code from a list heading: trim, spaces to `_`, lower-case.
pub fn type_code(name: &str) -> String {
    name.trim().replace(' ', "_").to_lowercase()
}

/// Read the cookie credential. A missing file means no cookie.
async fn load_cookie(path: &Path) -> Result<Option<String>, AdapterError> {
    let credential_error = |message: String| AdapterError::Credential {
        path: path.display().to_string(),
        message,
    };

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                path = %path.display(),
                "Cookie file not found, requesting without cookie"
            );
            return Ok(None);
        }
        Err(e) => return Err(credential_error(e.to_string())),
    };

    let file: CookieFile =
        serde_json::from_str(&content).map_err(|e| credential_error(e.to_string()))?;
    let cookie = file.cookie.trim().to_string();
    Ok((!cookie.is_empty()).then_some(cookie))
}

/// Fall back to the list item's `data-rid` when no rank was printed.
fn use_rid_rank(mut record: RawRecord) -> RawRecord {
    let rid = record.remove("data_rid");
    if !record.contains_key("rank") {
        if let Some(rid) = rid {
            record.insert("rank".to_string(), rid);
        }
    }
    record
}

/// Resolve page links, which are mostly protocol-relative, against the site root.
fn absolute(href: Option<String>) -> Option<String> {
    let href = href?;
    match PAGE_BASE.join(&href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Some(href),
    }
}

/// Extract every ranking list on the page, in page order.
pub fn extract_lists(html: &str) -> Vec<RawSection> {
    let doc = Html::parse_document(html);
    let mut sections = Vec::new();

    for list in doc.select(&RANK_LISTS) {
        if attr(list, "data-l2").is_none() {
            continue;
        }
        let Some(title) = first(list, &LIST_TITLE) else {
            continue;
        };
        let name: String = title.text().map(str::trim).collect();
        if name.is_empty() {
            continue;
        }
        let url = absolute(attr(title, "href"))
            .or_else(|| absolute(first(list, &MORE_LINK).and_then(|a| attr(a, "href"))));

        let records = list
            .select(&BOOK_ITEMS)
            .map(parse_book)
            .filter(|r| !r.is_empty())
            .collect();

        sections.push(RawSection { name, url, records });
    }

    sections
}

fn parse_book(item: ElementRef<'_>) -> RawRecord {
    let mut record = RawRecord::new();
    put(&mut record, "data_rid", attr(item, "data-rid"));

    if has_class(item, "unfold") {
        if let Some(link) = first(item, &INFO_TITLE) {
            put(&mut record, "title", Some(text_of(link)));
            put(&mut record, "url", absolute(attr(link, "href")));
            put(&mut record, "book_id", attr(link, "data-bid"));
        }
        if let Some(digital) = first(item, &DIGITAL) {
            if let Some(em) = first(digital, &EM) {
                put(&mut record, "indicator_value", Some(text_of(em)));
                put(&mut record, "indicator_unit", Some(own_text(digital).join("")));
            } else if has_class(digital, "f16") {
                put(&mut record, "special_mark", Some(text_of(digital)));
            }
        }
        if let Some(category) = first(item, &CATEGORY) {
            put(&mut record, "category", Some(text_of(category)));
            put(&mut record, "category_url", absolute(attr(category, "href")));
        }
        if let Some(writer) = first(item, &WRITER) {
            put(&mut record, "author", Some(text_of(writer)));
            put(&mut record, "author_url", absolute(attr(writer, "href")));
        }
        if let Some(img) = first(item, &COVER) {
            put(&mut record, "cover_url", absolute(attr(img, "src")));
            put(&mut record, "cover_alt", attr(img, "alt"));
        }
    } else {
        if let Some(num) = first(item, &NUM_BOX) {
            let printed = text_of(num);
            if !printed.is_empty() && printed.chars().all(|c| c.is_ascii_digit()) {
                put(&mut record, "rank", Some(printed));
            }
            put(&mut record, "rank_class", attr(num, "class"));
        }
        if let Some(link) = first(item, &NAME) {
            put(&mut record, "title", Some(text_of(link)));
            put(&mut record, "url", absolute(attr(link, "href")));
            put(&mut record, "book_id", attr(link, "data-bid"));
        }
        put(&mut record, "indicator_value", first(item, &TOTAL).map(text_of));
        put(&mut record, "icon_mark", first(item, &ICON).map(text_of));
    }

    // An item with nothing but its rid is layout filler.
    if record.len() == 1 && record.contains_key("data_rid") {
        record.clear();
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    const PAGE: &str = r#"
<html><body>
<div id="rank-list-row">
  <div class="rank-list sort-list" data-l2="2">
    <h3 class="wrap-title lang"><a href="//www.qidian.com/rank/yuepiao/"> 月票 <span>榜</span> </a></h3>
    <a class="more" href="//www.qidian.com/rank/yuepiao/">更多</a>
    <div class="book-list">
      <ul>
        <li class="unfold" data-rid="1">
          <div class="book-cover"><img src="//bookcover.qidian.com/1.jpg" alt="封面一"></div>
          <div class="book-info fl">
            <h2><a href="//book.qidian.com/info/1001/" data-bid="1001">大奉打更人</a></h2>
            <p class="digital"><em>12345</em>月票</p>
            <p class="author"><a class="type" href="//www.qidian.com/xuanhuan">玄幻</a><a class="writer" href="//my.qidian.com/author/7">卖报小郎君</a></p>
          </div>
        </li>
        <li data-rid="2">
          <div class="num-box"><span class="num2">2</span></div>
          <div class="name-box"><a class="name" href="//book.qidian.com/info/1002/">第二名</a><i class="total">9876</i></div>
        </li>
        <li data-rid="3">
          <div class="name-box"><a class="name" href="//book.qidian.com/info/1003/" data-bid="">第三名</a></div>
        </li>
      </ul>
    </div>
  </div>
  <div class="rank-list" data-l2="3">
    <h3 class="wrap-title lang"><a href="//www.qidian.com/rank/hotsales/">Hot List</a></h3>
    <div class="book-list"><ul>
      <li><div class="name-box"><a class="name" href="//book.qidian.com/info/2001/">热销一</a></div></li>
      <li><div class="name-box"><a class="name" href="//book.qidian.com/info/2002/">热销二</a></div></li>
    </ul></div>
  </div>
  <div class="rank-list">
    <h3 class="wrap-title lang"><a href="//www.qidian.com/ad/">广告</a></h3>
  </div>
</div>
</body></html>
"#;

    fn site() -> Site {
        Site {
            id: 2,
            code: "qidian".to_string(),
            name: "起点中文网".to_string(),
            url: "https://www.qidian.com/".to_string(),
            fetch_type: crate::models::FetchType::Html,
            api_url: None,
            description: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn adapter() -> QidianAdapter {
        QidianAdapter::new(site(), &AdapterOptions::default()).unwrap()
    }

    #[test]
    fn test_type_code_derivation() {
        assert_eq!(type_code(" 月票 榜 "), "月票_榜");
        assert_eq!(type_code("Hot List"), "hot_list");
        assert_eq!(type_code("   "), "");
    }

    #[test]
    fn test_lists_discovered_from_page() {
        let groups = adapter().process(RawPayload::Html(PAGE.to_string())).unwrap();
        let codes: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(codes, vec!["hot_list", "月票榜"]);

        let monthly = &groups["月票榜"];
        assert_eq!(monthly.name, "月票榜");
        assert_eq!(monthly.url.as_deref(), Some("https://www.qidian.com/rank/yuepiao/"));
        assert_eq!(monthly.description.as_deref(), Some("起点中文网 月票榜"));
        assert_eq!(monthly.records.len(), 3);

        let top = &monthly.records[0];
        assert_eq!(top.rank, 1);
        assert_eq!(top.title, "大奉打更人");
        assert_eq!(top.book_id.as_deref(), Some("1001"));
        assert_eq!(top.indicator_value.as_deref(), Some("12345"));
        assert_eq!(top.indicator_unit.as_deref(), Some("月票"));
        assert_eq!(top.category.as_deref(), Some("玄幻"));
        assert_eq!(top.author.as_deref(), Some("卖报小郎君"));
        assert_eq!(top.cover_url.as_deref(), Some("https://bookcover.qidian.com/1.jpg"));
        assert!(!top.extra.contains_key("data_rid"));

        let second = &monthly.records[1];
        assert_eq!(second.rank, 2);
        assert_eq!(second.indicator_value.as_deref(), Some("9876"));
        // No data-bid: derived from the info URL
        assert_eq!(second.book_id.as_deref(), Some("1002"));

        // Rank from data-rid when none is printed
        assert_eq!(monthly.records[2].rank, 3);
        assert_eq!(monthly.records[2].book_id.as_deref(), Some("1003"));

        // No rid either: position
        let hot: Vec<i32> = groups["hot_list"].records.iter().map(|r| r.rank).collect();
        assert_eq!(hot, vec![1, 2]);
    }

    #[test]
    fn test_duplicate_code_keeps_first_list() {
        let duplicate = r#"<div class="rank-list" data-l2="4">
    <h3 class="wrap-title lang"><a href="//www.qidian.com/rank/other/">hot list</a></h3>
    <div class="book-list"><ul>
      <li><div class="name-box"><a class="name" href="//book.qidian.com/info/3001/">别的榜</a></div></li>
    </ul></div>
  </div>
  <div class="rank-list">
    <h3 class="wrap-title lang"><a href="//www.qidian.com/ad/">"#;
        let page = PAGE.replacen(
            r#"<div class="rank-list">
    <h3 class="wrap-title lang"><a href="//www.qidian.com/ad/">"#,
            duplicate,
            1,
        );

        let groups = adapter().process(RawPayload::Html(page)).unwrap();
        let hot = &groups["hot_list"];
        assert_eq!(hot.name, "Hot List");
        let titles: Vec<&str> = hot.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["热销一", "热销二"]);
    }

    #[test]
    fn test_page_without_lists_is_empty() {
        let groups = adapter()
            .process(RawPayload::Html("<html></html>".to_string()))
            .unwrap();
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_cookie_file() {
        let dir = tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert_eq!(load_cookie(&missing).await.unwrap(), None);

        let good = dir.path().join("cookie.json");
        std::fs::write(&good, r#"{"cookie": " a=1; b=2 "}"#).unwrap();
        assert_eq!(load_cookie(&good).await.unwrap().as_deref(), Some("a=1; b=2"));

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, r#"{}"#).unwrap();
        assert_eq!(load_cookie(&empty).await.unwrap(), None);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "cookie=").unwrap();
        assert!(matches!(
            load_cookie(&bad).await,
            Err(AdapterError::Credential { .. })
        ));
    }
}
