//! Shared HTTP client for site adapters.

mod response;
mod user_agent;

pub use response::HttpResponse;
pub use user_agent::{resolve_user_agent, IMPERSONATE_USER_AGENTS, USER_AGENT};

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE, REFERER};
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::AdapterError;

/// HTTP client carrying per-site headers.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    site: String,
    headers: HeaderMap,
}

impl HttpClient {
    /// Create a client with the configured user agent and per-request timeout.
    /// - None / "impersonate": real browser user agent
    /// - "booklist": self-identifying agent
    /// - other: custom user agent string
    pub fn new(
        site: &str,
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, AdapterError> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            site: site.to_string(),
            headers: HeaderMap::new(),
        })
    }

    /// Create a client that sends no custom headers at all.
    pub fn plain(site: &str, timeout: Duration) -> Result<Self, AdapterError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            site: site.to_string(),
            headers: HeaderMap::new(),
        })
    }

    /// Set the Referer header for requests.
    pub fn with_referer(self, referer: &str) -> Self {
        self.with_header(REFERER, referer)
    }

    /// Set the Accept header for requests.
    pub fn with_accept(self, accept: &str) -> Self {
        self.with_header(ACCEPT, accept)
    }

    /// Send a raw Cookie header with every request.
    pub fn with_cookie(self, cookie: &str) -> Self {
        self.with_header(COOKIE, cookie)
    }

    fn with_header(mut self, name: reqwest::header::HeaderName, value: &str) -> Self {
        match HeaderValue::from_str(value) {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(_) => {
                tracing::warn!(site = %self.site, header = name.as_str(), "Ignoring invalid header value");
            }
        }
        self
    }

    /// Make a GET request.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await?;

        tracing::debug!(
            site = %self.site,
            url,
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "GET"
        );

        Ok(HttpResponse::from_response(response))
    }

    /// Get page content as text. Non-success status is an error.
    pub async fn get_text(&self, url: &str) -> Result<String, AdapterError> {
        let response = self.get(url).await?;
        if !response.is_success() {
            return Err(AdapterError::Status {
                status: response.status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Get and decode a JSON body. Non-success status is an error.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, AdapterError> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::get;
    use axum::Router;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_headers_are_sent() {
        let app = Router::new().route(
            "/echo",
            get(|headers: AxumHeaders| async move {
                let value = |name: &str| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string()
                };
                format!("{}|{}|{}", value("referer"), value("cookie"), value("accept"))
            }),
        );
        let base = spawn(app).await;

        let client = HttpClient::new("test", Duration::from_secs(5), Some("booklist"))
            .unwrap()
            .with_referer("https://example.com/")
            .with_cookie("a=1; b=2")
            .with_accept("application/json");
        let body = client.get_text(&format!("{}/echo", base)).await.unwrap();
        assert_eq!(body, "https://example.com/|a=1; b=2|application/json");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let app = Router::new().route("/gone", get(|| async { StatusCode::GONE }));
        let base = spawn(app).await;

        let client = HttpClient::plain("test", Duration::from_secs(5)).unwrap();
        let err = client
            .get_text(&format!("{}/gone", base))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Status { status: 410, .. }));
    }

    #[tokio::test]
    async fn test_get_json_decode_error() {
        let app = Router::new().route("/bad", get(|| async { "{oops" }));
        let base = spawn(app).await;

        let client = HttpClient::plain("test", Duration::from_secs(5)).unwrap();
        let err = client
            .get_json::<serde_json::Value>(&format!("{}/bad", base))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Decode(_)));
    }
}
