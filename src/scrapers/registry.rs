//! Static mapping from site code to adapter constructor.

use std::path::PathBuf;
use std::time::Duration;

use super::ciweimao::CiweimaoAdapter;
use super::fanqie::FanqieAdapter;
use super::qidian::QidianAdapter;
use super::{AdapterError, SiteAdapter};
use crate::models::Site;

/// Settings shared by all adapters.
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// User agent config value (see `HttpClient::new`).
    pub user_agent: Option<String>,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub qidian_cookie_file: Option<PathBuf>,
    pub fanqie_fallback_url: Option<String>,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: None,
            retry_attempts: 3,
            retry_delay: Duration::from_secs(2),
            qidian_cookie_file: None,
            fanqie_fallback_url: None,
        }
    }
}

type Constructor = fn(Site, &AdapterOptions) -> Result<Box<dyn SiteAdapter>, AdapterError>;

/// Every site code with a known adapter.
pub const ADAPTERS: &[(&str, Constructor)] = &[
    ("ciweimao", ciweimao),
    ("qidian", qidian),
    ("fanqie", fanqie),
];

fn ciweimao(site: Site, opts: &AdapterOptions) -> Result<Box<dyn SiteAdapter>, AdapterError> {
    Ok(Box::new(CiweimaoAdapter::new(site, opts)?))
}

fn qidian(site: Site, opts: &AdapterOptions) -> Result<Box<dyn SiteAdapter>, AdapterError> {
    Ok(Box::new(QidianAdapter::new(site, opts)?))
}

fn fanqie(site: Site, opts: &AdapterOptions) -> Result<Box<dyn SiteAdapter>, AdapterError> {
    Ok(Box::new(FanqieAdapter::new(site, opts)?))
}

/// Build the adapter for a site.
pub fn adapter_for(
    site: Site,
    options: &AdapterOptions,
) -> Result<Box<dyn SiteAdapter>, AdapterError> {
    let constructor = ADAPTERS
        .iter()
        .find(|(code, _)| *code == site.code)
        .map(|(_, constructor)| *constructor)
        .ok_or_else(|| AdapterError::UnknownSite(site.code.clone()))?;
    constructor(site, options)
}

/// Whether a site code has an adapter.
pub fn is_supported(code: &str) -> bool {
    ADAPTERS.iter().any(|(known, _)| *known == code)
}
