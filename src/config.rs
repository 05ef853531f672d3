//! Configuration management for booklist.
//!
//! `Config` is what a TOML or JSON file says; `Settings` is the resolved
//! runtime view after defaults, the config file, CLI flags and environment
//! overrides have been layered.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{FetchType, SnapshotPolicy};
use crate::repository::Store;
use crate::scrapers::AdapterOptions;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "booklist.db";

/// Config file name looked up in the working and user config directories.
pub const CONFIG_FILENAME: &str = "booklist.toml";

/// Default address for the read API.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Environment variable overriding the database path.
pub const DATABASE_ENV: &str = "BOOKLIST_DATABASE";

const FANQIE_API_URL: &str =
    "https://fanqienovel.com/api/author/misc/top_book_list/v1/?limit=200&offset=0";

/// A ranking type registered when its site is seeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypePreset {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TypePreset {
    fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            url: None,
            description: None,
        }
    }
}

/// A site seeded into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitePreset {
    pub code: String,
    pub name: String,
    pub url: String,
    pub fetch_type: FetchType,
    pub api_url: Option<String>,
    pub description: Option<String>,
    pub active: bool,
    pub types: Vec<TypePreset>,
}

/// The sites booklist knows how to ingest.
pub fn default_presets() -> Vec<SitePreset> {
    vec![
        SitePreset {
            code: "ciweimao".to_string(),
            name: "刺猬猫".to_string(),
            url: "https://www.ciweimao.com/".to_string(),
            fetch_type: FetchType::Html,
            api_url: None,
            description: Some("刺猬猫小说榜单".to_string()),
            active: true,
            types: vec![
                TypePreset::new("weekly_clicks", "周点击榜"),
                TypePreset::new("monthly_votes", "月票榜"),
                TypePreset::new("new_books", "新书榜"),
            ],
        },
        SitePreset {
            code: "qidian".to_string(),
            name: "起点中文网".to_string(),
            url: "https://www.qidian.com/".to_string(),
            fetch_type: FetchType::Html,
            api_url: None,
            description: Some("起点中文网榜单".to_string()),
            active: true,
            // Discovered from the page on each run
            types: Vec::new(),
        },
        SitePreset {
            code: "fanqie".to_string(),
            name: "番茄小说".to_string(),
            url: "https://fanqienovel.com/".to_string(),
            fetch_type: FetchType::Api,
            api_url: Some(FANQIE_API_URL.to_string()),
            description: Some("番茄小说榜单".to_string()),
            active: true,
            types: vec![TypePreset::new("hot_list", "热门榜")],
        },
    ]
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename inside `data_dir`.
    pub database_filename: String,
    /// Explicit database path (overrides data_dir/database_filename if set).
    pub database_override: Option<PathBuf>,
    /// User agent config value: `impersonate`, `booklist`, or a literal string.
    pub user_agent: Option<String>,
    /// Per-attempt request timeout in seconds.
    pub request_timeout: u64,
    /// Attempts for API sources before falling back.
    pub retry_attempts: u32,
    /// Delay between attempts in seconds.
    pub retry_delay: u64,
    /// What a second run on the same date does to stored rows.
    pub snapshot_policy: SnapshotPolicy,
    /// Address the read API listens on.
    pub bind: String,
    /// Sites to seed, with any config overrides applied.
    pub sites: Vec<SitePreset>,
    /// JSON file holding the Qidian session cookie.
    pub qidian_cookie_file: Option<PathBuf>,
    /// Secondary endpoint for Fanqie once retries are exhausted.
    pub fanqie_fallback_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("booklist");

        Self {
            qidian_cookie_file: Some(data_dir.join("qidian_cookie.json")),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_override: None,
            user_agent: None,
            request_timeout: 10,
            retry_attempts: 3,
            retry_delay: 2,
            snapshot_policy: SnapshotPolicy::default(),
            bind: DEFAULT_BIND.to_string(),
            sites: default_presets(),
            fanqie_fallback_url: Some(FANQIE_API_URL.to_string()),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            qidian_cookie_file: Some(data_dir.join("qidian_cookie.json")),
            data_dir,
            ..Default::default()
        }
    }

    /// Full path to the SQLite database.
    pub fn database_path(&self) -> PathBuf {
        self.database_override
            .clone()
            .unwrap_or_else(|| self.data_dir.join(&self.database_filename))
    }

    /// Check if the database file exists yet.
    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Ensure the data directory and the database's parent exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        let db_path = self.database_path();
        let dirs = std::iter::once(self.data_dir.as_path()).chain(db_path.parent());

        for dir in dirs.filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory '{}': {}", dir.display(), e),
                )
            })?;
        }
        Ok(())
    }

    /// Options handed to every adapter.
    pub fn adapter_options(&self) -> AdapterOptions {
        AdapterOptions {
            timeout: Duration::from_secs(self.request_timeout),
            user_agent: self.user_agent.clone(),
            retry_attempts: self.retry_attempts,
            retry_delay: Duration::from_secs(self.retry_delay),
            qidian_cookie_file: self.qidian_cookie_file.clone(),
            fanqie_fallback_url: self.fanqie_fallback_url.clone(),
        }
    }

    /// Open the store described by these settings. The schema is not touched.
    pub fn create_store(&self) -> Store {
        Store::new(&self.database_path()).with_policy(self.snapshot_policy)
    }
}

/// Per-site overrides from the config file.
///
/// Entries whose code matches a built-in preset change only the fields they
/// set. Unknown codes add a new site and must carry at least a name and URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_type: Option<FetchType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Replaces the preset type list when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypePreset>,
}

impl SiteConfig {
    fn merge_into(&self, preset: &mut SitePreset) {
        if let Some(ref name) = self.name {
            preset.name = name.clone();
        }
        if let Some(ref url) = self.url {
            preset.url = url.clone();
        }
        if let Some(fetch_type) = self.fetch_type {
            preset.fetch_type = fetch_type;
        }
        if let Some(ref api_url) = self.api_url {
            preset.api_url = Some(api_url.clone()).filter(|u| !u.is_empty());
        }
        if let Some(ref description) = self.description {
            preset.description = Some(description.clone());
        }
        if let Some(active) = self.active {
            preset.active = active;
        }
        if !self.types.is_empty() {
            preset.types = self.types.clone();
        }
    }

    fn to_preset(&self) -> Option<SitePreset> {
        Some(SitePreset {
            code: self.code.clone(),
            name: self.name.clone()?,
            url: self.url.clone()?,
            fetch_type: self.fetch_type.unwrap_or(FetchType::Html),
            api_url: self.api_url.clone().filter(|u| !u.is_empty()),
            description: self.description.clone(),
            active: self.active.unwrap_or(true),
            types: self.types.clone(),
        })
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename, or a path to the database file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// User agent config value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_attempts: Option<u32>,
    /// Delay between attempts in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_policy: Option<SnapshotPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qidian_cookie_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fanqie_fallback_url: Option<String>,
    /// Site overrides and additions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sites: Vec<SiteConfig>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover and load a config file from the standard locations.
    ///
    /// Looks for `./booklist.toml`, then `<config dir>/booklist/booklist.toml`.
    /// A file that fails to parse is reported and ignored.
    pub async fn load() -> Self {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from_path(&path).await {
                Ok(config) => {
                    tracing::debug!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Ignoring config {}: {}", path.display(), e);
                }
            }
        }
        Self::default()
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILENAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("booklist").join(CONFIG_FILENAME));
        }
        paths
    }

    /// Load configuration from a specific file path.
    /// Parses TOML or JSON based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

        let mut config: Config = match ext {
            "json" => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
            _ => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved against `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
            settings.qidian_cookie_file = Some(settings.data_dir.join("qidian_cookie.json"));
        }
        if let Some(ref database) = self.database {
            if Path::new(database).components().count() > 1 || database.starts_with('~') {
                settings.database_override = Some(self.resolve_path(database, base_dir));
            } else {
                settings.database_filename = database.clone();
            }
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(attempts) = self.retry_attempts {
            settings.retry_attempts = attempts;
        }
        if let Some(delay) = self.retry_delay {
            settings.retry_delay = delay;
        }
        if let Some(policy) = self.snapshot_policy {
            settings.snapshot_policy = policy;
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(ref cookie) = self.qidian_cookie_file {
            settings.qidian_cookie_file = Some(self.resolve_path(cookie, base_dir));
        }
        if let Some(ref url) = self.fanqie_fallback_url {
            settings.fanqie_fallback_url = Some(url.clone()).filter(|u| !u.is_empty());
        }

        for site in &self.sites {
            match settings.sites.iter_mut().find(|p| p.code == site.code) {
                Some(preset) => site.merge_into(preset),
                None => match site.to_preset() {
                    Some(preset) => settings.sites.push(preset),
                    None => tracing::warn!(
                        site = %site.code,
                        "Site config needs a name and url, ignoring"
                    ),
                },
            }
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory override (--data-dir flag).
    pub data_dir: Option<PathBuf>,
}

/// Load settings with explicit options.
///
/// Precedence, lowest first: defaults, config file, `--data-dir`,
/// `BOOKLIST_DATABASE`. An explicit `--config` that cannot be read is an error.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), String> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = config.base_dir().unwrap_or_else(|| cwd.clone());

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(ref data_dir) = options.data_dir {
        let data_dir = if data_dir.is_absolute() {
            data_dir.clone()
        } else {
            cwd.join(data_dir)
        };
        if config.qidian_cookie_file.is_none() {
            settings.qidian_cookie_file = Some(data_dir.join("qidian_cookie.json"));
        }
        settings.data_dir = data_dir;
    }

    // BOOKLIST_DATABASE takes highest precedence
    if let Some(database) = std::env::var(DATABASE_ENV).ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using {} from environment: {}", DATABASE_ENV, database);
        settings.database_override = Some(config.resolve_path(&database, &cwd));
    }

    Ok((settings, config))
}
