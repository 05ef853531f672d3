//! Shared helper functions for CLI commands.

use anyhow::Context;
use chrono::{Local, NaiveDate};
use console::style;

use crate::config::Settings;
use crate::repository::Store;
use crate::services::seed_sites;

/// Create directories and schema, then register the configured sites.
pub async fn prepare_store(settings: &Settings) -> anyhow::Result<Store> {
    settings.ensure_directories()?;

    let store = settings.create_store();
    store
        .init_schema()
        .await
        .context("Failed to initialize database schema")?;
    seed_sites(&store, &settings.sites)
        .await
        .context("Failed to register configured sites")?;

    Ok(store)
}

/// Open an existing database for reading. Prints a hint and returns `None`
/// when it has not been created yet.
pub fn open_store(settings: &Settings) -> Option<Store> {
    if !settings.database_exists() {
        println!(
            "{} No database at {}. Run 'booklist init' first.",
            style("!").yellow(),
            settings.database_path().display()
        );
        return None;
    }
    Some(settings.create_store())
}

/// Parse an optional `YYYY-MM-DD` argument, defaulting to today.
pub fn parse_date_arg(date: Option<&str>) -> anyhow::Result<NaiveDate> {
    match date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw)),
        None => Ok(Local::now().date_naive()),
    }
}

/// Truncate to `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
