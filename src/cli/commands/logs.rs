//! Fetch log command.

use std::collections::HashMap;

use console::style;

use super::helpers::{open_store, truncate};
use crate::config::Settings;
use crate::models::FetchStatus;

/// Show recent fetch logs, newest first.
pub async fn cmd_logs(settings: &Settings, site: Option<&str>, limit: i64) -> anyhow::Result<()> {
    let Some(store) = open_store(settings) else {
        return Ok(());
    };

    let sites: HashMap<i32, String> = store
        .sites()
        .get_all()
        .await?
        .into_iter()
        .map(|s| (s.id, s.code))
        .collect();

    let logs = match site {
        Some(code) => match store.sites().get_by_code(code).await? {
            Some(site) => store.fetch_logs().for_site(site.id, limit).await?,
            None => {
                println!("{} Site '{}' not found", style("✗").red(), code);
                return Ok(());
            }
        },
        None => store.fetch_logs().recent(limit).await?,
    };

    if logs.is_empty() {
        println!("{} No fetch logs yet", style("!").yellow());
        return Ok(());
    }

    println!("{:<17} {:<12} {:<8} {:>6}  Message", "Time", "Site", "Status", "Items");
    println!("{}", "-".repeat(70));

    for log in logs {
        let status = match log.status {
            FetchStatus::Success => style(log.status.as_str()).green(),
            FetchStatus::Failure => style(log.status.as_str()).red(),
        };
        println!(
            "{:<17} {:<12} {:<8} {:>6}  {}",
            log.fetch_time.format("%Y-%m-%d %H:%M"),
            sites.get(&log.site_id).map(String::as_str).unwrap_or("?"),
            status,
            log.items_fetched,
            truncate(log.message.as_deref().unwrap_or(""), 40)
        );
    }

    Ok(())
}
