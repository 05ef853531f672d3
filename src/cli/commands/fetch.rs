//! Fetch command: one ingestion pass.

use console::style;

use super::helpers::{parse_date_arg, prepare_store};
use crate::config::Settings;
use crate::services::{run_ingest, CycleOutcome};

/// Run one ingestion pass over the active sites, or the named ones.
pub async fn cmd_fetch(
    settings: &Settings,
    site_codes: &[String],
    date: Option<&str>,
) -> anyhow::Result<()> {
    let fetch_date = parse_date_arg(date)?;
    let store = prepare_store(settings).await?;

    println!(
        "{} Fetching rankings for {}",
        style("→").cyan(),
        fetch_date
    );

    let report = run_ingest(&store, &settings.adapter_options(), site_codes, fetch_date).await?;

    for site in &report.sites {
        let marker = match site.outcome {
            CycleOutcome::Saved { .. } => style("✓").green(),
            CycleOutcome::Skipped(_) => style("-").yellow(),
            _ => style("✗").red(),
        };
        println!("  {} {}: {}", marker, site.site_code, site.outcome);
    }

    println!(
        "{} {} succeeded, {} failed, {} entries saved",
        style("✓").green(),
        report.succeeded(),
        report.failed(),
        report.total_items()
    );

    Ok(())
}
