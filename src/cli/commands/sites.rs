//! Site listing command.

use console::style;

use super::helpers::{open_store, truncate};
use crate::config::Settings;
use crate::scrapers::is_supported;

/// List configured sites and their ranking types.
pub async fn cmd_sites(settings: &Settings) -> anyhow::Result<()> {
    let Some(store) = open_store(settings) else {
        return Ok(());
    };
    let sites = store.sites().get_all().await?;

    if sites.is_empty() {
        println!(
            "{} No sites configured. Run 'booklist init' first.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Ranking Sites").bold());
    println!("{}", "-".repeat(70));
    println!("{:<12} {:<20} {:<6} {:<8} URL", "Code", "Name", "Type", "Status");
    println!("{}", "-".repeat(70));

    for site in sites {
        let status = match (site.active, is_supported(&site.code)) {
            (false, _) => style("inactive").dim(),
            (true, true) => style("active").green(),
            (true, false) => style("no adapter").yellow(),
        };
        println!(
            "{:<12} {:<20} {:<6} {:<8} {}",
            site.code,
            truncate(&site.name, 19),
            site.fetch_type.as_str(),
            status,
            site.url
        );

        for ty in store.ranking_types().get_for_site(site.id).await? {
            println!("    {} {} ({})", style("·").dim(), ty.name, ty.code);
        }
    }

    Ok(())
}
