//! Initialize command.

use console::style;

use super::helpers::prepare_store;
use crate::config::Settings;

/// Create the database and register the configured sites.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let store = prepare_store(settings).await?;

    for site in store.sites().get_all().await? {
        let marker = if site.active {
            style("✓").green()
        } else {
            style("-").dim()
        };
        println!("  {} {} ({})", marker, site.name, site.code);
    }

    println!(
        "{} Initialized booklist database at {}",
        style("✓").green(),
        settings.database_path().display()
    );

    Ok(())
}
