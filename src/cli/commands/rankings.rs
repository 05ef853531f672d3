//! Rankings command: print a query result as JSON.

use anyhow::bail;

use super::helpers::{open_store, parse_date_arg};
use crate::config::Settings;
use crate::services::RankingService;

/// Print the overview, a site's rankings, or one list.
pub async fn cmd_rankings(
    settings: &Settings,
    site_code: Option<&str>,
    type_code: Option<&str>,
    date: Option<&str>,
) -> anyhow::Result<()> {
    let date = parse_date_arg(date)?;
    let Some(store) = open_store(settings) else {
        return Ok(());
    };
    let service = RankingService::new(store);

    let json = match (site_code, type_code) {
        (None, None) => serde_json::to_string_pretty(&service.overview(date).await?)?,
        (Some(site), None) => {
            serde_json::to_string_pretty(&service.site_rankings(site, date).await?)?
        }
        (Some(site), Some(ty)) => {
            serde_json::to_string_pretty(&service.type_rankings(site, ty, date).await?)?
        }
        (None, Some(_)) => bail!("A ranking type needs a site code"),
    };

    println!("{}", json);
    Ok(())
}
