//! Seeding configured sites and their preset ranking types.

use crate::config::SitePreset;
use crate::repository::{DieselError, SiteFields, Store, TypeFields};

/// Register every preset site and type. Safe to run repeatedly.
///
/// Existing rows keep their identifiers and display fields; only the
/// active flag follows the configuration.
pub async fn seed_sites(store: &Store, presets: &[SitePreset]) -> Result<usize, DieselError> {
    let sites = store.sites();
    let types = store.ranking_types();

    for preset in presets {
        let site_id = sites
            .upsert(
                &preset.code,
                SiteFields {
                    name: &preset.name,
                    url: &preset.url,
                    fetch_type: preset.fetch_type,
                    api_url: preset.api_url.as_deref(),
                    description: preset.description.as_deref(),
                },
            )
            .await?;
        sites.set_active(&preset.code, preset.active).await?;

        for ty in &preset.types {
            types
                .seed(
                    site_id,
                    &ty.code,
                    TypeFields {
                        name: &ty.name,
                        url: ty.url.as_deref(),
                        description: ty.description.as_deref(),
                    },
                )
                .await?;
        }
        tracing::debug!(site = %preset.code, site_id, active = preset.active, "Seeded site");
    }

    Ok(presets.len())
}
