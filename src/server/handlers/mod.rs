//! HTTP request handlers for the read API.

mod api;
mod rankings;

// Re-export handlers for use by the router
pub use api::{api_sites, health, root};
pub use rankings::{api_overview, api_site_rankings, api_type_rankings};
