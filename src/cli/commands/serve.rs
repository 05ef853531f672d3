//! Web server command.

use console::style;

use super::helpers::prepare_store;
use crate::config::Settings;

/// Start the read API.
pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let bind = normalize_bind_address(bind);

    println!("{} Preparing database...", style("→").cyan());
    let store = prepare_store(settings).await?;
    println!("  {} Database ready", style("✓").green());

    println!("{} Starting booklist API at http://{}", style("→").cyan(), bind);
    println!("  Press Ctrl+C to stop");

    crate::server::serve(store, &bind).await
}

/// Normalize a bind address that can be:
/// - Just a port: "8000" -> 127.0.0.1:8000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:8000
/// - Host and port: "0.0.0.0:8000" -> unchanged
fn normalize_bind_address(bind: &str) -> String {
    if let Ok(port) = bind.parse::<u16>() {
        return format!("127.0.0.1:{}", port);
    }

    if let Some((_, port)) = bind.rsplit_once(':') {
        if port.parse::<u16>().is_ok() {
            return bind.to_string();
        }
    }

    format!("{}:8000", bind)
}
