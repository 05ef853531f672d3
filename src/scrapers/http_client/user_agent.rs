//! User agent handling for HTTP requests.

/// Self-identifying agent, used when configuration asks for no impersonation.
pub const USER_AGENT: &str = "booklist/0.3 (daily ranking archive)";

/// Real browser user agents for impersonate mode.
///
/// The ranking pages serve reduced or empty markup to agents they don't
/// recognise as browsers.
pub const IMPERSONATE_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
];

/// Pick a browser user agent.
pub fn random_user_agent() -> &'static str {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as usize)
        .unwrap_or(0);
    IMPERSONATE_USER_AGENTS[nanos % IMPERSONATE_USER_AGENTS.len()]
}

/// Resolve user agent from config value.
/// - None or "impersonate" => a real browser user agent
/// - "booklist" => the self-identifying agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config {
        None | Some("impersonate") => random_user_agent().to_string(),
        Some("booklist") => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_browser() {
        assert!(resolve_user_agent(None).starts_with("Mozilla/5.0"));
        assert!(resolve_user_agent(Some("impersonate")).starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_self_identifying_and_custom() {
        assert_eq!(resolve_user_agent(Some("booklist")), USER_AGENT);
        assert_eq!(resolve_user_agent(Some("MyBot/1.0")), "MyBot/1.0");
    }
}
