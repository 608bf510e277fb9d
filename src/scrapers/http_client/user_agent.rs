//! User agents sent to novel sites.

use std::hash::{BuildHasher, RandomState};
use std::sync::LazyLock;

/// Sent by plain source fetches when nothing is configured.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Desktop Chrome, the default for the static and rendered page strategies.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Config value that asks for a real browser user agent.
pub const IMPERSONATE: &str = "impersonate";

/// Pool for `user_agent = "impersonate"`.
pub const IMPERSONATE_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
];

// Picked once so every request in a run presents the same browser.
static IMPERSONATED: LazyLock<&'static str> = LazyLock::new(|| {
    let pick = RandomState::new().hash_one("novelscrape") as usize;
    IMPERSONATE_USER_AGENTS[pick % IMPERSONATE_USER_AGENTS.len()]
});

/// User agent for a configured value, or `fallback` when none is set.
pub fn resolve_user_agent(configured: Option<&str>, fallback: &str) -> String {
    match configured.map(str::trim).filter(|ua| !ua.is_empty()) {
        None => fallback.to_string(),
        Some(IMPERSONATE) => IMPERSONATED.to_string(),
        Some(custom) => custom.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_or_blank_uses_fallback() {
        assert_eq!(resolve_user_agent(None, USER_AGENT), USER_AGENT);
        assert_eq!(resolve_user_agent(Some("  "), BROWSER_USER_AGENT), BROWSER_USER_AGENT);
    }

    #[test]
    fn test_impersonate_is_stable_within_a_run() {
        let first = resolve_user_agent(Some(IMPERSONATE), USER_AGENT);
        assert!(IMPERSONATE_USER_AGENTS.contains(&first.as_str()));
        assert_eq!(resolve_user_agent(Some(IMPERSONATE), BROWSER_USER_AGENT), first);
    }

    #[test]
    fn test_custom_passes_through() {
        assert_eq!(
            resolve_user_agent(Some("novelscrape/0.1"), USER_AGENT),
            "novelscrape/0.1"
        );
    }
}
