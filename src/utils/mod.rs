//! Utility functions and helpers.

pub mod http;
pub mod log;

use regex::Regex;
use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract the `page=<n>` query parameter from an href.
pub fn page_number(href: &str) -> Option<u32> {
    let pattern = Regex::new(r"[?&]page=(\d+)").ok()?;
    pattern
        .captures(href)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Join two `/`-separated store paths.
///
/// An absolute `child` replaces `base`, like a filesystem join.
pub fn join_path(base: &str, child: &str) -> String {
    if child.starts_with('/') || base.is_empty() {
        return child.to_string();
    }
    if child.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), child)
}
