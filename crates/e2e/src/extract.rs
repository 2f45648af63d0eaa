//! Pulling record ids out of links and URLs

use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(\d+)/?$").unwrap_or_else(|e| panic!("invalid id pattern: {}", e))
});

/// Numeric last path segment of `href`, ignoring query, fragment and a
/// trailing slash
pub fn trailing_id(href: &str) -> Option<u64> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    TRAILING_ID
        .captures(path)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Id following `marker` in `href`, e.g. the booking in `/trip-bookings/12/payment`
pub fn id_after(href: &str, marker: &str) -> Option<u64> {
    let (_, rest) = href.split_once(marker)?;
    let digits: String = rest
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
