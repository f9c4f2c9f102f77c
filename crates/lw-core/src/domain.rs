//! Hostname helpers and the registrable-domain heuristic.
//!
//! Two hosts are considered the same site when their last two labels agree.
//! This approximates eTLD+1 without a public-suffix list, so hosts under
//! multi-part suffixes (`shop.co.uk` vs `news.co.uk`) compare as the same
//! site. Leaks between such hosts are not reported.

use url::Url;

/// Hostname of `url`, or an empty string when the URL cannot be parsed or
/// has no host (`data:`, `about:blank`).
pub fn hostname_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Query string of `url` including its leading `?`, or empty.
///
/// URLs without a hostname yield an empty query, so hostless requests carry
/// no URL evidence.
pub fn query_of(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    if parsed.host_str().map_or(true, str::is_empty) {
        return String::new();
    }
    match parsed.query() {
        Some(query) if !query.is_empty() => format!("?{query}"),
        _ => String::new(),
    }
}

/// Last two dot-separated labels of a host, if it has at least two.
fn registrable_labels(host: &str) -> Option<(&str, &str)> {
    let mut labels = host.rsplit('.');
    let tld = labels.next()?;
    let sld = labels.next()?;
    Some((sld, tld))
}

/// Whether `hostname` belongs to a different site than the active tab.
///
/// Returns `false` when either host is empty: a request that cannot be placed
/// relative to the tab is never attributed as a leak.
pub fn is_distinct_domain(hostname: &str, active_tab_hostname: &str) -> bool {
    if hostname.is_empty() || active_tab_hostname.is_empty() {
        return false;
    }

    match (
        registrable_labels(hostname),
        registrable_labels(active_tab_hostname),
    ) {
        (Some(request_site), Some(tab_site)) => request_site != tab_site,
        _ => hostname != active_tab_hostname,
    }
}
