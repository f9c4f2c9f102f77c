//! Well-known third-party collectors, used to annotate leak destinations.
//!
//! Annotation only: a leak is recorded whether or not its host appears here.

/// Each entry is (registrable domain, category).
pub const TRACKER_DOMAINS: &[(&str, &str)] = &[
    // --- Ad exchanges and retargeting ---
    ("doubleclick.net", "advertising"),
    ("googlesyndication.com", "advertising"),
    ("googleadservices.com", "advertising"),
    ("adsrvr.org", "advertising"),
    ("criteo.com", "advertising"),
    ("criteo.net", "advertising"),
    ("taboola.com", "advertising"),
    ("outbrain.com", "advertising"),
    ("adnxs.com", "advertising"),
    ("pubmatic.com", "advertising"),
    ("rubiconproject.com", "advertising"),
    ("amazon-adsystem.com", "advertising"),
    // --- Analytics and tag management ---
    ("google-analytics.com", "analytics"),
    ("googletagmanager.com", "analytics"),
    ("hotjar.com", "analytics"),
    ("mixpanel.com", "analytics"),
    ("segment.io", "analytics"),
    ("amplitude.com", "analytics"),
    ("clarity.ms", "analytics"),
    ("bat.bing.com", "analytics"),
    // --- Social pixels ---
    ("facebook.com", "social"),
    ("facebook.net", "social"),
    ("tiktok.com", "social"),
    ("analytics.tiktok.com", "social"),
    ("ads-twitter.com", "social"),
    ("linkedin.com", "social"),
    ("ct.pinterest.com", "social"),
    ("tr.snapchat.com", "social"),
    // --- Server-side tagging and CDPs ---
    ("stape.io", "server_side_tagging"),
    ("tealiumiq.com", "server_side_tagging"),
    ("rudderstack.com", "server_side_tagging"),
    // --- Data brokers / identity resolution ---
    ("bluekai.com", "data_broker"),
    ("demdex.net", "data_broker"),
    ("rlcdn.com", "data_broker"),
    ("liadm.com", "data_broker"),
    ("id5-sync.com", "data_broker"),
];

/// Category of the tracker `domain` belongs to, by exact or dot-bounded
/// suffix match (`ads.doubleclick.net` matches `doubleclick.net`).
pub fn match_tracker_domain(domain: &str) -> Option<&'static str> {
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();

    for &(tracker, category) in TRACKER_DOMAINS {
        if domain == tracker {
            return Some(category);
        }
        if domain.len() > tracker.len() {
            let offset = domain.len() - tracker.len();
            if domain.as_bytes()[offset - 1] == b'.' && domain[offset..] == *tracker {
                return Some(category);
            }
        }
    }
    None
}
