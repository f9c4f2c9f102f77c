//! Tail fingerprints of tracking cookie values.
//!
//! Tracking cookies carry versioned prefixes (`fb.1.`, `GA1.2.`) that differ
//! between the cookie store and the values scripts embed in requests. The
//! last two dot-separated segments are stable, so they are what gets searched
//! for in outgoing traffic.

use serde::{Deserialize, Serialize};

use crate::identifiers::IdentifierKind;

/// Separator between cookie value segments.
pub const SEGMENT_SEPARATOR: char = '.';

/// Number of trailing segments kept in a fingerprint.
const TAIL_SEGMENTS: usize = 2;

/// Opaque suffix of a tracking cookie value used as a leak signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-sensitive substring test against a request haystack.
    pub fn occurs_in(&self, haystack: &str) -> bool {
        haystack.contains(self.0.as_str())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the tail fingerprint of a cookie value.
///
/// Returns `None` when the cookie is absent or the derived tail is empty.
pub fn derive_fingerprint(cookie_value: Option<&str>) -> Option<Fingerprint> {
    let value = cookie_value?;
    let segments: Vec<&str> = value.split(SEGMENT_SEPARATOR).collect();
    let start = segments.len().saturating_sub(TAIL_SEGMENTS);
    let tail = segments[start..].join(&SEGMENT_SEPARATOR.to_string());

    if tail.is_empty() {
        None
    } else {
        Some(Fingerprint(tail))
    }
}

/// Current fingerprint of each identifier kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprints {
    pub facebook: Option<Fingerprint>,
    pub google_analytics: Option<Fingerprint>,
}

impl Fingerprints {
    pub fn get(&self, kind: IdentifierKind) -> Option<&Fingerprint> {
        match kind {
            IdentifierKind::Facebook => self.facebook.as_ref(),
            IdentifierKind::GoogleAnalytics => self.google_analytics.as_ref(),
        }
    }

    pub fn set(&mut self, kind: IdentifierKind, fingerprint: Option<Fingerprint>) {
        match kind {
            IdentifierKind::Facebook => self.facebook = fingerprint,
            IdentifierKind::GoogleAnalytics => self.google_analytics = fingerprint,
        }
    }

    /// True when no identifier has a fingerprint, so nothing can match.
    pub fn is_empty(&self) -> bool {
        self.facebook.is_none() && self.google_analytics.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tail(value: &str) -> Option<String> {
        derive_fingerprint(Some(value)).map(|f| f.as_str().to_string())
    }

    #[test]
    fn keeps_last_two_segments() {
        assert_eq!(tail("abc.123.xyz987").as_deref(), Some("123.xyz987"));
        assert_eq!(
            tail("fb.1.1596403881668.1116446470").as_deref(),
            Some("1596403881668.1116446470")
        );
        assert_eq!(
            tail("GA1.2.1517850379.1602857412").as_deref(),
            Some("1517850379.1602857412")
        );
    }

    #[test]
    fn short_values_are_unchanged() {
        assert_eq!(tail("single").as_deref(), Some("single"));
        assert_eq!(tail("two.parts").as_deref(), Some("two.parts"));
    }

    #[test]
    fn absent_cookie_has_no_fingerprint() {
        assert_eq!(derive_fingerprint(None), None);
    }

    #[test]
    fn empty_cookie_has_no_fingerprint() {
        assert_eq!(derive_fingerprint(Some("")), None);
    }

    #[test]
    fn empty_segments_are_preserved() {
        assert_eq!(tail("a..").as_deref(), Some("."));
        assert_eq!(tail("a.b.").as_deref(), Some("b."));
    }

    #[test]
    fn occurs_in_is_case_sensitive() {
        let fp = derive_fingerprint(Some("fb.1.ABC.def")).expect("fingerprint");
        assert!(fp.occurs_in("id=ABC.def&x=1"));
        assert!(!fp.occurs_in("id=abc.def&x=1"));
    }

    #[test]
    fn fingerprints_lookup_by_kind() {
        let mut fps = Fingerprints::default();
        assert!(fps.is_empty());

        fps.set(IdentifierKind::GoogleAnalytics, derive_fingerprint(Some("GA1.2.3.4")));
        assert!(!fps.is_empty());
        assert_eq!(fps.get(IdentifierKind::Facebook), None);
        assert_eq!(
            fps.get(IdentifierKind::GoogleAnalytics).map(Fingerprint::as_str),
            Some("3.4")
        );
    }
}
