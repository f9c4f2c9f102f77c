//! Tracking identifiers watched for third-party leaks.
//!
//! Each identifier is a first-party cookie set by an advertising or analytics
//! script. The hosts that legitimately receive the identifier (the issuer's
//! own collection endpoints) are allow-listed and never reported.

use serde::{Deserialize, Serialize};

/// First-party hosts of the Facebook pixel (`_fbp`).
pub const FACEBOOK_ALLOW_LIST: &[&str] = &["facebook.com", "www.facebook.com"];

/// First-party hosts of Google Analytics / Tag Manager (`_ga`).
pub const GOOGLE_ANALYTICS_ALLOW_LIST: &[&str] = &[
    "google-analytics.com",
    "www.google-analytics.com",
    "analytics.google.com",
    "stats.g.doubleclick.net",
];

/// The tracking identifiers leakwatch correlates against outgoing traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// Facebook pixel browser id, wire position "identifier A".
    Facebook,
    /// Google Analytics client id, wire position "identifier B".
    GoogleAnalytics,
}

impl IdentifierKind {
    /// Every kind, in display order.
    pub const ALL: [IdentifierKind; 2] = [Self::Facebook, Self::GoogleAnalytics];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::GoogleAnalytics => "google_analytics",
        }
    }

    /// Name of the cookie holding the identifier.
    pub fn cookie_name(&self) -> &'static str {
        match self {
            Self::Facebook => "_fbp",
            Self::GoogleAnalytics => "_ga",
        }
    }

    /// Label shown on the dashboard.
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Facebook => "Facebook ID",
            Self::GoogleAnalytics => "GTM ID",
        }
    }

    pub fn allow_list(&self) -> &'static [&'static str] {
        match self {
            Self::Facebook => FACEBOOK_ALLOW_LIST,
            Self::GoogleAnalytics => GOOGLE_ANALYTICS_ALLOW_LIST,
        }
    }

    /// Whether `hostname` is one of the identifier's own issuing hosts.
    ///
    /// Exact comparison only: `pixel.facebook.com` is not allow-listed.
    pub fn is_allowed(&self, hostname: &str) -> bool {
        self.allow_list().contains(&hostname)
    }
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_label())
    }
}
