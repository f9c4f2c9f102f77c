use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprints;
use crate::identifiers::IdentifierKind;

/// Placeholder shown for an identifier whose cookie is not set.
pub const NOT_FOUND: &str = "Not found";

/// A single outgoing request header as reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    /// Absent for headers the browser only exposes as binary values.
    #[serde(default)]
    pub value: Option<String>,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// One chunk of a raw upload body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadChunk {
    #[serde(default)]
    pub bytes: Option<Vec<u8>>,
    /// Set instead of `bytes` for file uploads.
    #[serde(default)]
    pub file: Option<String>,
}

/// Request body as captured before the request is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    /// Parsed `application/x-www-form-urlencoded` or multipart fields.
    #[serde(default)]
    pub form_data: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub raw: Option<Vec<UploadChunk>>,
    /// Set by the browser when the body could not be captured.
    #[serde(default)]
    pub error: Option<String>,
}

/// Raw cookie values of the active tab, per identifier kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieValues {
    pub facebook: Option<String>,
    pub google_analytics: Option<String>,
}

impl CookieValues {
    pub fn get(&self, kind: IdentifierKind) -> Option<&str> {
        match kind {
            IdentifierKind::Facebook => self.facebook.as_deref(),
            IdentifierKind::GoogleAnalytics => self.google_analytics.as_deref(),
        }
    }

    pub fn set(&mut self, kind: IdentifierKind, value: Option<String>) {
        match kind {
            IdentifierKind::Facebook => self.facebook = value,
            IdentifierKind::GoogleAnalytics => self.google_analytics = value,
        }
    }

    /// Value for display, falling back to [`NOT_FOUND`] when the cookie is
    /// absent or empty.
    pub fn display_value(&self, kind: IdentifierKind) -> String {
        self.get(kind)
            .filter(|v| !v.is_empty())
            .unwrap_or(NOT_FOUND)
            .to_string()
    }
}

/// Evidence that a fingerprint reached a third-party host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakRecord {
    pub hostname: String,
    /// Header block or query+body text of the most recent matching request.
    pub evidence: String,
}

/// Leak records of one identifier kind, keyed by hostname.
///
/// Keeps first-insertion order for stable display. Recording an existing
/// hostname replaces its evidence in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeakRecords {
    records: Vec<LeakRecord>,
}

impl LeakRecords {
    /// Insert or overwrite the evidence for `hostname`.
    /// Returns `true` when the hostname was not recorded before.
    pub fn upsert(&mut self, hostname: &str, evidence: &str) -> bool {
        if let Some(existing) = self.records.iter_mut().find(|r| r.hostname == hostname) {
            existing.evidence = evidence.to_string();
            return false;
        }
        self.records.push(LeakRecord {
            hostname: hostname.to_string(),
            evidence: evidence.to_string(),
        });
        true
    }

    pub fn get(&self, hostname: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.hostname == hostname)
            .map(|r| r.evidence.as_str())
    }

    pub fn contains(&self, hostname: &str) -> bool {
        self.get(hostname).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LeakRecord> {
        self.records.iter()
    }

    /// `(hostname, evidence)` pairs, the shape the dashboard consumes, with
    /// each evidence string cut to `max_evidence` bytes.
    pub fn to_pairs(&self, max_evidence: usize) -> Vec<(String, String)> {
        self.records
            .iter()
            .map(|r| (r.hostname.clone(), clip_evidence(&r.evidence, max_evidence)))
            .collect()
    }
}

/// Cut `evidence` to at most `max_bytes` on a char boundary and mark the cut
/// with `…`. A zero budget drops the evidence entirely.
pub fn clip_evidence(evidence: &str, max_bytes: usize) -> String {
    if evidence.len() <= max_bytes {
        return evidence.to_string();
    }
    if max_bytes == 0 {
        return String::new();
    }
    let mut end = max_bytes;
    while !evidence.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &evidence[..end])
}

/// Fingerprints plus the leaks recorded against them since they were set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub fingerprints: Fingerprints,
    pub facebook: LeakRecords,
    pub google_analytics: LeakRecords,
}

impl TrackingSnapshot {
    /// Fresh snapshot with no recorded leaks.
    pub fn new(fingerprints: Fingerprints) -> Self {
        Self {
            fingerprints,
            ..Default::default()
        }
    }

    pub fn records(&self, kind: IdentifierKind) -> &LeakRecords {
        match kind {
            IdentifierKind::Facebook => &self.facebook,
            IdentifierKind::GoogleAnalytics => &self.google_analytics,
        }
    }

    pub fn records_mut(&mut self, kind: IdentifierKind) -> &mut LeakRecords {
        match kind {
            IdentifierKind::Facebook => &mut self.facebook,
            IdentifierKind::GoogleAnalytics => &mut self.google_analytics,
        }
    }

    pub fn total_leaks(&self) -> usize {
        self.facebook.len() + self.google_analytics.len()
    }
}
