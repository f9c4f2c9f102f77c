use log::{debug, info};

use lw_core::domain::is_distinct_domain;
use lw_core::fingerprint::{Fingerprint, Fingerprints};
use lw_core::identifiers::IdentifierKind;
use lw_core::models::TrackingSnapshot;
use lw_core::tracker_domains::match_tracker_domain;

use crate::haystack::Channel;

/// A leak recorded by one classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLeak {
    pub kind: IdentifierKind,
    pub hostname: String,
    /// `true` the first time this hostname leaks under this fingerprint.
    pub first_seen: bool,
}

/// One request channel ready for classification.
#[derive(Debug, Clone, Copy)]
pub struct Classification<'a> {
    /// Destination host of the request; empty when the URL was malformed.
    pub hostname: &'a str,
    pub active_tab_hostname: &'a str,
    pub haystack: &'a str,
    pub channel: Channel,
}

/// Owns the tracking snapshot and applies the leak rules to requests.
#[derive(Debug, Default)]
pub struct LeakDetector {
    snapshot: TrackingSnapshot,
}

impl LeakDetector {
    pub fn new(fingerprints: Fingerprints) -> Self {
        Self {
            snapshot: TrackingSnapshot::new(fingerprints),
        }
    }

    pub fn fingerprints(&self) -> &Fingerprints {
        &self.snapshot.fingerprints
    }

    pub fn snapshot(&self) -> &TrackingSnapshot {
        &self.snapshot
    }

    /// Replace the fingerprints and drop every recorded leak of both kinds.
    pub fn reset(&mut self, fingerprints: Fingerprints) {
        let discarded = self.snapshot.total_leaks();
        self.snapshot = TrackingSnapshot::new(fingerprints);
        debug!("Tracking snapshot reset, {discarded} leak records discarded");
    }

    /// Record a leak for every identifier whose fingerprint occurs in the
    /// haystack, unless the destination is allow-listed for that identifier
    /// or belongs to the active tab's own site.
    pub fn classify(&mut self, request: Classification<'_>) -> Vec<RecordedLeak> {
        let mut recorded = Vec::new();

        for kind in IdentifierKind::ALL {
            let Some(fingerprint) = self.snapshot.fingerprints.get(kind) else {
                continue;
            };
            if !is_leak(kind, fingerprint, &request) {
                continue;
            }

            let first_seen = self
                .snapshot
                .records_mut(kind)
                .upsert(request.hostname, request.haystack);
            log_leak(kind, &request, first_seen);
            recorded.push(RecordedLeak {
                kind,
                hostname: request.hostname.to_string(),
                first_seen,
            });
        }

        recorded
    }
}

fn is_leak(kind: IdentifierKind, fingerprint: &Fingerprint, request: &Classification<'_>) -> bool {
    fingerprint.occurs_in(request.haystack)
        && !kind.is_allowed(request.hostname)
        && is_distinct_domain(request.hostname, request.active_tab_hostname)
}

fn log_leak(kind: IdentifierKind, request: &Classification<'_>, first_seen: bool) {
    if first_seen {
        let category = match_tracker_domain(request.hostname).unwrap_or("unknown");
        info!(
            "LEAK: {} sent to {} via {} (tab: {}, category: {category})",
            kind, request.hostname, request.channel, request.active_tab_hostname
        );
    } else {
        debug!(
            "Leak evidence refreshed: {} -> {} via {}",
            kind, request.hostname, request.channel
        );
    }
}
