//! Offline replay of recorded browser events.
//!
//! Input is one inbound message per line, in the same JSON shape the
//! extension sends to the host. Events are applied strictly in order and the
//! tracker is reconciled after every tab or cookie change, so a replay always
//! produces the same report.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use lw_core::collaborators::{ChannelError, PresentationChannel, TabHandle};
use lw_core::config::AppConfig;
use lw_core::identifiers::IdentifierKind;
use lw_core::messages::{DashboardUpdate, InboundMessage};
use lw_core::models::{CookieValues, TrackingSnapshot};
use lw_detector::{DetectorHandle, IdentifierTracker, LeakDetector, Reconciler};

use crate::browser::BrowserState;

/// Final state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub snapshot: TrackingSnapshot,
    /// Cookie values from the last reconciliation, if any ran with a tab.
    pub cookie_values: Option<CookieValues>,
    pub processed: usize,
    pub skipped: usize,
}

/// Replays have no dashboard; updates are only logged.
struct Discard;

#[async_trait]
impl PresentationChannel for Discard {
    async fn publish(&self, tab: &TabHandle, update: &DashboardUpdate) -> Result<(), ChannelError> {
        debug!(
            "Dashboard update for tab {:?}: {} + {} destinations",
            tab.id,
            update.identifier_a_domains.len(),
            update.identifier_b_domains.len()
        );
        Ok(())
    }
}

pub async fn replay_file(path: &Path, config: &AppConfig) -> Result<ReplayReport> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;
    replay(BufReader::new(file), config).await
}

pub async fn replay<R: AsyncBufRead + Unpin>(reader: R, config: &AppConfig) -> Result<ReplayReport> {
    let browser = Arc::new(BrowserState::default());
    let (detector, _task) = DetectorHandle::spawn(
        LeakDetector::default(),
        browser.clone(),
        config.command_queue(),
    );
    let tracker = IdentifierTracker::new(browser.clone(), browser.clone());
    let mut reconciler = Reconciler::new(tracker, detector.clone(), Arc::new(Discard));
    let mut cookie_values = None;

    let mut processed = 0;
    let mut skipped = 0;
    let mut lines = reader.lines();
    let mut line_no = 0;
    while let Some(line) = lines.next_line().await.context("reading replay input")? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let message = match serde_json::from_str::<InboundMessage>(line) {
            Ok(message) => message,
            Err(e) => {
                warn!("Line {line_no}: skipping malformed message: {e}");
                skipped += 1;
                continue;
            }
        };
        processed += 1;

        match message {
            InboundMessage::TabActivated { tab_id, url } => {
                browser.set_active_tab(Some(TabHandle { id: tab_id, url }));
                reconcile(&mut reconciler, &mut cookie_values).await?;
            }
            InboundMessage::TabClosed => {
                browser.set_active_tab(None);
                reconcile(&mut reconciler, &mut cookie_values).await?;
            }
            InboundMessage::Cookies { url, values } => {
                browser.set_cookies(&url, values);
                reconcile(&mut reconciler, &mut cookie_values).await?;
            }
            InboundMessage::BeforeSendHeaders {
                url,
                request_headers,
            } => {
                detector.on_before_send_headers(&url, &request_headers).await?;
            }
            InboundMessage::BeforeRequest { url, request_body } => {
                detector.on_before_request(&url, request_body.as_ref()).await?;
            }
            InboundMessage::GetTrackingData => {
                let data = detector.tracking_data().await?;
                info!(
                    "Line {line_no}: tracking data has {} {} and {} {} destinations",
                    data.identifier_a_domains.len(),
                    IdentifierKind::Facebook,
                    data.identifier_b_domains.len(),
                    IdentifierKind::GoogleAnalytics,
                );
            }
        }
    }

    let snapshot = detector.snapshot().await?;
    debug!("Replay finished: {processed} events, {skipped} skipped");

    Ok(ReplayReport {
        snapshot,
        cookie_values,
        processed,
        skipped,
    })
}

async fn reconcile(
    reconciler: &mut Reconciler,
    cookie_values: &mut Option<CookieValues>,
) -> Result<()> {
    if let Some(report) = reconciler.tick().await? {
        *cookie_values = Some(report.cookie_values);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SESSION: &str = r#"
{"kind":"tabActivated","tabId":1,"url":"https://shop.example.com/product/42"}
{"kind":"cookies","url":"https://shop.example.com/","values":{"_fbp":"fb.1.1596403881668.1116446470","_ga":"GA1.2.1033501218.1596403883"}}
{"kind":"beforeSendHeaders","url":"https://tracker.example.net/pixel","requestHeaders":[{"name":"X-Uid","value":"1596403881668.1116446470"}]}
{"kind":"beforeRequest","url":"https://www.facebook.com/tr?id=1596403881668.1116446470"}
{"kind":"beforeRequest","url":"https://collect.example.org/e","requestBody":{"formData":{"cid":["1033501218.1596403883"]}}}
{"kind":"beforeRequest","url":"https://cdn.example.com/x?cid=1033501218.1596403883"}
"#;

    fn write_session(extra: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "{SESSION}{extra}").expect("write session");
        file
    }

    #[tokio::test]
    async fn replay_records_third_party_leaks_only() {
        let file = write_session("");
        let report = replay_file(file.path(), &AppConfig::default())
            .await
            .expect("replay");

        let facebook = report.snapshot.records(IdentifierKind::Facebook);
        assert_eq!(facebook.len(), 1);
        assert_eq!(
            facebook.get("tracker.example.net"),
            Some("X-Uid: 1596403881668.1116446470")
        );

        let google = report.snapshot.records(IdentifierKind::GoogleAnalytics);
        assert_eq!(google.len(), 1);
        assert_eq!(
            google.get("collect.example.org"),
            Some("cid=1033501218.1596403883")
        );
        assert_eq!(report.processed, 6);
        assert_eq!(report.skipped, 0);
        assert_eq!(
            report.cookie_values.and_then(|c| c.facebook).as_deref(),
            Some("fb.1.1596403881668.1116446470")
        );
    }

    #[tokio::test]
    async fn cookie_rotation_clears_the_report() {
        let file = write_session(
            r#"{"kind":"cookies","url":"https://shop.example.com/","values":{"_fbp":"fb.1.1596403881668.1116446470","_ga":"GA1.2.999.888"}}"#,
        );
        let report = replay_file(file.path(), &AppConfig::default())
            .await
            .expect("replay");

        assert_eq!(report.snapshot.total_leaks(), 0);
        assert_eq!(
            report
                .snapshot
                .fingerprints
                .google_analytics
                .as_ref()
                .map(|f| f.as_str()),
            Some("999.888")
        );
    }

    #[tokio::test]
    async fn malformed_lines_are_counted_and_skipped() {
        let input = "\n{\"kind\":\"nope\"}\nnot json\n{\"kind\":\"getTrackingData\"}\n";
        let report = replay(input.as_bytes(), &AppConfig::default())
            .await
            .expect("replay");

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.snapshot.total_leaks(), 0);
        assert!(report.cookie_values.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = replay_file(&dir.path().join("absent.jsonl"), &AppConfig::default()).await;
        assert!(result.is_err());
    }
}
