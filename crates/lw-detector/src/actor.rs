//! Single-owner task around [`LeakDetector`].
//!
//! Request observers and the reconciler run concurrently; they reach the
//! detector only through a bounded command queue, so every reset and every
//! classification is applied whole and in arrival order.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use lw_core::collaborators::TabResolver;
use lw_core::domain::hostname_of;
use lw_core::fingerprint::Fingerprints;
use lw_core::messages::TrackingData;
use lw_core::models::{HttpHeader, RequestBody, TrackingSnapshot};

use crate::detector::{Classification, LeakDetector, RecordedLeak};
use crate::haystack::{header_haystack, query_and_body_haystack, Channel};

#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("leak detector task has stopped")]
    Stopped,
}

impl<T> From<mpsc::error::SendError<T>> for DetectorError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        Self::Stopped
    }
}

impl From<oneshot::error::RecvError> for DetectorError {
    fn from(_: oneshot::error::RecvError) -> Self {
        Self::Stopped
    }
}

#[derive(Debug)]
enum Command {
    Classify {
        hostname: String,
        active_tab_hostname: String,
        haystack: String,
        channel: Channel,
        reply: oneshot::Sender<Vec<RecordedLeak>>,
    },
    Reset {
        fingerprints: Fingerprints,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<TrackingSnapshot>,
    },
}

/// Cloneable handle to a running detector task.
#[derive(Clone)]
pub struct DetectorHandle {
    sender: mpsc::Sender<Command>,
    tabs: Arc<dyn TabResolver>,
}

impl DetectorHandle {
    /// Move `detector` into a new task. The task exits once every handle
    /// has been dropped.
    pub fn spawn(
        detector: LeakDetector,
        tabs: Arc<dyn TabResolver>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(run(detector, receiver));
        (Self { sender, tabs }, task)
    }

    /// Classify the header block of an outgoing request.
    pub async fn on_before_send_headers(
        &self,
        url: &str,
        headers: &[HttpHeader],
    ) -> Result<Vec<RecordedLeak>, DetectorError> {
        self.classify(url, header_haystack(headers), Channel::Headers)
            .await
    }

    /// Classify the query string and body of an outgoing request.
    pub async fn on_before_request(
        &self,
        url: &str,
        body: Option<&RequestBody>,
    ) -> Result<Vec<RecordedLeak>, DetectorError> {
        self.classify(url, query_and_body_haystack(url, body), Channel::QueryAndBody)
            .await
    }

    /// Install new fingerprints and clear both leak collections.
    pub async fn reset(&self, fingerprints: Fingerprints) -> Result<(), DetectorError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(Command::Reset {
                fingerprints,
                reply,
            })
            .await?;
        Ok(rx.await?)
    }

    /// Copy of the current fingerprints and leak records.
    pub async fn snapshot(&self) -> Result<TrackingSnapshot, DetectorError> {
        let (reply, rx) = oneshot::channel();
        self.sender.send(Command::Snapshot { reply }).await?;
        Ok(rx.await?)
    }

    /// Both domain maps, as answered to a `getTrackingData` request.
    pub async fn tracking_data(&self) -> Result<TrackingData, DetectorError> {
        let snapshot = self.snapshot().await?;
        Ok(TrackingData::from(&snapshot))
    }

    async fn classify(
        &self,
        url: &str,
        haystack: String,
        channel: Channel,
    ) -> Result<Vec<RecordedLeak>, DetectorError> {
        let hostname = hostname_of(url);
        if hostname.is_empty() {
            debug!("Skipping request with no hostname: {url}");
            return Ok(Vec::new());
        }

        let active_tab_hostname = self
            .tabs
            .active_tab()
            .await
            .and_then(|tab| tab.url)
            .map(|url| hostname_of(&url))
            .unwrap_or_default();

        let (reply, rx) = oneshot::channel();
        self.sender
            .send(Command::Classify {
                hostname,
                active_tab_hostname,
                haystack,
                channel,
                reply,
            })
            .await?;
        Ok(rx.await?)
    }
}

async fn run(mut detector: LeakDetector, mut receiver: mpsc::Receiver<Command>) {
    while let Some(command) = receiver.recv().await {
        match command {
            Command::Classify {
                hostname,
                active_tab_hostname,
                haystack,
                channel,
                reply,
            } => {
                let recorded = detector.classify(Classification {
                    hostname: &hostname,
                    active_tab_hostname: &active_tab_hostname,
                    haystack: &haystack,
                    channel,
                });
                // The caller may have given up waiting; the leak is recorded regardless.
                let _ = reply.send(recorded);
            }
            Command::Reset {
                fingerprints,
                reply,
            } => {
                detector.reset(fingerprints);
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                if reply.send(detector.snapshot().clone()).is_err() {
                    warn!("Snapshot requester went away before the reply");
                }
            }
        }
    }
    debug!("Leak detector task stopped");
}
