//! Long-running native-messaging host: browser events in, dashboard updates
//! and tracking-data answers out.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use lw_core::collaborators::TabHandle;
use lw_core::config::AppConfig;
use lw_core::messages::{InboundMessage, OutboundMessage};
use lw_detector::{DetectorHandle, IdentifierTracker, LeakDetector, Reconciler};

use crate::browser::BrowserState;
use crate::native::{encode_fitted, read_message, spawn_writer, NativeChannel};

/// Outbound frames waiting for the writer.
const OUTBOUND_QUEUE: usize = 64;

/// Serve the extension over `reader`/`writer` until the browser closes the
/// input stream.
pub async fn serve<R, W>(mut reader: R, writer: W, config: &AppConfig) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let browser = Arc::new(BrowserState::default());
    let (detector, _detector_task) = DetectorHandle::spawn(
        LeakDetector::default(),
        browser.clone(),
        config.command_queue(),
    );
    let (outbound, writer_task) = spawn_writer(writer, OUTBOUND_QUEUE);

    let tracker = IdentifierTracker::new(browser.clone(), browser.clone());
    let mut reconciler = Reconciler::new(
        tracker,
        detector.clone(),
        Arc::new(NativeChannel::new(outbound.clone())),
    );
    reconciler.prime().await?;
    let interval = config.reconcile_interval();
    let reconcile_task = tokio::spawn(reconciler.run(interval));
    info!("Native messaging host ready, reconciling every {interval:?}");

    let host = Host {
        browser,
        detector,
        outbound,
    };
    while let Some(payload) = read_message(&mut reader).await? {
        match serde_json::from_slice::<InboundMessage>(&payload) {
            Ok(message) => host.dispatch(message).await,
            Err(e) => warn!("Skipping malformed message: {e}"),
        }
    }
    info!("Browser closed the connection, shutting down");

    reconcile_task.abort();
    let _ = reconcile_task.await;
    drop(host);
    writer_task.await.context("joining writer task")??;
    Ok(())
}

struct Host {
    browser: Arc<BrowserState>,
    detector: DetectorHandle,
    outbound: mpsc::Sender<Vec<u8>>,
}

impl Host {
    async fn dispatch(&self, message: InboundMessage) {
        match message {
            InboundMessage::TabActivated { tab_id, url } => {
                self.browser
                    .set_active_tab(Some(TabHandle { id: tab_id, url }));
            }
            InboundMessage::TabClosed => self.browser.set_active_tab(None),
            InboundMessage::Cookies { url, values } => self.browser.set_cookies(&url, values),
            InboundMessage::BeforeSendHeaders {
                url,
                request_headers,
            } => {
                let detector = self.detector.clone();
                tokio::spawn(async move {
                    if let Err(e) = detector.on_before_send_headers(&url, &request_headers).await {
                        warn!("Header classification for {url} failed: {e}");
                    }
                });
            }
            InboundMessage::BeforeRequest { url, request_body } => {
                let detector = self.detector.clone();
                tokio::spawn(async move {
                    if let Err(e) = detector.on_before_request(&url, request_body.as_ref()).await {
                        warn!("Body classification for {url} failed: {e}");
                    }
                });
            }
            InboundMessage::GetTrackingData => self.answer_tracking_data().await,
        }
    }

    async fn answer_tracking_data(&self) {
        let tracking_data = match self.detector.tracking_data().await {
            Ok(tracking_data) => tracking_data,
            Err(e) => {
                warn!("Could not answer getTrackingData: {e}");
                return;
            }
        };
        let frame = match encode_fitted(OutboundMessage::TrackingData { tracking_data }) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Could not answer getTrackingData: {e}");
                return;
            }
        };
        if self.outbound.send(frame).await.is_err() {
            debug!("Writer closed before tracking data could be sent");
        }
    }
}
