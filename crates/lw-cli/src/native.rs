//! Browser native-messaging framing: a 32-bit length in native byte order,
//! then that many bytes of UTF-8 JSON.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use lw_core::collaborators::{ChannelError, PresentationChannel, TabHandle};
use lw_core::messages::{DashboardUpdate, OutboundMessage};

/// Browsers reject host-to-extension messages above 1 MiB.
pub const MAX_OUTBOUND_MESSAGE: usize = 1024 * 1024;

/// Browsers never send extension-to-host messages above 64 MiB.
pub const MAX_INBOUND_MESSAGE: usize = 64 * 1024 * 1024;

/// Read one framed message. Returns `None` when the stream ends cleanly
/// before a new frame starts.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e).context("reading message length"),
    }

    let len = u32::from_ne_bytes(len_buf) as usize;
    if len > MAX_INBOUND_MESSAGE {
        bail!("inbound message too large: {len} bytes");
    }

    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .await
        .context("reading message payload")?;
    Ok(Some(buf))
}

/// Serialize `message` into a complete frame.
pub fn encode_message(message: &OutboundMessage) -> Result<Vec<u8>, ChannelError> {
    let json = serde_json::to_vec(message)?;
    if json.len() > MAX_OUTBOUND_MESSAGE {
        return Err(ChannelError::TooLarge(json.len()));
    }

    let mut frame = Vec::with_capacity(json.len() + 4);
    frame.extend_from_slice(&(json.len() as u32).to_ne_bytes());
    frame.extend_from_slice(&json);
    Ok(frame)
}

/// Encode `message`, falling back to destinations without evidence when the
/// full message does not fit in one frame.
pub fn encode_fitted(mut message: OutboundMessage) -> Result<Vec<u8>, ChannelError> {
    match encode_message(&message) {
        Err(ChannelError::TooLarge(size)) => {
            warn!("Outbound message is {size} bytes, sending destinations without evidence");
            message.clip_evidence(0);
            encode_message(&message)
        }
        result => result,
    }
}

pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> Result<()> {
    writer.write_all(frame).await.context("writing message")?;
    writer.flush().await.context("flushing message")?;
    Ok(())
}

/// Own `writer` in a task that writes every frame sent on the returned
/// queue. The task ends when all senders are dropped or the writer fails.
pub fn spawn_writer<W>(writer: W, capacity: usize) -> (mpsc::Sender<Vec<u8>>, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (sender, receiver) = mpsc::channel::<Vec<u8>>(capacity.max(1));
    let task = tokio::spawn(write_loop(writer, receiver));
    (sender, task)
}

async fn write_loop<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut receiver: mpsc::Receiver<Vec<u8>>,
) -> Result<()> {
    while let Some(frame) = receiver.recv().await {
        write_frame(&mut writer, &frame).await?;
    }
    debug!("Native messaging writer closed");
    Ok(())
}

/// Delivers dashboard updates to the extension through the writer queue.
pub struct NativeChannel {
    outbound: mpsc::Sender<Vec<u8>>,
}

impl NativeChannel {
    pub fn new(outbound: mpsc::Sender<Vec<u8>>) -> Self {
        Self { outbound }
    }
}

#[async_trait]
impl PresentationChannel for NativeChannel {
    async fn publish(&self, tab: &TabHandle, update: &DashboardUpdate) -> Result<(), ChannelError> {
        // The extension routes updates by tab id.
        if tab.id.is_none() {
            return Err(ChannelError::NoReceiver(None));
        }
        let frame = encode_fitted(OutboundMessage::UpdateDashboard(update.clone()))?;
        self.outbound
            .send(frame)
            .await
            .map_err(|_| ChannelError::Closed)
    }
}
