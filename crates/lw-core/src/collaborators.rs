use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::messages::DashboardUpdate;

/// The active tab of the current browser window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabHandle {
    pub id: Option<u64>,
    pub url: Option<String>,
}

impl TabHandle {
    pub fn new(id: Option<u64>, url: impl Into<String>) -> Self {
        Self {
            id,
            url: Some(url.into()),
        }
    }
}

/// Browser tab query: the active tab of the current window.
#[async_trait]
pub trait TabResolver: Send + Sync {
    /// `None` when no tab is active. Lookup failures also yield `None`.
    async fn active_tab(&self) -> Option<TabHandle>;
}

/// Browser cookie store lookup.
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Value of cookie `name` as visible to `url`, or `None` when absent or
    /// the lookup failed.
    async fn cookie(&self, url: &str, name: &str) -> Option<String>;
}

/// Push channel to the dashboard rendered in the active tab.
#[async_trait]
pub trait PresentationChannel: Send + Sync {
    async fn publish(&self, tab: &TabHandle, update: &DashboardUpdate) -> Result<(), ChannelError>;
}

/// Why a dashboard update could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("no dashboard is listening in tab {0:?}")]
    NoReceiver(Option<u64>),
    #[error("presentation channel closed")]
    Closed,
    #[error("failed to encode dashboard message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("dashboard message too large: {0} bytes")]
    TooLarge(usize),
}
