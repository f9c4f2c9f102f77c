use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use log::debug;

use lw_core::collaborators::{CookieStore, TabHandle, TabResolver};
use lw_core::domain::hostname_of;

/// Mirror of the browser state the extension reports: the active tab and
/// the cookies it has forwarded, keyed by hostname.
#[derive(Debug, Default)]
pub struct BrowserState {
    active_tab: RwLock<Option<TabHandle>>,
    cookies: RwLock<HashMap<String, BTreeMap<String, String>>>,
}

impl BrowserState {
    pub fn set_active_tab(&self, tab: Option<TabHandle>) {
        debug!("Active tab: {tab:?}");
        if let Ok(mut active) = self.active_tab.write() {
            *active = tab;
        }
    }

    /// Replace every cookie known for `url`'s host.
    pub fn set_cookies(&self, url: &str, values: BTreeMap<String, String>) {
        let host = hostname_of(url);
        if host.is_empty() {
            debug!("Ignoring cookies for hostless URL {url}");
            return;
        }
        if let Ok(mut cookies) = self.cookies.write() {
            cookies.insert(host, values);
        }
    }
}

#[async_trait]
impl TabResolver for BrowserState {
    async fn active_tab(&self) -> Option<TabHandle> {
        self.active_tab.read().ok()?.clone()
    }
}

#[async_trait]
impl CookieStore for BrowserState {
    async fn cookie(&self, url: &str, name: &str) -> Option<String> {
        let host = hostname_of(url);
        let cookies = self.cookies.read().ok()?;
        cookies.get(&host)?.get(name).cloned()
    }
}
