use std::sync::Arc;

use log::debug;

use lw_core::collaborators::{CookieStore, TabHandle, TabResolver};
use lw_core::fingerprint::{derive_fingerprint, Fingerprints};
use lw_core::identifiers::IdentifierKind;
use lw_core::models::CookieValues;

/// Result of re-deriving fingerprints for the active tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Whether either fingerprint differs from the previous refresh.
    pub changed: bool,
    pub tab: TabHandle,
    pub cookie_values: CookieValues,
    pub fingerprints: Fingerprints,
}

/// Keeps the fingerprints of the active tab's tracking cookies current.
pub struct IdentifierTracker {
    tabs: Arc<dyn TabResolver>,
    cookies: Arc<dyn CookieStore>,
    fingerprints: Fingerprints,
}

impl IdentifierTracker {
    pub fn new(tabs: Arc<dyn TabResolver>, cookies: Arc<dyn CookieStore>) -> Self {
        Self {
            tabs,
            cookies,
            fingerprints: Fingerprints::default(),
        }
    }

    /// Fingerprints as of the last commit.
    pub fn fingerprints(&self) -> &Fingerprints {
        &self.fingerprints
    }

    /// Resolve the active tab and re-derive both fingerprints, comparing
    /// them with the committed ones. Nothing is committed here: a changed
    /// outcome keeps reporting a change until [`commit`](Self::commit).
    ///
    /// Returns `None` when there is no active tab with a URL.
    pub async fn refresh(&mut self) -> Option<RefreshOutcome> {
        let tab = self.tabs.active_tab().await?;
        let Some(url) = tab.url.clone().filter(|u| !u.is_empty()) else {
            debug!("Active tab {:?} has no URL, keeping fingerprints", tab.id);
            return None;
        };

        let mut cookie_values = CookieValues::default();
        let mut fingerprints = Fingerprints::default();
        for kind in IdentifierKind::ALL {
            let value = self.cookies.cookie(&url, kind.cookie_name()).await;
            fingerprints.set(kind, derive_fingerprint(value.as_deref()));
            cookie_values.set(kind, value);
        }

        let changed = fingerprints != self.fingerprints;
        if changed {
            debug!(
                "Fingerprints changed for {url}: facebook={:?} google_analytics={:?}",
                fingerprints.facebook, fingerprints.google_analytics
            );
        }

        Some(RefreshOutcome {
            changed,
            tab,
            cookie_values,
            fingerprints,
        })
    }

    /// Record `fingerprints` as installed in the detector.
    pub fn commit(&mut self, fingerprints: Fingerprints) {
        self.fingerprints = fingerprints;
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// In-memory browser: one active tab and a flat cookie jar.
    #[derive(Default)]
    pub struct FakeBrowser {
        pub tab: Mutex<Option<TabHandle>>,
        pub cookies: Mutex<HashMap<String, String>>,
    }

    impl FakeBrowser {
        pub fn with_tab(url: &str) -> Arc<Self> {
            let browser = Self::default();
            *browser.tab.lock().unwrap() = Some(TabHandle::new(Some(1), url));
            Arc::new(browser)
        }

        pub fn set_cookie(&self, name: &str, value: &str) {
            self.cookies
                .lock()
                .unwrap()
                .insert(name.to_string(), value.to_string());
        }

        pub fn navigate(&self, tab: Option<TabHandle>) {
            *self.tab.lock().unwrap() = tab;
        }
    }

    #[async_trait]
    impl TabResolver for FakeBrowser {
        async fn active_tab(&self) -> Option<TabHandle> {
            self.tab.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CookieStore for FakeBrowser {
        async fn cookie(&self, _url: &str, name: &str) -> Option<String> {
            self.cookies.lock().unwrap().get(name).cloned()
        }
    }
}
