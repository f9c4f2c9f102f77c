use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::MissedTickBehavior;

use lw_core::collaborators::PresentationChannel;
use lw_core::messages::DashboardUpdate;
use lw_core::models::{CookieValues, TrackingSnapshot};

use crate::actor::{DetectorError, DetectorHandle};
use crate::tracker::IdentifierTracker;

/// What one reconciliation pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// The fingerprints changed and the leak records were cleared.
    pub reset: bool,
    pub cookie_values: CookieValues,
    pub snapshot: TrackingSnapshot,
}

/// Periodically syncs the tracker's fingerprints into the detector and
/// pushes the current state to the dashboard.
pub struct Reconciler {
    tracker: IdentifierTracker,
    detector: DetectorHandle,
    presentation: Arc<dyn PresentationChannel>,
}

impl Reconciler {
    pub fn new(
        tracker: IdentifierTracker,
        detector: DetectorHandle,
        presentation: Arc<dyn PresentationChannel>,
    ) -> Self {
        Self {
            tracker,
            detector,
            presentation,
        }
    }

    /// Initial refresh at startup. Installs fingerprints without publishing.
    pub async fn prime(&mut self) -> Result<(), DetectorError> {
        if let Some(outcome) = self.tracker.refresh().await {
            if outcome.changed {
                self.detector.reset(outcome.fingerprints.clone()).await?;
                self.tracker.commit(outcome.fingerprints);
            }
        }
        Ok(())
    }

    /// One reconciliation pass. Returns `None` when there is no active tab,
    /// in which case nothing is reset or published.
    pub async fn tick(&mut self) -> Result<Option<TickReport>, DetectorError> {
        let Some(outcome) = self.tracker.refresh().await else {
            return Ok(None);
        };

        if outcome.changed {
            info!(
                "Tracking cookies changed on {}, clearing recorded leaks",
                outcome.tab.url.as_deref().unwrap_or_default()
            );
            // Commit only once the detector holds the new fingerprints, so a
            // failed reset is retried on the next tick.
            self.detector.reset(outcome.fingerprints.clone()).await?;
            self.tracker.commit(outcome.fingerprints);
        }

        let snapshot = self.detector.snapshot().await?;
        let update = DashboardUpdate::new(outcome.tab.id, &outcome.cookie_values, &snapshot);
        if let Err(e) = self.presentation.publish(&outcome.tab, &update).await {
            warn!("Failed to publish dashboard update: {e}");
        }

        Ok(Some(TickReport {
            reset: outcome.changed,
            cookie_values: outcome.cookie_values,
            snapshot,
        }))
    }

    /// Tick every `interval` until the detector task goes away.
    pub async fn run(mut self, interval: Duration) -> Result<(), DetectorError> {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!("Reconciling every {interval:?}");

        loop {
            ticker.tick().await;
            self.tick().await?;
        }
    }
}
