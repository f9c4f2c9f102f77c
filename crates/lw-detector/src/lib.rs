//! Identifier tracking and third-party leak detection.

pub mod actor;
pub mod detector;
pub mod haystack;
pub mod reconcile;
pub mod tracker;

pub use actor::{DetectorError, DetectorHandle};
pub use detector::{Classification, LeakDetector, RecordedLeak};
pub use haystack::Channel;
pub use reconcile::{Reconciler, TickReport};
pub use tracker::{IdentifierTracker, RefreshOutcome};
