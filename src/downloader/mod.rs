//! Download orchestration split into focused submodules.
//!
//! - [`batch`] - Batch entry points (task lists, manifests, lockfiles, URL lists)
//! - [`task_loop`] - Per-task fetch/verify/retry state machine

mod batch;
mod task_loop;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::types::Event;
use crate::validate::{ArchiveValidator, TarballValidator};
use std::sync::Arc;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Tarball downloader (cloneable - all fields are Arc-wrapped)
///
/// Owns the fetch and validation collaborators and the event channel. Each batch
/// call creates the base directory, runs one retry loop per task and returns one
/// [`DownloadOutcome`](crate::types::DownloadOutcome) per task, in task order.
#[derive(Clone)]
pub struct TarballDownloader {
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across task loops)
    pub(crate) config: Arc<Config>,
    /// Single-file fetch primitive
    pub(crate) fetcher: Arc<dyn Fetcher>,
    /// Structural archive check, run on the blocking pool
    pub(crate) validator: Arc<dyn ArchiveValidator>,
}

impl TarballDownloader {
    /// Create a downloader that fetches over HTTP and validates gzip tarballs
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
        Ok(Self::with_components(
            config,
            fetcher,
            Arc::new(TarballValidator),
        ))
    }

    /// Create a downloader with custom fetch and validation implementations
    pub fn with_components(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        validator: Arc<dyn ArchiveValidator>,
    ) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            event_tx,
            config: Arc::new(config),
            fetcher,
            validator,
        }
    }

    /// Subscribe to download events
    ///
    /// Receivers that fall more than the channel capacity behind observe
    /// `RecvError::Lagged` and miss events; downloads are never slowed down.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
