//! # tarball-dl
//!
//! Bulk tarball mirroring: resolve a dependency lockfile (or a plain list of
//! registry URLs) into download tasks, fetch every tarball concurrently into
//! `<base_dir>/<package>/<file>.tgz`, and verify each archive's structure,
//! retrying transient failures a bounded number of times.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Per-task isolation** - One tarball failing never aborts the others; every
//!   batch returns one outcome per task
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Pluggable** - Fetching and archive validation sit behind traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use tarball_dl::{Config, PackageLock, TarballDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         base_dir: "./tarballs".into(),
//!         ..Default::default()
//!     };
//!     let downloader = TarballDownloader::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let lock = PackageLock::from_json_file("package-lock.json")?;
//!     let outcomes = downloader.download_from_package_lock(&lock).await?;
//!     println!("{} tarballs processed", outcomes.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Download orchestration
pub mod downloader;
/// Error types
pub mod error;
/// Single-file fetch primitive
pub mod fetch;
/// Dependency manifest and lockfile model
pub mod manifest;
/// Manifest and URL resolution into download tasks
pub mod resolver;
/// Bounded retry loop
pub mod retry;
/// Core types and events
pub mod types;
/// Structural archive validation
pub mod validate;

// Re-export commonly used types
pub use config::{Config, FetchConfig, RetryConfig};
pub use downloader::TarballDownloader;
pub use error::{Error, Result};
pub use fetch::{FetchOutcome, Fetcher, HttpFetcher};
pub use manifest::{DependencyManifest, DependencyNode, PackageLock};
pub use resolver::{resolve_from_manifest, resolve_from_urls};
pub use types::{BatchStats, DownloadOutcome, DownloadTask, Event, Position};
pub use validate::{ArchiveValidator, TarballValidator};
