//! Single-file fetch primitive
//!
//! [`Fetcher`] downloads one URL into one destination file. The orchestrator only
//! relies on the contract: either a completed file with the time it took, or
//! [`FetchOutcome::Skipped`] when nothing had to be transferred. [`HttpFetcher`]
//! is the reqwest-backed implementation used by default.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// What a fetch produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The resource was written to `path`
    Completed {
        /// Destination file
        path: PathBuf,
        /// Time spent fetching
        duration: Duration,
    },
    /// Nothing was transferred (e.g. the file is already present)
    Skipped,
}

/// Fetch one URL into `directory/filename`
///
/// Implementations may cache and report [`FetchOutcome::Skipped`]; they return
/// `Err` on network or filesystem failures.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `url` to `directory/filename`
    async fn fetch(&self, url: &str, directory: &Path, filename: &str) -> Result<FetchOutcome>;
}

/// HTTP(S) fetcher streaming the body to disk
///
/// The body is written to `<filename>.part` and renamed into place once complete,
/// so an interrupted transfer never leaves a truncated file under the final name.
pub struct HttpFetcher {
    client: reqwest::Client,
    skip_existing: bool,
}

impl HttpFetcher {
    /// Create a fetcher from configuration
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            skip_existing: config.skip_existing,
        })
    }

    async fn stream_to_file(&self, url: &str, part_path: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| Error::Fetch {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut file = fs::File::create(part_path).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| Error::Fetch {
                url: url.to_string(),
                source,
            })?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, directory: &Path, filename: &str) -> Result<FetchOutcome> {
        fs::create_dir_all(directory).await?;
        let path = directory.join(filename);

        if self.skip_existing && fs::try_exists(&path).await? {
            debug!(url, path = %path.display(), "destination already present, skipping fetch");
            return Ok(FetchOutcome::Skipped);
        }

        let part_path = directory.join(format!("{filename}.part"));
        let start = Instant::now();

        match self.stream_to_file(url, &part_path).await {
            Ok(bytes) => {
                fs::rename(&part_path, &path).await?;
                let duration = start.elapsed();
                debug!(
                    url,
                    path = %path.display(),
                    bytes,
                    duration_ms = duration.as_millis() as u64,
                    "fetch complete"
                );
                Ok(FetchOutcome::Completed { path, duration })
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&part_path).await
                    && cleanup.kind() != std::io::ErrorKind::NotFound
                {
                    debug!(path = %part_path.display(), error = %cleanup, "failed to remove partial file");
                }
                Err(e)
            }
        }
    }
}
