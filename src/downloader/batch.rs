//! Batch entry points.

use crate::error::Result;
use crate::manifest::{DependencyManifest, PackageLock};
use crate::resolver::{resolve_from_manifest, resolve_from_urls};
use crate::types::{BatchStats, DownloadOutcome, DownloadTask, Event, Position};
use futures::stream::{self, StreamExt};

use super::TarballDownloader;

impl TarballDownloader {
    /// Download and verify every task, returning one outcome per task in task order
    ///
    /// The base directory is created first (it may already exist). All task loops
    /// run concurrently, capped by `max_concurrent_downloads` when it is set. A task
    /// that runs out of retries is reported as [`DownloadOutcome::Failed`]; it never
    /// aborts the rest of the batch.
    ///
    /// # Errors
    ///
    /// Only if the base directory cannot be created.
    pub async fn download_all(&self, tasks: &[DownloadTask]) -> Result<Vec<DownloadOutcome>> {
        tokio::fs::create_dir_all(&self.config.base_dir).await?;

        let total = tasks.len();
        let limit = self
            .config
            .max_concurrent_downloads
            .unwrap_or(total)
            .max(1);

        tracing::info!(
            count = total,
            base_dir = %self.config.base_dir.display(),
            concurrency = limit,
            "downloading tarballs"
        );
        self.emit(Event::BatchStarted { count: total });

        let outcomes: Vec<DownloadOutcome> = stream::iter(tasks.iter().enumerate())
            .map(|(offset, task)| self.run_task(task, Position::from_offset(offset, total)))
            .buffered(limit)
            .collect()
            .await;

        let stats = BatchStats::from_outcomes(&outcomes);
        tracing::info!(
            succeeded = stats.succeeded,
            skipped = stats.skipped,
            failed = stats.failed,
            "tarball batch finished"
        );
        self.emit(Event::BatchFinished {
            succeeded: stats.succeeded,
            skipped: stats.skipped,
            failed: stats.failed,
        });

        Ok(outcomes)
    }

    /// Download every resolvable dependency of a manifest tree
    pub async fn download_from_manifest(
        &self,
        manifest: &DependencyManifest,
    ) -> Result<Vec<DownloadOutcome>> {
        let tasks = resolve_from_manifest(manifest);
        self.download_all(&tasks).await
    }

    /// Download every resolvable dependency of a `package-lock.json`
    pub async fn download_from_package_lock(
        &self,
        lock: &PackageLock,
    ) -> Result<Vec<DownloadOutcome>> {
        self.download_from_manifest(&lock.dependencies).await
    }

    /// Download a list of registry tarball URLs
    ///
    /// # Errors
    ///
    /// [`Error::MalformedUrl`](crate::Error::MalformedUrl) if any URL cannot be
    /// mapped to a directory; nothing is downloaded in that case.
    pub async fn download_from_urls<I>(&self, urls: I) -> Result<Vec<DownloadOutcome>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let tasks = resolve_from_urls(urls)?;
        self.download_all(&tasks).await
    }
}
