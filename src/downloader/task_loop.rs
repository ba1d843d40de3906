//! Per-task retry loop.
//!
//! Every attempt runs fetch, then an existence check, then structural validation.
//! A skip ends the loop at once and a valid archive ends it in success. Input
//! errors (unparseable file name, unsafe target directory) fail the task without
//! retrying; anything else consumes one retry. The loop is a single awaited chain,
//! so the outcome returned is always that of the last attempt.

use crate::error::{Error, Result};
use crate::fetch::FetchOutcome;
use crate::resolver::{archive_file_name, target_directory};
use crate::retry::{IsRetryable, download_with_retry, remaining_after};
use crate::types::{DownloadOutcome, DownloadTask, Event, Position};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::TarballDownloader;

/// Reason attached to skipped outcomes
pub(crate) const SKIP_REASON: &str = "already downloaded";

/// Terminal result of a successful attempt
#[derive(Debug)]
enum Attempt {
    Verified { path: PathBuf, duration: Duration },
    Skipped,
}

impl TarballDownloader {
    /// Drive one task to a terminal outcome. Never fails; errors become
    /// [`DownloadOutcome::Failed`].
    pub(crate) async fn run_task(&self, task: &DownloadTask, position: Position) -> DownloadOutcome {
        let retry = &self.config.retry;
        let result =
            download_with_retry(retry, move |attempt| self.attempt(task, position, attempt)).await;

        match result {
            Ok(Attempt::Verified { path, duration }) => DownloadOutcome::Succeeded {
                url: task.url.clone(),
                path,
                duration_ms: duration_ms(duration),
            },
            Ok(Attempt::Skipped) => DownloadOutcome::Skipped {
                url: task.url.clone(),
                reason: SKIP_REASON.to_string(),
            },
            Err(e) => {
                let error = e.to_string();
                if e.is_retryable() {
                    tracing::error!(
                        %position,
                        url = %task.url,
                        error = %error,
                        "failed to download tarball, retries exhausted"
                    );
                    self.emit(Event::RetriesExhausted {
                        position,
                        url: task.url.clone(),
                        error: error.clone(),
                    });
                } else {
                    tracing::error!(
                        %position,
                        url = %task.url,
                        error = %error,
                        "tarball task rejected"
                    );
                    self.emit(Event::Rejected {
                        position,
                        url: task.url.clone(),
                        error: error.clone(),
                    });
                }
                DownloadOutcome::Failed {
                    url: task.url.clone(),
                    last_error: error,
                }
            }
        }
    }

    /// One attempt, reporting its failure before handing it to the retry loop
    async fn attempt(&self, task: &DownloadTask, position: Position, attempt: u32) -> Result<Attempt> {
        let remaining_retries = remaining_after(&self.config.retry, attempt);

        tracing::info!(%position, url = %task.url, attempt, "downloading");
        self.emit(Event::Downloading {
            position,
            url: task.url.clone(),
            remaining_retries,
        });

        let result = self.fetch_and_verify(task, position).await;
        match &result {
            Err(Error::InvalidArchive { path, .. }) => {
                if remaining_retries > 0 {
                    tracing::warn!(
                        %position,
                        path = %path.display(),
                        remaining_retries,
                        "invalid tgz deleted, retrying download"
                    );
                } else {
                    tracing::warn!(
                        %position,
                        path = %path.display(),
                        "invalid tgz deleted, no retries left"
                    );
                }
                self.emit(Event::InvalidArchive {
                    position,
                    url: task.url.clone(),
                    path: path.clone(),
                    remaining_retries,
                });
            }
            Err(e) => {
                tracing::warn!(
                    %position,
                    url = %task.url,
                    error = %e,
                    remaining_retries,
                    "failed download tgz"
                );
                self.emit(Event::AttemptFailed {
                    position,
                    url: task.url.clone(),
                    error: e.to_string(),
                    remaining_retries,
                });
            }
            Ok(_) => {}
        }
        result
    }

    async fn fetch_and_verify(&self, task: &DownloadTask, position: Position) -> Result<Attempt> {
        let filename = archive_file_name(&task.url)?;
        let directory = target_directory(&self.config.base_dir, &task.target_subdirectory)?;

        let (path, duration) = match self.fetcher.fetch(&task.url, &directory, &filename).await? {
            FetchOutcome::Skipped => {
                tracing::info!(%position, url = %task.url, "skipping download");
                self.emit(Event::Skipped {
                    position,
                    url: task.url.clone(),
                });
                return Ok(Attempt::Skipped);
            }
            FetchOutcome::Completed { path, duration } => (path, duration),
        };

        if !tokio::fs::try_exists(&path).await? {
            return Err(Error::MissingArtifact { path });
        }

        let validator = Arc::clone(&self.validator);
        let archive = path.clone();
        let valid = tokio::task::spawn_blocking(move || validator.validate(&archive)).await??;

        if !valid {
            return Err(Error::InvalidArchive {
                path,
                reason: "archive entries could not be listed".to_string(),
            });
        }

        let duration_ms = duration_ms(duration);
        tracing::info!(%position, url = %task.url, duration_ms, "tgz downloaded");
        self.emit(Event::Downloaded {
            position,
            url: task.url.clone(),
            path: path.clone(),
            duration_ms,
        });
        Ok(Attempt::Verified { path, duration })
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
