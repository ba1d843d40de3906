//! Core types for tarball-dl

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One resolved tarball to download and verify
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTask {
    /// Tarball URL
    pub url: String,
    /// Subdirectory of the base directory the tarball is written to
    pub target_subdirectory: String,
}

impl DownloadTask {
    /// Create a new task
    pub fn new(url: impl Into<String>, target_subdirectory: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target_subdirectory: target_subdirectory.into(),
        }
    }
}

/// 1-based position of a task within its batch, rendered as `"i/total"`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 1-based index of the task
    pub index: usize,
    /// Number of tasks in the batch
    pub total: usize,
}

impl Position {
    /// Position of the task at zero-based `offset` in a batch of `total`
    pub fn from_offset(offset: usize, total: usize) -> Self {
        Self {
            index: offset + 1,
            total,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.total)
    }
}

/// Terminal result of one task's retry loop
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// Tarball downloaded and passed structural validation
    Succeeded {
        /// URL of the tarball
        url: String,
        /// Where the tarball was written
        path: PathBuf,
        /// Duration reported by the fetch that produced the valid archive
        duration_ms: u64,
    },
    /// Fetcher reported the tarball as already available; nothing was validated
    Skipped {
        /// URL of the tarball
        url: String,
        /// Why the download was skipped
        reason: String,
    },
    /// Every attempt failed (or a non-retryable error occurred)
    Failed {
        /// URL of the tarball
        url: String,
        /// Message of the last error seen
        last_error: String,
    },
}

impl DownloadOutcome {
    /// URL of the task this outcome belongs to
    pub fn url(&self) -> &str {
        match self {
            DownloadOutcome::Succeeded { url, .. }
            | DownloadOutcome::Skipped { url, .. }
            | DownloadOutcome::Failed { url, .. } => url,
        }
    }

    /// Whether the task ended in [`DownloadOutcome::Succeeded`]
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Succeeded { .. })
    }

    /// Whether the task ended in [`DownloadOutcome::Failed`]
    pub fn is_failure(&self) -> bool {
        matches!(self, DownloadOutcome::Failed { .. })
    }
}

/// Tally of outcomes for one batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Tasks that downloaded and validated
    pub succeeded: usize,
    /// Tasks the fetcher skipped
    pub skipped: usize,
    /// Tasks that ran out of retries
    pub failed: usize,
}

impl BatchStats {
    /// Count the outcomes of a batch
    pub fn from_outcomes(outcomes: &[DownloadOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut stats, outcome| {
                match outcome {
                    DownloadOutcome::Succeeded { .. } => stats.succeeded += 1,
                    DownloadOutcome::Skipped { .. } => stats.skipped += 1,
                    DownloadOutcome::Failed { .. } => stats.failed += 1,
                }
                stats
            })
    }

    /// Number of outcomes counted
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

/// Event emitted for every state transition of a batch or a task loop
///
/// Events are observational only; nothing in the download loop depends on whether
/// anyone receives them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A batch is about to start
    BatchStarted {
        /// Number of tasks in the batch
        count: usize,
    },

    /// An attempt for a task is starting
    Downloading {
        /// Position of the task in the batch
        position: Position,
        /// Tarball URL
        url: String,
        /// Retries left after this attempt
        remaining_retries: u32,
    },

    /// Fetcher reported the tarball as already available
    Skipped {
        /// Position of the task in the batch
        position: Position,
        /// Tarball URL
        url: String,
    },

    /// Tarball downloaded and validated
    Downloaded {
        /// Position of the task in the batch
        position: Position,
        /// Tarball URL
        url: String,
        /// Where the tarball was written
        path: PathBuf,
        /// Fetch duration in milliseconds
        duration_ms: u64,
    },

    /// Downloaded file failed structural validation and was deleted
    InvalidArchive {
        /// Position of the task in the batch
        position: Position,
        /// Tarball URL
        url: String,
        /// Path of the deleted file
        path: PathBuf,
        /// Retries left before the task fails
        remaining_retries: u32,
    },

    /// An attempt failed with an error
    AttemptFailed {
        /// Position of the task in the batch
        position: Position,
        /// Tarball URL
        url: String,
        /// Error message
        error: String,
        /// Retries left before the task fails
        remaining_retries: u32,
    },

    /// The task has no retries left
    RetriesExhausted {
        /// Position of the task in the batch
        position: Position,
        /// Tarball URL
        url: String,
        /// Message of the last error
        error: String,
    },

    /// The task failed with an error that retrying cannot fix (no retries spent)
    Rejected {
        /// Position of the task in the batch
        position: Position,
        /// Tarball URL
        url: String,
        /// Error message
        error: String,
    },

    /// Every task in the batch reached a terminal outcome
    BatchFinished {
        /// Tasks that downloaded and validated
        succeeded: usize,
        /// Tasks the fetcher skipped
        skipped: usize,
        /// Tasks that ran out of retries or were rejected
        failed: usize,
    },
}

impl Event {
    /// Severity a presentation layer should tag this event with
    pub fn severity(&self) -> tracing::Level {
        match self {
            Event::BatchStarted { .. } | Event::Downloading { .. } | Event::Downloaded { .. } => {
                tracing::Level::INFO
            }
            Event::Skipped { .. } | Event::InvalidArchive { .. } | Event::AttemptFailed { .. } => {
                tracing::Level::WARN
            }
            Event::RetriesExhausted { .. } | Event::Rejected { .. } => tracing::Level::ERROR,
            Event::BatchFinished { failed, .. } => {
                if *failed > 0 {
                    tracing::Level::WARN
                } else {
                    tracing::Level::INFO
                }
            }
        }
    }

    /// Position of the task the event refers to, if it is task-scoped
    pub fn position(&self) -> Option<Position> {
        match self {
            Event::Downloading { position, .. }
            | Event::Skipped { position, .. }
            | Event::Downloaded { position, .. }
            | Event::InvalidArchive { position, .. }
            | Event::AttemptFailed { position, .. }
            | Event::RetriesExhausted { position, .. }
            | Event::Rejected { position, .. } => Some(*position),
            Event::BatchStarted { .. } | Event::BatchFinished { .. } => None,
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_renders_one_based_label() {
        assert_eq!(Position::from_offset(0, 3).to_string(), "1/3");
        assert_eq!(Position::from_offset(2, 3).to_string(), "3/3");
    }

    #[test]
    fn batch_stats_counts_each_outcome_kind() {
        let outcomes = vec![
            DownloadOutcome::Succeeded {
                url: "u1".into(),
                path: PathBuf::from("a/a.tgz"),
                duration_ms: 10,
            },
            DownloadOutcome::Skipped {
                url: "u2".into(),
                reason: "already downloaded".into(),
            },
            DownloadOutcome::Failed {
                url: "u3".into(),
                last_error: "HTTP 500".into(),
            },
            DownloadOutcome::Failed {
                url: "u4".into(),
                last_error: "HTTP 404".into(),
            },
        ];

        let stats = BatchStats::from_outcomes(&outcomes);
        assert_eq!(
            stats,
            BatchStats {
                succeeded: 1,
                skipped: 1,
                failed: 2
            }
        );
        assert_eq!(stats.total(), 4);
        assert_eq!(outcomes[2].url(), "u3");
        assert!(outcomes[0].is_success());
        assert!(outcomes[3].is_failure());
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = Event::Downloaded {
            position: Position::from_offset(0, 2),
            url: "https://r/a/-/a-1.0.tgz".into(),
            path: PathBuf::from("tarballs/a/a-1.0.tgz"),
            duration_ms: 42,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "downloaded");
        assert_eq!(json["position"]["index"], 1);
        assert_eq!(json["duration_ms"], 42);
    }

    #[test]
    fn severity_follows_transition_kind() {
        let position = Position::from_offset(0, 1);
        let url = String::from("https://r/a/-/a-1.0.tgz");

        assert_eq!(
            Event::Downloading {
                position,
                url: url.clone(),
                remaining_retries: 5
            }
            .severity(),
            tracing::Level::INFO
        );
        assert_eq!(
            Event::AttemptFailed {
                position,
                url: url.clone(),
                error: "boom".into(),
                remaining_retries: 4
            }
            .severity(),
            tracing::Level::WARN
        );
        assert_eq!(
            Event::RetriesExhausted {
                position,
                url: url.clone(),
                error: "boom".into()
            }
            .severity(),
            tracing::Level::ERROR
        );
        assert_eq!(
            Event::Rejected {
                position,
                url,
                error: "malformed URL".into()
            }
            .severity(),
            tracing::Level::ERROR
        );
        assert_eq!(
            Event::BatchFinished {
                succeeded: 1,
                skipped: 0,
                failed: 1
            }
            .severity(),
            tracing::Level::WARN
        );
    }

    #[test]
    fn batch_events_have_no_position() {
        assert_eq!(Event::BatchStarted { count: 3 }.position(), None);
        let position = Position::from_offset(1, 3);
        assert_eq!(
            Event::Skipped {
                position,
                url: "u".into()
            }
            .position(),
            Some(position)
        );
    }
}
