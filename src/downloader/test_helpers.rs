//! Shared test helpers: scripted fetchers, counting validators and tarball fixtures.

use crate::config::Config;
use crate::downloader::TarballDownloader;
use crate::error::{Error, Result};
use crate::fetch::{FetchOutcome, Fetcher};
use crate::types::Event;
use crate::validate::{ArchiveValidator, TarballValidator};
use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What one scripted fetch does
#[derive(Clone, Debug)]
pub(crate) enum Step {
    /// Write a valid tarball and report it
    Valid,
    /// Write garbage and report it
    Corrupt,
    /// Report the skip sentinel without touching disk
    Skip,
    /// Return an error with this message
    Fail(&'static str),
    /// Return an error that carries no message
    Opaque,
    /// Report completion without writing anything
    Vanish,
}

/// Fetcher that replays a per-URL script; once a script runs out the last step repeats
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<HashMap<String, usize>>,
    /// Reported fetch duration
    pub(crate) duration: Duration,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self {
            duration: Duration::from_millis(25),
            ..Default::default()
        }
    }

    pub(crate) fn script(self, url: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), steps.into_iter().collect());
        self
    }

    pub(crate) fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn next_step(&self, url: &str) -> Step {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .get_mut(url)
            .unwrap_or_else(|| panic!("no script for {url}"));
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, directory: &Path, filename: &str) -> Result<FetchOutcome> {
        let step = self.next_step(url);
        let path = directory.join(filename);
        match step {
            Step::Valid => {
                std::fs::create_dir_all(directory)?;
                std::fs::write(&path, valid_tgz())?;
            }
            Step::Corrupt => {
                std::fs::create_dir_all(directory)?;
                std::fs::write(&path, b"<html>503 Service Unavailable</html>")?;
            }
            Step::Skip => return Ok(FetchOutcome::Skipped),
            Step::Fail(message) => return Err(Error::other(message)),
            Step::Opaque => return Err(Error::other("")),
            Step::Vanish => {}
        }
        Ok(FetchOutcome::Completed {
            path,
            duration: self.duration,
        })
    }
}

/// Real tarball validator that counts how often it runs
#[derive(Default)]
pub(crate) struct CountingValidator {
    calls: AtomicUsize,
}

impl CountingValidator {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArchiveValidator for CountingValidator {
    fn validate(&self, path: &Path) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TarballValidator.validate(path)
    }
}

/// A small but well-formed npm-style tarball
pub(crate) fn valid_tgz() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let body = br#"{"name":"fixture","version":"1.0.0"}"#;
    let mut header = tar::Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o644);
    builder
        .append_data(&mut header, "package/package.json", &body[..])
        .unwrap();
    let tar = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

/// Downloader over a scripted fetcher, writing under a fresh temp dir
pub(crate) fn create_test_downloader(
    fetcher: Arc<ScriptedFetcher>,
) -> (TarballDownloader, Arc<CountingValidator>, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = Config {
        base_dir: temp_dir.path().join("tarballs"),
        ..Default::default()
    };
    let validator = Arc::new(CountingValidator::default());
    let downloader = TarballDownloader::with_components(config, fetcher, validator.clone());
    (downloader, validator, temp_dir)
}

/// Drain every event currently buffered in a receiver
pub(crate) fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
