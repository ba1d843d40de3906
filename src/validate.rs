//! Structural archive validation
//!
//! A tarball is accepted when every entry header in it can be read. Contents are
//! never extracted and never checked against a digest.

use crate::error::Result;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check that a downloaded file is a readable archive
///
/// A malformed archive is reported as `Ok(false)` and the file is removed before
/// returning. `Err` is reserved for filesystem failures unrelated to the format.
pub trait ArchiveValidator: Send + Sync {
    /// Validate the archive at `path`, deleting it if it is malformed
    fn validate(&self, path: &Path) -> Result<bool>;
}

/// Validator for `.tgz` / `.tar.gz` tarballs (plain `.tar` is accepted too)
#[derive(Clone, Copy, Debug, Default)]
pub struct TarballValidator;

impl TarballValidator {
    /// List every entry, returning the parser error of the first bad one
    pub fn list_entries(path: &Path) -> io::Result<usize> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut magic = [0u8; 2];
        let read = read_prefix(&mut reader, &mut magic)?;
        let prefix = io::Cursor::new(magic[..read].to_vec());
        let stream = prefix.chain(reader);

        if read == GZIP_MAGIC.len() && magic == GZIP_MAGIC {
            count_entries(GzDecoder::new(stream))
        } else {
            count_entries(stream)
        }
    }
}

impl ArchiveValidator for TarballValidator {
    fn validate(&self, path: &Path) -> Result<bool> {
        match Self::list_entries(path) {
            Ok(entries) => {
                debug!(path = %path.display(), entries, "archive is readable");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "archive to validate does not exist");
                Ok(false)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid archive, deleting");
                remove_if_present(path)?;
                Ok(false)
            }
        }
    }
}

fn count_entries<R: Read>(reader: R) -> io::Result<usize> {
    let mut archive = tar::Archive::new(reader);
    let mut count = 0;
    for entry in archive.entries()? {
        let entry = entry?;
        entry.path()?;
        count += 1;
    }
    if count == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "archive contains no entries",
        ));
    }
    Ok(count)
}

fn read_prefix<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
