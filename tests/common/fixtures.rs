//! Tarball fixtures and downloader builders

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tarball_dl::{Config, FetchConfig, TarballDownloader};

/// Build a gzip-compressed npm-style tarball for `name@version`
pub fn package_tgz(name: &str, version: &str) -> Vec<u8> {
    let manifest = format!(r#"{{"name":"{name}","version":"{version}"}}"#);
    let index = format!("module.exports = '{name}';\n");

    let mut builder = tar::Builder::new(Vec::new());
    for (path, body) in [
        ("package/package.json", manifest.as_bytes()),
        ("package/index.js", index.as_bytes()),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, path, body).unwrap();
    }
    let tar = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

/// Bytes a misbehaving proxy might serve instead of a tarball
pub const HTML_ERROR_PAGE: &[u8] = b"<!doctype html><title>502 Bad Gateway</title>";

/// Real HTTP downloader writing under `base_dir`
pub fn http_downloader(base_dir: &Path) -> TarballDownloader {
    TarballDownloader::new(Config {
        base_dir: base_dir.to_path_buf(),
        fetch: FetchConfig {
            timeout: Duration::from_secs(10),
            ..Default::default()
        },
        ..Default::default()
    })
    .unwrap()
}
