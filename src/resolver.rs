//! Turn manifests and URL lists into download tasks

use crate::error::{Error, Result};
use crate::manifest::DependencyManifest;
use crate::types::DownloadTask;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Registry path separator between the package name and the tarball file name
const TARBALL_SEPARATOR: &str = "/-/";

/// Walk a manifest depth-first (parent before children, declaration order) and
/// emit one task per node with a non-empty `resolved` URL.
///
/// Nodes without a URL emit nothing but their children are still visited. The
/// target subdirectory is the dependency name.
pub fn resolve_from_manifest(manifest: &DependencyManifest) -> Vec<DownloadTask> {
    let mut tasks = Vec::with_capacity(manifest.resolvable_count());
    collect_tasks(manifest, &mut tasks);
    tasks
}

fn collect_tasks(manifest: &DependencyManifest, tasks: &mut Vec<DownloadTask>) {
    for (name, node) in manifest.iter() {
        if let Some(url) = node.resolved_url() {
            tasks.push(DownloadTask::new(url, name.as_str()));
        }
        if !node.dependencies.is_empty() {
            collect_tasks(&node.dependencies, tasks);
        }
    }
}

/// Build one task per URL, deriving the subdirectory from the URL path.
///
/// Fails on the first URL that cannot be parsed or yields no directory name;
/// nothing is downloaded in that case.
pub fn resolve_from_urls<I>(urls: I) -> Result<Vec<DownloadTask>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    urls.into_iter()
        .map(|url| {
            let url = url.as_ref();
            Ok(DownloadTask::new(url, directory_for_url(url)?))
        })
        .collect()
}

/// Subdirectory for a registry tarball URL: the path before the first `/-/`,
/// without its leading `/`. A path with no separator is used whole.
///
/// ```
/// use tarball_dl::resolver::directory_for_url;
///
/// let dir = directory_for_url("https://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz").unwrap();
/// assert_eq!(dir, "left-pad");
/// ```
pub fn directory_for_url(url: &str) -> Result<String> {
    let parsed = parse(url)?;
    let path = parsed.path();
    let head = path.split(TARBALL_SEPARATOR).next().unwrap_or(path);
    let directory = head.strip_prefix('/').unwrap_or(head);

    if directory.is_empty() {
        return Err(Error::malformed_url(url, "URL path names no package directory"));
    }
    Ok(directory.to_string())
}

/// Directory a task writes into: `base_dir` joined with the task's subdirectory.
///
/// The subdirectory is always taken as relative. Root and drive prefixes are
/// dropped, so `/tmp/evil` lands in `<base_dir>/tmp/evil`. A `..` component is
/// rejected since it could climb out of `base_dir`.
pub fn target_directory(base_dir: &Path, subdirectory: &str) -> Result<PathBuf> {
    let mut directory = base_dir.to_path_buf();
    for component in Path::new(subdirectory).components() {
        match component {
            Component::Normal(part) => directory.push(part),
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::UnsafeTarget {
                    subdirectory: subdirectory.to_string(),
                    reason: "parent directory components are not allowed".to_string(),
                });
            }
        }
    }
    Ok(directory)
}

/// File name a tarball is saved under: the last segment of the URL path.
pub fn archive_file_name(url: &str) -> Result<String> {
    let parsed = parse(url)?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::malformed_url(url, "URL path has no file name"))
}

fn parse(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| Error::malformed_url(url, e.to_string()))?;
    if parsed.cannot_be_a_base() {
        return Err(Error::malformed_url(url, "URL has no hierarchical path"));
    }
    Ok(parsed)
}
