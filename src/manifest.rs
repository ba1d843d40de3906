//! Dependency manifest model
//!
//! A manifest is a tree keyed by dependency name. Each node may name the URL its
//! tarball resolves to and may carry nested dependencies of the same shape; this is
//! the `dependencies` section of an npm `package-lock.json` (lockfile v1).
//! Declaration order is preserved because it determines download task order.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Ordered mapping of dependency name to node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyManifest(pub IndexMap<String, DependencyNode>);

/// One dependency in the manifest tree
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyNode {
    /// URL the dependency's tarball was resolved to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,

    /// Nested dependencies
    #[serde(default, skip_serializing_if = "DependencyManifest::is_empty")]
    pub dependencies: DependencyManifest,
}

impl DependencyNode {
    /// Node with a resolved URL and no children
    pub fn resolved(url: impl Into<String>) -> Self {
        Self {
            resolved: Some(url.into()),
            dependencies: DependencyManifest::default(),
        }
    }

    /// Resolved URL, if present and non-empty
    pub fn resolved_url(&self) -> Option<&str> {
        self.resolved.as_deref().filter(|url| !url.is_empty())
    }

    /// Attach nested dependencies
    pub fn with_dependencies(mut self, dependencies: DependencyManifest) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl DependencyManifest {
    /// Empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dependency, keeping declaration order
    pub fn insert(&mut self, name: impl Into<String>, node: DependencyNode) -> Option<DependencyNode> {
        self.0.insert(name.into(), node)
    }

    /// Whether there are no direct dependencies
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of direct dependencies
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate direct dependencies in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &DependencyNode)> {
        self.0.iter()
    }

    /// Number of nodes with a non-empty `resolved` URL, at any depth
    pub fn resolvable_count(&self) -> usize {
        self.iter()
            .map(|(_, node)| {
                usize::from(node.resolved_url().is_some()) + node.dependencies.resolvable_count()
            })
            .sum()
    }
}

impl<N: Into<String>> FromIterator<(N, DependencyNode)> for DependencyManifest {
    fn from_iter<T: IntoIterator<Item = (N, DependencyNode)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(name, node)| (name.into(), node)).collect())
    }
}

/// npm `package-lock.json`, reduced to what mirroring needs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageLock {
    /// Root package name
    #[serde(default)]
    pub name: Option<String>,

    /// Root package version
    #[serde(default)]
    pub version: Option<String>,

    /// Lockfile format version
    #[serde(default)]
    pub lockfile_version: Option<u32>,

    /// Dependency tree
    #[serde(default)]
    pub dependencies: DependencyManifest,
}

impl PackageLock {
    /// Parse a lockfile from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a lockfile from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read lockfile '{}': {}", path.display(), e),
            ))
        })?;
        let lock = Self::from_json_str(&content)?;
        if lock.dependencies.is_empty() {
            tracing::warn!(
                path = %path.display(),
                lockfile_version = ?lock.lockfile_version,
                "lockfile has no dependencies section"
            );
        }
        Ok(lock)
    }
}
