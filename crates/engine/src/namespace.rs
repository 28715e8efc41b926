//! Namespace discovery and candidate enumeration.
//!
//! Both walks are synchronous; the flattener runs them on the blocking pool. A root
//! that does not exist, or cannot be listed, simply contributes nothing.

use crate::layout::{ITEMS_PACKS, PluginLayout};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// An asset group name, taken verbatim from a directory name.
///
/// Cloning is cheap; every candidate of a namespace shares the same allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(Arc<str>);

impl Namespace {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discovered namespace and the directory holding its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDir {
    pub name: Namespace,
    pub path: PathBuf,
}

/// A file found during discovery, consumed exactly once by classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    namespace: Namespace,
    path: PathBuf,
    relative: PathBuf,
}

impl Candidate {
    /// Creates a candidate; `relative` is `path` relative to the plugin directory.
    pub fn new(namespace: Namespace, path: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self { namespace, path: path.into(), relative: relative.into() }
    }

    fn under(namespace: Namespace, path: PathBuf, plugin_root: &Path) -> Self {
        let relative = path.strip_prefix(plugin_root).map_or_else(|_| path.clone(), Path::to_path_buf);
        Self { namespace, path, relative }
    }

    #[must_use]
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path relative to the plugin directory; path heuristics match against this.
    #[must_use]
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// The final path component, lossily decoded.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

/// Lists the namespace directories of a plugin in discovery order.
///
/// 1. Sub-directories of `contents/` not starting with `reserved_prefix`.
/// 2. Sub-directories of `contents/<ns>/resourcepack/assets/` for each namespace of (1).
/// 3. Sub-directories of `data/resource_pack/assets/`.
///
/// Each group is sorted by name. A directory may appear under two namespaces (the
/// nested pack of (2) is also inside its parent of (1)); the mover tolerates the
/// second, stale enumeration.
#[must_use]
pub fn discover_namespaces(layout: &PluginLayout, reserved_prefix: &str) -> Vec<NamespaceDir> {
    let top_level: Vec<NamespaceDir> = subdirectories(layout.contents())
        .into_iter()
        .filter(|ns| reserved_prefix.is_empty() || !ns.name.as_str().starts_with(reserved_prefix))
        .collect();

    let nested: Vec<NamespaceDir> = top_level
        .iter()
        .flat_map(|ns| subdirectories(&ns.path.join("resourcepack").join("assets")))
        .collect();

    let mut namespaces = top_level;
    namespaces.extend(nested);
    namespaces.extend(subdirectories(&layout.resource_pack_assets()));

    debug!(count = namespaces.len(), "Discovered namespaces");
    namespaces
}

/// Walks every namespace recursively, then `data/items_packs/`, in file-name order.
#[must_use]
pub fn enumerate_candidates(layout: &PluginLayout, namespaces: &[NamespaceDir]) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for ns in namespaces {
        for path in walk_files(&ns.path) {
            candidates.push(Candidate::under(ns.name.clone(), path, layout.root()));
        }
    }

    let items_packs = Namespace::new(ITEMS_PACKS);
    for path in walk_files(&layout.items_packs()) {
        candidates.push(Candidate::under(items_packs.clone(), path, layout.root()));
    }

    debug!(count = candidates.len(), "Enumerated candidate files");
    candidates
}

fn subdirectories(root: &Path) -> Vec<NamespaceDir> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            warn!(path = %root.display(), error = %err, "Cannot list namespace root");
            return Vec::new();
        },
    };

    let mut dirs: Vec<NamespaceDir> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .map(|entry| NamespaceDir {
            name: Namespace::new(entry.file_name().to_string_lossy()),
            path: entry.path(),
        })
        .collect();
    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    dirs
}

fn walk_files(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(root = %root.display(), error = %err, "Skipping unreadable entry");
                None
            },
        })
        .filter(|entry| entry.path().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn names(dirs: &[NamespaceDir]) -> Vec<&str> {
        dirs.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_discovery_order_and_reserved_prefix() {
        let tmp = tempdir().unwrap();
        let layout = PluginLayout::new(tmp.path());
        let contents = layout.contents().to_path_buf();

        fs::create_dir_all(contents.join("zeta")).unwrap();
        fs::create_dir_all(contents.join("alpha/resourcepack/assets/minecraft")).unwrap();
        fs::create_dir_all(contents.join("_disabled")).unwrap();
        fs::create_dir_all(layout.resource_pack_assets().join("legacy")).unwrap();
        touch(&contents.join("stray.yml"));

        let found = discover_namespaces(&layout, "_");
        assert_eq!(names(&found), ["alpha", "zeta", "minecraft", "legacy"]);
    }

    #[test]
    fn test_missing_roots_contribute_nothing() {
        let tmp = tempdir().unwrap();
        let layout = PluginLayout::new(tmp.path().join("nowhere"));
        assert!(discover_namespaces(&layout, "_").is_empty());
        assert!(enumerate_candidates(&layout, &[]).is_empty());
    }

    #[test]
    fn test_enumeration_is_sorted_and_relative() {
        let tmp = tempdir().unwrap();
        let layout = PluginLayout::new(tmp.path());
        let ns = layout.contents().join("ns1");
        touch(&ns.join("textures/b.png"));
        touch(&ns.join("textures/a.png"));
        touch(&layout.items_packs().join("ns1/items.yml"));

        let namespaces = discover_namespaces(&layout, "_");
        let found = enumerate_candidates(&layout, &namespaces);
        let listed: Vec<(String, PathBuf)> = found
            .iter()
            .map(|c| (c.namespace().to_string(), c.relative().to_path_buf()))
            .collect();

        assert_eq!(
            listed,
            [
                ("ns1".to_owned(), PathBuf::from("contents/ns1/textures/a.png")),
                ("ns1".to_owned(), PathBuf::from("contents/ns1/textures/b.png")),
                ("items_packs".to_owned(), PathBuf::from("data/items_packs/ns1/items.yml")),
            ]
        );
    }

    #[test]
    fn test_nested_pack_files_are_enumerated_twice() {
        let tmp = tempdir().unwrap();
        let layout = PluginLayout::new(tmp.path());
        touch(&layout.contents().join("pack/resourcepack/assets/inner/sounds/hit.ogg"));

        let namespaces = discover_namespaces(&layout, "_");
        let found = enumerate_candidates(&layout, &namespaces);
        let owners: Vec<&str> = found.iter().map(|c| c.namespace().as_str()).collect();
        assert_eq!(owners, ["pack", "inner"]);
        assert_eq!(found[0].path(), found[1].path());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_enumerated() {
        let tmp = tempdir().unwrap();
        let layout = PluginLayout::new(tmp.path());
        let outside = tmp.path().join("shared/hit.ogg");
        touch(&outside);
        let ns = layout.contents().join("ns1/sfx");
        fs::create_dir_all(&ns).unwrap();
        std::os::unix::fs::symlink(&outside, ns.join("hit.ogg")).unwrap();

        let found = enumerate_candidates(&layout, &discover_namespaces(&layout, "_"));

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].relative(), Path::new("contents/ns1/sfx/hit.ogg"));
    }
}
