//! Literal substitution of old names in text files after the move phase.
//!
//! All keys of a [`RenameMapping`] are compiled into one alternation, longest key
//! first, and applied in a single left-to-right pass. Matching is plain substring
//! matching with no word boundaries, so a key inside a longer token is replaced as
//! well. Replacement text is never re-scanned.

use crate::atomic::write_atomic;
use crate::error::{EngineError, EngineErrorExt};
use crate::mapping::RenameMapping;
use crate::report::SkipReason;
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Extensions treated as rewritable text, compared case-insensitively.
pub const TEXT_EXTENSIONS: [&str; 5] = ["json", "yml", "yaml", "mcmeta", "txt"];

const PATTERN_SIZE_LIMIT: usize = 256 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    Updated,
    Unchanged,
    Skipped(SkipReason),
}

impl RewriteOutcome {
    #[must_use]
    pub const fn updated(self) -> bool {
        matches!(self, Self::Updated)
    }
}

/// A compiled, read-only view of a [`RenameMapping`].
#[derive(Debug, Clone)]
pub struct ReferenceRewriter {
    pattern: Option<Regex>,
    replacements: HashMap<String, String>,
}

impl ReferenceRewriter {
    /// Compiles the mapping. An empty mapping yields a rewriter that changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Pattern`] if the alternation cannot be compiled.
    pub fn new(mapping: &RenameMapping) -> Result<Self, EngineError> {
        let replacements: HashMap<String, String> =
            mapping.iter().map(|(old, new)| (old.to_owned(), new.to_owned())).collect();
        if replacements.is_empty() {
            return Ok(Self { pattern: None, replacements });
        }

        let mut keys: Vec<&str> = replacements.keys().map(String::as_str).collect();
        keys.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = keys.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");

        let pattern = RegexBuilder::new(&alternation)
            .size_limit(PATTERN_SIZE_LIMIT)
            .dfa_size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .context(format!("Failed to compile {} rename keys", keys.len()))?;

        debug!(keys = keys.len(), "Reference rewriter compiled");
        Ok(Self { pattern: Some(pattern), replacements })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }

    /// Applies every substitution; borrows the input when nothing matched.
    #[must_use]
    pub fn rewrite_str<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let Some(pattern) = &self.pattern else {
            return Cow::Borrowed(text);
        };
        pattern.replace_all(text, |caps: &regex::Captures<'_>| {
            let key = &caps[0];
            self.replacements.get(key).map_or_else(|| key.to_owned(), Clone::clone)
        })
    }

    /// Rewrites one file in place, writing only when the content changed.
    pub async fn rewrite_file(&self, path: &Path) -> RewriteOutcome {
        if self.is_empty() {
            return RewriteOutcome::Unchanged;
        }

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Skipping unreadable text file");
                return RewriteOutcome::Skipped(SkipReason::Unreadable);
            },
        };

        let rewritten = match self.rewrite_str(&text) {
            Cow::Borrowed(_) => {
                trace!(path = %path.display(), "No references");
                return RewriteOutcome::Unchanged;
            },
            Cow::Owned(rewritten) if rewritten == text => return RewriteOutcome::Unchanged,
            Cow::Owned(rewritten) => rewritten,
        };

        let target = match tokio::fs::canonicalize(path).await {
            Ok(target) => target,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Skipping unresolvable text file");
                return RewriteOutcome::Skipped(SkipReason::Unreadable);
            },
        };

        match write_atomic(&target, rewritten.as_bytes()).await {
            Ok(()) => {
                debug!(path = %path.display(), "References updated");
                RewriteOutcome::Updated
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to persist rewritten file");
                RewriteOutcome::Skipped(SkipReason::WriteFailed)
            },
        }
    }
}

/// Lists every rewritable text file below `roots`, each root in file-name order.
///
/// Symlinked files are included. A file reachable through two nested roots or
/// through a link is listed once, under the first path seen.
#[must_use]
pub fn collect_text_files(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = fxhash::FxHashSet::default();
    roots
        .iter()
        .filter(|root| root.is_dir())
        .flat_map(|root| WalkDir::new(root).sort_by_file_name().into_iter().flatten())
        .filter(|entry| is_text_file(entry.path()) && entry.path().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| seen.insert(std::fs::canonicalize(path).unwrap_or_else(|_| path.clone())))
        .collect()
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEXT_EXTENSIONS.iter().any(|t| ext.eq_ignore_ascii_case(t)))
}
