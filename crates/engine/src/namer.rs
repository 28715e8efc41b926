use fxhash::FxHashSet;
use std::path::{Path, PathBuf};

/// Returns `{namespace}_{stem}{ext}`, or `{namespace}_{stem}_{n}{ext}` with the smallest
/// `n >= 1` that is free, for a file about to land in `dest`.
///
/// Existence is re-checked for every synthesized name, so the result never names a file
/// that exists in `dest` at call time.
#[must_use]
pub fn safe_name(namespace: &str, file_name: &str, dest: &Path) -> String {
    first_free(namespace, file_name, |candidate| dest.join(candidate).exists())
}

/// Hands out destination names for a whole run.
///
/// Moves may still be in flight when the next name is chosen, so on top of the disk
/// check every name handed out earlier stays reserved.
#[derive(Debug, Default)]
pub struct NameAllocator {
    claimed: FxHashSet<PathBuf>,
}

impl NameAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks a free name in `dest` and reserves it; see [`safe_name`].
    pub fn allocate(&mut self, namespace: &str, file_name: &str, dest: &Path) -> String {
        let name = first_free(namespace, file_name, |candidate| {
            let target = dest.join(candidate);
            self.claimed.contains(&target) || target.exists()
        });
        self.claimed.insert(dest.join(&name));
        name
    }

    /// Number of names reserved so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claimed.len()
    }
}

fn first_free(namespace: &str, file_name: &str, taken: impl Fn(&str) -> bool) -> String {
    let (stem, ext) = split_extension(file_name);

    let mut name = format!("{namespace}_{stem}{ext}");
    let mut n = 1u64;
    while taken(&name) {
        name = format!("{namespace}_{stem}_{n}{ext}");
        n += 1;
    }
    name
}

/// Splits off the last extension, keeping the dot. Leading dots belong to the stem, so
/// `.hidden` has no extension and `a.tar.gz` splits into `a.tar` + `.gz`.
#[must_use]
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if file_name[..idx].chars().any(|c| c != '.') => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}
