use crate::atomic::TMP_MARKER;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Staging files younger than this may belong to a concurrent writer.
const STALE_AFTER: Duration = Duration::from_secs(300);

/// Removes staging files orphaned by an interrupted earlier run below `roots`.
///
/// Best effort: failures are logged and never abort the run. Returns the number of
/// files removed.
pub async fn purge_stale_staging(roots: Vec<PathBuf>) -> usize {
    let now = SystemTime::now();

    match tokio::task::spawn_blocking(move || {
        roots.iter().map(|root| remove_stale(root, now, STALE_AFTER)).fold((0, 0), |acc, r| {
            (acc.0 + r.0, acc.1 + r.1)
        })
    })
    .await
    {
        Ok((removed, failed)) => {
            if removed > 0 || failed > 0 {
                info!(removed, failed, "Cleaned up stale staging files");
            }
            removed
        },
        Err(e) => {
            error!(error = %e, "Staging cleanup task panicked");
            0
        },
    }
}

fn remove_stale(root: &Path, now: SystemTime, threshold: Duration) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;

    WalkDir::new(root)
        .into_iter()
        .flatten()
        .filter(|entry| is_staging(entry) && is_stale(entry, now, threshold))
        .for_each(|entry| match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Failed to remove staging file");
                failed += 1;
            },
        });

    (removed, failed)
}

fn is_staging(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry.file_name().to_str().is_some_and(|name| name.contains(TMP_MARKER))
}

fn is_stale(entry: &DirEntry, now: SystemTime, threshold: Duration) -> bool {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|modified| now.duration_since(modified).ok())
        .map_or(true, |age| age > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_only_old_staging_files_are_removed() {
        let tmp = tempdir().unwrap();
        let staging = tmp.path().join(format!("items.yml{TMP_MARKER}1.1"));
        let regular = tmp.path().join("items.yml");
        fs::write(&staging, b"partial").unwrap();
        fs::write(&regular, b"ok").unwrap();

        let (removed, _) = remove_stale(tmp.path(), SystemTime::now(), STALE_AFTER);
        assert_eq!(removed, 0, "fresh staging files must survive");

        let later = SystemTime::now() + STALE_AFTER * 2;
        let (removed, failed) = remove_stale(tmp.path(), later, STALE_AFTER);
        assert_eq!((removed, failed), (1, 0));
        assert!(!staging.exists());
        assert!(regular.exists());
    }

    #[tokio::test]
    async fn test_purge_tolerates_missing_roots() {
        let tmp = tempdir().unwrap();
        assert_eq!(purge_stale_staging(vec![tmp.path().join("absent")]).await, 0);
    }
}
