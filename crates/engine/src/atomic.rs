//! Crash-safe replacement of whole files.

use crate::error::{EngineError, EngineErrorExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Marker embedded in every staging file name.
pub(crate) const TMP_MARKER: &str = ".iaflattmp.";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Writes `data` to `target` with an atomic swap.
///
/// 1. Data goes to a unique staging file next to the target (`<name>.iaflattmp.<n>`).
/// 2. The staging file takes over the target's permissions and is synced to disk.
/// 3. The staging file is renamed over the target and the directory is synced.
///
/// An interrupt therefore leaves either the old or the new content, never a mix. A
/// staging file orphaned by a crash is removed by the next run's purge.
///
/// # Errors
///
/// Returns [`EngineError::Io`] if any step fails; the staging file is removed on
/// failure.
pub async fn write_atomic(target: &Path, data: &[u8]) -> Result<(), EngineError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .await
            .context(format!("Failed to create parent of {}", target.display()))?;
    }

    let staging = staging_path(target);
    if let Err(err) = fill_staging(&staging, target, data).await {
        let _ = fs::remove_file(&staging).await;
        return Err(err);
    }

    if let Err(err) = swap(&staging, target).await {
        let _ = fs::remove_file(&staging).await;
        return Err(err);
    }

    if let Some(parent) = target.parent() {
        sync_dir(parent).await;
    }

    debug!(path = %target.display(), bytes = data.len(), "File written atomically");
    Ok(())
}

async fn fill_staging(staging: &Path, target: &Path, data: &[u8]) -> Result<(), EngineError> {
    let mut file = fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(staging)
        .await
        .context(format!("Staging file creation failed: {}", staging.display()))?;
    file.write_all(data).await.context("Write failed")?;
    if let Ok(meta) = fs::metadata(target).await {
        file.set_permissions(meta.permissions())
            .await
            .context(format!("Failed to carry over permissions of {}", target.display()))?;
    }
    file.sync_all().await.context("Disk sync failed")
}

async fn swap(staging: &Path, target: &Path) -> Result<(), EngineError> {
    match fs::rename(staging, target).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            fs::remove_file(target)
                .await
                .context(format!("Failed to replace existing file: {}", target.display()))?;
            fs::rename(staging, target).await.context(format!(
                "Atomic swap failed: {} -> {}",
                staging.display(),
                target.display()
            ))
        },
        Err(err) => Err(EngineError::Io {
            source: err,
            context: Some(
                format!("Atomic swap failed: {} -> {}", staging.display(), target.display()).into(),
            ),
        }),
    }
}

async fn sync_dir(path: &Path) {
    match fs::File::open(path).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                warn!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

/// A unique sibling path of `target` used for staging writes and cross-device copies.
pub(crate) fn staging_path(target: &Path) -> PathBuf {
    let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("iaflat");
    target.with_file_name(format!("{file_name}{TMP_MARKER}{}.{counter}", std::process::id()))
}
