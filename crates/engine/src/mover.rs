use crate::error::{EngineError, EngineErrorExt};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Result of relocating one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The source was already gone, e.g. moved through an earlier duplicate enumeration.
    SourceMissing,
}

impl MoveOutcome {
    #[must_use]
    pub const fn moved(self) -> bool {
        matches!(self, Self::Moved)
    }
}

/// Moves `src` to `dst` on the blocking pool, creating `dst`'s parents first.
///
/// The caller stays free to drive progress reporting while the rename runs. `dst` is
/// expected to come from the namer, so it never replaces a pre-existing file.
///
/// # Errors
///
/// Returns [`EngineError::Io`] if the directories cannot be created or the rename fails,
/// and [`EngineError::Task`] if the blocking task panics. A missing source is not an
/// error.
pub async fn move_file(src: &Path, dst: &Path) -> Result<MoveOutcome, EngineError> {
    let (src, dst) = (src.to_path_buf(), dst.to_path_buf());
    tokio::task::spawn_blocking(move || relocate(&src, &dst))
        .await
        .context("Move task panicked")?
}

fn relocate(src: &Path, dst: &Path) -> Result<MoveOutcome, EngineError> {
    if !src.exists() {
        trace!(src = %src.display(), "Source already moved");
        return Ok(MoveOutcome::SourceMissing);
    }

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create destination: {}", parent.display()))?;
    }

    match std::fs::rename(src, dst) {
        Ok(()) => {},
        Err(err) if err.kind() == io::ErrorKind::NotFound && !src.exists() => {
            return Ok(MoveOutcome::SourceMissing);
        },
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(src, dst)?;
        },
        Err(err) => {
            return Err(EngineError::Io {
                source: err,
                context: Some(format!("Move failed: {} -> {}", src.display(), dst.display()).into()),
            });
        },
    }

    debug!(src = %src.display(), dst = %dst.display(), "File moved");
    Ok(MoveOutcome::Moved)
}

fn copy_then_remove(src: &Path, dst: &Path) -> Result<(), EngineError> {
    let staging: PathBuf = crate::atomic::staging_path(dst);
    if let Err(err) = publish_copy(src, &staging, dst) {
        let _ = std::fs::remove_file(&staging);
        return Err(err);
    }
    std::fs::remove_file(src)
        .context(format!("Failed to remove moved source: {}", src.display()))?;
    Ok(())
}

/// Copies `src` to `staging`, syncs it and renames it onto `dst`.
fn publish_copy(src: &Path, staging: &Path, dst: &Path) -> Result<(), EngineError> {
    std::fs::copy(src, staging)
        .context(format!("Cross-device copy failed: {} -> {}", src.display(), staging.display()))?;
    std::fs::File::open(staging)
        .and_then(|file| file.sync_all())
        .context(format!("Disk sync failed: {}", staging.display()))?;
    std::fs::rename(staging, dst).context(format!("Failed to publish copy: {}", dst.display()))
}
