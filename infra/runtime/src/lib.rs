//! # Runtime
//!
//! Tokio runtime profiles for the iaflat tools.
//!
//! The flattening engine dispatches every file move and rewrite as an independent unit
//! of work, most of it on Tokio's blocking pool. The profiles here decide how much of
//! that work actually runs in parallel:
//!
//! * **Default**: multi-threaded scheduler sized to the machine.
//! * **Parallel**: multi-threaded scheduler with a wider blocking pool, for large packs
//!   on fast disks. The `iaflat` binary runs on this profile.
//!
//! ## Example
//!
//! ```rust,ignore
//! #[iaflat_runtime::main(parallel)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use iaflat_derive::main;

use anyhow::anyhow;
use std::{thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// The number of worker threads used if detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
/// Tokio's own default for the blocking pool.
const DEFAULT_BLOCKING_THREADS: usize = 512;
/// Upper bound for any thread count coming from the environment.
const MAX_THREADS: usize = 1024;
/// How long an idle blocking thread stays alive.
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(10);

/// Configuration for the Tokio runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub max_blocking_threads: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: detect_worker_threads(),
            max_blocking_threads: DEFAULT_BLOCKING_THREADS,
            thread_name: "iaflat-worker".to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }
}

impl RuntimeConfig {
    /// Preset for large asset trees where many moves can be in flight at once.
    #[must_use = "Use this configuration for I/O heavy runs"]
    pub fn parallel() -> Self {
        let workers = detect_worker_threads();
        Self {
            worker_threads: workers,
            max_blocking_threads: (workers * 16).clamp(16, MAX_THREADS),
            thread_name: "iaflat-io".to_owned(),
            ..Self::default()
        }
    }
}

/// Detects the number of worker threads from `TOKIO_WORKER_THREADS` or the hardware.
fn detect_worker_threads() -> usize {
    std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0 && n <= MAX_THREADS)
        .unwrap_or_else(|| {
            available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
        })
}

/// Builds a Tokio runtime from a [`RuntimeConfig`].
///
/// I/O and timer drivers are always enabled; the signal driver is needed for
/// interrupt handling in the CLI.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the OS refuses to create the runtime threads.
pub fn build_runtime(config: &RuntimeConfig) -> Result<Runtime> {
    debug!(config = ?config, "Building tokio runtime");

    let mut builder = Builder::new_multi_thread();
    builder
        .worker_threads(config.worker_threads.clamp(1, MAX_THREADS))
        .thread_name(&config.thread_name)
        .max_blocking_threads(config.max_blocking_threads.clamp(1, MAX_THREADS))
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all();

    builder.build().map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_runs_blocking_work() {
        let rt = build_runtime(&RuntimeConfig::default()).unwrap();
        let value = rt.block_on(async { tokio::task::spawn_blocking(|| 21 * 2).await.unwrap() });
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parallel_profile_has_wider_blocking_pool() {
        let config = RuntimeConfig::parallel();
        assert!(config.max_blocking_threads >= 16);
        assert!(config.max_blocking_threads <= MAX_THREADS);
        assert_eq!(config.thread_name, "iaflat-io");
        assert!(build_runtime(&config).is_ok());
    }
}
