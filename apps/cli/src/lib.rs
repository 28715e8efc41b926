//! # iaflat
//!
//! Flattens `plugins/ItemsAdder` below the working directory (or `--dir`) in place and
//! reports how many config files were updated.
//!
//! | Exit code | Meaning                              |
//! |-----------|--------------------------------------|
//! | 0         | finished                             |
//! | 1         | plugin directory missing, or failure |
//! | 130       | interrupted (Ctrl+C / SIGTERM)       |
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod args;
mod progress;

pub use args::Args;
pub use progress::ConsoleProgress;

use anyhow::{Context, Result};
use iaflat_engine::{EngineError, FlattenReport, Flattener, ProgressSink, load_config};
use iaflat_logger::Logger;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::signal;
use tracing::{info, warn};

/// Prefix of rolling log files.
pub const LOG_NAME: &str = "iaflat";
/// Exit status of an interrupted run, as shells report `128 + SIGINT`.
pub const EXIT_CANCELLED: u8 = 130;

/// How a run ended, short of a hard failure.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(FlattenReport),
    /// The configured plugin directory, relative to the base directory.
    PluginMissing(PathBuf),
    Cancelled,
}

impl RunOutcome {
    /// Prints the operator-facing result line.
    pub fn print(&self) {
        match self {
            Self::Completed(_) => {
                println!();
                println!("{}", self.message());
            },
            Self::PluginMissing(_) | Self::Cancelled => eprintln!("{}", self.message()),
        }
    }

    /// The result line, without the stream it belongs on.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Completed(report) => {
                format!("Done! Updated {} config files.", report.config_files_updated)
            },
            Self::PluginMissing(dir) => {
                format!("Error: Could not find {} directory.", display_relative(dir))
            },
            Self::Cancelled => "Cancelled by user.".to_owned(),
        }
    }

    /// Process exit status: 0, 1 or [`EXIT_CANCELLED`].
    #[must_use]
    pub const fn status(&self) -> u8 {
        match self {
            Self::Completed(_) => 0,
            Self::PluginMissing(_) => 1,
            Self::Cancelled => EXIT_CANCELLED,
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status())
    }
}

/// Initializes logging as requested on the command line.
///
/// # Errors
///
/// Fails if a global subscriber is already installed or the log directory is unusable.
pub fn init_logger(args: &Args) -> Result<Logger> {
    let builder = Logger::builder().name(LOG_NAME).verbosity(args.verbose);
    let logger = match &args.log_dir {
        Some(dir) => builder.path(dir).init(),
        None => builder.init(),
    };
    logger.context("Failed to initialize logging")
}

/// Runs one flatten pass, racing it against Ctrl+C and SIGTERM.
///
/// # Errors
///
/// See [`run_until`].
pub async fn run(args: &Args, progress: &dyn ProgressSink) -> Result<RunOutcome> {
    let shutdown = async {
        if let Err(err) = shutdown_signal().await {
            warn!(error = %err, "Signal handling failed, interrupts are not caught");
            std::future::pending::<()>().await;
        }
    };
    run_until(args, progress, shutdown).await
}

/// Runs one flatten pass until it finishes or `shutdown` resolves.
///
/// `shutdown` is polled before the run on every wake-up, so a signal handler it installs
/// is in place before any file is touched. Cancelling drops the run between two units
/// of work; finished moves stay where they are.
///
/// # Errors
///
/// Returns configuration problems and fatal engine failures. A missing plugin
/// directory is an outcome, not an error.
pub async fn run_until<S>(args: &Args, progress: &dyn ProgressSink, shutdown: S) -> Result<RunOutcome>
where
    S: Future<Output = ()>,
{
    let config = load_config(args.config.as_deref()).context("Configuration is malformed")?;
    let base = match &args.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Cannot determine working directory")?,
    };
    let plugin_dir = config.plugin_dir.clone();

    let flattener = match Flattener::builder().base_dir(&base).config(config).build() {
        Ok(flattener) => flattener,
        Err(EngineError::PluginNotFound { .. }) => return Ok(RunOutcome::PluginMissing(plugin_dir)),
        Err(err) => return Err(err.into()),
    };

    tokio::select! {
        biased;

        () = shutdown => {
            info!("Run cancelled");
            Ok(RunOutcome::Cancelled)
        },
        report = flattener.run(progress) => {
            let report = report.context("Flatten run failed")?;
            log_summary(&report);
            Ok(RunOutcome::Completed(report))
        },
    }
}

fn log_summary(report: &FlattenReport) {
    info!(
        moved = report.moved(),
        unclassified = report.unclassified,
        already_moved = report.already_moved,
        move_failures = report.move_failures,
        sound_registries = report.sound_registries_merged,
        font_lists = report.font_lists_merged,
        manifests_skipped = report.manifests_skipped,
        text_files = report.text_files_scanned,
        text_files_skipped = report.text_files_skipped,
        "Run summary"
    );
}

fn display_relative(path: &Path) -> String {
    path.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res,
        res = terminate => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iaflat_engine::{Phase, SilentProgress};
    use std::fs;
    use tempfile::tempdir;
    use tokio::sync::Notify;

    fn args_for(dir: &Path) -> Args {
        Args { dir: Some(dir.to_path_buf()), config: None, verbose: 0, log_dir: None }
    }

    /// Raises the interrupt once the first file has been moved.
    #[derive(Default)]
    struct InterruptAfterFirstMove {
        interrupt: Notify,
    }

    impl ProgressSink for InterruptAfterFirstMove {
        fn begin(&self, _phase: Phase, _total: u64) {}

        fn advance(&self, phase: Phase, _delta: u64) {
            if phase == Phase::Flattening {
                self.interrupt.notify_one();
            }
        }

        fn finish(&self, _phase: Phase) {}

        fn notice(&self, _message: &str) {}
    }

    #[test]
    fn test_outcome_messages_and_statuses() {
        assert_eq!(RunOutcome::Cancelled.message(), "Cancelled by user.");
        assert_eq!(RunOutcome::Cancelled.status(), 130);

        let missing = RunOutcome::PluginMissing(PathBuf::from("plugins/ItemsAdder"));
        assert_eq!(missing.message(), "Error: Could not find plugins/ItemsAdder directory.");
        assert_eq!(missing.status(), 1);

        let report = FlattenReport { config_files_updated: 3, ..FlattenReport::default() };
        let done = RunOutcome::Completed(report);
        assert_eq!(done.message(), "Done! Updated 3 config files.");
        assert_eq!(done.status(), 0);
    }

    #[tokio::test]
    async fn test_interrupt_keeps_finished_moves_and_leaves_the_rest() {
        let tmp = tempdir().unwrap();
        let textures = tmp.path().join("plugins/ItemsAdder/contents/ns1/textures");
        fs::create_dir_all(&textures).unwrap();
        for i in 0..40 {
            fs::write(textures.join(format!("t{i:02}.png")), b"png").unwrap();
        }
        let config = tmp.path().join("iaflat.toml");
        fs::write(&config, "concurrency = 1\n").unwrap();
        let args = Args { config: Some(config), ..args_for(tmp.path()) };
        let sink = InterruptAfterFirstMove::default();

        let outcome = run_until(&args, &sink, sink.interrupt.notified()).await.unwrap();

        assert!(matches!(outcome, RunOutcome::Cancelled));
        let dest = tmp.path().join("plugins/ItemsAdder/contents/resourcepack/assets/textures");
        assert!(dest.join("ns1_t00.png").exists());
        assert!(!textures.join("t00.png").exists());
        assert!(textures.join("t39.png").exists());
        assert!(!dest.join("ns1_t39.png").exists());
    }

    #[tokio::test]
    async fn test_interrupt_before_start_touches_nothing() {
        let tmp = tempdir().unwrap();
        let texture = tmp.path().join("plugins/ItemsAdder/contents/ns1/textures/a.png");
        fs::create_dir_all(texture.parent().unwrap()).unwrap();
        fs::write(&texture, b"png").unwrap();

        let outcome = run_until(&args_for(tmp.path()), &SilentProgress, async {}).await.unwrap();

        assert!(matches!(outcome, RunOutcome::Cancelled));
        assert!(texture.exists());
        assert!(!tmp.path().join("plugins/ItemsAdder/contents/resourcepack").exists());
    }

    #[tokio::test]
    async fn test_missing_plugin_is_an_outcome() {
        let tmp = tempdir().unwrap();
        let outcome = run(&args_for(tmp.path()), &SilentProgress).await.unwrap();
        assert!(matches!(&outcome, RunOutcome::PluginMissing(dir) if dir == Path::new("plugins/ItemsAdder")));
    }

    #[tokio::test]
    async fn test_successful_run() {
        let tmp = tempdir().unwrap();
        let texture = tmp.path().join("plugins/ItemsAdder/contents/ns1/textures/a.png");
        fs::create_dir_all(texture.parent().unwrap()).unwrap();
        fs::write(&texture, b"png").unwrap();

        let outcome = run(&args_for(tmp.path()), &SilentProgress).await.unwrap();

        let RunOutcome::Completed(report) = outcome else {
            panic!("expected a completed run, got {outcome:?}");
        };
        assert_eq!(report.moved_textures, 1);
        assert!(!texture.exists());
    }

    #[tokio::test]
    async fn test_explicit_missing_config_is_an_error() {
        let tmp = tempdir().unwrap();
        let args = Args { config: Some(tmp.path().join("nope.toml")), ..args_for(tmp.path()) };
        assert!(run(&args, &SilentProgress).await.is_err());
    }

    #[test]
    fn test_relative_dir_uses_forward_slashes() {
        let path = PathBuf::from("plugins").join("ItemsAdder");
        assert_eq!(display_relative(&path), "plugins/ItemsAdder");
    }
}
