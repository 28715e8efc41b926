use iaflat_engine::{Phase, ProgressSink};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;

const TEMPLATE: &str =
    "{msg:<20} [{bar:40.cyan/blue}] {percent:>3}% {pos}/{len} eta {eta} elapsed {elapsed}";

/// Live progress bars on stderr, one per phase; notices go to stdout.
#[derive(Debug)]
pub struct ConsoleProgress {
    bar: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl ConsoleProgress {
    #[must_use]
    pub const fn new() -> Self {
        Self { bar: Mutex::new(None), hidden: false }
    }

    /// Tracks progress without drawing anything.
    #[must_use]
    pub const fn hidden() -> Self {
        Self { bar: Mutex::new(None), hidden: true }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock()
            && let Some(bar) = guard.as_ref()
        {
            f(bar);
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn begin(&self, phase: Phase, total: u64) {
        let bar = if self.hidden {
            ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::hidden())
        } else {
            ProgressBar::new(total)
        };
        bar.set_style(Self::style());
        bar.set_message(phase.to_string());

        if let Ok(mut guard) = self.bar.lock()
            && let Some(previous) = guard.replace(bar)
        {
            previous.finish();
        }
    }

    fn advance(&self, _phase: Phase, delta: u64) {
        self.with_bar(|bar| bar.inc(delta));
    }

    fn finish(&self, _phase: Phase) {
        if let Ok(mut guard) = self.bar.lock()
            && let Some(bar) = guard.take()
        {
            bar.finish();
        }
    }

    fn notice(&self, message: &str) {
        if self.hidden {
            return;
        }
        let guard = self.bar.lock().ok();
        match guard.as_ref().and_then(|bar| bar.as_ref()) {
            Some(bar) => bar.suspend(|| println!("{message}")),
            None => println!("{message}"),
        }
    }
}
