use strum_macros::{Display, EnumIter};

/// A reporting phase with a known total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Phase {
    #[strum(to_string = "Flattening...")]
    Flattening,
    #[strum(to_string = "Updating configs...")]
    UpdatingConfigs,
}

/// Receives progress from a run.
///
/// Calls arrive from the single coordinating task, one at a time and in phase order:
/// `begin`, any number of `advance`, then `finish`. Notices may arrive between phases.
pub trait ProgressSink: Send + Sync {
    fn begin(&self, phase: Phase, total: u64);

    fn advance(&self, phase: Phase, delta: u64);

    fn finish(&self, phase: Phase);

    /// A one-line operator message, e.g. `Merged sounds.json -> <path>`.
    fn notice(&self, message: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn begin(&self, _phase: Phase, _total: u64) {}

    fn advance(&self, _phase: Phase, _delta: u64) {}

    fn finish(&self, _phase: Phase) {}

    fn notice(&self, _message: &str) {}
}
