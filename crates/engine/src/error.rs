use std::borrow::Cow;

/// A specialized [`EngineError`] enum of this crate.
///
/// Only run-level failures surface as this type. Per-file problems (an unreadable
/// config, a malformed manifest, a source that vanished) are reported as outcomes
/// and never abort a batch.
#[iaflat_derive::iaflat_error]
pub enum EngineError {
    #[error("ItemsAdder plugin directory not found{}: {message}", format_context(.context))]
    PluginNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Manifest decode failure{}: {source}", format_context(.context))]
    Decode { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Configuration error{}: {source}", format_context(.context))]
    Config { source: ::config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Rename pattern error{}: {source}", format_context(.context))]
    Pattern { source: regex::Error, context: Option<Cow<'static, str>> },

    #[error("Worker task failure{}: {source}", format_context(.context))]
    Task { source: tokio::task::JoinError, context: Option<Cow<'static, str>> },

    #[error("Internal engine error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
