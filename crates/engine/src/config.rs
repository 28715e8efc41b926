use crate::error::{EngineError, EngineErrorExt};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default location of the optional configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "iaflat.toml";
/// Prefix of environment overrides (`IAFLAT__CONCURRENCY=4`).
pub const ENV_PREFIX: &str = "IAFLAT";

/// Settings of a flattening run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlattenConfig {
    /// Plugin directory, relative to the base directory of the run.
    pub plugin_dir: PathBuf,
    /// `contents/` sub-directories starting with this prefix are not namespaces.
    pub reserved_prefix: String,
    /// Maximum number of move or rewrite units in flight.
    pub concurrency: usize,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            plugin_dir: PathBuf::from("plugins").join("ItemsAdder"),
            reserved_prefix: "_".to_owned(),
            concurrency: 16,
        }
    }
}

impl FlattenConfig {
    /// The effective concurrency; zero is treated as one.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

/// Loads a [`FlattenConfig`] from an optional file layered under environment overrides.
///
/// 1. **File**: `path` if given (must exist), otherwise `iaflat.toml` in the working
///    directory when present. Any format the `config` crate understands may be used.
/// 2. **Environment**: variables prefixed with `IAFLAT__` override the file
///    (e.g. `IAFLAT__RESERVED_PREFIX=.`).
///
/// Fields missing from every source keep their defaults.
///
/// # Errors
///
/// Returns [`EngineError::Config`] if an explicitly requested file is missing, a
/// source is malformed, or a value has the wrong type.
pub fn load_config(path: Option<&Path>) -> Result<FlattenConfig, EngineError> {
    load_layered(path, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).prefix_separator("__").separator("__").try_parsing(true)
}

fn load_layered(path: Option<&Path>, env: Environment) -> Result<FlattenConfig, EngineError> {
    let (file, required) = path.map_or_else(
        || (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        |p| (p.to_path_buf(), true),
    );

    if required || file.exists() {
        info!(path = %file.display(), "Loading configuration");
    }

    Config::builder()
        .add_source(File::from(file.as_path()).required(required))
        .add_source(env)
        .build()
        .context("Failed to build config")?
        .try_deserialize::<FlattenConfig>()
        .context("Failed to deserialize config")
}
