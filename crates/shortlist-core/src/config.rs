//! Settings, loaded through the `config` crate.
//!
//! Layering (later wins):
//! 1. built-in defaults
//! 2. an optional config file (`shortlist.toml` unless a path is given)
//! 3. environment variables prefixed `SHORTLIST__`, `__` as separator
//!    (e.g. `SHORTLIST__ORCHESTRATOR__MAX_CONCURRENCY=8`)

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::errors::{CoreError, CoreResult};

pub const DEFAULT_CONFIG_FILE: &str = "shortlist.toml";
pub const ENV_PREFIX: &str = "SHORTLIST";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub orchestrator: OrchestratorSettings,
    pub scoring: ScoringSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Soft cap on simultaneously running units per coordinator.
    pub max_concurrency: usize,
    /// Per-unit deadline; `None` disables it.
    pub task_timeout_secs: Option<u64>,
    /// Default `top_n` when a request does not name one.
    pub shortlist_size: usize,
    /// Limit passed to each source query.
    pub max_records_per_source: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 3,
            task_timeout_secs: Some(300),
            shortlist_size: 10,
            max_records_per_source: 50,
        }
    }
}

impl OrchestratorSettings {
    pub fn task_timeout(&self) -> Option<Duration> {
        self.task_timeout_secs.map(Duration::from_secs)
    }
}

/// Concrete scoring backend, chosen once at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringBackend {
    #[default]
    Keyword,
    Neutral,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub backend: ScoringBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load from `shortlist.toml` (if present) and the environment.
    pub fn load() -> CoreResult<Self> {
        Self::load_from(None)
    }

    /// Load from an explicit file (must exist) or the default one (optional).
    pub fn load_from(path: Option<&Path>) -> CoreResult<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!(?settings, "settings loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> CoreResult<()> {
        let o = &self.orchestrator;
        if o.max_concurrency == 0 {
            return Err(CoreError::Config(
                "orchestrator.max_concurrency must be at least 1".to_string(),
            ));
        }
        if o.task_timeout_secs == Some(0) {
            return Err(CoreError::Config(
                "orchestrator.task_timeout_secs must be positive (omit it to disable)".to_string(),
            ));
        }
        if o.max_records_per_source == 0 {
            return Err(CoreError::Config(
                "orchestrator.max_records_per_source must be at least 1".to_string(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(CoreError::Config("logging.level must not be empty".to_string()));
        }
        Ok(())
    }
}
