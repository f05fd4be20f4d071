//! Scheduler configuration.
//!
//! Loaded from a TOML file; every field has a default so a missing file or
//! a partial file both work:
//!
//! ```toml
//! [caps]
//! max_per_participant = 4
//! max_builds = 2
//!
//! [search]
//! node_limit = 2000000
//! time_limit_secs = 60
//!
//! [output]
//! dir = "out"
//! csv = true
//! json = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schedule::{Caps, SearchBudget};

pub const DEFAULT_CONFIG_PATH: &str = "scheduler.toml";

/// Time limit applied to web requests when the config sets no cutoff
pub const DEFAULT_SERVER_TIME_LIMIT_SECS: f64 = 30.0;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub caps: Caps,
    pub search: SearchConfig,
    pub output: OutputConfig,
}

/// Optional search cutoffs; unset means unbounded
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    pub node_limit: Option<u64>,
    pub time_limit_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub csv: bool,
    pub json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: PathBuf::from("."),
            csv: true,
            json: false,
        }
    }
}

impl SchedulerConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Uses `path` when given, otherwise `scheduler.toml` if it exists,
    /// otherwise defaults. An explicit path that cannot be read is an error.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(secs) = self.search.time_limit_secs {
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "time_limit_secs must be a non-negative number, got {secs}"
                )));
            }
        }
        Ok(())
    }

    pub fn budget(&self) -> SearchBudget {
        SearchBudget {
            node_limit: self.search.node_limit,
            time_limit: self.search.time_limit_secs.map(Duration::from_secs_f64),
        }
    }

    /// Budget for requests served over HTTP. Same as `budget`, except that a
    /// config with neither limit set gets the default time limit.
    pub fn server_budget(&self) -> SearchBudget {
        let mut budget = self.budget();
        if budget.node_limit.is_none() && budget.time_limit.is_none() {
            budget.time_limit = Some(Duration::from_secs_f64(DEFAULT_SERVER_TIME_LIMIT_SECS));
        }
        budget
    }
}
