//! Layered configuration for the task manager, loaded with figment.
//!
//! Sources, highest priority first:
//! 1. Environment variables with the `TASKERS_` prefix (`TASKERS_STORE_PATH`, ...)
//! 2. `taskers.toml` in the working directory
//! 3. Built-in defaults

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, StoreError};
use crate::store::TaskStore;

pub const CONFIG_FILE: &str = "taskers.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// JSON document holding every task.
    pub store_path: PathBuf,
    /// File the tracing subscriber writes to; the terminal belongs to the UI.
    pub log_file: PathBuf,
    /// `EnvFilter` directive, e.g. `info` or `taskers=debug`.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data/tasks.json"),
            log_file: PathBuf::from("taskers.log"),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(Path::new(CONFIG_FILE))
            .extract()
            .map_err(ConfigError::from)
    }

    pub fn figment(config_file: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if config_file.exists() {
            figment = figment.merge(Toml::file(config_file));
        }
        figment.merge(Env::prefixed("TASKERS_"))
    }

    pub fn store(&self) -> Result<TaskStore, StoreError> {
        TaskStore::open(&self.store_path)
    }
}
