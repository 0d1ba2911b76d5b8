//! Runtime settings: built-in defaults overlaid with `HOF_*` environment
//! variables (a `.env` file is loaded first by `main`).

use std::path::PathBuf;

use config::{Config, ConfigError, Environment};
use hof_core::schemas::default_channels;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// e.g. "127.0.0.1:8080"
    pub bind_addr: String,
    /// Snapshot file for the local store; in-memory only when unset
    pub data_path: Option<PathBuf>,
    /// Comma separated in `HOF_CHANNELS`
    pub channels: Vec<String>,
    pub max_upload_bytes: usize,
    /// Decoded files kept behind object URLs at once
    pub file_cache_capacity: usize,
    /// JSON log lines instead of the human-readable format
    pub log_json: bool,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix("HOF"))
    }

    /// Same as `load`, reading variables from `vars` instead of the process.
    #[cfg(test)]
    fn from_vars(vars: std::collections::HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix("HOF").source(Some(vars)))
    }

    fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_addr", "127.0.0.1:8080")?
            .set_default("channels", default_channels())?
            .set_default("max_upload_bytes", 10_i64 * 1024 * 1024)?
            .set_default("file_cache_capacity", 256_i64)?
            .set_default("log_json", false)?
            .add_source(
                env.try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("channels"),
            )
            .build()?
            .try_deserialize()
    }
}
