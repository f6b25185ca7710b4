//! Process configuration.
//!
//! Read once at startup from a single file (JSON by default, any format the
//! `config` crate recognises by extension), then overlaid with `USERBASE__*`
//! environment variables:
//!
//! ```json
//! { "server": "sqlite://users.db", "database": "app" }
//! ```

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "conf.json";

/// Env var naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "USERBASE_CONFIG";

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// Storage connection string: `mongodb://…`, `sqlite://users.db` or `memory://`.
    pub server: String,
    /// Logical database name inside that storage.
    pub database: String,
    /// Socket address the HTTP server binds.
    pub listen: String,
    /// How long to wait for a storage connection.
    pub connect_timeout_secs: u64,
    /// Largest request body the server buffers.
    pub max_body_bytes: usize,
}

/// The subset of [`Settings`] the storage layer needs.
#[derive(Clone, Debug)]
pub struct StorageSettings {
    pub server: String,
    pub database: String,
    pub connect_timeout_secs: u64,
}

impl Settings {
    /// Loads `path`. A missing file, a parse error or a missing required
    /// key is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("listen", "0.0.0.0:3000")?
            .set_default("connect_timeout_secs", 20)?
            .set_default("max_body_bytes", 1024 * 1024)?
            .add_source(File::from(path.as_ref()).required(true))
            .add_source(Environment::with_prefix("USERBASE").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// `$USERBASE_CONFIG`, falling back to [`DEFAULT_CONFIG_PATH`].
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn storage(&self) -> StorageSettings {
        StorageSettings {
            server: self.server.clone(),
            database: self.database.clone(),
            connect_timeout_secs: self.connect_timeout_secs,
        }
    }
}
