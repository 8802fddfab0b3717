//! Config loading and persistence.
//!
//! Layers, lowest first: built-in defaults, the user file
//! (`$XDG_CONFIG_HOME/geoversion/config.toml`), the project file
//! (`geoversion.toml` in the cwd or an ancestor), then `GV_*` env vars.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};

mod load;
mod merge;
mod schema;

pub use load::{
    PROJECT_CONFIG_FILE, config_path, discover_project_root, find_project_root, load,
    load_for_project, load_or_init, load_project_config, load_user_config, project_config_path,
    write_config,
};
pub use merge::{apply_env_overrides, merge_layers};
pub use schema::{
    Config, ConfigLayer, DEFAULT_IDENTITY_ATTRIBUTE, DeltaConfig, DeltaConfigOverride,
    FileLoggingConfig, FileLoggingConfigOverride, IdentityConfig, IdentityConfigOverride,
    LogFormat, LogRotation, LoggingConfig, LoggingConfigOverride, StoreBackend, StoreConfig,
    StoreConfigOverride,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("failed to render config: {source}")]
    Render {
        #[source]
        source: Box<toml::ser::Error>,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn transience(&self) -> Transience {
        match self {
            ConfigError::Read { .. } | ConfigError::Write { .. } => Transience::Unknown,
            ConfigError::Parse { .. } | ConfigError::Render { .. } => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            ConfigError::Write { .. } => Effect::Unknown,
            _ => Effect::None,
        }
    }
}
