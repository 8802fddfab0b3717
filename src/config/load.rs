use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::merge::{apply_env_overrides, merge_layers};
use super::{Config, ConfigError, ConfigLayer};

pub const PROJECT_CONFIG_FILE: &str = "geoversion.toml";

pub fn config_path() -> PathBuf {
    crate::paths::config_dir().join("config.toml")
}

pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_CONFIG_FILE)
}

/// Nearest directory at or above the cwd holding a `geoversion.toml`.
pub fn discover_project_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_project_root(&cwd)
}

pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| project_config_path(dir).is_file())
        .map(Path::to_path_buf)
}

pub fn load_user_config() -> Result<Option<ConfigLayer>, ConfigError> {
    read_layer(&config_path())
}

pub fn load_project_config(project_root: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    read_layer(&project_config_path(project_root))
}

fn read_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
}

pub fn load() -> Result<Config, ConfigError> {
    load_for_project(discover_project_root().as_deref())
}

pub fn load_for_project(project_root: Option<&Path>) -> Result<Config, ConfigError> {
    let user = load_user_config()?;
    let project = match project_root {
        Some(root) => load_project_config(root)?,
        None => None,
    };
    let mut config = merge_layers(user, project);
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Load config, falling back to defaults on error, and write a default user
/// config file if none exists yet.
pub fn load_or_init() -> Config {
    let path = config_path();
    let had_user_config = path.exists();

    let config = match load() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("config load failed, using defaults: {e}");
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            cfg
        }
    };

    if !had_user_config && let Err(e) = write_config(&path, &Config::default()) {
        tracing::warn!("failed to write default config: {e}");
    }

    config
}

pub fn write_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(cfg).map_err(|source| ConfigError::Render {
        source: Box::new(source),
    })?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let io_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(io_err)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    temp.write_all(contents.as_bytes()).map_err(io_err)?;
    temp.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}
