//! XDG directory helpers for config/data locations.

use std::path::PathBuf;

const APP_DIR: &str = "geoversion";

/// Base directory for persistent data.
///
/// Uses `GV_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/geoversion` or
/// `~/.local/share/geoversion`.
pub fn data_dir() -> PathBuf {
    data_dir_from(|key| std::env::var(key).ok())
}

/// Default root of the filesystem store.
pub fn store_dir() -> PathBuf {
    data_dir().join("store")
}

/// Default directory for rolling log files.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Base directory for configuration files.
///
/// Uses `GV_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/geoversion` or
/// `~/.config/geoversion`.
pub fn config_dir() -> PathBuf {
    config_dir_from(|key| std::env::var(key).ok())
}

fn data_dir_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    resolve(&lookup, "GV_DATA_DIR", "XDG_DATA_HOME", &[".local", "share"])
}

fn config_dir_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    resolve(&lookup, "GV_CONFIG_DIR", "XDG_CONFIG_HOME", &[".config"])
}

fn resolve(
    lookup: &impl Fn(&str) -> Option<String>,
    explicit: &str,
    xdg: &str,
    home_fallback: &[&str],
) -> PathBuf {
    if let Some(dir) = lookup(explicit)
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    lookup(xdg)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
            home_fallback.iter().fold(home, |path, part| path.join(part))
        })
        .join(APP_DIR)
}
