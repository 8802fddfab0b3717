use std::path::PathBuf;

use super::schema::StoreBackend;
use super::{Config, ConfigLayer};

pub fn merge_layers(user: Option<ConfigLayer>, project: Option<ConfigLayer>) -> Config {
    let mut config = Config::default();
    if let Some(layer) = user {
        layer.apply_to(&mut config);
    }
    if let Some(layer) = project {
        layer.apply_to(&mut config);
    }
    config
}

pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply `GV_*` overrides read through `lookup`. Blank values are ignored;
/// unparseable ones are ignored with a warning.
pub(crate) fn apply_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| {
        lookup(key)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
    };

    if let Some(dir) = var("GV_DATA_DIR") {
        config.store.data_dir = Some(PathBuf::from(dir));
    }

    if let Some(raw) = var("GV_STORE_BACKEND") {
        match StoreBackend::parse(&raw) {
            Some(backend) => config.store.backend = backend,
            None => tracing::warn!("invalid GV_STORE_BACKEND `{raw}`, ignoring"),
        }
    }

    if let Some(attribute) = var("GV_IDENTITY_ATTRIBUTE") {
        config.identity.attribute = Some(attribute);
    }

    if let Some(raw) = var("GV_DELTA_CACHE") {
        match parse_bool(&raw) {
            Some(cache) => config.delta.cache = cache,
            None => tracing::warn!("invalid GV_DELTA_CACHE `{raw}`, ignoring"),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
