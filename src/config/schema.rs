use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_IDENTITY_ATTRIBUTE: &str = "feature_id";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub store: StoreConfig,
    pub identity: IdentityConfig,
    pub delta: DeltaConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Tree,
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    Daily,
    Hourly,
    Minutely,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    pub stdout_format: LogFormat,
    /// `EnvFilter` directives; `GV_LOG` still wins when set.
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            stdout_format: LogFormat::Compact,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub rotation: LogRotation,
    pub retention_max_files: Option<usize>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            format: LogFormat::Json,
            rotation: LogRotation::Daily,
            retention_max_files: Some(10),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    #[default]
    Fs,
}

impl StoreBackend {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Some(StoreBackend::Memory),
            "fs" | "file" | "filesystem" => Some(StoreBackend::Fs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Root of the filesystem store; defaults to `paths::store_dir()`.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Attribute holding a BPO's persistent feature id. `None` disables
    /// derivation; identities must then be assigned explicitly.
    pub attribute: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            attribute: Some(DEFAULT_IDENTITY_ATTRIBUTE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaConfig {
    /// Memoize computed deltas in the store.
    pub cache: bool,
}

impl Default for DeltaConfig {
    fn default() -> Self {
        Self { cache: true }
    }
}

/// One config file's worth of overrides. Absent keys leave the value from
/// lower layers untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub logging: LoggingConfigOverride,
    pub store: StoreConfigOverride,
    pub identity: IdentityConfigOverride,
    pub delta: DeltaConfigOverride,
}

impl ConfigLayer {
    pub fn apply_to(&self, target: &mut Config) {
        self.logging.apply_to(&mut target.logging);
        self.store.apply_to(&mut target.store);
        self.identity.apply_to(&mut target.identity);
        self.delta.apply_to(&mut target.delta);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfigOverride {
    pub stdout: Option<bool>,
    pub stdout_format: Option<LogFormat>,
    pub filter: Option<String>,
    pub file: Option<FileLoggingConfigOverride>,
}

impl LoggingConfigOverride {
    pub fn apply_to(&self, target: &mut LoggingConfig) {
        if let Some(stdout) = self.stdout {
            target.stdout = stdout;
        }
        if let Some(format) = self.stdout_format {
            target.stdout_format = format;
        }
        if let Some(filter) = &self.filter {
            target.filter = Some(filter.clone());
        }
        if let Some(file) = &self.file {
            file.apply_to(&mut target.file);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfigOverride {
    pub enabled: Option<bool>,
    pub dir: Option<PathBuf>,
    pub format: Option<LogFormat>,
    pub rotation: Option<LogRotation>,
    pub retention_max_files: Option<usize>,
}

impl FileLoggingConfigOverride {
    pub fn apply_to(&self, target: &mut FileLoggingConfig) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
        if let Some(dir) = &self.dir {
            target.dir = Some(dir.clone());
        }
        if let Some(format) = self.format {
            target.format = format;
        }
        if let Some(rotation) = self.rotation {
            target.rotation = rotation;
        }
        if let Some(files) = self.retention_max_files {
            target.retention_max_files = Some(files);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfigOverride {
    pub backend: Option<StoreBackend>,
    pub data_dir: Option<PathBuf>,
}

impl StoreConfigOverride {
    pub fn apply_to(&self, target: &mut StoreConfig) {
        if let Some(backend) = self.backend {
            target.backend = backend;
        }
        if let Some(dir) = &self.data_dir {
            target.data_dir = Some(dir.clone());
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfigOverride {
    /// An empty string turns derivation off.
    pub attribute: Option<String>,
}

impl IdentityConfigOverride {
    pub fn apply_to(&self, target: &mut IdentityConfig) {
        if let Some(attribute) = &self.attribute {
            let trimmed = attribute.trim();
            target.attribute = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaConfigOverride {
    pub cache: Option<bool>,
}

impl DeltaConfigOverride {
    pub fn apply_to(&self, target: &mut DeltaConfig) {
        if let Some(cache) = self.cache {
            target.cache = cache;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.store.backend, StoreBackend::Fs);
        assert_eq!(cfg.identity.attribute.as_deref(), Some("feature_id"));
        assert!(cfg.delta.cache);
        assert!(!cfg.logging.file.enabled);
    }

    #[test]
    fn partial_layer_parses_and_applies() {
        let layer: ConfigLayer = toml::from_str(
            r#"
            [store]
            backend = "memory"

            [identity]
            attribute = ""

            [logging.file]
            enabled = true
            rotation = "hourly"
            "#,
        )
        .unwrap();
        let mut cfg = Config::default();
        layer.apply_to(&mut cfg);
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.identity.attribute, None);
        assert!(cfg.logging.file.enabled);
        assert_eq!(cfg.logging.file.rotation, LogRotation::Hourly);
        assert_eq!(cfg.logging.file.format, LogFormat::Json);
        assert!(cfg.delta.cache);
    }

    #[test]
    fn backend_parse_accepts_aliases() {
        assert_eq!(StoreBackend::parse(" Memory "), Some(StoreBackend::Memory));
        assert_eq!(StoreBackend::parse("filesystem"), Some(StoreBackend::Fs));
        assert_eq!(StoreBackend::parse("s3"), None);
    }
}
