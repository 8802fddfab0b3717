//! Tracing subscriber setup for binaries and tools embedding the crate.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the embedding program calls [`init`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{FileLoggingConfig, LogFormat, LogRotation, LoggingConfig};
use crate::paths;

const LOG_FILE_PREFIX: &str = "geoversion.log";
const FILTER_ENV_VAR: &str = "GV_LOG";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// 0 = errors, 1 = info, 2+ = debug. Ignored when a filter is given.
    pub verbosity: u8,
    pub logging: LoggingConfig,
}

impl TelemetryConfig {
    pub fn new(verbosity: u8, logging: LoggingConfig) -> Self {
        Self { verbosity, logging }
    }
}

/// Keeps the non-blocking file writer flushing; drop it last.
pub struct TelemetryGuard {
    _guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
}

/// Install the global subscriber. Fails quietly (with a warning once
/// installed) if the log directory cannot be prepared.
pub fn init(config: TelemetryConfig) -> TelemetryGuard {
    let filter = build_filter(&config);

    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.logging.stdout {
        layers.push(fmt_layer(config.logging.stdout_format, std::io::stderr, true));
    }

    let mut pruned = None;
    let mut setup_error = None;
    if config.logging.file.enabled {
        let dir = resolve_log_dir(&config.logging.file);
        match fs::create_dir_all(&dir) {
            Ok(()) => {
                if let Some(max_files) = config.logging.file.retention_max_files {
                    match prune_logs(&dir, LOG_FILE_PREFIX, max_files) {
                        Ok(removed) => pruned = Some(removed),
                        Err(err) => setup_error = Some(format!("log retention failed: {err}")),
                    }
                }
                let appender = tracing_appender::rolling::RollingFileAppender::new(
                    rotation(config.logging.file.rotation),
                    &dir,
                    LOG_FILE_PREFIX,
                );
                let (writer, guard) = tracing_appender::non_blocking(appender);
                layers.push(fmt_layer(config.logging.file.format, writer, false));
                guards.push(guard);
            }
            Err(err) => {
                setup_error = Some(format!("log dir init failed for {}: {err}", dir.display()));
            }
        }
    }

    layers.push(Box::new(filter));
    Registry::default().with(layers).init();

    if let Some(removed) = pruned
        && removed > 0
    {
        tracing::info!(removed, "old log files pruned");
    }
    if let Some(error) = setup_error {
        tracing::warn!("{error}");
    }

    TelemetryGuard { _guards: guards }
}

fn build_filter(config: &TelemetryConfig) -> EnvFilter {
    let builder = EnvFilter::builder()
        .with_default_directive(level_from_verbosity(config.verbosity).into())
        .with_env_var(FILTER_ENV_VAR);
    if std::env::var_os(FILTER_ENV_VAR).is_none()
        && let Some(directives) = &config.logging.filter
    {
        return builder.parse_lossy(directives);
    }
    builder.from_env_lossy()
}

fn fmt_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Tree => Box::new(
            tracing_tree::HierarchicalLayer::new(2)
                .with_ansi(ansi)
                .with_writer(writer),
        ),
        LogFormat::Pretty => Box::new(
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true)
                .with_thread_ids(true),
        ),
        LogFormat::Compact => Box::new(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(writer)
                .with_ansi(ansi)
                .with_target(true),
        ),
        LogFormat::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        ),
    }
}

fn rotation(rotation: LogRotation) -> tracing_appender::rolling::Rotation {
    match rotation {
        LogRotation::Daily => tracing_appender::rolling::Rotation::DAILY,
        LogRotation::Hourly => tracing_appender::rolling::Rotation::HOURLY,
        LogRotation::Minutely => tracing_appender::rolling::Rotation::MINUTELY,
        LogRotation::Never => tracing_appender::rolling::Rotation::NEVER,
    }
}

fn level_from_verbosity(verbosity: u8) -> tracing::metadata::LevelFilter {
    match verbosity {
        0 => tracing::metadata::LevelFilter::ERROR,
        1 => tracing::metadata::LevelFilter::INFO,
        _ => tracing::metadata::LevelFilter::DEBUG,
    }
}

fn resolve_log_dir(config: &FileLoggingConfig) -> PathBuf {
    config.dir.clone().unwrap_or_else(paths::log_dir)
}

/// Delete the oldest `prefix*` files so that at most `max_files` remain.
fn prune_logs(dir: &Path, prefix: &str, max_files: usize) -> std::io::Result<usize> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_log = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(prefix));
        let meta = entry.metadata()?;
        if is_log && meta.is_file() {
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((modified, entry.path()));
        }
    }

    let excess = oldest_excess(entries, max_files);
    let mut removed = 0;
    for path in excess {
        if fs::remove_file(&path).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}

fn oldest_excess(mut entries: Vec<(SystemTime, PathBuf)>, max_files: usize) -> Vec<PathBuf> {
    entries.sort();
    let excess = entries.len().saturating_sub(max_files);
    entries.into_iter().take(excess).map(|(_, path)| path).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn oldest_files_beyond_limit_are_selected() {
        let at = |secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
        let entries = vec![
            (at(30), PathBuf::from("c.log")),
            (at(10), PathBuf::from("a.log")),
            (at(40), PathBuf::from("d.log")),
            (at(20), PathBuf::from("b.log")),
        ];
        assert_eq!(
            oldest_excess(entries.clone(), 2),
            vec![PathBuf::from("a.log"), PathBuf::from("b.log")]
        );
        assert!(oldest_excess(entries, 10).is_empty());
    }

    #[test]
    fn prune_only_touches_prefixed_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["geoversion.log.1", "geoversion.log.2", "other.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let removed = prune_logs(dir.path(), LOG_FILE_PREFIX, 0).unwrap();
        assert_eq!(removed, 2);
        assert!(dir.path().join("other.txt").exists());
    }

    #[test]
    fn verbosity_maps_to_levels() {
        use tracing::metadata::LevelFilter;
        assert_eq!(level_from_verbosity(0), LevelFilter::ERROR);
        assert_eq!(level_from_verbosity(1), LevelFilter::INFO);
        assert_eq!(level_from_verbosity(5), LevelFilter::DEBUG);
    }
}
