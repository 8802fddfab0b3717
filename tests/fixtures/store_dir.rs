//! Temporary filesystem store root.

use std::path::{Path, PathBuf};

use geoversion::config::{Config, StoreBackend};
use geoversion::Repository;
use tempfile::TempDir;

pub struct TempStoreDir {
    _temp: TempDir,
    root: PathBuf,
}

impl TempStoreDir {
    pub fn new() -> std::io::Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().join("store");
        Ok(Self { _temp: temp, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Fs;
        config.store.data_dir = Some(self.root.clone());
        config
    }

    pub fn open(&self) -> Repository {
        Repository::open(&self.config()).expect("open fs repository")
    }
}
