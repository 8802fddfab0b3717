//! Filesystem store backend.
//!
//! Layout: `<root>/<collection>/<hex(key)>`, one file per record. Writes go
//! through a temp file in the same directory followed by an atomic rename, so
//! readers never observe a half-written record. `put_unique` uses a
//! no-clobber rename; `compare_and_swap` is serialized by an in-process lock,
//! which makes this backend safe for one process at a time.

use std::fs;
use std::io::{self, Write};
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{Collection, DurableStore, StoreError, suffix_in_bounds};

#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
    cas_lock: Mutex<()>,
}

impl FsStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        for collection in Collection::ALL {
            let dir = root.join(collection.as_str());
            fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir, source })?;
        }
        Ok(Self {
            root,
            cas_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.as_str())
    }

    fn path(&self, collection: Collection, key: &str) -> PathBuf {
        self.dir(collection).join(encode_key(key))
    }

    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn stage(&self, collection: Collection, value: &[u8]) -> Result<tempfile::NamedTempFile, StoreError> {
        let dir = self.dir(collection);
        let io_err = |source| StoreError::Io {
            path: dir.clone(),
            source,
        };
        let mut temp = tempfile::Builder::new()
            .prefix(".tmp")
            .tempfile_in(&dir)
            .map_err(io_err)?;
        temp.write_all(value).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;
        Ok(temp)
    }
}

impl DurableStore for FsStore {
    fn get_by_key(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.read(&self.path(collection, key))
    }

    fn put_unique(&self, collection: Collection, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path(collection, key);
        let temp = self.stage(collection, value)?;
        match temp.persist_noclobber(&path) {
            Ok(_) => Ok(()),
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::DuplicateKey {
                    collection,
                    key: key.to_string(),
                })
            }
            Err(err) => Err(StoreError::Io {
                path,
                source: err.error,
            }),
        }
    }

    fn compare_and_swap(
        &self,
        collection: Collection,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> Result<(), StoreError> {
        let _guard = self
            .cas_lock
            .lock()
            .map_err(|_| StoreError::LockPoisoned { collection })?;
        let path = self.path(collection, key);
        let current = self.read(&path)?;
        if current.as_deref() != expected {
            return Err(StoreError::Conflict {
                collection,
                key: key.to_string(),
            });
        }
        let temp = self.stage(collection, value)?;
        temp.persist(&path).map_err(|err| StoreError::Io {
            path: path.clone(),
            source: err.error,
        })?;
        Ok(())
    }

    fn query_range(
        &self,
        collection: Collection,
        prefix: &str,
        lower: Bound<&str>,
        upper: Bound<&str>,
    ) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let dir = self.dir(collection);
        let entries = fs::read_dir(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let name = entry.file_name();
            // Staged temp files and foreign names do not decode.
            let Some(key) = name.to_str().and_then(decode_key) else {
                continue;
            };
            if key.starts_with(prefix) && suffix_in_bounds(&key[prefix.len()..], lower, upper) {
                keys.push(key);
            }
        }
        keys.sort();

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            // A record may not exist anymore only if something outside this
            // store removed it; skip rather than fail the scan.
            if let Some(value) = self.read(&self.path(collection, &key))? {
                out.push((key, value));
            }
        }
        Ok(out)
    }
}

fn encode_key(key: &str) -> String {
    key.bytes().map(|b| format!("{:02x}", b)).collect()
}

fn decode_key(name: &str) -> Option<String> {
    if name.len() % 2 != 0 || !name.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let bytes = (0..name.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&name[i..i + 2], 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}
