//! Durable key-value store boundary.
//!
//! The core only needs a handful of primitives from its backing store:
//! unique-key insert, keyed lookup, compare-and-swap on a single key and an
//! ordered range scan. Records are opaque bytes; callers own the encoding.

use std::fmt;
use std::ops::Bound;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

/// Separator between components of composite index keys.
pub const KEY_SEPARATOR: char = '\u{1f}';

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    BpoCas,
    Situations,
    SituationVersions,
    SituationVersionsByTime,
    VersionDeltas,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::BpoCas,
        Collection::Situations,
        Collection::SituationVersions,
        Collection::SituationVersionsByTime,
        Collection::VersionDeltas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::BpoCas => "bpo_cas",
            Collection::Situations => "situations",
            Collection::SituationVersions => "situation_versions",
            Collection::SituationVersionsByTime => "situation_versions_by_time",
            Collection::VersionDeltas => "version_deltas",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("duplicate key `{key}` in {collection}")]
    DuplicateKey { collection: Collection, key: String },
    #[error("compare-and-swap conflict on `{key}` in {collection}")]
    Conflict { collection: Collection, key: String },
    #[error("{collection} lock poisoned")]
    LockPoisoned { collection: Collection },
    #[error("store io failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn transience(&self) -> Transience {
        match self {
            StoreError::DuplicateKey { .. } => Transience::Permanent,
            StoreError::Conflict { .. } => Transience::Retryable,
            StoreError::LockPoisoned { .. } => Transience::Permanent,
            StoreError::Io { .. } => Transience::Unknown,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            StoreError::Io { .. } => Effect::Unknown,
            _ => Effect::None,
        }
    }
}

/// Durable record store consumed by the object store, version graph,
/// delta cache and situation registry.
pub trait DurableStore: Send + Sync {
    fn get_by_key(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Insert a record that must not exist yet. Fails with
    /// [`StoreError::DuplicateKey`] and leaves the existing record untouched
    /// otherwise.
    fn put_unique(&self, collection: Collection, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Replace `key` only if its current value equals `expected`
    /// (`None` = must be absent). Fails with [`StoreError::Conflict`].
    fn compare_and_swap(
        &self,
        collection: Collection,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> Result<(), StoreError>;

    /// Records whose key starts with `prefix` and whose remainder after the
    /// prefix lies within `(lower, upper)`, ascending by key.
    fn query_range(
        &self,
        collection: Collection,
        prefix: &str,
        lower: Bound<&str>,
        upper: Bound<&str>,
    ) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        Ok(self
            .query_range(collection, "", Bound::Unbounded, Bound::Unbounded)?
            .len())
    }
}

pub(crate) fn suffix_in_bounds(suffix: &str, lower: Bound<&str>, upper: Bound<&str>) -> bool {
    let above = match lower {
        Bound::Included(l) => suffix >= l,
        Bound::Excluded(l) => suffix > l,
        Bound::Unbounded => true,
    };
    let below = match upper {
        Bound::Included(u) => suffix <= u,
        Bound::Excluded(u) => suffix < u,
        Bound::Unbounded => true,
    };
    above && below
}
