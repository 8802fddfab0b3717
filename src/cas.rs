//! Content-addressed object store for BPO payloads.
//!
//! Payloads are keyed by the hex SHA-256 of their canonical encoding and are
//! immutable once written. Concurrent puts of identical content race on
//! `put_unique`: exactly one insert wins and every other caller verifies the
//! stored payload and returns the same hash.

use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Bpo, Clock, ContentHash, EncodingError, GeometryType, StableIdentity, WallClock};
use crate::error::{Effect, Transience};
use crate::store::{Collection, DurableStore, StoreError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CasError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("no payload stored under {hash}")]
    NotFound { hash: ContentHash },
    #[error("hash collision: different content stored under {hash}")]
    HashCollision { hash: ContentHash },
    #[error("content {hash} already stored with identity {stored:?}, refusing identity {incoming:?}")]
    IdentityConflict {
        hash: ContentHash,
        stored: Option<StableIdentity>,
        incoming: Option<StableIdentity>,
    },
    #[error("payload under {hash} is corrupt: {reason}")]
    Corrupt { hash: ContentHash, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CasError {
    pub fn transience(&self) -> Transience {
        match self {
            CasError::Store(e) => e.transience(),
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            CasError::Store(e) => e.effect(),
            _ => Effect::None,
        }
    }
}

/// Stored form of a BPO payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BpoRecord {
    hash: ContentHash,
    bpo: Bpo,
    created_at: WallClock,
}

#[derive(Clone)]
pub struct ObjectStore {
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
}

impl ObjectStore {
    pub fn new(store: Arc<dyn DurableStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Store `bpo` unless identical content is already present.
    ///
    /// Idempotent: re-putting identical content returns the same hash and
    /// leaves exactly one payload.
    pub fn put(&self, bpo: &Bpo) -> Result<ContentHash, CasError> {
        let canonical = bpo.canonical_bytes()?;
        let hash = ContentHash::digest(&canonical);
        let record = BpoRecord {
            hash,
            bpo: bpo.clone(),
            created_at: self.clock.now(),
        };
        let bytes = serde_json::to_vec(&record).map_err(EncodingError::from)?;

        match self
            .store
            .put_unique(Collection::BpoCas, &hash.to_hex(), &bytes)
        {
            Ok(()) => {
                tracing::debug!(%hash, geometry = %bpo.geometry_type(), "bpo stored");
                Ok(hash)
            }
            Err(StoreError::DuplicateKey { .. }) => {
                let existing = self.load(hash)?;
                if existing.bpo.canonical_bytes()? != canonical {
                    tracing::error!(%hash, "hash collision: stored content differs");
                    return Err(CasError::HashCollision { hash });
                }
                if bpo.identity().is_some() && existing.bpo.identity() != bpo.identity() {
                    return Err(CasError::IdentityConflict {
                        hash,
                        stored: existing.bpo.identity().cloned(),
                        incoming: bpo.identity().cloned(),
                    });
                }
                tracing::debug!(%hash, "bpo already stored");
                Ok(hash)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Put every BPO, returning the snapshot's hash set.
    pub fn put_all<'a>(
        &self,
        bpos: impl IntoIterator<Item = &'a Bpo>,
    ) -> Result<BTreeSet<ContentHash>, CasError> {
        bpos.into_iter().map(|bpo| self.put(bpo)).collect()
    }

    pub fn get(&self, hash: ContentHash) -> Result<Bpo, CasError> {
        self.load(hash).map(|record| record.bpo)
    }

    pub fn contains(&self, hash: ContentHash) -> Result<bool, CasError> {
        Ok(self
            .store
            .get_by_key(Collection::BpoCas, &hash.to_hex())?
            .is_some())
    }

    /// Number of stored payloads.
    pub fn count(&self) -> Result<usize, CasError> {
        Ok(self.store.count(Collection::BpoCas)?)
    }

    /// Every stored hash, ascending.
    pub fn hashes(&self) -> Result<Vec<ContentHash>, CasError> {
        self.scan()?
            .into_iter()
            .map(|(key, _)| {
                ContentHash::from_hex(&key).map_err(|err| CasError::Corrupt {
                    hash: ContentHash::digest(key.as_bytes()),
                    reason: format!("unparseable key `{key}`: {err}"),
                })
            })
            .collect()
    }

    /// Payloads of one geometry kind. A full scan; spatial search is left to
    /// an external index.
    pub fn find_by_geometry_type(
        &self,
        geometry_type: GeometryType,
    ) -> Result<Vec<(ContentHash, Bpo)>, CasError> {
        let mut out = Vec::new();
        for (key, bytes) in self.scan()? {
            let hash = ContentHash::from_hex(&key).map_err(|err| CasError::Corrupt {
                hash: ContentHash::digest(key.as_bytes()),
                reason: format!("unparseable key `{key}`: {err}"),
            })?;
            let record = decode(hash, &bytes)?;
            if record.bpo.geometry_type() == geometry_type {
                out.push((hash, record.bpo));
            }
        }
        Ok(out)
    }

    fn scan(&self) -> Result<Vec<(String, Vec<u8>)>, CasError> {
        Ok(self
            .store
            .query_range(Collection::BpoCas, "", Bound::Unbounded, Bound::Unbounded)?)
    }

    fn load(&self, hash: ContentHash) -> Result<BpoRecord, CasError> {
        let bytes = self
            .store
            .get_by_key(Collection::BpoCas, &hash.to_hex())?
            .ok_or(CasError::NotFound { hash })?;
        decode(hash, &bytes)
    }
}

/// Decode a record and check that its content still hashes to its key.
fn decode(hash: ContentHash, bytes: &[u8]) -> Result<BpoRecord, CasError> {
    let record: BpoRecord = serde_json::from_slice(bytes).map_err(|err| CasError::Corrupt {
        hash,
        reason: err.to_string(),
    })?;
    let actual = record.bpo.content_hash().map_err(|err| CasError::Corrupt {
        hash,
        reason: err.to_string(),
    })?;
    if record.hash != hash || actual != hash {
        tracing::error!(%hash, %actual, "stored payload does not match its key");
        return Err(CasError::Corrupt {
            hash,
            reason: format!("content hashes to {actual}"),
        });
    }
    Ok(record)
}
