//! Delta engine: added/removed/modified between two version snapshots.
//!
//! Raw adds and removes come from the hash-set difference. A removed and an
//! added BPO that share a stable identity are folded into one `modified`
//! pair. The result is exactly swap-symmetric.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cas::{CasError, ObjectStore};
use crate::core::{ContentHash, DeltaId, EncodingError, StableIdentity, VersionId};
use crate::error::{Effect, Transience};
use crate::graph::{GraphError, VersionGraph};
use crate::store::{Collection, DurableStore, StoreError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeltaError {
    #[error("unknown version {version_id}")]
    UnknownVersion { version_id: VersionId },
    #[error("cached delta `{key}` is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
    #[error(transparent)]
    Graph(GraphError),
    #[error(transparent)]
    Cas(#[from] CasError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GraphError> for DeltaError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::UnknownVersion { version_id } => DeltaError::UnknownVersion { version_id },
            other => DeltaError::Graph(other),
        }
    }
}

impl DeltaError {
    pub fn transience(&self) -> Transience {
        match self {
            DeltaError::Graph(e) => e.transience(),
            DeltaError::Cas(e) => e.transience(),
            DeltaError::Store(e) => e.transience(),
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            DeltaError::Graph(e) => e.effect(),
            DeltaError::Cas(e) => e.effect(),
            DeltaError::Store(e) => e.effect(),
            _ => Effect::None,
        }
    }
}

/// Non-fatal findings attached to a delta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeltaWarning {
    /// More than one removed or added BPO carries the same identity. Pairs
    /// were formed in ascending hash order; the rest stay adds/removes.
    AmbiguousIdentity {
        identity: StableIdentity,
        removed: Vec<ContentHash>,
        added: Vec<ContentHash>,
    },
}

impl DeltaWarning {
    fn reversed(self) -> Self {
        match self {
            DeltaWarning::AmbiguousIdentity {
                identity,
                removed,
                added,
            } => DeltaWarning::AmbiguousIdentity {
                identity,
                removed: added,
                added: removed,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDelta {
    pub delta_id: DeltaId,
    pub from: VersionId,
    pub to: VersionId,
    pub added: BTreeSet<ContentHash>,
    pub removed: BTreeSet<ContentHash>,
    /// `(old_hash, new_hash)` pairs.
    pub modified: BTreeSet<(ContentHash, ContentHash)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DeltaWarning>,
}

impl VersionDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// The delta from `to` back to `from`.
    pub fn reversed(self) -> Self {
        Self {
            delta_id: DeltaId::for_pair(self.to, self.from),
            from: self.to,
            to: self.from,
            added: self.removed,
            removed: self.added,
            modified: self.modified.into_iter().map(|(old, new)| (new, old)).collect(),
            warnings: self.warnings.into_iter().map(DeltaWarning::reversed).collect(),
        }
    }
}

pub struct DeltaEngine {
    graph: Arc<VersionGraph>,
    cas: ObjectStore,
    store: Arc<dyn DurableStore>,
    cache: bool,
}

impl DeltaEngine {
    pub fn new(
        graph: Arc<VersionGraph>,
        cas: ObjectStore,
        store: Arc<dyn DurableStore>,
        cache: bool,
    ) -> Self {
        Self {
            graph,
            cas,
            store,
            cache,
        }
    }

    /// Compute the delta directly from the two snapshots.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn compute_delta(&self, from: VersionId, to: VersionId) -> Result<VersionDelta, DeltaError> {
        let old = self.graph.get_version(from)?;
        let new = self.graph.get_version(to)?;

        let mut removed: BTreeSet<ContentHash> =
            old.bpo_refs.difference(&new.bpo_refs).copied().collect();
        let mut added: BTreeSet<ContentHash> =
            new.bpo_refs.difference(&old.bpo_refs).copied().collect();

        let removed_by_identity = self.group_by_identity(&removed)?;
        let mut added_by_identity = self.group_by_identity(&added)?;

        let mut modified = BTreeSet::new();
        let mut warnings = Vec::new();
        for (identity, olds) in removed_by_identity {
            let Some(news) = added_by_identity.remove(&identity) else {
                continue;
            };
            if olds.len() > 1 || news.len() > 1 {
                tracing::warn!(
                    %identity,
                    removed = olds.len(),
                    added = news.len(),
                    "ambiguous stable identity in delta"
                );
                warnings.push(DeltaWarning::AmbiguousIdentity {
                    identity,
                    removed: olds.clone(),
                    added: news.clone(),
                });
            }
            for (old_hash, new_hash) in olds.into_iter().zip(news) {
                removed.remove(&old_hash);
                added.remove(&new_hash);
                modified.insert((old_hash, new_hash));
            }
        }

        Ok(VersionDelta {
            delta_id: DeltaId::for_pair(from, to),
            from,
            to,
            added,
            removed,
            modified,
            warnings,
        })
    }

    /// Like [`compute_delta`](Self::compute_delta), memoized in the store.
    ///
    /// A cached delta for the reverse pair is reused by swapping it.
    pub fn delta(&self, from: VersionId, to: VersionId) -> Result<VersionDelta, DeltaError> {
        if !self.cache {
            return self.compute_delta(from, to);
        }
        if let Some(hit) = self.load(from, to)? {
            tracing::debug!(%from, %to, "delta cache hit");
            return Ok(hit);
        }
        if let Some(hit) = self.load(to, from)? {
            tracing::debug!(%from, %to, "reverse delta cache hit");
            return Ok(hit.reversed());
        }

        let delta = self.compute_delta(from, to)?;
        let bytes = serde_json::to_vec(&delta).map_err(EncodingError::from)?;
        match self
            .store
            .put_unique(Collection::VersionDeltas, &delta.delta_id.to_hex(), &bytes)
        {
            Ok(()) | Err(StoreError::DuplicateKey { .. }) => Ok(delta),
            Err(err) => Err(err.into()),
        }
    }

    fn load(&self, from: VersionId, to: VersionId) -> Result<Option<VersionDelta>, DeltaError> {
        let key = DeltaId::for_pair(from, to).to_hex();
        let Some(bytes) = self.store.get_by_key(Collection::VersionDeltas, &key)? else {
            return Ok(None);
        };
        let delta: VersionDelta = serde_json::from_slice(&bytes).map_err(|err| DeltaError::Corrupt {
            key: key.clone(),
            reason: err.to_string(),
        })?;
        if delta.from != from || delta.to != to {
            return Err(DeltaError::Corrupt {
                key,
                reason: format!("record is for {} -> {}", delta.from, delta.to),
            });
        }
        Ok(Some(delta))
    }

    /// Identity-carrying hashes grouped by identity, each group ascending.
    fn group_by_identity(
        &self,
        hashes: &BTreeSet<ContentHash>,
    ) -> Result<BTreeMap<StableIdentity, Vec<ContentHash>>, DeltaError> {
        let mut groups: BTreeMap<StableIdentity, Vec<ContentHash>> = BTreeMap::new();
        for &hash in hashes {
            if let Some(identity) = self.cas.get(hash)?.identity() {
                groups.entry(identity.clone()).or_default().push(hash);
            }
        }
        Ok(groups)
    }
}
