//! Situation registry: named situations and their head pointers.
//!
//! Commits to one situation are serialized by an in-process lock per
//! situation id. The situation record itself is advanced with a
//! compare-and-swap against the bytes read under that lock, so a writer
//! outside this registry that moved the heads in between is detected and
//! reported as [`RegistryError::ConcurrentModification`].

use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::cas::{CasError, ObjectStore};
use crate::core::{
    AuthorId, Bpo, Clock, CoreError, EncodingError, Situation, SituationId, VersionId,
};
use crate::error::{Effect, Transience};
use crate::graph::{GraphError, NewVersion, VersionGraph};
use crate::store::{Collection, DurableStore, StoreError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("situation {situation_id} not found")]
    SituationNotFound { situation_id: SituationId },
    #[error("situation {situation_id} already exists")]
    SituationExists { situation_id: SituationId },
    #[error("situation {situation_id} has {} heads; pass explicit parents", .heads.len())]
    AmbiguousHeads {
        situation_id: SituationId,
        heads: Vec<VersionId>,
    },
    #[error("situation {situation_id} was modified concurrently; retry with fresh heads")]
    ConcurrentModification { situation_id: SituationId },
    #[error("situation record `{key}` is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Cas(#[from] CasError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistryError {
    pub fn transience(&self) -> Transience {
        match self {
            RegistryError::ConcurrentModification { .. } => Transience::Retryable,
            RegistryError::Cas(e) => e.transience(),
            RegistryError::Graph(e) => e.transience(),
            RegistryError::Store(e) => e.transience(),
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            // BPOs and the version node were written; the heads were not.
            RegistryError::ConcurrentModification { .. } => Effect::Some,
            RegistryError::Cas(e) => e.effect(),
            RegistryError::Graph(e) => e.effect(),
            RegistryError::Store(e) => e.effect(),
            _ => Effect::None,
        }
    }
}

pub struct SituationRegistry {
    store: Arc<dyn DurableStore>,
    cas: ObjectStore,
    graph: Arc<VersionGraph>,
    clock: Arc<dyn Clock>,
    identity_attribute: Option<String>,
    locks: Mutex<HashMap<SituationId, Arc<Mutex<()>>>>,
}

impl SituationRegistry {
    pub fn new(
        store: Arc<dyn DurableStore>,
        cas: ObjectStore,
        graph: Arc<VersionGraph>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cas,
            graph,
            clock,
            identity_attribute: None,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Derive a BPO's stable identity from this attribute when the caller
    /// did not assign one.
    pub fn with_identity_attribute(mut self, attribute: Option<String>) -> Self {
        self.identity_attribute = attribute;
        self
    }

    pub fn create_situation(
        &self,
        situation_id: SituationId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Situation, RegistryError> {
        let situation = Situation::new(situation_id, name, description, self.clock.now());
        let bytes = serde_json::to_vec(&situation).map_err(EncodingError::from)?;
        match self.store.put_unique(
            Collection::Situations,
            situation.situation_id.as_str(),
            &bytes,
        ) {
            Ok(()) => {}
            Err(StoreError::DuplicateKey { .. }) => {
                return Err(RegistryError::SituationExists {
                    situation_id: situation.situation_id,
                });
            }
            Err(err) => return Err(err.into()),
        }
        tracing::info!(situation_id = %situation.situation_id, name = %situation.name, "situation created");
        Ok(situation)
    }

    pub fn get_situation(&self, situation_id: &SituationId) -> Result<Situation, RegistryError> {
        self.load(situation_id).map(|(_, situation)| situation)
    }

    /// All situations, ordered by id.
    pub fn list_situations(&self) -> Result<Vec<Situation>, RegistryError> {
        self.store
            .query_range(Collection::Situations, "", Bound::Unbounded, Bound::Unbounded)?
            .into_iter()
            .map(|(key, bytes)| decode(&key, &bytes))
            .collect()
    }

    pub fn heads(&self, situation_id: &SituationId) -> Result<BTreeSet<VersionId>, RegistryError> {
        Ok(self.get_situation(situation_id)?.heads)
    }

    /// Rename and/or re-describe a situation. `None` keeps the current value.
    pub fn update_metadata(
        &self,
        situation_id: &SituationId,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Situation, RegistryError> {
        let lock = self.lock_for(situation_id)?;
        let _guard = lock.lock().map_err(|_| poisoned())?;

        let (raw, mut situation) = self.load(situation_id)?;
        if let Some(name) = name {
            situation.name = name;
        }
        if let Some(description) = description {
            situation.description = description;
        }
        situation.updated_at = self.clock.now().max(situation.updated_at);
        self.swap(&raw, &situation)?;
        Ok(situation)
    }

    /// Snapshot `bpos` as a new version of `situation_id` and advance heads.
    ///
    /// With no explicit parents the new version extends the single current
    /// head (or becomes the root). Explicit parents may name any version of
    /// this situation; naming a non-head forks the history.
    ///
    /// Invalid requests fail before anything is written. The version node is
    /// persisted before the head pointer moves, so when another writer wins
    /// the head swap the call fails with `ConcurrentModification` and the
    /// node stays behind as an orphan: `get_version` and
    /// `versions_for_situation` still return it, but no head reaches it.
    #[tracing::instrument(skip(self, parents, bpos, message, author), fields(%situation_id))]
    pub fn commit(
        &self,
        situation_id: &SituationId,
        parents: Vec<VersionId>,
        bpos: &[Bpo],
        message: impl Into<String>,
        author: AuthorId,
    ) -> Result<VersionId, RegistryError> {
        let lock = self.lock_for(situation_id)?;
        let _guard = lock.lock().map_err(|_| poisoned())?;

        let (raw, mut situation) = self.load(situation_id)?;
        let parents = if parents.is_empty() {
            match situation.heads.len() {
                0 | 1 => situation.heads.iter().copied().collect(),
                _ => {
                    return Err(RegistryError::AmbiguousHeads {
                        situation_id: situation_id.clone(),
                        heads: situation.heads.iter().copied().collect(),
                    });
                }
            }
        } else {
            parents
        };
        self.graph.validate_parents(situation_id, &parents)?;

        let bpos = match &self.identity_attribute {
            Some(attribute) => bpos
                .iter()
                .map(|bpo| bpo.clone().identity_from_attribute(attribute))
                .collect::<Result<Vec<_>, _>>()?,
            None => bpos.to_vec(),
        };
        let bpo_refs = self.cas.put_all(&bpos)?;

        let version = self.graph.create_version(
            NewVersion::new(situation_id.clone(), author)
                .with_parents(parents)
                .with_bpo_refs(bpo_refs)
                .with_message(message),
        )?;

        for parent in &version.parent_version_ids {
            situation.heads.remove(parent);
        }
        situation.heads.insert(version.version_id);
        situation.updated_at = self.clock.now().max(version.created_at);
        self.swap(&raw, &situation)?;

        tracing::info!(
            version_id = %version.version_id,
            parents = version.parent_version_ids.len(),
            bpos = version.bpo_refs.len(),
            heads = situation.heads.len(),
            "committed"
        );
        Ok(version.version_id)
    }

    fn lock_for(&self, situation_id: &SituationId) -> Result<Arc<Mutex<()>>, RegistryError> {
        let mut locks = self.locks.lock().map_err(|_| poisoned())?;
        Ok(locks.entry(situation_id.clone()).or_default().clone())
    }

    fn load(&self, situation_id: &SituationId) -> Result<(Vec<u8>, Situation), RegistryError> {
        let key = situation_id.as_str();
        let raw = self
            .store
            .get_by_key(Collection::Situations, key)?
            .ok_or_else(|| RegistryError::SituationNotFound {
                situation_id: situation_id.clone(),
            })?;
        let situation = decode(key, &raw)?;
        Ok((raw, situation))
    }

    fn swap(&self, expected: &[u8], situation: &Situation) -> Result<(), RegistryError> {
        let bytes = serde_json::to_vec(situation).map_err(EncodingError::from)?;
        match self.store.compare_and_swap(
            Collection::Situations,
            situation.situation_id.as_str(),
            Some(expected),
            &bytes,
        ) {
            Ok(()) => Ok(()),
            Err(StoreError::Conflict { .. }) => {
                tracing::warn!(situation_id = %situation.situation_id, "situation changed underneath commit");
                Err(RegistryError::ConcurrentModification {
                    situation_id: situation.situation_id.clone(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn decode(key: &str, bytes: &[u8]) -> Result<Situation, RegistryError> {
    serde_json::from_slice(bytes).map_err(|err| RegistryError::Corrupt {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

fn poisoned() -> RegistryError {
    StoreError::LockPoisoned {
        collection: Collection::Situations,
    }
    .into()
}
