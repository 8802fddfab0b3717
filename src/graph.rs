//! Version graph: append-only DAG of immutable situation versions.
//!
//! Nodes live in `situation_versions` keyed by version id; a secondary
//! `situation_versions_by_time` index serves chronological listings. Nodes
//! only reference strictly older ids, so the graph cannot contain cycles as
//! long as a version never names itself as a parent.

use std::collections::{BTreeSet, BinaryHeap, HashSet};
use std::num::NonZeroUsize;
use std::ops::Bound;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use thiserror::Error;

use crate::core::{
    AuthorId, Clock, ContentHash, EncodingError, SituationId, SituationVersion, VersionId,
    WallClock,
};
use crate::error::{Effect, Transience};
use crate::store::{Collection, DurableStore, KEY_SEPARATOR, StoreError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphError {
    #[error("unknown version {version_id}")]
    UnknownVersion { version_id: VersionId },
    #[error("invalid parent {parent}: {reason}")]
    InvalidParent { parent: VersionId, reason: String },
    #[error("version {version_id} lists itself as a parent")]
    Cycle { version_id: VersionId },
    #[error("version {version_id} already exists")]
    DuplicateVersion { version_id: VersionId },
    #[error("version record `{key}` is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GraphError {
    pub fn transience(&self) -> Transience {
        match self {
            GraphError::Store(e) => e.transience(),
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            GraphError::Store(e) => e.effect(),
            _ => Effect::None,
        }
    }
}

/// Request to append a version node.
#[derive(Clone, Debug)]
pub struct NewVersion {
    pub situation_id: SituationId,
    /// Ordered; the first entry is the mainline parent.
    pub parents: Vec<VersionId>,
    pub bpo_refs: BTreeSet<ContentHash>,
    pub commit_message: String,
    pub author: AuthorId,
    /// Caller-chosen id, e.g. when importing history. Generated if absent.
    pub version_id: Option<VersionId>,
}

impl NewVersion {
    pub fn new(situation_id: SituationId, author: AuthorId) -> Self {
        Self {
            situation_id,
            parents: Vec::new(),
            bpo_refs: BTreeSet::new(),
            commit_message: String::new(),
            author,
            version_id: None,
        }
    }

    pub fn with_parents(mut self, parents: impl IntoIterator<Item = VersionId>) -> Self {
        self.parents = parents.into_iter().collect();
        self
    }

    pub fn with_bpo_refs(mut self, refs: impl IntoIterator<Item = ContentHash>) -> Self {
        self.bpo_refs = refs.into_iter().collect();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn with_version_id(mut self, version_id: VersionId) -> Self {
        self.version_id = Some(version_id);
        self
    }
}

/// Which parent edges `history` follows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HistoryMode {
    /// Only the first-listed parent: the linear mainline.
    #[default]
    FirstParent,
    /// Every parent: the full DAG.
    AllParents,
}

/// Default number of decoded nodes kept in memory per graph.
pub const NODE_CACHE_CAPACITY: usize = 4096;

pub struct VersionGraph {
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    /// Least-recently-used decoded nodes; the store stays authoritative.
    nodes: Mutex<LruCache<VersionId, Arc<SituationVersion>>>,
}

impl VersionGraph {
    pub fn new(store: Arc<dyn DurableStore>, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(NODE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::with_cache_capacity(store, clock, capacity)
    }

    pub fn with_cache_capacity(
        store: Arc<dyn DurableStore>,
        clock: Arc<dyn Clock>,
        capacity: NonZeroUsize,
    ) -> Self {
        Self {
            store,
            clock,
            nodes: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Validate and persist a new version node.
    ///
    /// Nothing is written unless every parent exists, belongs to the same
    /// situation and is listed once.
    pub fn create_version(&self, request: NewVersion) -> Result<Arc<SituationVersion>, GraphError> {
        let version_id = request.version_id.unwrap_or_else(VersionId::generate);
        if request.parents.contains(&version_id) {
            return Err(GraphError::Cycle { version_id });
        }
        let parents = self.validate_parents(&request.situation_id, &request.parents)?;

        // Strictly after every parent, even if the wall clock went backwards.
        let created_at = parents
            .iter()
            .map(|p| p.created_at.succ())
            .fold(self.clock.now(), WallClock::max);

        let node = SituationVersion {
            version_id,
            situation_id: request.situation_id,
            parent_version_ids: request.parents,
            commit_message: request.commit_message,
            author: request.author,
            created_at,
            bpo_refs: request.bpo_refs,
        };
        let bytes = serde_json::to_vec(&node).map_err(EncodingError::from)?;

        match self.store.put_unique(
            Collection::SituationVersions,
            &version_id.to_string(),
            &bytes,
        ) {
            Ok(()) => {}
            Err(StoreError::DuplicateKey { .. }) => {
                return Err(GraphError::DuplicateVersion { version_id });
            }
            Err(err) => return Err(err.into()),
        }
        // The node above is the commit point; readers of the index skip
        // entries whose node is missing.
        self.store.put_unique(
            Collection::SituationVersionsByTime,
            &time_key(&node.situation_id, created_at, version_id),
            version_id.to_string().as_bytes(),
        )?;

        tracing::debug!(
            situation_id = %node.situation_id,
            %version_id,
            parents = node.parent_version_ids.len(),
            bpos = node.bpo_refs.len(),
            "version created"
        );
        let node = Arc::new(node);
        self.remember(node.clone())?;
        Ok(node)
    }

    /// Check a prospective parent list without writing anything.
    pub fn validate_parents(
        &self,
        situation_id: &SituationId,
        parents: &[VersionId],
    ) -> Result<Vec<Arc<SituationVersion>>, GraphError> {
        let mut seen = HashSet::with_capacity(parents.len());
        let mut out = Vec::with_capacity(parents.len());
        for &parent in parents {
            if !seen.insert(parent) {
                return Err(GraphError::InvalidParent {
                    parent,
                    reason: "listed more than once".to_string(),
                });
            }
            let node = self.get_version(parent)?;
            if &node.situation_id != situation_id {
                return Err(GraphError::InvalidParent {
                    parent,
                    reason: format!(
                        "belongs to situation {}, not {}",
                        node.situation_id, situation_id
                    ),
                });
            }
            out.push(node);
        }
        Ok(out)
    }

    pub fn get_version(&self, version_id: VersionId) -> Result<Arc<SituationVersion>, GraphError> {
        if let Some(node) = self.cached(version_id)? {
            return Ok(node);
        }
        let key = version_id.to_string();
        let bytes = self
            .store
            .get_by_key(Collection::SituationVersions, &key)?
            .ok_or(GraphError::UnknownVersion { version_id })?;
        let node: SituationVersion =
            serde_json::from_slice(&bytes).map_err(|err| GraphError::Corrupt {
                key: key.clone(),
                reason: err.to_string(),
            })?;
        if node.version_id != version_id {
            return Err(GraphError::Corrupt {
                key,
                reason: format!("record names version {}", node.version_id),
            });
        }
        let node = Arc::new(node);
        self.remember(node.clone())?;
        Ok(node)
    }

    pub fn contains(&self, version_id: VersionId) -> Result<bool, GraphError> {
        match self.get_version(version_id) {
            Ok(_) => Ok(true),
            Err(GraphError::UnknownVersion { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// True if `ancestor` is reachable from `descendant` along parent edges.
    /// Reflexive.
    pub fn is_ancestor(&self, ancestor: VersionId, descendant: VersionId) -> Result<bool, GraphError> {
        let target = self.get_version(ancestor)?;
        let start = self.get_version(descendant)?;
        if ancestor == descendant {
            return Ok(true);
        }

        let mut seen = HashSet::new();
        let mut queue = vec![start];
        while let Some(node) = queue.pop() {
            for &parent in &node.parent_version_ids {
                if parent == ancestor {
                    return Ok(true);
                }
                if !seen.insert(parent) {
                    continue;
                }
                let parent = self.get_version(parent)?;
                // Ancestors are strictly older, so nothing at or before the
                // target's timestamp can lead back to it.
                if parent.created_at > target.created_at {
                    queue.push(parent);
                }
            }
        }
        Ok(false)
    }

    /// Every lowest common ancestor of `a` and `b`, best first: greatest
    /// `created_at`, then smallest version id.
    pub fn merge_bases(&self, a: VersionId, b: VersionId) -> Result<Vec<VersionId>, GraphError> {
        let from_a = self.ancestors(a)?;
        let from_b = self.ancestors(b)?;
        let common: HashSet<VersionId> = from_a.intersection(&from_b).copied().collect();
        if common.is_empty() {
            return Ok(Vec::new());
        }

        // Any proper ancestor of a common ancestor is itself common and is
        // dominated by it.
        let mut dominated = HashSet::new();
        let mut stack = Vec::new();
        for &id in &common {
            stack.extend(self.get_version(id)?.parent_version_ids.iter().copied());
        }
        while let Some(id) = stack.pop() {
            if dominated.insert(id) {
                stack.extend(self.get_version(id)?.parent_version_ids.iter().copied());
            }
        }

        let mut bases = Vec::new();
        for id in common.difference(&dominated) {
            bases.push(self.get_version(*id)?);
        }
        bases.sort_by(|x, y| {
            y.created_at
                .cmp(&x.created_at)
                .then_with(|| x.version_id.cmp(&y.version_id))
        });
        Ok(bases.into_iter().map(|n| n.version_id).collect())
    }

    pub fn lowest_common_ancestor(
        &self,
        a: VersionId,
        b: VersionId,
    ) -> Result<Option<VersionId>, GraphError> {
        Ok(self.merge_bases(a, b)?.into_iter().next())
    }

    /// Lazy walk from `start` in reverse-chronological topological order.
    ///
    /// The iterator is `Clone`; a clone taken before iteration replays the
    /// same sequence.
    pub fn history(&self, start: VersionId, mode: HistoryMode) -> Result<History<'_>, GraphError> {
        let node = self.get_version(start)?;
        let mut frontier = BinaryHeap::new();
        frontier.push((node.created_at, start));
        Ok(History {
            graph: self,
            mode,
            frontier,
            seen: HashSet::from([start]),
            done: false,
        })
    }

    /// Versions of one situation, oldest first, created within
    /// `[since, until]` (either end optional).
    pub fn versions_for_situation(
        &self,
        situation_id: &SituationId,
        since: Option<WallClock>,
        until: Option<WallClock>,
    ) -> Result<Vec<Arc<SituationVersion>>, GraphError> {
        let prefix = format!("{situation_id}{KEY_SEPARATOR}");
        let lower = since.map(|t| format!("{:020}", t.as_millis()));
        let upper = until.and_then(|t| t.as_millis().checked_add(1)).map(|t| format!("{t:020}"));
        let entries = self.store.query_range(
            Collection::SituationVersionsByTime,
            &prefix,
            lower.as_deref().map_or(Bound::Unbounded, Bound::Included),
            upper.as_deref().map_or(Bound::Unbounded, Bound::Excluded),
        )?;

        let mut out = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let raw = String::from_utf8(value).map_err(|err| GraphError::Corrupt {
                key: key.clone(),
                reason: err.to_string(),
            })?;
            let version_id = VersionId::parse_str(&raw).map_err(|err| GraphError::Corrupt {
                key: key.clone(),
                reason: err.to_string(),
            })?;
            match self.get_version(version_id) {
                Ok(node) => out.push(node),
                Err(GraphError::UnknownVersion { .. }) => {
                    tracing::debug!(%version_id, "skipping index entry without a version node");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(out)
    }

    /// `id` and all of its ancestors.
    fn ancestors(&self, id: VersionId) -> Result<HashSet<VersionId>, GraphError> {
        self.get_version(id)?;
        let mut seen = HashSet::from([id]);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for &parent in &self.get_version(current)?.parent_version_ids {
                if seen.insert(parent) {
                    stack.push(parent);
                }
            }
        }
        Ok(seen)
    }

    fn cached(&self, version_id: VersionId) -> Result<Option<Arc<SituationVersion>>, GraphError> {
        let mut nodes = self.nodes.lock().map_err(|_| StoreError::LockPoisoned {
            collection: Collection::SituationVersions,
        })?;
        Ok(nodes.get(&version_id).cloned())
    }

    fn remember(&self, node: Arc<SituationVersion>) -> Result<(), GraphError> {
        let mut nodes = self.nodes.lock().map_err(|_| StoreError::LockPoisoned {
            collection: Collection::SituationVersions,
        })?;
        nodes.put(node.version_id, node);
        Ok(())
    }
}

fn time_key(situation_id: &SituationId, created_at: WallClock, version_id: VersionId) -> String {
    format!(
        "{situation_id}{KEY_SEPARATOR}{:020}{KEY_SEPARATOR}{version_id}",
        created_at.as_millis()
    )
}

/// Iterator returned by [`VersionGraph::history`].
///
/// Yields the newest pending version first; equal timestamps fall back to
/// the larger version id. Stops after the first error.
#[derive(Clone)]
pub struct History<'a> {
    graph: &'a VersionGraph,
    mode: HistoryMode,
    frontier: BinaryHeap<(WallClock, VersionId)>,
    seen: HashSet<VersionId>,
    done: bool,
}

impl Iterator for History<'_> {
    type Item = Result<VersionId, GraphError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (_, id) = self.frontier.pop()?;
        match self.expand(id) {
            Ok(()) => Some(Ok(id)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl History<'_> {
    fn expand(&mut self, id: VersionId) -> Result<(), GraphError> {
        let node = self.graph.get_version(id)?;
        let parents = match self.mode {
            HistoryMode::FirstParent => node.first_parent().into_iter().collect::<Vec<_>>(),
            HistoryMode::AllParents => node.parent_version_ids.clone(),
        };
        for parent in parents {
            if self.seen.insert(parent) {
                let parent = self.graph.get_version(parent)?;
                self.frontier.push((parent.created_at, parent.version_id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::store::MemoryStore;

    struct Fixture {
        clock: Arc<ManualClock>,
        graph: VersionGraph,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(WallClock(1_000)));
        let graph = VersionGraph::new(Arc::new(MemoryStore::new()), clock.clone());
        Fixture { clock, graph }
    }

    fn sid(raw: &str) -> SituationId {
        SituationId::parse(raw).unwrap()
    }

    fn commit(f: &Fixture, situation: &str, parents: &[VersionId]) -> VersionId {
        f.clock.advance(10);
        f.graph
            .create_version(
                NewVersion::new(sid(situation), AuthorId::new("tester").unwrap())
                    .with_parents(parents.iter().copied()),
            )
            .unwrap()
            .version_id
    }

    fn vid(n: u128) -> VersionId {
        VersionId::new(uuid::Uuid::from_u128(n))
    }

    #[test]
    fn ancestry_is_reflexive_and_transitive() {
        let f = fixture();
        let a = commit(&f, "s", &[]);
        let b = commit(&f, "s", &[a]);
        let c = commit(&f, "s", &[b]);
        assert!(f.graph.is_ancestor(c, c).unwrap());
        assert!(f.graph.is_ancestor(a, c).unwrap());
        assert!(f.graph.is_ancestor(b, c).unwrap());
        assert!(!f.graph.is_ancestor(c, a).unwrap());
    }

    #[test]
    fn unrelated_branches_are_not_ancestors() {
        let f = fixture();
        let root = commit(&f, "s", &[]);
        let left = commit(&f, "s", &[root]);
        let right = commit(&f, "s", &[root]);
        assert!(!f.graph.is_ancestor(left, right).unwrap());
        assert!(!f.graph.is_ancestor(right, left).unwrap());
    }

    #[test]
    fn parent_validation_rejects_malformed_requests() {
        let f = fixture();
        let other = commit(&f, "other", &[]);
        let root = commit(&f, "s", &[]);
        let author = AuthorId::new("tester").unwrap();

        let err = f
            .graph
            .create_version(NewVersion::new(sid("s"), author.clone()).with_parents([other]))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidParent { parent, .. } if parent == other));

        let err = f
            .graph
            .create_version(NewVersion::new(sid("s"), author.clone()).with_parents([root, root]))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidParent { .. }));

        let missing = vid(42);
        let err = f
            .graph
            .create_version(NewVersion::new(sid("s"), author.clone()).with_parents([missing]))
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownVersion { version_id } if version_id == missing));

        let me = vid(7);
        let err = f
            .graph
            .create_version(
                NewVersion::new(sid("s"), author.clone())
                    .with_version_id(me)
                    .with_parents([root, me]),
            )
            .unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));
        assert!(!f.graph.contains(me).unwrap());
    }

    #[test]
    fn duplicate_version_id_is_rejected() {
        let f = fixture();
        let author = AuthorId::new("tester").unwrap();
        let request = NewVersion::new(sid("s"), author).with_version_id(vid(1));
        f.graph.create_version(request.clone()).unwrap();
        assert!(matches!(
            f.graph.create_version(request),
            Err(GraphError::DuplicateVersion { .. })
        ));
    }

    #[test]
    fn created_at_moves_past_parents_when_clock_lags() {
        let f = fixture();
        let root = commit(&f, "s", &[]);
        f.clock.set(WallClock(5));
        let child = f
            .graph
            .create_version(
                NewVersion::new(sid("s"), AuthorId::new("tester").unwrap()).with_parents([root]),
            )
            .unwrap();
        let root = f.graph.get_version(root).unwrap();
        assert_eq!(child.created_at, root.created_at.succ());
    }

    #[test]
    fn lca_of_fork_is_fork_point() {
        let f = fixture();
        let v1 = commit(&f, "s", &[]);
        let left = commit(&f, "s", &[v1]);
        let right = commit(&f, "s", &[v1]);
        let left2 = commit(&f, "s", &[left]);
        assert_eq!(f.graph.lowest_common_ancestor(left2, right).unwrap(), Some(v1));
        assert_eq!(f.graph.lowest_common_ancestor(left2, left).unwrap(), Some(left));
        assert_eq!(f.graph.lowest_common_ancestor(v1, v1).unwrap(), Some(v1));
    }

    #[test]
    fn lca_of_unrelated_roots_is_none() {
        let f = fixture();
        let a = commit(&f, "s", &[]);
        let b = commit(&f, "s", &[]);
        assert_eq!(f.graph.lowest_common_ancestor(a, b).unwrap(), None);
    }

    #[test]
    fn criss_cross_merge_bases_prefer_newest_then_smallest_id() {
        let f = fixture();
        let author = AuthorId::new("tester").unwrap();
        let root = commit(&f, "s", &[]);
        // Same clock reading for both branch tips: tie on created_at.
        f.clock.advance(10);
        let mk = |id: u128, parents: Vec<VersionId>| {
            f.graph
                .create_version(
                    NewVersion::new(sid("s"), author.clone())
                        .with_version_id(vid(id))
                        .with_parents(parents),
                )
                .unwrap()
                .version_id
        };
        let b = mk(200, vec![root]);
        let a = mk(100, vec![root]);
        f.clock.advance(10);
        let c = mk(300, vec![a, b]);
        let d = mk(400, vec![b, a]);
        assert_eq!(f.graph.merge_bases(c, d).unwrap(), vec![a, b]);
        assert_eq!(f.graph.lowest_common_ancestor(c, d).unwrap(), Some(a));

        // A newer base wins over a smaller id.
        f.clock.advance(10);
        let x = mk(50, vec![c]);
        f.clock.advance(10);
        let y = mk(900, vec![d]);
        let e = mk(500, vec![x, y]);
        let g = mk(600, vec![y, x]);
        assert_eq!(f.graph.merge_bases(e, g).unwrap(), vec![y, x]);
    }

    #[test]
    fn history_follows_first_parent_or_whole_dag() {
        let f = fixture();
        let root = commit(&f, "s", &[]);
        let main = commit(&f, "s", &[root]);
        let side = commit(&f, "s", &[root]);
        let merge = commit(&f, "s", &[main, side]);

        let linear: Vec<_> = f
            .graph
            .history(merge, HistoryMode::FirstParent)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(linear, vec![merge, main, root]);

        let full = f.graph.history(merge, HistoryMode::AllParents).unwrap();
        let replay = full.clone();
        let all: Vec<_> = full.collect::<Result<_, _>>().unwrap();
        assert_eq!(all, vec![merge, side, main, root]);
        let again: Vec<_> = replay.collect::<Result<_, _>>().unwrap();
        assert_eq!(again, all);
    }

    #[test]
    fn history_of_unknown_version_fails() {
        let f = fixture();
        assert!(matches!(
            f.graph.history(vid(9), HistoryMode::FirstParent),
            Err(GraphError::UnknownVersion { .. })
        ));
    }

    #[test]
    fn versions_for_situation_windows_by_time() {
        let f = fixture();
        let v1 = commit(&f, "s", &[]);
        let v2 = commit(&f, "s", &[v1]);
        let v3 = commit(&f, "s", &[v2]);
        commit(&f, "s2", &[]);

        let all: Vec<_> = f
            .graph
            .versions_for_situation(&sid("s"), None, None)
            .unwrap()
            .iter()
            .map(|n| n.version_id)
            .collect();
        assert_eq!(all, vec![v1, v2, v3]);

        let t2 = f.graph.get_version(v2).unwrap().created_at;
        let window: Vec<_> = f
            .graph
            .versions_for_situation(&sid("s"), Some(t2), Some(t2))
            .unwrap()
            .iter()
            .map(|n| n.version_id)
            .collect();
        assert_eq!(window, vec![v2]);
    }

    #[test]
    fn node_cache_is_bounded_and_falls_back_to_the_store() {
        let clock = Arc::new(ManualClock::new(WallClock(1_000)));
        let graph = VersionGraph::with_cache_capacity(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            NonZeroUsize::new(2).unwrap(),
        );
        let f = Fixture { clock, graph };
        let mut tip = commit(&f, "s", &[]);
        let root = tip;
        for _ in 0..5 {
            tip = commit(&f, "s", &[tip]);
        }

        let history: Vec<_> = f
            .graph
            .history(tip, HistoryMode::FirstParent)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(history.len(), 6);
        assert_eq!(f.graph.nodes.lock().unwrap().len(), 2);
        assert!(f.graph.is_ancestor(root, tip).unwrap());
        assert_eq!(f.graph.get_version(root).unwrap().version_id, root);
        assert!(f.graph.nodes.lock().unwrap().len() <= 2);
    }

    #[test]
    fn nodes_survive_a_fresh_graph_over_the_same_store() {
        let store: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(WallClock(1)));
        let first = VersionGraph::new(store.clone(), clock.clone());
        let node = first
            .create_version(
                NewVersion::new(sid("s"), AuthorId::new("tester").unwrap())
                    .with_message("initial"),
            )
            .unwrap();
        let second = VersionGraph::new(store, clock);
        assert_eq!(*second.get_version(node.version_id).unwrap(), *node);
    }
}
