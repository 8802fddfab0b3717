//! Repository: the components wired over one durable store.

use std::sync::Arc;

use crate::cas::ObjectStore;
use crate::config::{Config, StoreBackend};
use crate::core::{Clock, SystemClock};
use crate::delta::DeltaEngine;
use crate::graph::VersionGraph;
use crate::registry::SituationRegistry;
use crate::store::{DurableStore, FsStore, MemoryStore};
use crate::{Result, paths};

pub struct Repository {
    store: Arc<dyn DurableStore>,
    objects: ObjectStore,
    graph: Arc<VersionGraph>,
    deltas: DeltaEngine,
    registry: SituationRegistry,
}

impl Repository {
    /// Open the store selected by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        let store: Arc<dyn DurableStore> = match config.store.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Fs => {
                let root = config.store.data_dir.clone().unwrap_or_else(paths::store_dir);
                tracing::info!(root = %root.display(), "opening filesystem store");
                Arc::new(FsStore::open(root)?)
            }
        };
        Ok(Self::with_store(store, Arc::new(SystemClock), config))
    }

    /// Fresh in-memory repository with default settings.
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), Arc::new(SystemClock), &Config::default())
    }

    pub fn with_store(store: Arc<dyn DurableStore>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        let objects = ObjectStore::new(store.clone(), clock.clone());
        let graph = Arc::new(VersionGraph::new(store.clone(), clock.clone()));
        let deltas = DeltaEngine::new(graph.clone(), objects.clone(), store.clone(), config.delta.cache);
        let registry = SituationRegistry::new(store.clone(), objects.clone(), graph.clone(), clock)
            .with_identity_attribute(config.identity.attribute.clone());
        Self {
            store,
            objects,
            graph,
            deltas,
            registry,
        }
    }

    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn graph(&self) -> &VersionGraph {
        &self.graph
    }

    pub fn deltas(&self) -> &DeltaEngine {
        &self.deltas
    }

    pub fn registry(&self) -> &SituationRegistry {
        &self.registry
    }
}
