#![forbid(unsafe_code)]

pub mod cas;
pub mod config;
pub mod core;
pub mod delta;
pub mod error;
pub mod graph;
pub mod paths;
pub mod registry;
pub mod repo;
pub mod store;
pub mod telemetry;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the main types at crate root for convenience
pub use crate::cas::{CasError, ObjectStore};
pub use crate::core::{
    AttrValue, Attributes, AuthorId, Bpo, Clock, ContentHash, DeltaId, Geometry, GeometryType,
    ManualClock, Position, Situation, SituationId, SituationVersion, StableIdentity, SystemClock,
    VersionId, WallClock,
};
pub use crate::delta::{DeltaEngine, DeltaError, DeltaWarning, VersionDelta};
pub use crate::graph::{GraphError, HistoryMode, NewVersion, VersionGraph};
pub use crate::registry::{RegistryError, SituationRegistry};
pub use crate::repo::Repository;
pub use crate::store::{DurableStore, FsStore, MemoryStore, StoreError};
