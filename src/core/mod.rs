//! Core domain types for geoversion (Layers 0-3)
//!
//! Module hierarchy follows type dependency order:
//! - time: WallClock, Clock (Layer 0)
//! - identity: SituationId, VersionId, ContentHash, StableIdentity (Layer 1)
//! - geometry, attributes: GeoJSON shape and attribute map (Layer 2)
//! - json_canon, canon: canonical encoding and content hash (Layer 2)
//! - bpo: Bpo (Layer 3)
//! - situation: Situation, SituationVersion (Layer 3)

pub mod attributes;
pub mod bpo;
pub mod canon;
pub mod error;
pub mod geometry;
pub mod identity;
pub mod json_canon;
pub mod situation;
pub mod time;

pub use attributes::{AttrValue, Attributes};
pub use bpo::Bpo;
pub use canon::{CANON_VERSION, COORDINATE_SCALE, canonicalize, canonicalize_json, content_hash};
pub use error::{CoreError, EncodingError, InvalidId};
pub use geometry::{Geometry, GeometryType, Position};
pub use identity::{AuthorId, ContentHash, DeltaId, SituationId, StableIdentity, VersionId};
pub use json_canon::to_canon_json_bytes;
pub use situation::{Situation, SituationVersion};
pub use time::{Clock, ManualClock, SystemClock, WallClock};
