//! Layer 3: Basic Planning Object
//!
//! Immutable (geometry, attributes) value plus an optional stable identity.
//! The identity is deliberately outside the content hash.

use serde::{Deserialize, Serialize};

use super::attributes::Attributes;
use super::canon;
use super::error::{CoreError, EncodingError};
use super::geometry::{Geometry, GeometryType};
use super::identity::{ContentHash, StableIdentity};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bpo {
    geometry: Geometry,
    attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity: Option<StableIdentity>,
}

impl Bpo {
    /// Build a BPO, validating geometry and attributes up front.
    pub fn new(geometry: Geometry, attributes: Attributes) -> Result<Self, EncodingError> {
        geometry.validate()?;
        attributes.validate()?;
        Ok(Self {
            geometry,
            attributes,
            identity: None,
        })
    }

    /// Build from raw GeoJSON geometry and a JSON attribute object.
    pub fn from_json(
        geometry: serde_json::Value,
        attributes: serde_json::Value,
    ) -> Result<Self, EncodingError> {
        Self::new(
            Geometry::from_geojson(geometry)?,
            Attributes::from_json(attributes)?,
        )
    }

    /// Explicitly assign a stable identity.
    pub fn with_identity(mut self, identity: StableIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Derive the stable identity from a text or integer attribute, unless one
    /// was already assigned. Missing or non-scalar attributes leave the BPO
    /// without identity.
    pub fn identity_from_attribute(mut self, key: &str) -> Result<Self, CoreError> {
        if self.identity.is_some() {
            return Ok(self);
        }
        if let Some(raw) = self.attributes.get(key).and_then(|v| v.as_identity_str()) {
            self.identity = Some(StableIdentity::new(raw)?);
        }
        Ok(self)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry.geometry_type()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn identity(&self) -> Option<&StableIdentity> {
        self.identity.as_ref()
    }

    pub fn canonical_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        canon::canonicalize(&self.geometry, &self.attributes)
    }

    pub fn content_hash(&self) -> Result<ContentHash, EncodingError> {
        canon::content_hash(&self.geometry, &self.attributes)
    }
}
