//! Core capability errors (identifier parsing, geometry and attribute encoding).
//!
//! These are bounded and stable: core errors represent domain/refusal states,
//! not library implementation details.

use thiserror::Error;

use crate::error::{Effect, Transience};

/// Invalid identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidId {
    #[error("situation id `{raw}` is invalid: {reason}")]
    Situation { raw: String, reason: String },
    #[error("version id `{raw}` is invalid: {reason}")]
    Version { raw: String, reason: String },
    #[error("author `{raw}` is invalid: {reason}")]
    Author { raw: String, reason: String },
    #[error("stable identity `{raw}` is invalid: {reason}")]
    Identity { raw: String, reason: String },
    #[error("content hash `{raw}` is invalid: {reason}")]
    ContentHash { raw: String, reason: String },
    #[error("delta id `{raw}` is invalid: {reason}")]
    Delta { raw: String, reason: String },
}

/// A geometry or attribute set that cannot be brought into canonical form.
///
/// User data problem: never retried, always surfaced to the caller.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum EncodingError {
    #[error("non-finite coordinate {value} at {path}")]
    NonFiniteCoordinate { path: String, value: f64 },
    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: String },
    #[error("attribute `{key}` is unsupported: {reason}")]
    UnsupportedAttribute { key: String, reason: String },
    #[error("canonical json encode failed: {reason}")]
    Json { reason: String },
}

impl EncodingError {
    pub(crate) fn geometry(reason: impl Into<String>) -> Self {
        EncodingError::InvalidGeometry {
            reason: reason.into(),
        }
    }

    pub(crate) fn attribute(key: impl Into<String>, reason: impl Into<String>) -> Self {
        EncodingError::UnsupportedAttribute {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EncodingError {
    fn from(err: serde_json::Error) -> Self {
        EncodingError::Json {
            reason: err.to_string(),
        }
    }
}

/// Canonical error enum for core capability.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl CoreError {
    pub fn transience(&self) -> Transience {
        // Core errors are pure domain/input failures.
        Transience::Permanent
    }

    pub fn effect(&self) -> Effect {
        Effect::None
    }
}
