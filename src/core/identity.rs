//! Layer 1: Identity atoms
//!
//! SituationId: human-facing situation name
//! VersionId: commit node identifier
//! AuthorId: commit attribution
//! StableIdentity: BPO identity that survives content edits
//! ContentHash / DeltaId: SHA-256 digests

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::error::{CoreError, InvalidId};

const MAX_SITUATION_ID_LEN: usize = 64;

/// Situation identifier.
///
/// ASCII alphanumerics plus `.`, `_`, `-` and `:`; at most 64 bytes. The
/// restricted alphabet keeps ids usable as store key components.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SituationId(String);

impl SituationId {
    pub fn parse(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        let invalid = |raw: &str, reason: &str| -> CoreError {
            InvalidId::Situation {
                raw: raw.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };
        if s.is_empty() {
            return Err(invalid(&s, "empty"));
        }
        if s.len() > MAX_SITUATION_ID_LEN {
            return Err(invalid(&s, "longer than 64 bytes"));
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-' | b':'))
        {
            return Err(invalid(&s, "contains characters outside [A-Za-z0-9._:-]"));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SituationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SituationId({:?})", self.0)
    }
}

impl fmt::Display for SituationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SituationId {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        SituationId::parse(s)
    }
}

impl From<SituationId> for String {
    fn from(id: SituationId) -> String {
        id.0
    }
}

/// Version identifier - a random UUID assigned at commit time.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(Uuid);

impl VersionId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse_str(s: &str) -> Result<Self, CoreError> {
        Uuid::parse_str(s).map(Self).map_err(|err| {
            InvalidId::Version {
                raw: s.to_string(),
                reason: err.to_string(),
            }
            .into()
        })
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionId({})", self.0)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for VersionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Commit author - non-empty string after trimming.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthorId(String);

impl AuthorId {
    pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.trim().is_empty() {
            Err(InvalidId::Author {
                raw: s,
                reason: "empty".into(),
            }
            .into())
        } else {
            Ok(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorId({:?})", self.0)
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AuthorId {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        AuthorId::new(s)
    }
}

impl From<AuthorId> for String {
    fn from(id: AuthorId) -> String {
        id.0
    }
}

/// Identity of a planning object that persists across content edits.
///
/// Never part of the content hash: two BPOs with different content but the
/// same identity are "the same object, modified".
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StableIdentity(String);

impl StableIdentity {
    pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.trim().is_empty() {
            Err(InvalidId::Identity {
                raw: s,
                reason: "empty".into(),
            }
            .into())
        } else {
            Ok(Self(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StableIdentity({:?})", self.0)
    }
}

impl fmt::Display for StableIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for StableIdentity {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        StableIdentity::new(s)
    }
}

impl From<StableIdentity> for String {
    fn from(id: StableIdentity) -> String {
        id.0
    }
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&out);
    buf
}

fn to_hex(bytes: &[u8; 32]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn parse_hex32(s: &str) -> Result<[u8; 32], String> {
    if s.len() != 64 {
        return Err(format!("must be 64 hex chars (got {})", s.len()));
    }
    let mut bytes = [0u8; 32];
    for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
        let hex = std::str::from_utf8(chunk).map_err(|_| "contains invalid UTF-8".to_string())?;
        if !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(format!("contains invalid lowercase hex: {}", hex));
        }
        bytes[i] = u8::from_str_radix(hex, 16)
            .map_err(|_| format!("contains invalid hex: {}", hex))?;
    }
    Ok(bytes)
}

/// Content hash - SHA-256 of a BPO's canonical encoding.
///
/// Ordering is byte order, which matches the ordering of the hex form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash canonical bytes.
    pub fn digest(canonical: &[u8]) -> Self {
        Self(sha256(canonical))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Parse from lowercase hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        parse_hex32(s).map(Self).map_err(|reason| {
            InvalidId::ContentHash {
                raw: s.to_string(),
                reason,
            }
            .into()
        })
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl serde::Serialize for ContentHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for ContentHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ContentHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Delta identifier - deterministic digest of the ordered version pair.
///
/// Deterministic so that concurrent computations of the same delta collide
/// on the same store key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeltaId([u8; 32]);

impl DeltaId {
    pub fn for_pair(from: VersionId, to: VersionId) -> Self {
        let preimage = format!("delta\n{from}\n{to}");
        Self(sha256(preimage.as_bytes()))
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        parse_hex32(s).map(Self).map_err(|reason| {
            InvalidId::Delta {
                raw: s.to_string(),
                reason,
            }
            .into()
        })
    }
}

impl fmt::Debug for DeltaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeltaId({})", self.to_hex())
    }
}

impl fmt::Display for DeltaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl serde::Serialize for DeltaId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for DeltaId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DeltaId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn situation_id_rejects_separators_and_empty() {
        assert!(SituationId::parse("harbour-plan_2026.v2").is_ok());
        assert!(SituationId::parse("").is_err());
        assert!(SituationId::parse("a b").is_err());
        assert!(SituationId::parse("a\u{1f}b").is_err());
        assert!(SituationId::parse("x".repeat(65)).is_err());
    }

    #[test]
    fn content_hash_hex_roundtrip_and_order() {
        let a = ContentHash::digest(b"a");
        let b = ContentHash::digest(b"b");
        assert_eq!(ContentHash::from_hex(&a.to_hex()).unwrap(), a);
        assert_eq!(a.cmp(&b), a.to_hex().cmp(&b.to_hex()));
        assert_eq!(
            ContentHash::digest(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn content_hash_rejects_uppercase_and_short() {
        let hex = ContentHash::digest(b"a").to_hex();
        assert!(ContentHash::from_hex(&hex.to_uppercase()).is_err());
        assert!(ContentHash::from_hex(&hex[..10]).is_err());
    }

    #[test]
    fn delta_id_depends_on_direction() {
        let a = VersionId::generate();
        let b = VersionId::generate();
        assert_eq!(DeltaId::for_pair(a, b), DeltaId::for_pair(a, b));
        assert_ne!(DeltaId::for_pair(a, b), DeltaId::for_pair(b, a));
    }

    #[test]
    fn author_and_identity_reject_blank() {
        assert!(AuthorId::new("  ").is_err());
        assert!(StableIdentity::new("").is_err());
        assert_eq!(StableIdentity::new("parcel-7").unwrap().as_str(), "parcel-7");
    }
}
