//! Layer 3: Situation and SituationVersion records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::identity::{AuthorId, ContentHash, SituationId, VersionId};
use super::time::WallClock;

/// Named, independently versioned collection of BPOs.
///
/// Mutable: `updated_at` and `heads` move on every commit. Owned by the
/// situation registry; holds only references to versions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Situation {
    pub situation_id: SituationId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: WallClock,
    pub updated_at: WallClock,
    #[serde(default)]
    pub heads: BTreeSet<VersionId>,
}

impl Situation {
    pub fn new(
        situation_id: SituationId,
        name: impl Into<String>,
        description: impl Into<String>,
        now: WallClock,
    ) -> Self {
        Self {
            situation_id,
            name: name.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
            heads: BTreeSet::new(),
        }
    }

    /// More than one head means the history has forked.
    pub fn is_forked(&self) -> bool {
        self.heads.len() > 1
    }

    /// The single head, if there is exactly one.
    pub fn sole_head(&self) -> Option<VersionId> {
        match self.heads.len() {
            1 => self.heads.iter().next().copied(),
            _ => None,
        }
    }
}

/// Immutable commit node.
///
/// `bpo_refs` is the complete snapshot for this version, not a patch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationVersion {
    pub version_id: VersionId,
    pub situation_id: SituationId,
    /// Ordered: the first entry is the mainline parent.
    #[serde(default)]
    pub parent_version_ids: Vec<VersionId>,
    #[serde(default)]
    pub commit_message: String,
    pub author: AuthorId,
    pub created_at: WallClock,
    #[serde(default)]
    pub bpo_refs: BTreeSet<ContentHash>,
}

impl SituationVersion {
    pub fn is_root(&self) -> bool {
        self.parent_version_ids.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parent_version_ids.len() > 1
    }

    pub fn first_parent(&self) -> Option<VersionId> {
        self.parent_version_ids.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sole_head_only_when_linear() {
        let mut situation = Situation::new(
            SituationId::parse("harbour").unwrap(),
            "Harbour",
            "",
            WallClock(1),
        );
        assert_eq!(situation.sole_head(), None);
        let a = VersionId::generate();
        situation.heads.insert(a);
        assert_eq!(situation.sole_head(), Some(a));
        situation.heads.insert(VersionId::generate());
        assert!(situation.is_forked());
        assert_eq!(situation.sole_head(), None);
    }

    #[test]
    fn version_record_serde_roundtrip() {
        let version = SituationVersion {
            version_id: VersionId::generate(),
            situation_id: SituationId::parse("harbour").unwrap(),
            parent_version_ids: vec![VersionId::generate(), VersionId::generate()],
            commit_message: "merge".into(),
            author: AuthorId::new("planner").unwrap(),
            created_at: WallClock(7),
            bpo_refs: [ContentHash::digest(b"x")].into_iter().collect(),
        };
        let json = serde_json::to_vec(&version).unwrap();
        let back: SituationVersion = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, version);
        assert!(back.is_merge());
    }
}
