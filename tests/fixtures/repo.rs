//! In-memory repositories with a controllable clock.

use std::sync::Arc;

use geoversion::config::Config;
use geoversion::{AuthorId, ManualClock, MemoryStore, Repository, SituationId, WallClock};

pub struct TestRepo {
    pub repo: Repository,
    pub clock: Arc<ManualClock>,
}

impl TestRepo {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(WallClock(1_700_000_000_000)));
        let repo = Repository::with_store(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            &Config::default(),
        );
        Self { repo, clock }
    }

    /// Create a situation and return its id.
    pub fn situation(&self, raw: &str) -> SituationId {
        let id = SituationId::parse(raw).expect("situation id");
        self.repo
            .registry()
            .create_situation(id.clone(), raw, "")
            .expect("create situation");
        id
    }
}

pub fn author(name: &str) -> AuthorId {
    AuthorId::new(name).expect("author")
}
