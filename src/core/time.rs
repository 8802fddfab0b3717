//! Layer 0: Time primitives
//!
//! WallClock is a millisecond timestamp used for `created_at`/`updated_at`
//! and for the LCA tie-break. Ordering of versions is made causal by the
//! version graph, not by the clock.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WallClock(pub u64);

impl WallClock {
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(ms)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Next millisecond; saturates.
    pub fn succ(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Source of timestamps for new versions and situation updates.
pub trait Clock: Send + Sync {
    fn now(&self) -> WallClock;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> WallClock {
        WallClock::now()
    }
}

/// Clock that only moves when told to. Deterministic timestamps for tests
/// and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start: WallClock) -> Self {
        Self {
            ms: AtomicU64::new(start.0),
        }
    }

    pub fn set(&self, at: WallClock) {
        self.ms.store(at.0, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> WallClock {
        WallClock(self.ms.load(Ordering::SeqCst))
    }
}
