//! Engine activity counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// A point-in-time copy of the engine's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Tier containers created (at most one per tier).
    pub containers_created: u64,
    /// Lookups that found a handle.
    pub cache_hits: u64,
    /// Lookups that found nothing.
    pub cache_misses: u64,
    /// Implementations produced by the synthesizer.
    pub synthesized: u64,
    /// Cache entries registered from loaded images.
    pub loaded: u64,
}

#[derive(Default)]
pub(crate) struct Counters {
    pub(crate) containers_created: AtomicU64,
    pub(crate) cache_hits: AtomicU64,
    pub(crate) cache_misses: AtomicU64,
    pub(crate) synthesized: AtomicU64,
    pub(crate) loaded: AtomicU64,
}

impl Counters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> EngineStats {
        EngineStats {
            containers_created: self.containers_created.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            synthesized: self.synthesized.load(Ordering::Relaxed),
            loaded: self.loaded.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_bumps() {
        let counters = Counters::default();
        Counters::bump(&counters.cache_hits);
        Counters::bump(&counters.cache_hits);
        Counters::add(&counters.loaded, 3);
        let stats = counters.snapshot();
        assert_eq!(stats.cache_hits, 2);
        assert_eq!(stats.loaded, 3);
        assert_eq!(stats.cache_misses, 0);
    }
}
