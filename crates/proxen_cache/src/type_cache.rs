//! The structural lookup table from signature keys to implementation handles.

use std::sync::Arc;

use dashmap::DashMap;
use proxen_synth::{GenerationContainer, ImplHandle, SignatureKey};

/// Concurrent, add-only map from [`SignatureKey`] to [`ImplHandle`].
///
/// Single-key operations are linearizable and need no external locking.
/// Entries are never evicted; a second insert for the same key replaces the
/// handle (last write wins).
#[derive(Default)]
pub struct TypeCache {
    entries: DashMap<SignatureKey, ImplHandle>,
}

impl TypeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle bound to `key`, if any.
    pub fn get(&self, key: &SignatureKey) -> Option<ImplHandle> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Binds `key` to `handle`, returning the handle it replaced.
    pub fn insert(&self, key: SignatureKey, handle: ImplHandle) -> Option<ImplHandle> {
        self.entries.insert(key, handle)
    }

    /// Number of bound keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry whose handle lives in `container`, ordered by
    /// implementation name and then key.
    pub fn snapshot_for(
        &self,
        container: &Arc<GenerationContainer>,
    ) -> Vec<(SignatureKey, ImplHandle)> {
        let mut entries: Vec<(SignatureKey, ImplHandle)> = self
            .entries
            .iter()
            .filter(|entry| entry.value().belongs_to(container))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|(ka, ha), (kb, hb)| {
            ha.name()
                .cmp(hb.name())
                .then_with(|| ka.to_string().cmp(&kb.to_string()))
        });
        entries
    }
}

impl std::fmt::Debug for TypeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
