//! The persisted signature mapping embedded in container images.

use serde::{Deserialize, Serialize};

use proxen_synth::SignatureKey;

/// One persisted binding from a signature key to an implementation name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// The structural key.
    pub key: SignatureKey,
    /// The implementation's name inside the image's container.
    pub implementation: String,
}

/// The full set of key bindings for one tier at save time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTable {
    /// Entries, in the order they were snapshotted.
    pub entries: Vec<MappingEntry>,
}

impl MappingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a binding.
    pub fn push(&mut self, key: SignatureKey, implementation: impl Into<String>) {
        self.entries.push(MappingEntry {
            key,
            implementation: implementation.into(),
        });
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no bindings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the bindings.
    pub fn iter(&self) -> impl Iterator<Item = &MappingEntry> {
        self.entries.iter()
    }
}

impl FromIterator<(SignatureKey, String)> for MappingTable {
    fn from_iter<I: IntoIterator<Item = (SignatureKey, String)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, implementation)| MappingEntry {
                    key,
                    implementation,
                })
                .collect(),
        }
    }
}
