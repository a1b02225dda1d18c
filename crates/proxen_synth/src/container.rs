//! Generation containers: append-only homes for synthesized implementations.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use proxen_common::{Ident, Interner, SigningKey, Tier};

use crate::implementation::{ImplHandle, Implementation};

/// A named, append-only unit of synthesized implementations for one tier.
///
/// Implementation names are unique within a container: the container's
/// naming scope disambiguates a colliding suggestion by appending `_1`,
/// `_2`, and so on. Implementations are never removed or replaced.
pub struct GenerationContainer {
    name: String,
    tier: Tier,
    path: Option<PathBuf>,
    signing_key: Option<SigningKey>,
    /// Symbol table for implementation names.
    symbols: Interner,
    state: RwLock<ContainerState>,
}

#[derive(Default)]
struct ContainerState {
    implementations: Vec<Arc<Implementation>>,
    by_name: HashMap<Ident, usize>,
}

impl GenerationContainer {
    /// Creates an empty container.
    ///
    /// `path` is where the container's image is written on save; `None`
    /// means the container is never persisted.
    pub fn new(name: impl Into<String>, tier: Tier, path: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            tier,
            path,
            signing_key: None,
            symbols: Interner::new(),
            state: RwLock::new(ContainerState::default()),
        }
    }

    /// Attaches the key used to seal this container's images.
    pub fn with_signing_key(mut self, key: SigningKey) -> Self {
        self.signing_key = Some(key);
        self
    }

    /// The container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The container's tier.
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Where the container's image is written, if persisted.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The signing key wired in at creation, if any.
    pub fn signing_key(&self) -> Option<&SigningKey> {
        self.signing_key.as_ref()
    }

    /// Number of implementations defined.
    pub fn len(&self) -> usize {
        self.state.read().implementations.len()
    }

    /// Returns `true` if nothing has been defined yet.
    pub fn is_empty(&self) -> bool {
        self.state.read().implementations.is_empty()
    }

    /// Returns `true` if an implementation named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.symbols
            .get(name)
            .is_some_and(|id| self.state.read().by_name.contains_key(&id))
    }

    /// Snapshot of every implementation, in definition order.
    pub fn implementations(&self) -> Vec<Arc<Implementation>> {
        self.state.read().implementations.clone()
    }

    /// Returns a handle to the implementation named `name`.
    pub fn handle_for(self: &Arc<Self>, name: &str) -> Option<ImplHandle> {
        let id = self.symbols.get(name)?;
        let state = self.state.read();
        let index = *state.by_name.get(&id)?;
        Some(ImplHandle::new(
            Arc::clone(&state.implementations[index]),
            Arc::clone(self),
        ))
    }

    /// Adds an implementation, renaming it if its name is already taken.
    ///
    /// The unique name is chosen and the implementation inserted under one
    /// write lock, so concurrent definitions never collide.
    pub fn define(self: &Arc<Self>, mut implementation: Implementation) -> ImplHandle {
        let mut state = self.state.write();
        implementation.name = self.unique_name(&state, &implementation.name);
        let id = self.symbols.get_or_intern(&implementation.name);
        let implementation = Arc::new(implementation);
        let index = state.implementations.len();
        state.by_name.insert(id, index);
        state.implementations.push(Arc::clone(&implementation));
        ImplHandle::new(implementation, Arc::clone(self))
    }

    fn unique_name(&self, state: &ContainerState, suggested: &str) -> String {
        let taken = |name: &str| {
            self.symbols
                .get(name)
                .is_some_and(|id| state.by_name.contains_key(&id))
        };
        if !taken(suggested) {
            return suggested.to_string();
        }
        let mut counter = 1usize;
        loop {
            let candidate = format!("{suggested}_{counter}");
            if !taken(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

impl fmt::Debug for GenerationContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationContainer")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .field("path", &self.path)
            .field("implementations", &self.len())
            .finish()
    }
}
