//! The generation engine: cache, tier containers, synthesis, persistence.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock, RwLockUpgradableReadGuard};
use proxen_cache::{load_image, read_image_file, save_image, TypeCache};
use proxen_common::{SigningKey, Tier};
use proxen_config::{resolve_tier, EngineConfig, ResolvedTier};
use proxen_synth::{
    GenerationContainer, ImplHandle, SignatureKey, Synthesizer, TargetDescription,
    TemplateSynthesizer,
};

use crate::error::EngineError;
use crate::stats::{Counters, EngineStats};

/// Version string written into every image this engine saves.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

const SIGNING_KEY: &str = "signing key";

/// Signing material, resolved at most once per engine.
enum KeyState {
    Absent,
    Ready(SigningKey),
    Unreadable(String),
}

/// Which tier a synthesized implementation should land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TierPreference {
    /// Always the standard tier.
    #[default]
    Standard,
    /// Always the elevated tier. Fails if it cannot be materialized.
    Elevated,
    /// The elevated tier when it is enabled, signing material is available,
    /// and every type in the description is trusted. Otherwise standard.
    /// A configured key file that cannot be read is an error, not a reason
    /// to fall back.
    ElevatedIfPossible,
}

/// Orchestrates lookup, synthesis, and persistence of implementations.
///
/// The engine owns one [`TypeCache`], at most one container per [`Tier`],
/// and any containers imported from loaded images. It is `Send + Sync` and
/// meant to be shared behind an `Arc`.
///
/// [`get_or_synthesize`](Self::get_or_synthesize) is not atomic: two threads
/// missing on the same key may both synthesize, and the later registration
/// wins. Callers needing exactly-once synthesis use
/// [`get_or_synthesize_exclusive`](Self::get_or_synthesize_exclusive).
pub struct GenerationEngine {
    config: EngineConfig,
    tiers: [ResolvedTier; 2],
    containers: [Mutex<Option<Arc<GenerationContainer>>>; 2],
    imported: Mutex<Vec<Arc<GenerationContainer>>>,
    cache: TypeCache,
    synthesizer: Box<dyn Synthesizer>,
    signing: OnceLock<KeyState>,
    lock: RwLock<()>,
    counters: Counters,
}

impl GenerationEngine {
    /// Creates an engine from `config` with the default
    /// [`TemplateSynthesizer`].
    pub fn new(config: EngineConfig) -> Self {
        let tiers = Tier::ALL.map(|tier| resolve_tier(&config, tier));
        Self {
            config,
            tiers,
            containers: Default::default(),
            imported: Mutex::new(Vec::new()),
            cache: TypeCache::new(),
            synthesizer: Box::new(TemplateSynthesizer::new()),
            signing: OnceLock::new(),
            lock: RwLock::new(()),
            counters: Counters::default(),
        }
    }

    /// Creates a non-persisting engine with default settings.
    pub fn in_memory() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Supplies signing material directly, taking precedence over
    /// `[signing].key_file`.
    pub fn with_signing_key(mut self, key: SigningKey) -> Self {
        self.signing = OnceLock::from(KeyState::Ready(key));
        self
    }

    /// Replaces the synthesizer used on cache misses.
    pub fn with_synthesizer(mut self, synthesizer: impl Synthesizer + 'static) -> Self {
        self.synthesizer = Box::new(synthesizer);
        self
    }

    /// The configuration the engine was built from.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The structural cache.
    pub fn cache(&self) -> &TypeCache {
        &self.cache
    }

    /// Returns the handle bound to `key`. Never synthesizes or blocks on
    /// synthesis.
    pub fn lookup(&self, key: &SignatureKey) -> Option<ImplHandle> {
        let found = self.cache.get(key);
        if found.is_some() {
            Counters::bump(&self.counters.cache_hits);
            tracing::trace!(%key, "cache hit");
        } else {
            Counters::bump(&self.counters.cache_misses);
            tracing::trace!(%key, "cache miss");
        }
        found
    }

    /// Binds `key` to `handle`. A previous binding is replaced.
    pub fn register(&self, key: SignatureKey, handle: ImplHandle) {
        tracing::debug!(%key, implementation = handle.name(), tier = %handle.tier(), "registered");
        self.cache.insert(key, handle);
    }

    /// Returns the container for `tier`, creating it on first use.
    ///
    /// Creation happens once per tier no matter how many threads race here.
    /// The elevated tier needs signing material at creation time.
    pub fn acquire_container(&self, tier: Tier) -> Result<Arc<GenerationContainer>, EngineError> {
        let mut slot = self.containers[tier.index()].lock();
        if let Some(container) = slot.as_ref() {
            return Ok(Arc::clone(container));
        }

        let container = Arc::new(self.new_tier_container(tier)?);
        *slot = Some(Arc::clone(&container));
        Counters::bump(&self.counters.containers_created);
        tracing::info!(
            tier = %tier,
            name = container.name(),
            path = ?container.path(),
            "container created"
        );
        Ok(container)
    }

    fn new_tier_container(&self, tier: Tier) -> Result<GenerationContainer, EngineError> {
        let resolved = &self.tiers[tier.index()];
        if !resolved.enabled {
            return Err(EngineError::TierDisabled(tier));
        }
        let container = GenerationContainer::new(resolved.name.clone(), tier, resolved.path.clone());
        match tier {
            Tier::Standard => Ok(container),
            Tier::Elevated => {
                let key = self
                    .signing_key()?
                    .cloned()
                    .ok_or_else(|| EngineError::MissingResource {
                        resource: SIGNING_KEY.to_string(),
                        reason: "no signing key supplied and no [signing].key_file configured"
                            .to_string(),
                    })?;
                Ok(container.with_signing_key(key))
            }
        }
    }

    /// The engine's signing key. `[signing].key_file` is read on first use
    /// only; an unreadable file is reported as `MissingResource` every time.
    fn signing_key(&self) -> Result<Option<&SigningKey>, EngineError> {
        let state = self.signing.get_or_init(|| match &self.config.signing.key_file {
            None => KeyState::Absent,
            Some(path) => match SigningKey::from_file(path) {
                Ok(key) => {
                    tracing::debug!(key_id = %key.key_id(), path = %path.display(), "signing key loaded");
                    KeyState::Ready(key)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "signing key unavailable");
                    KeyState::Unreadable(e.to_string())
                }
            },
        });
        match state {
            KeyState::Absent => Ok(None),
            KeyState::Ready(key) => Ok(Some(key)),
            KeyState::Unreadable(reason) => Err(EngineError::MissingResource {
                resource: SIGNING_KEY.to_string(),
                reason: reason.clone(),
            }),
        }
    }

    /// The container for `tier`, if it has been materialized. Never creates.
    pub fn container(&self, tier: Tier) -> Option<Arc<GenerationContainer>> {
        self.containers[tier.index()].lock().clone()
    }

    /// The configured container name for `tier`.
    pub fn container_name(&self, tier: Tier) -> &str {
        &self.tiers[tier.index()].name
    }

    /// Where `tier`'s image is saved, or `None` when persistence is off.
    pub fn container_path(&self, tier: Tier) -> Option<&Path> {
        self.tiers[tier.index()].path.as_deref()
    }

    /// Containers imported from loaded images that did not become a tier
    /// container.
    pub fn imported_containers(&self) -> Vec<Arc<GenerationContainer>> {
        self.imported.lock().clone()
    }

    /// The reader/writer lock for callers composing multi-step operations.
    ///
    /// The engine itself takes it only in
    /// [`get_or_synthesize_exclusive`](Self::get_or_synthesize_exclusive).
    pub fn lock(&self) -> &RwLock<()> {
        &self.lock
    }

    /// A snapshot of the activity counters.
    pub fn stats(&self) -> EngineStats {
        self.counters.snapshot()
    }

    /// Returns the cached implementation for `description`, synthesizing
    /// and registering one on a miss.
    ///
    /// A synthesis failure propagates and registers nothing.
    #[tracing::instrument(level = "debug", skip_all, fields(base = %description.base.name, preference = ?preference))]
    pub fn get_or_synthesize(
        &self,
        description: &TargetDescription,
        preference: TierPreference,
    ) -> Result<ImplHandle, EngineError> {
        let key = description.key();
        if let Some(handle) = self.lookup(&key) {
            return Ok(handle);
        }
        self.synthesize_and_register(key, description, preference)
    }

    /// Like [`get_or_synthesize`](Self::get_or_synthesize), but synthesizes
    /// at most once per key across threads that all use this method.
    ///
    /// The check runs under an upgradable read of [`lock`](Self::lock);
    /// synthesis and registration run under the write lock.
    #[tracing::instrument(level = "debug", skip_all, fields(base = %description.base.name, preference = ?preference))]
    pub fn get_or_synthesize_exclusive(
        &self,
        description: &TargetDescription,
        preference: TierPreference,
    ) -> Result<ImplHandle, EngineError> {
        let key = description.key();
        let guard = self.lock.upgradable_read();
        if let Some(handle) = self.lookup(&key) {
            return Ok(handle);
        }
        let _write = RwLockUpgradableReadGuard::upgrade(guard);
        self.synthesize_and_register(key, description, preference)
    }

    fn synthesize_and_register(
        &self,
        key: SignatureKey,
        description: &TargetDescription,
        preference: TierPreference,
    ) -> Result<ImplHandle, EngineError> {
        let tier = self.select_tier(description, preference)?;
        let container = self.acquire_container(tier)?;
        let handle = self.synthesizer.synthesize(&container, description)?;
        Counters::bump(&self.counters.synthesized);
        self.register(key, handle.clone());
        Ok(handle)
    }

    fn select_tier(
        &self,
        description: &TargetDescription,
        preference: TierPreference,
    ) -> Result<Tier, EngineError> {
        match preference {
            TierPreference::Standard => Ok(Tier::Standard),
            TierPreference::Elevated => Ok(Tier::Elevated),
            TierPreference::ElevatedIfPossible => {
                if !self.tiers[Tier::Elevated.index()].enabled || !description.is_trusted() {
                    return Ok(Tier::Standard);
                }
                if self.container(Tier::Elevated).is_some() || self.signing_key()?.is_some() {
                    Ok(Tier::Elevated)
                } else {
                    Ok(Tier::Standard)
                }
            }
        }
    }

    /// Writes a tier's container and its cache entries to the tier's image.
    ///
    /// With `tier` unset, the single materialized tier is saved; if both are
    /// materialized this fails with [`EngineError::AmbiguousState`], and if
    /// neither is, nothing is written. Returns the image path, or `None` when
    /// persistence is disabled or nothing was saved.
    pub fn save(&self, tier: Option<Tier>) -> Result<Option<PathBuf>, EngineError> {
        if !self.config.engine.persist {
            tracing::debug!("persistence disabled, save skipped");
            return Ok(None);
        }

        let tier = match tier {
            Some(tier) => tier,
            None => {
                let materialized: Vec<Tier> = Tier::ALL
                    .into_iter()
                    .filter(|t| self.container(*t).is_some())
                    .collect();
                match materialized.as_slice() {
                    [] => return Ok(None),
                    [only] => *only,
                    _ => return Err(EngineError::AmbiguousState),
                }
            }
        };

        let container = self.container(tier).ok_or(EngineError::NotFound(tier))?;
        let Some(path) = container.path() else {
            return Ok(None);
        };
        let entries = self.cache.snapshot_for(&container);
        save_image(path, &container, &entries, ENGINE_VERSION)?;
        tracing::info!(
            tier = %tier,
            path = %path.display(),
            implementations = container.len(),
            mappings = entries.len(),
            "saved"
        );
        Ok(Some(path.to_path_buf()))
    }

    /// Loads an image and registers every mapping whose implementation
    /// resolves in it. Returns the number of entries registered.
    ///
    /// If the image's tier has no container yet, the image becomes that
    /// tier's container, so later synthesis and saves extend it. Otherwise it
    /// is kept as a separate imported container. Mappings naming an
    /// implementation the image lacks are skipped.
    ///
    /// Signing material is consulted only for sealed or elevated images.
    /// When the engine has a key, an elevated image must carry a seal that
    /// verifies against it.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> Result<usize, EngineError> {
        let raw = read_image_file(path)?;
        let key = if raw.header.seal.is_some() || raw.header.tier == Tier::Elevated {
            self.signing_key()?
        } else {
            None
        };
        let image = load_image(raw, key)?;
        let tier = image.header.tier;

        let container = {
            let mut slot = self.containers[tier.index()].lock();
            if slot.is_some() {
                self.import_container(&image.header.container, tier)
            } else {
                match self.new_tier_container(tier) {
                    Ok(fresh) => {
                        let fresh = Arc::new(fresh);
                        *slot = Some(Arc::clone(&fresh));
                        Counters::bump(&self.counters.containers_created);
                        tracing::info!(tier = %tier, name = fresh.name(), "container adopted from image");
                        fresh
                    }
                    Err(err) => {
                        tracing::debug!(tier = %tier, error = %err, "image imported without adoption");
                        self.import_container(&image.header.container, tier)
                    }
                }
            }
        };

        for implementation in image.implementations {
            container.define(implementation);
        }

        let mut registered = 0usize;
        for entry in image.mapping.entries {
            match container.handle_for(&entry.implementation) {
                Some(handle) => {
                    self.register(entry.key, handle);
                    registered += 1;
                }
                None => {
                    tracing::debug!(
                        key = %entry.key,
                        implementation = %entry.implementation,
                        "mapping skipped: implementation not in image"
                    );
                }
            }
        }

        Counters::add(&self.counters.loaded, registered as u64);
        tracing::info!(tier = %tier, registered, "loaded");
        Ok(registered)
    }

    fn import_container(&self, name: &str, tier: Tier) -> Arc<GenerationContainer> {
        let container = Arc::new(GenerationContainer::new(name, tier, None));
        self.imported.lock().push(Arc::clone(&container));
        container
    }
}

impl std::fmt::Debug for GenerationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationEngine")
            .field("tiers", &self.tiers)
            .field("cache", &self.cache)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxen_synth::{MemberDescriptor, TypeDescriptor};

    fn key() -> SigningKey {
        SigningKey::from_material(b"engine-unit-test-key").unwrap()
    }

    fn repo() -> TargetDescription {
        TargetDescription::new(
            TypeDescriptor::class("Repo").member(MemberDescriptor::method("save").param("i64")),
        )
        .with_capability(TypeDescriptor::contract("Disposable"))
    }

    #[test]
    fn miss_then_hit() {
        let engine = GenerationEngine::in_memory();
        let first = engine
            .get_or_synthesize(&repo(), TierPreference::Standard)
            .unwrap();
        let second = engine
            .get_or_synthesize(&repo(), TierPreference::Standard)
            .unwrap();
        assert_eq!(first, second);
        let stats = engine.stats();
        assert_eq!(stats.synthesized, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.containers_created, 1);
    }

    #[test]
    fn container_is_not_created_by_inspection() {
        let engine = GenerationEngine::in_memory();
        assert!(engine.container(Tier::Standard).is_none());
        assert_eq!(engine.container_name(Tier::Standard), "proxen_standard");
        assert!(engine.container_path(Tier::Standard).is_none());
        assert_eq!(engine.stats().containers_created, 0);
    }

    #[test]
    fn elevated_without_key_is_missing_resource() {
        let engine = GenerationEngine::in_memory();
        let err = engine.acquire_container(Tier::Elevated).unwrap_err();
        assert!(matches!(err, EngineError::MissingResource { .. }));
        assert!(engine.container(Tier::Elevated).is_none());
    }

    #[test]
    fn elevated_with_key_is_sealed() {
        let engine = GenerationEngine::in_memory().with_signing_key(key());
        let container = engine.acquire_container(Tier::Elevated).unwrap();
        assert_eq!(container.tier(), Tier::Elevated);
        assert!(container.signing_key().is_some());
    }

    #[test]
    fn disabled_tier_is_rejected() {
        let engine = GenerationEngine::new(EngineConfig::default().without_elevated())
            .with_signing_key(key());
        assert!(matches!(
            engine.acquire_container(Tier::Elevated),
            Err(EngineError::TierDisabled(Tier::Elevated))
        ));
    }

    #[test]
    fn elevated_if_possible_falls_back_for_untrusted() {
        let engine = GenerationEngine::in_memory().with_signing_key(key());
        let handle = engine
            .get_or_synthesize(&repo(), TierPreference::ElevatedIfPossible)
            .unwrap();
        assert_eq!(handle.tier(), Tier::Standard);

        let trusted = TargetDescription::new(TypeDescriptor::class("Vault").trusted());
        let handle = engine
            .get_or_synthesize(&trusted, TierPreference::ElevatedIfPossible)
            .unwrap();
        assert_eq!(handle.tier(), Tier::Elevated);
    }

    #[test]
    fn elevated_if_possible_without_key_stays_standard() {
        let engine = GenerationEngine::in_memory();
        let trusted = TargetDescription::new(TypeDescriptor::class("Vault").trusted());
        let handle = engine
            .get_or_synthesize(&trusted, TierPreference::ElevatedIfPossible)
            .unwrap();
        assert_eq!(handle.tier(), Tier::Standard);
    }

    #[test]
    fn elevated_if_possible_reports_unreadable_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = GenerationEngine::new(
            EngineConfig::default().with_key_file(dir.path().join("absent.key")),
        );

        let trusted = TargetDescription::new(TypeDescriptor::class("Vault").trusted());
        let err = engine
            .get_or_synthesize(&trusted, TierPreference::ElevatedIfPossible)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingResource { .. }));
        assert!(engine.container(Tier::Standard).is_none());
        assert!(engine.cache().is_empty());

        // Untrusted descriptions never need the key.
        let handle = engine
            .get_or_synthesize(&repo(), TierPreference::ElevatedIfPossible)
            .unwrap();
        assert_eq!(handle.tier(), Tier::Standard);
    }

    #[test]
    fn key_file_is_read_once() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("proxen.key");
        std::fs::write(&key_file, b"engine-unit-test-key").unwrap();
        let engine = GenerationEngine::new(EngineConfig::default().with_key_file(&key_file));

        let first = engine.signing_key().unwrap().map(SigningKey::key_id);
        std::fs::remove_file(&key_file).unwrap();
        let second = engine.signing_key().unwrap().map(SigningKey::key_id);
        assert_eq!(first, Some(key().key_id()));
        assert_eq!(first, second);
    }

    #[test]
    fn programmatic_key_wins_over_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let engine = GenerationEngine::new(
            EngineConfig::default().with_key_file(dir.path().join("absent.key")),
        )
        .with_signing_key(key());
        assert!(engine.acquire_container(Tier::Elevated).is_ok());
    }

    #[test]
    fn synthesis_failure_registers_nothing() {
        let engine = GenerationEngine::in_memory();
        let sealed = TargetDescription::new(TypeDescriptor::class("Account").sealed());
        let err = engine
            .get_or_synthesize(&sealed, TierPreference::Standard)
            .unwrap_err();
        assert!(matches!(err, EngineError::Synthesis(_)));
        assert!(engine.cache().is_empty());
        assert_eq!(engine.container(Tier::Standard).map(|c| c.len()), Some(0));
    }

    #[test]
    fn register_is_last_write_wins() {
        let engine = GenerationEngine::in_memory();
        let container = engine.acquire_container(Tier::Standard).unwrap();
        let a = TemplateSynthesizer::new()
            .synthesize(&container, &repo())
            .unwrap();
        let b = TemplateSynthesizer::new()
            .synthesize(&container, &repo())
            .unwrap();
        engine.register(repo().key(), a);
        engine.register(repo().key(), b.clone());
        assert_eq!(engine.lookup(&repo().key()), Some(b));
    }

    #[test]
    fn in_memory_save_is_none() {
        let engine = GenerationEngine::in_memory();
        engine
            .get_or_synthesize(&repo(), TierPreference::Standard)
            .unwrap();
        assert!(engine.save(Some(Tier::Standard)).unwrap().is_none());
        assert!(engine.save(None).unwrap().is_none());
    }

    #[test]
    fn custom_synthesizer_is_used() {
        struct Refusing;
        impl Synthesizer for Refusing {
            fn synthesize(
                &self,
                _container: &Arc<GenerationContainer>,
                description: &TargetDescription,
            ) -> Result<ImplHandle, proxen_synth::SynthesisError> {
                Err(proxen_synth::SynthesisError::NotAContract {
                    name: description.base.name.to_string(),
                })
            }
        }

        let engine = GenerationEngine::in_memory().with_synthesizer(Refusing);
        assert!(matches!(
            engine.get_or_synthesize(&repo(), TierPreference::Standard),
            Err(EngineError::Synthesis(_))
        ));
    }
}
