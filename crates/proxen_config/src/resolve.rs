//! Tier resolution: turning per-tier settings into a concrete container identity.

use crate::types::EngineConfig;
use proxen_common::Tier;
use std::path::PathBuf;

/// A fully resolved tier: the container name to create and, when the engine
/// persists, where its image goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTier {
    /// The tier this resolution is for.
    pub tier: Tier,
    /// Container name.
    pub name: String,
    /// Image path. `None` unless persistence is enabled.
    pub path: Option<PathBuf>,
    /// Whether the tier may be materialized.
    pub enabled: bool,
}

/// Resolves the container name and image path for `tier`.
///
/// A relative image file is placed under `[engine].directory` when one is
/// configured; absolute files are used as-is.
pub fn resolve_tier(config: &EngineConfig, tier: Tier) -> ResolvedTier {
    let tc = config.tiers.get(tier);
    let path = config.engine.persist.then(|| {
        let file = PathBuf::from(tc.file_or_default(tier));
        match &config.engine.directory {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file,
        }
    });

    ResolvedTier {
        tier,
        name: tc.name_or_default(tier),
        path,
        enabled: tc.enabled,
    }
}
