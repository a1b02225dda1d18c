//! Configuration types deserialized from `proxen.toml`.

use proxen_common::Tier;
use serde::Deserialize;
use std::path::PathBuf;

/// Default container name for the standard tier.
pub const DEFAULT_STANDARD_NAME: &str = "proxen_standard";

/// Default container name for the elevated tier.
pub const DEFAULT_ELEVATED_NAME: &str = "proxen_elevated";

/// File extension for persisted container images.
pub const IMAGE_EXT: &str = "pxi";

/// The top-level engine configuration parsed from `proxen.toml`.
///
/// Every section is optional; an empty file yields an in-memory engine with
/// default container names and both tiers enabled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Persistence settings.
    #[serde(default)]
    pub engine: EngineSection,
    /// Per-tier container naming and enablement.
    #[serde(default)]
    pub tiers: TiersConfig,
    /// Where elevated-tier signing material comes from.
    #[serde(default)]
    pub signing: SigningConfig,
}

impl EngineConfig {
    /// Returns a configuration that persists container images under `directory`.
    pub fn persistent(directory: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.engine.persist = true;
        config.engine.directory = Some(directory.into());
        config
    }

    /// Disables the elevated tier.
    pub fn without_elevated(mut self) -> Self {
        self.tiers.elevated.enabled = false;
        self
    }

    /// Sets the signing key file used when the elevated tier is first created.
    pub fn with_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.signing.key_file = Some(path.into());
        self
    }
}

/// The `[engine]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineSection {
    /// Whether container images are written to disk on save.
    #[serde(default)]
    pub persist: bool,
    /// Directory that relative image file names are placed in.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// The `[tiers]` section, one table per tier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TiersConfig {
    /// Standard-tier container settings.
    #[serde(default)]
    pub standard: TierConfig,
    /// Elevated-tier container settings.
    #[serde(default)]
    pub elevated: TierConfig,
}

impl TiersConfig {
    /// Returns the settings for `tier`.
    pub fn get(&self, tier: Tier) -> &TierConfig {
        match tier {
            Tier::Standard => &self.standard,
            Tier::Elevated => &self.elevated,
        }
    }
}

/// Settings for a single tier's container.
#[derive(Debug, Clone, Deserialize)]
pub struct TierConfig {
    /// Container name. Defaults to [`DEFAULT_STANDARD_NAME`] or
    /// [`DEFAULT_ELEVATED_NAME`].
    #[serde(default)]
    pub name: Option<String>,
    /// Image file name or path. Defaults to `<name>.pxi`.
    #[serde(default)]
    pub file: Option<String>,
    /// Whether the tier may be materialized at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            name: None,
            file: None,
            enabled: true,
        }
    }
}

impl TierConfig {
    /// Returns the configured container name or the tier's default.
    pub fn name_or_default(&self, tier: Tier) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => match tier {
                Tier::Standard => DEFAULT_STANDARD_NAME.to_string(),
                Tier::Elevated => DEFAULT_ELEVATED_NAME.to_string(),
            },
        }
    }

    /// Returns the configured image file or `<name>.pxi`.
    pub fn file_or_default(&self, tier: Tier) -> String {
        match &self.file {
            Some(file) => file.clone(),
            None => format!("{}.{IMAGE_EXT}", self.name_or_default(tier)),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// The `[signing]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SigningConfig {
    /// File holding raw key material for the elevated tier.
    #[serde(default)]
    pub key_file: Option<PathBuf>,
}
