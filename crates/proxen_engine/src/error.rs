//! Engine-level errors.

use std::path::PathBuf;

use proxen_cache::CacheError;
use proxen_common::Tier;
use proxen_synth::SynthesisError;

/// Errors surfaced by [`GenerationEngine`](crate::GenerationEngine).
///
/// A failed operation leaves no partially created container and no cache
/// mutation behind.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `save` was called without a tier while both tiers are materialized.
    #[error("both tiers are materialized; specify which tier to save")]
    AmbiguousState,

    /// The requested tier has never been materialized.
    #[error("the {0} tier has not been materialized")]
    NotFound(Tier),

    /// A loaded image carries no signature mapping.
    #[error("image {path} has no signature mapping metadata")]
    MissingMetadata {
        /// The image path.
        path: PathBuf,
    },

    /// Required external material is absent or unreadable.
    #[error("missing {resource}: {reason}")]
    MissingResource {
        /// What was needed.
        resource: String,
        /// Why it could not be obtained.
        reason: String,
    },

    /// The tier is disabled in configuration.
    #[error("the {0} tier is disabled")]
    TierDisabled(Tier),

    /// The synthesizer rejected the description.
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Reading or writing a container image failed.
    #[error("persistence failed: {0}")]
    Persistence(CacheError),
}

impl From<CacheError> for EngineError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::MissingMetadata { path } => EngineError::MissingMetadata { path },
            other => EngineError::Persistence(other),
        }
    }
}
