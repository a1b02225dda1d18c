//! The Proxen generation engine.
//!
//! [`GenerationEngine`] ties the pieces together: it checks the structural
//! [`TypeCache`](proxen_cache::TypeCache), lazily creates at most one
//! [`GenerationContainer`](proxen_synth::GenerationContainer) per trust tier,
//! drives a [`Synthesizer`](proxen_synth::Synthesizer) on a miss, and saves or
//! loads each tier's container image.
//!
//! # Usage
//!
//! ```ignore
//! let engine = GenerationEngine::new(EngineConfig::persistent("target/proxen"));
//! let handle = engine.get_or_synthesize(&description, TierPreference::Standard)?;
//! engine.save(Some(Tier::Standard))?;
//! ```

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod stats;

pub use engine::{GenerationEngine, TierPreference, ENGINE_VERSION};
pub use error::EngineError;
pub use stats::EngineStats;
