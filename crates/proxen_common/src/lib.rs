//! Shared foundational types used across the Proxen synthesis engine.
//!
//! This crate provides content hashing for structural fingerprints and image
//! checksums, interned identifiers for container symbol tables, the trust
//! [`Tier`] enum, and the signing key used to seal elevated-tier images.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod signing;
pub mod tier;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use signing::{KeyError, Seal, SigningKey};
pub use tier::Tier;
