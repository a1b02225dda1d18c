//! Signing material for the elevated generation tier.
//!
//! Key material of any length (at least [`MIN_KEY_MATERIAL`] bytes) is
//! stretched into a 32-byte BLAKE3 key. Images produced by the elevated tier
//! carry a [`Seal`]: the key's public id plus a keyed MAC over the payload.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;

/// Domain-separation context for key derivation.
const KEY_CONTEXT: &str = "proxen 2024 elevated-tier image seal";

/// Minimum number of bytes of raw key material.
pub const MIN_KEY_MATERIAL: usize = 16;

/// Errors that can occur while obtaining signing material.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The key file could not be read.
    #[error("cannot read signing key {path}: {source}")]
    Io {
        /// The key file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The key material is too short to be used.
    #[error("signing key material is {len} bytes, need at least {MIN_KEY_MATERIAL}")]
    TooShort {
        /// Length of the supplied material.
        len: usize,
    },
}

/// A derived 32-byte key used to seal elevated-tier images.
#[derive(Clone)]
pub struct SigningKey {
    key: [u8; 32],
}

impl SigningKey {
    /// Derives a signing key from raw key material.
    pub fn from_material(material: &[u8]) -> Result<Self, KeyError> {
        if material.len() < MIN_KEY_MATERIAL {
            return Err(KeyError::TooShort {
                len: material.len(),
            });
        }
        Ok(Self {
            key: blake3::derive_key(KEY_CONTEXT, material),
        })
    }

    /// Reads key material from a file and derives a signing key from it.
    pub fn from_file(path: &Path) -> Result<Self, KeyError> {
        let material = std::fs::read(path).map_err(|e| KeyError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_material(&material)
    }

    /// Returns the public identifier of this key.
    pub fn key_id(&self) -> ContentHash {
        ContentHash::from_bytes(blake3::hash(&self.key).as_bytes())
    }

    /// Computes a seal over `payload`.
    pub fn seal(&self, payload: &[u8]) -> Seal {
        Seal {
            key_id: self.key_id(),
            mac: *blake3::keyed_hash(&self.key, payload).as_bytes(),
        }
    }

    /// Returns `true` if `seal` was produced by this key over `payload`.
    pub fn verify(&self, seal: &Seal, payload: &[u8]) -> bool {
        if seal.key_id != self.key_id() {
            return false;
        }
        // `blake3::Hash` equality is constant-time.
        blake3::keyed_hash(&self.key, payload) == blake3::Hash::from(seal.mac)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id())
            .finish_non_exhaustive()
    }
}

/// A keyed MAC attached to a sealed image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seal {
    /// Public id of the key that produced the MAC.
    pub key_id: ContentHash,
    /// BLAKE3 keyed hash of the image payload.
    pub mac: [u8; 32],
}
