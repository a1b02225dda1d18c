//! Error types for cache persistence.

use std::path::PathBuf;

/// Errors raised while writing or reading container images.
///
/// Unlike a lookup miss, every one of these is a hard failure: a damaged or
/// foreign image is never silently treated as empty.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing an image.
    #[error("image I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The image has an invalid or truncated header.
    #[error("invalid image header in {path}: {reason}")]
    InvalidHeader {
        /// The image path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The image path.
        path: PathBuf,
        /// The checksum recorded in the header.
        expected: String,
        /// The checksum computed from the payload.
        actual: String,
    },

    /// The image format version is not the one this build writes.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The image path.
        path: PathBuf,
        /// The supported format version.
        expected: u32,
        /// The version found in the file.
        actual: u32,
    },

    /// The image carries no mapping table.
    #[error("image {path} has no signature mapping metadata")]
    MissingMetadata {
        /// The image path.
        path: PathBuf,
    },

    /// The image seal does not verify against the loading key.
    #[error("seal mismatch in {path}: image was not sealed by this key")]
    SealMismatch {
        /// The image path.
        path: PathBuf,
    },

    /// An elevated-tier image carries no seal, but the loader holds a key.
    #[error("elevated image {path} is not sealed")]
    Unsealed {
        /// The image path.
        path: PathBuf,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}
