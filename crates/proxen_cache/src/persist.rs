//! Saving a tier's container and cache entries, and reading them back.

use std::path::Path;
use std::sync::Arc;

use proxen_common::{SigningKey, Tier};
use proxen_synth::{GenerationContainer, ImplHandle, Implementation, SignatureKey};
use serde::Serialize;

use crate::error::CacheError;
use crate::image::{self, ImageHeader, ImagePayload, RawImage};
use crate::mapping::MappingTable;

/// Writes `container` and its cache `entries` to `path` as one image.
///
/// `entries` must be the tier's full snapshot; the mapping table written is
/// an exact image of it. The payload is sealed when the container carries a
/// signing key.
#[tracing::instrument(level = "debug", skip_all, fields(container = container.name(), path = %path.display()))]
pub fn save_image(
    path: &Path,
    container: &Arc<GenerationContainer>,
    entries: &[(SignatureKey, ImplHandle)],
    engine_version: &str,
) -> Result<ImageHeader, CacheError> {
    let metadata: MappingTable = entries
        .iter()
        .map(|(key, handle)| (key.clone(), handle.name().to_string()))
        .collect();
    let payload = ImagePayload {
        implementations: container
            .implementations()
            .iter()
            .map(|imp| (**imp).clone())
            .collect(),
        metadata: Some(metadata),
    };

    let (header, bytes) = image::encode_image(
        container.tier(),
        container.name(),
        engine_version,
        &payload,
        container.signing_key(),
    )?;
    image::write_image_file(path, &bytes)?;

    tracing::debug!(
        implementations = payload.implementations.len(),
        mappings = entries.len(),
        sealed = header.seal.is_some(),
        bytes = bytes.len(),
        "image written"
    );
    Ok(header)
}

/// An image read back from disk, ready to be registered.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// The validated header.
    pub header: ImageHeader,
    /// The container's implementations, in definition order.
    pub implementations: Vec<Implementation>,
    /// The signature mapping.
    pub mapping: MappingTable,
}

/// Opens an image read by [`read_image_file`](image::read_image_file).
///
/// The seal is checked against `key` (see [`RawImage::verify_seal`]) before
/// the payload is decoded. An image without a mapping table fails with
/// [`CacheError::MissingMetadata`].
#[tracing::instrument(level = "debug", skip_all, fields(path = %raw.path.display()))]
pub fn load_image(raw: RawImage, key: Option<&SigningKey>) -> Result<LoadedImage, CacheError> {
    raw.verify_seal(key)?;
    let payload = raw.decode()?;
    let RawImage { path, header, .. } = raw;
    let mapping = payload
        .metadata
        .ok_or(CacheError::MissingMetadata { path })?;

    tracing::debug!(
        container = %header.container,
        tier = %header.tier,
        implementations = payload.implementations.len(),
        mappings = mapping.len(),
        "image read"
    );
    Ok(LoadedImage {
        header,
        implementations: payload.implementations,
        mapping,
    })
}

/// A human-oriented view of an image, for inspection tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    /// Tier the image was saved from.
    pub tier: Tier,
    /// Container name.
    pub container: String,
    /// Engine version that wrote the image.
    pub engine_version: String,
    /// Image format version.
    pub format_version: u32,
    /// Payload checksum, hex.
    pub checksum: String,
    /// Id of the sealing key, hex, if sealed.
    pub sealed_by: Option<String>,
    /// Implementation names, in definition order.
    pub implementations: Vec<String>,
    /// `(key, implementation)` pairs, or `None` for a bare image.
    pub mappings: Option<Vec<(String, String)>>,
}

/// Reads an image's header and mapping without registering anything.
///
/// Seals are reported but not verified. A missing mapping table is not an
/// error here.
pub fn inspect_image(path: &Path) -> Result<ImageSummary, CacheError> {
    let raw = image::read_image_file(path)?;
    let payload = raw.decode()?;
    let header = raw.header;
    Ok(ImageSummary {
        tier: header.tier,
        container: header.container,
        engine_version: header.engine_version,
        format_version: header.format_version,
        checksum: header.checksum.to_string(),
        sealed_by: header.seal.map(|s| s.key_id.to_string()),
        implementations: payload
            .implementations
            .into_iter()
            .map(|imp| imp.name)
            .collect(),
        mappings: payload.metadata.map(|table| {
            table
                .entries
                .into_iter()
                .map(|entry| (entry.key.to_string(), entry.implementation))
                .collect()
        }),
    })
}
