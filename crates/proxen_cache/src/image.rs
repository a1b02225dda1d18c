//! The on-disk container image format.
//!
//! An image is one file per tier: a 4-byte little-endian header length, a
//! bincode-encoded [`ImageHeader`], then the bincode-encoded
//! [`ImagePayload`]. The header carries magic bytes, the format version, and
//! a checksum of the payload bytes so that corruption is caught before the
//! payload is decoded.

use std::path::{Path, PathBuf};

use proxen_common::{ContentHash, Seal, SigningKey, Tier};
use proxen_synth::Implementation;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::mapping::MappingTable;

/// Magic bytes identifying a Proxen container image.
pub const IMAGE_MAGIC: [u8; 4] = *b"PRXN";

/// Current image format version. Increment on breaking changes to the
/// header or payload layout.
pub const IMAGE_FORMAT_VERSION: u32 = 1;

/// Header prepended to every image for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHeader {
    /// Magic bytes: must be `b"PRXN"`.
    pub magic: [u8; 4],

    /// Image format version.
    pub format_version: u32,

    /// Tier of the container that was saved.
    pub tier: Tier,

    /// Name of the container that was saved.
    pub container: String,

    /// Engine version that produced this image.
    pub engine_version: String,

    /// Content hash of the payload bytes.
    pub checksum: ContentHash,

    /// Keyed MAC over the tier, container name, and payload. Present on
    /// images saved with a signing key.
    pub seal: Option<Seal>,
}

/// Everything stored after the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// The container's implementations, in definition order.
    pub implementations: Vec<Implementation>,

    /// Signature mapping for the tier. Images written by this crate always
    /// carry one; `None` marks a bare container image.
    pub metadata: Option<MappingTable>,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CacheError> {
    bincode::serde::encode_to_vec(value, bincode::config::standard()).map_err(|e| {
        CacheError::Serialization {
            reason: e.to_string(),
        }
    })
}

/// Encodes a full image: length prefix, header, payload.
///
/// When `key` is given the image is sealed with it. The seal binds the
/// tier and container name as well as the payload bytes.
pub fn encode_image(
    tier: Tier,
    container: &str,
    engine_version: &str,
    payload: &ImagePayload,
    key: Option<&SigningKey>,
) -> Result<(ImageHeader, Vec<u8>), CacheError> {
    let payload_bytes = encode(payload)?;

    let header = ImageHeader {
        magic: IMAGE_MAGIC,
        format_version: IMAGE_FORMAT_VERSION,
        tier,
        container: container.to_string(),
        engine_version: engine_version.to_string(),
        checksum: ContentHash::from_bytes(&payload_bytes),
        seal: key.map(|k| k.seal(&seal_input(tier, container, &payload_bytes))),
    };
    let header_bytes = encode(&header)?;

    // 4-byte header length (little-endian) + header + payload
    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload_bytes.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload_bytes);

    Ok((header, output))
}

/// Bytes covered by an image seal: tier, container name, then payload, each
/// length-prefixed.
fn seal_input(tier: Tier, container: &str, payload: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(24 + container.len() + payload.len());
    for part in [tier.as_str().as_bytes(), container.as_bytes(), payload] {
        input.extend_from_slice(&(part.len() as u64).to_le_bytes());
        input.extend_from_slice(part);
    }
    input
}

/// Writes `bytes` to `path`, replacing any existing file.
///
/// The old file is removed first, then the new image is written to a sibling
/// temporary file and renamed into place.
pub fn write_image_file(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |source| CacheError::Io { path, source }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io(parent))?;
    }
    if path.exists() {
        std::fs::remove_file(path).map_err(io(path))?;
    }

    let tmp = temp_path(path);
    std::fs::write(&tmp, bytes).map_err(io(tmp.as_path()))?;
    std::fs::rename(&tmp, path).map_err(io(path))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// An image whose header has been validated but whose payload is still raw.
#[derive(Debug, Clone)]
pub struct RawImage {
    /// Where the image was read from.
    pub path: PathBuf,
    /// The validated header.
    pub header: ImageHeader,
    /// Payload bytes, checksum already verified.
    pub payload: Vec<u8>,
}

impl RawImage {
    /// Checks the seal against `key`.
    ///
    /// Without a key nothing is checked. With a key, a sealed image must
    /// verify, and an elevated-tier image must be sealed.
    pub fn verify_seal(&self, key: Option<&SigningKey>) -> Result<(), CacheError> {
        let Some(key) = key else {
            return Ok(());
        };
        match &self.header.seal {
            Some(seal) => {
                let input = seal_input(self.header.tier, &self.header.container, &self.payload);
                if key.verify(seal, &input) {
                    Ok(())
                } else {
                    Err(CacheError::SealMismatch {
                        path: self.path.clone(),
                    })
                }
            }
            None if self.header.tier == Tier::Elevated => Err(CacheError::Unsealed {
                path: self.path.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Decodes the payload.
    pub fn decode(&self) -> Result<ImagePayload, CacheError> {
        bincode::serde::decode_from_slice(&self.payload, bincode::config::standard())
            .map(|(payload, _)| payload)
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })
    }
}

/// Reads an image file and validates its header.
///
/// Truncation, bad magic, a different format version, or a checksum
/// mismatch are all errors. The seal is not checked here; see
/// [`RawImage::verify_seal`].
pub fn read_image_file(path: &Path) -> Result<RawImage, CacheError> {
    let raw = std::fs::read(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let invalid = |reason: &str| CacheError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let len_bytes: [u8; 4] = raw
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid("file too short for header length"))?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_bytes = raw
        .get(4..4 + header_len)
        .ok_or_else(|| invalid("truncated header"))?;

    let (header, _): (ImageHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(|e| invalid(&format!("undecodable header: {e}")))?;

    if header.magic != IMAGE_MAGIC {
        return Err(invalid("bad magic bytes"));
    }
    if header.format_version != IMAGE_FORMAT_VERSION {
        return Err(CacheError::VersionMismatch {
            path: path.to_path_buf(),
            expected: IMAGE_FORMAT_VERSION,
            actual: header.format_version,
        });
    }

    let payload = &raw[4 + header_len..];
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(CacheError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    Ok(RawImage {
        path: path.to_path_buf(),
        header,
        payload: payload.to_vec(),
    })
}
