//! Structural cache and container image persistence.
//!
//! [`TypeCache`] maps signature keys to implementation handles. The
//! persistence layer writes a container's implementations, together with the
//! tier's cache entries as a [`MappingTable`], into a single image file that a
//! later process can load without re-synthesizing anything.

#![warn(missing_docs)]

pub mod error;
pub mod image;
pub mod mapping;
pub mod persist;
pub mod type_cache;

pub use error::CacheError;
pub use image::{read_image_file, ImageHeader, ImagePayload, RawImage, IMAGE_FORMAT_VERSION, IMAGE_MAGIC};
pub use mapping::{MappingEntry, MappingTable};
pub use persist::{inspect_image, load_image, save_image, ImageSummary, LoadedImage};
pub use type_cache::TypeCache;
