//! Errors raised while reading or checking `proxen.toml`.

use std::path::PathBuf;

/// Why an engine configuration could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected tables.
    #[error("invalid configuration: {reason}")]
    Parse {
        /// The parser's message.
        reason: String,
    },

    /// A tier setting was given but left blank.
    #[error("`{field}` must not be empty")]
    EmptyField {
        /// Dotted path of the setting, e.g. `tiers.standard.name`.
        field: String,
    },

    /// Both tiers would create a container with the same name.
    #[error("standard and elevated tiers share the container name '{name}'")]
    SharedContainerName {
        /// The colliding name.
        name: String,
    },

    /// Both tiers would write their image to the same file.
    #[error("standard and elevated tiers share the image file '{file}'")]
    SharedImageFile {
        /// The colliding file name.
        file: String,
    },
}
