//! Error types for the streamcrypt host.
//!
//! All errors use thiserror; the binary wraps them in `anyhow` at the top level.

use std::path::PathBuf;

use streamcrypt_core::{CipherError, RegistryError};
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required configuration value
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Options that cannot be combined
    #[error("Conflicting options: {0}")]
    Conflict(String),

    /// Input file does not exist
    #[error("Input file not found: {path}")]
    InputNotFound {
        /// Path given for the input file
        path: PathBuf,
    },

    /// Input file has no content to transform
    #[error("Input file is empty: {path}")]
    EmptyInput {
        /// Path given for the input file
        path: PathBuf,
    },
}

/// Errors raised while running a host command.
#[derive(Debug, Error)]
pub enum HostError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Module could not be loaded or found
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Cipher rejected its key or nonce
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// Failed to read or write a file
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Key or nonce given on the command line is not valid hex
    #[error("Invalid hex for {what}: {source}")]
    InvalidHex {
        /// Which value failed to parse
        what: &'static str,
        /// Underlying decode error
        #[source]
        source: hex::FromHexError,
    },

    /// Decrypting the ciphertext did not reproduce the input
    #[error("Round trip through {0} did not reproduce the input")]
    RoundTripMismatch(String),
}

impl HostError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
