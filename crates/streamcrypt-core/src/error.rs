//! Error types for cipher and registry operations

use thiserror::Error;

/// Errors raised by the cipher algorithms before any output is produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Key length outside the algorithm's accepted set
    #[error("Invalid {algorithm} key: expected {expected}, got {actual} bytes")]
    InvalidKey {
        /// Algorithm that rejected the key
        algorithm: &'static str,
        /// Description of the accepted key lengths
        expected: String,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Nonce missing or of the wrong length
    #[error("Invalid {algorithm} nonce: expected {expected} bytes, got {}", nonce_len(.actual))]
    InvalidNonce {
        /// Algorithm that rejected the nonce
        algorithm: &'static str,
        /// Required nonce length in bytes
        expected: usize,
        /// Actual nonce length, `None` when no nonce was supplied
        actual: Option<usize>,
    },
}

#[allow(clippy::ref_option)]
fn nonce_len(actual: &Option<usize>) -> String {
    match actual {
        Some(len) => len.to_string(),
        None => "none".to_string(),
    }
}

/// Errors raised while loading or looking up cipher modules
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Lookup of a name that was never successfully loaded
    #[error("Cipher module not loaded: {0}")]
    ModuleNotFound(String),

    /// The implementation unit could not be located or opened
    #[error("Failed to load unit {unit}: {reason}")]
    ModuleLoad {
        /// Unit identifier derived from the module name
        unit: String,
        /// Why the unit could not be opened
        reason: String,
    },

    /// The unit lacks the factory entry point or returned an unusable descriptor
    #[error("Unit {unit} does not expose a usable cipher module: {reason}")]
    ModuleInterface {
        /// Unit identifier derived from the module name
        unit: String,
        /// What was wrong with the entry point or descriptor
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_nonce_display() {
        let missing = CipherError::InvalidNonce {
            algorithm: "SALSA20",
            expected: 8,
            actual: None,
        };
        assert_eq!(
            missing.to_string(),
            "Invalid SALSA20 nonce: expected 8 bytes, got none"
        );

        let short = CipherError::InvalidNonce {
            algorithm: "SALSA20",
            expected: 8,
            actual: Some(7),
        };
        assert_eq!(
            short.to_string(),
            "Invalid SALSA20 nonce: expected 8 bytes, got 7"
        );
    }

    #[test]
    fn test_invalid_key_display() {
        let err = CipherError::InvalidKey {
            algorithm: "SALSA20",
            expected: "16 or 32 bytes".to_string(),
            actual: 24,
        };
        assert_eq!(
            err.to_string(),
            "Invalid SALSA20 key: expected 16 or 32 bytes, got 24 bytes"
        );
    }
}
