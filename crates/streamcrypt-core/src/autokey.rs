//! Autokey cipher with plaintext feedback
//!
//! The first byte is shifted by `key[0]`; every later byte is shifted by the
//! plaintext byte before it. All arithmetic is modulo 256.
//!
//! ```text
//! c[0] = p[0] + k[0]          p[0] = c[0] - k[0]
//! c[i] = p[i] + p[i-1]        p[i] = c[i] - p[i-1]
//! ```
//!
//! Decryption feeds back the bytes it has already recovered, so it runs
//! strictly front to back. Only the first key byte is ever used.

use crate::error::CipherError;
use crate::module::{CipherModule, names};

static AUTOKEY_MODULE: CipherModule = CipherModule {
    name: names::AUTOKEY,
    encrypt: autokey_encrypt,
    decrypt: autokey_decrypt,
};

/// Factory entry point for the Autokey unit
pub fn create_cipher_module() -> &'static CipherModule {
    &AUTOKEY_MODULE
}

fn seed(key: &[u8]) -> Result<u8, CipherError> {
    key.first().copied().ok_or_else(|| CipherError::InvalidKey {
        algorithm: names::AUTOKEY,
        expected: "at least 1 byte".to_string(),
        actual: 0,
    })
}

/// Encrypt with the autokey cipher
///
/// The nonce is ignored.
///
/// # Errors
///
/// Returns `CipherError::InvalidKey` if the key is empty.
pub fn autokey_encrypt(
    input: &[u8],
    key: &[u8],
    _nonce: Option<&[u8]>,
) -> Result<Vec<u8>, CipherError> {
    let mut previous = seed(key)?;

    let output = input
        .iter()
        .map(|&plain| {
            let cipher = plain.wrapping_add(previous);
            previous = plain;
            cipher
        })
        .collect();

    Ok(output)
}

/// Decrypt with the autokey cipher
///
/// The nonce is ignored.
///
/// # Errors
///
/// Returns `CipherError::InvalidKey` if the key is empty.
pub fn autokey_decrypt(
    input: &[u8],
    key: &[u8],
    _nonce: Option<&[u8]>,
) -> Result<Vec<u8>, CipherError> {
    let mut previous = seed(key)?;

    let output = input
        .iter()
        .map(|&cipher| {
            let plain = cipher.wrapping_sub(previous);
            previous = plain;
            plain
        })
        .collect();

    Ok(output)
}
