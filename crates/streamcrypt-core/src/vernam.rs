//! Vernam one-time-pad cipher
//!
//! Each input byte is XORed with the key byte at the same position. The key
//! must be at least as long as the input; only its first `input.len()` bytes
//! are used. Keeping keys random and never reusing them is the caller's job.

use crate::error::CipherError;
use crate::module::{CipherModule, names};

static VERNAM_MODULE: CipherModule = CipherModule {
    name: names::VERNAM,
    encrypt: vernam_cipher,
    decrypt: vernam_cipher,
};

/// Factory entry point for the Vernam unit
pub fn create_cipher_module() -> &'static CipherModule {
    &VERNAM_MODULE
}

/// Apply the one-time pad (encryption and decryption are the same operation)
///
/// The nonce is ignored.
///
/// # Errors
///
/// Returns `CipherError::InvalidKey` if the key is shorter than the input.
pub fn vernam_cipher(
    input: &[u8],
    key: &[u8],
    _nonce: Option<&[u8]>,
) -> Result<Vec<u8>, CipherError> {
    if key.len() < input.len() {
        return Err(CipherError::InvalidKey {
            algorithm: names::VERNAM,
            expected: format!("at least {} bytes", input.len()),
            actual: key.len(),
        });
    }

    let output = input
        .iter()
        .zip(key)
        .map(|(&byte, &pad)| byte ^ pad)
        .collect();

    Ok(output)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_vernam_known_vector() {
        let ciphertext = vernam_cipher(b"HI", &[0x01, 0x02], None).unwrap();
        assert_eq!(ciphertext, [0x49, 0x4B]);

        let plaintext = vernam_cipher(&ciphertext, &[0x01, 0x02], None).unwrap();
        assert_eq!(plaintext, b"HI");
    }

    #[test]
    fn test_vernam_longer_key() {
        let key = [0xFF; 32];
        let ciphertext = vernam_cipher(b"abc", &key, None).unwrap();
        assert_eq!(ciphertext.len(), 3);
        assert_eq!(ciphertext, [!b'a', !b'b', !b'c']);
    }

    #[test]
    fn test_vernam_short_key() {
        let result = vernam_cipher(b"hello", b"key", None);
        assert_eq!(
            result,
            Err(CipherError::InvalidKey {
                algorithm: "VERNAM",
                expected: "at least 5 bytes".to_string(),
                actual: 3,
            })
        );
    }

    #[test]
    fn test_vernam_empty() {
        assert!(vernam_cipher(b"", b"", None).unwrap().is_empty());
    }

    #[test]
    fn test_vernam_ignores_nonce() {
        let key = [0x5A; 4];
        let with = vernam_cipher(b"data", &key, Some(&[1, 2, 3])).unwrap();
        let without = vernam_cipher(b"data", &key, None).unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_vernam_module() {
        let module = create_cipher_module();
        assert_eq!(module.name, "VERNAM");
        assert!(module.is_self_inverse());
    }
}
