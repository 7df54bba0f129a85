//! The cipher module contract
//!
//! Every algorithm is published as a [`CipherModule`]: a name plus one encrypt
//! and one decrypt function sharing the [`CipherFn`] signature. Callers pick a
//! module by name and invoke it without knowing which algorithm backs it.
//!
//! Implementations must satisfy:
//! - output length equals input length
//! - `decrypt(encrypt(p, k, n), k, n) == p` for every valid key and nonce
//! - invalid keys or nonces fail before any output is produced
//! - no hidden state: identical arguments give identical output

use std::fmt;

use crate::error::CipherError;

/// Known module names
pub mod names {
    /// One-time-pad XOR
    pub const VERNAM: &str = "VERNAM";
    /// Byte-addition autokey with plaintext feedback
    pub const AUTOKEY: &str = "AUTOKEY";
    /// Salsa20 keystream combined by XOR
    pub const SALSA20: &str = "SALSA20";
}

/// Modules shipped with this crate, in menu order
pub const BUILTIN_NAMES: [&str; 3] = [names::VERNAM, names::AUTOKEY, names::SALSA20];

/// Name of the factory entry point every loadable unit exposes
pub const FACTORY_SYMBOL: &str = "create_cipher_module";

/// Shared signature of encrypt and decrypt: `(input, key, nonce) -> output`
pub type CipherFn = fn(&[u8], &[u8], Option<&[u8]>) -> Result<Vec<u8>, CipherError>;

/// Factory entry point returning a statically-lived descriptor
pub type ModuleFactory = fn() -> &'static CipherModule;

/// Descriptor of one cipher algorithm
#[derive(Clone, Copy)]
pub struct CipherModule {
    /// Unique, case-sensitive module name
    pub name: &'static str,
    /// Encryption operation
    pub encrypt: CipherFn,
    /// Decryption operation
    pub decrypt: CipherFn,
}

impl CipherModule {
    /// Encrypt `input` with this module's algorithm
    pub fn encrypt(
        &self,
        input: &[u8],
        key: &[u8],
        nonce: Option<&[u8]>,
    ) -> Result<Vec<u8>, CipherError> {
        (self.encrypt)(input, key, nonce)
    }

    /// Decrypt `input` with this module's algorithm
    pub fn decrypt(
        &self,
        input: &[u8],
        key: &[u8],
        nonce: Option<&[u8]>,
    ) -> Result<Vec<u8>, CipherError> {
        (self.decrypt)(input, key, nonce)
    }

    /// Whether decryption is the very same function as encryption
    pub fn is_self_inverse(&self) -> bool {
        std::ptr::fn_addr_eq(self.encrypt, self.decrypt)
    }
}

impl fmt::Debug for CipherModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherModule")
            .field("name", &self.name)
            .field("self_inverse", &self.is_self_inverse())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CipherModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
