//! Interchangeable symmetric stream ciphers
//!
//! Every algorithm is published as a [`CipherModule`] descriptor with one
//! encrypt and one decrypt function of the same shape, so a host can pick an
//! algorithm by name and call it without special-casing its type.
//!
//! # Components
//!
//! - **Vernam**: one-time-pad XOR, key at least as long as the input
//! - **Autokey**: byte-addition cipher fed back by the previous plaintext byte
//! - **Salsa20**: 20-round Salsa20 keystream combined by XOR
//! - **Registry**: loads modules by name through a pluggable [`ModuleLoader`]
//!
//! All cipher operations are pure functions over in-memory buffers. Invalid
//! keys or nonces are rejected before any output is produced.
//!
//! # Examples
//!
//! ## Looking up a cipher by name
//!
//! ```
//! use streamcrypt_core::ModuleRegistry;
//!
//! let mut registry = ModuleRegistry::with_builtin();
//! registry.load("SALSA20")?;
//!
//! let salsa = registry.lookup("SALSA20")?;
//! let key = [7u8; 32];
//! let nonce = [1u8; 8];
//!
//! let ciphertext = salsa.encrypt(b"attack at dawn", &key, Some(&nonce))?;
//! let plaintext = salsa.decrypt(&ciphertext, &key, Some(&nonce))?;
//! assert_eq!(plaintext, b"attack at dawn");
//!
//! registry.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Adding an algorithm without touching the registry
//!
//! ```
//! use streamcrypt_core::{CipherError, CipherModule, ModuleRegistry, StaticLoader};
//!
//! fn invert(input: &[u8], _key: &[u8], _nonce: Option<&[u8]>) -> Result<Vec<u8>, CipherError> {
//!     Ok(input.iter().map(|b| !b).collect())
//! }
//!
//! static INVERT: CipherModule = CipherModule {
//!     name: "INVERT",
//!     encrypt: invert,
//!     decrypt: invert,
//! };
//!
//! fn create_cipher_module() -> &'static CipherModule {
//!     &INVERT
//! }
//!
//! let mut loader = StaticLoader::builtin();
//! loader.register_factory("INVERT", create_cipher_module);
//!
//! let mut registry = ModuleRegistry::new(loader);
//! let module = registry.load("INVERT")?;
//! assert_eq!(module.encrypt(&[0x0F], &[], None)?, [0xF0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod autokey;
pub mod error;
pub mod loader;
pub mod module;
pub mod registry;
pub mod salsa20;
pub mod vernam;

pub use error::{CipherError, RegistryError};

// Re-export commonly used types
pub use loader::{ModuleLoader, ModuleUnit, StaticLoader, StaticUnit, unit_id_for};
pub use module::{BUILTIN_NAMES, CipherFn, CipherModule, FACTORY_SYMBOL, ModuleFactory, names};
pub use registry::ModuleRegistry;
pub use salsa20::{Salsa20Core, keystream_block};
