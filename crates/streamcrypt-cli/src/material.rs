//! Key and nonce acquisition
//!
//! Keys come from a hex argument, a raw key file, or the random generator;
//! nonces from a hex argument, a raw nonce file, or the random generator.
//! The cipher modules only ever see the resulting byte buffers.

use std::fs;
use std::path::{Path, PathBuf};

use rand::{RngExt, rng};
use streamcrypt_core::names;
use streamcrypt_core::salsa20::SALSA20_NONCE_SIZE;
use tracing::{debug, warn};

use crate::config::{KeyArgs, NonceArgs};
use crate::error::{ConfigError, HostError};

/// Key length generated for Autokey and unknown modules
pub const DEFAULT_KEY_LEN: usize = 16;

/// Key length generated for Salsa20
pub const SALSA20_KEY_LEN: usize = 32;

/// Bytes resolved from a key or nonce source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    /// The key or nonce bytes
    pub bytes: Vec<u8>,
    /// Whether the bytes were freshly generated
    pub generated: bool,
}

impl Material {
    fn given(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            generated: false,
        }
    }

    fn generated(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            generated: true,
        }
    }
}

/// Whether `cipher` consumes a nonce
pub fn needs_nonce(cipher: &str) -> bool {
    cipher == names::SALSA20
}

/// Length of a generated key for `cipher` and an input of `input_len` bytes
pub fn generated_key_len(cipher: &str, input_len: usize) -> usize {
    match cipher {
        names::VERNAM => input_len,
        names::SALSA20 => SALSA20_KEY_LEN,
        _ => DEFAULT_KEY_LEN,
    }
}

/// `len` bytes from the process random generator
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng().fill(&mut bytes[..]);
    bytes
}

/// Read a file, mapping failures to `HostError::Io`
pub fn read_file(path: &Path) -> Result<Vec<u8>, HostError> {
    fs::read(path).map_err(|e| HostError::io(path, e))
}

/// Write a file, mapping failures to `HostError::Io`
pub fn write_file(path: &Path, contents: &[u8]) -> Result<(), HostError> {
    fs::write(path, contents).map_err(|e| HostError::io(path, e))
}

/// Read a raw key file, dropping exactly one trailing `\n`
///
/// Any other trailing byte, `\r` included, is part of the key.
pub fn read_key_file(path: &Path) -> Result<Vec<u8>, HostError> {
    let mut bytes = read_file(path)?;
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    Ok(bytes)
}

/// Write a key file that [`read_key_file`] reads back unchanged
pub fn write_key_file(path: &Path, key: &[u8]) -> Result<(), HostError> {
    let mut contents = Vec::with_capacity(key.len() + 1);
    contents.extend_from_slice(key);
    contents.push(b'\n');
    write_file(path, &contents)
}

fn decode_hex(what: &'static str, value: &str) -> Result<Vec<u8>, HostError> {
    hex::decode(value.trim())
        .map_err(|source| HostError::InvalidHex { what, source })
}

/// Resolve the key for `cipher`
///
/// # Errors
///
/// Returns `HostError::InvalidHex` or `HostError::Io` when the source cannot
/// be read, and `ConfigError::MissingRequired` when no source is given.
pub fn resolve_key(args: &KeyArgs, cipher: &str, input_len: usize) -> Result<Material, HostError> {
    if let Some(value) = &args.key_hex {
        return decode_hex("key", value).map(Material::given);
    }
    if let Some(path) = &args.key_file {
        debug!("Reading key from {}", path.display());
        return read_key_file(path).map(Material::given);
    }
    if args.generate_key {
        let len = generated_key_len(cipher, input_len);
        debug!("Generating {} byte key for {}", len, cipher);
        return Ok(Material::generated(random_bytes(len)));
    }

    Err(ConfigError::MissingRequired("a key source".into()).into())
}

/// Resolve the nonce for `cipher`
///
/// Ciphers that take no nonce get `None`, and any nonce given for them is
/// ignored with a warning. When `generate` is set and no source is given, a
/// fresh 8-byte nonce is produced.
///
/// # Errors
///
/// Returns `HostError::InvalidHex` or `HostError::Io` when the source cannot
/// be read, and `ConfigError::MissingRequired` when a nonce is needed, none
/// is given, and `generate` is false.
pub fn resolve_nonce(
    args: &NonceArgs,
    cipher: &str,
    generate: bool,
) -> Result<Option<Material>, HostError> {
    if !needs_nonce(cipher) {
        if args.is_given() {
            warn!("{} takes no nonce, ignoring the one given", cipher);
        }
        return Ok(None);
    }

    if let Some(value) = &args.nonce_hex {
        return decode_hex("nonce", value).map(|bytes| Some(Material::given(bytes)));
    }
    if let Some(path) = &args.nonce_file {
        debug!("Reading nonce from {}", path.display());
        return read_file(path).map(|bytes| Some(Material::given(bytes)));
    }
    if generate {
        debug!("Generating nonce for {}", cipher);
        return Ok(Some(Material::generated(random_bytes(SALSA20_NONCE_SIZE))));
    }

    let what = format!("a nonce for {cipher}");
    Err(ConfigError::MissingRequired(what).into())
}

/// Path of a sidecar file next to `output` (`out.bin` -> `out.bin.key`)
pub fn sidecar_path(output: &Path, suffix: &str) -> PathBuf {
    let mut path = output.as_os_str().to_owned();
    path.push(".");
    path.push(suffix);
    PathBuf::from(path)
}

/// Extension of `path` including the dot, or an empty string when it has none
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
