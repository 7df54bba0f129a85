//! Host configuration management.
//!
//! This module parses the command line (with environment variable fallbacks)
//! and validates cross-field consistency before any file is touched.
//!
//! # Configuration Sources
//!
//! - CLI arguments (`--cipher`, `--input`, `--key-hex`, ...)
//! - Environment variables (`STREAMCRYPT_CIPHER`, `STREAMCRYPT_KEY_FILE`, ...)
//! - Default values
//!
//! # Example
//!
//! ```
//! use clap::Parser;
//! use streamcrypt_cli::{Command, HostConfig};
//!
//! let config = HostConfig::try_parse_from([
//!     "streamcrypt",
//!     "encrypt",
//!     "--cipher",
//!     "VERNAM",
//!     "--input",
//!     "message.txt",
//!     "--output",
//!     "message.enc",
//!     "--generate-key",
//! ])
//! .expect("arguments should parse");
//!
//! assert!(matches!(config.command, Command::Encrypt(_)));
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use streamcrypt_core::{BUILTIN_NAMES, names};

use crate::error::ConfigError;

/// Host configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "streamcrypt",
    about = "Encrypt and decrypt files with interchangeable stream cipher modules",
    version
)]
pub struct HostConfig {
    /// Cipher modules to load at startup, comma-separated
    #[arg(
        long,
        global = true,
        env = "STREAMCRYPT_MODULES",
        value_delimiter = ',',
        default_values_t = BUILTIN_NAMES.map(String::from)
    )]
    pub modules: Vec<String>,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Host operations.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the loaded cipher modules
    List,

    /// Encrypt a file
    Encrypt(TransformArgs),

    /// Decrypt a file
    Decrypt(TransformArgs),

    /// Encrypt a file, decrypt the result, and write both
    Roundtrip(RoundtripArgs),
}

/// Cipher selection and input shared by every transforming command.
#[derive(Debug, Clone, Args)]
pub struct CipherArgs {
    /// Cipher module name (VERNAM, AUTOKEY, SALSA20)
    #[arg(long, short = 'c', env = "STREAMCRYPT_CIPHER")]
    pub cipher: String,

    /// File to read the input bytes from
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Key source
    #[command(flatten)]
    pub key: KeyArgs,

    /// Nonce source (SALSA20 only)
    #[command(flatten)]
    pub nonce: NonceArgs,
}

/// Where the key comes from. At most one source may be given.
#[derive(Debug, Clone, Default, Args)]
pub struct KeyArgs {
    /// Key as a hex string
    #[arg(long, env = "STREAMCRYPT_KEY_HEX", hide_env_values = true)]
    pub key_hex: Option<String>,

    /// File holding the raw key bytes (trailing newlines are stripped)
    #[arg(long, env = "STREAMCRYPT_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// Generate a random key
    #[arg(long)]
    pub generate_key: bool,
}

impl KeyArgs {
    /// Number of key sources given
    pub fn source_count(&self) -> usize {
        usize::from(self.key_hex.is_some())
            + usize::from(self.key_file.is_some())
            + usize::from(self.generate_key)
    }
}

/// Where the nonce comes from. When neither is given a fresh nonce is
/// generated for encryption.
#[derive(Debug, Clone, Default, Args)]
pub struct NonceArgs {
    /// Nonce as a hex string
    #[arg(long)]
    pub nonce_hex: Option<String>,

    /// File holding the raw nonce bytes
    #[arg(long)]
    pub nonce_file: Option<PathBuf>,
}

impl NonceArgs {
    /// Whether any nonce source was given
    pub fn is_given(&self) -> bool {
        self.nonce_hex.is_some() || self.nonce_file.is_some()
    }
}

/// Arguments for `encrypt` and `decrypt`.
#[derive(Debug, Clone, Args)]
pub struct TransformArgs {
    /// Cipher, input, key and nonce
    #[command(flatten)]
    pub cipher: CipherArgs,

    /// File to write the output bytes to
    #[arg(long, short = 'o')]
    pub output: PathBuf,
}

/// Arguments for `roundtrip`.
#[derive(Debug, Clone, Args)]
pub struct RoundtripArgs {
    /// Cipher, input, key and nonce
    #[command(flatten)]
    pub cipher: CipherArgs,

    /// Directory receiving `<CIPHER>_encrypted<ext>` and `<CIPHER>_decrypted<ext>`
    #[arg(
        long,
        short = 'd',
        env = "STREAMCRYPT_OUTPUT_DIR",
        default_value = "output"
    )]
    pub output_dir: PathBuf,
}

impl HostConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Validate configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - no module is configured
    /// - more than one key source or nonce source is given
    /// - a transforming command has no key source
    /// - `decrypt` is asked to generate a key, or a SALSA20 nonce
    /// - the input file doesn't exist
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modules.iter().all(|name| name.trim().is_empty()) {
            return Err(ConfigError::MissingRequired(
                "at least one cipher module".to_string(),
            ));
        }

        match &self.command {
            Command::List => Ok(()),
            Command::Encrypt(args) => validate_cipher_args(&args.cipher),
            Command::Roundtrip(args) => validate_cipher_args(&args.cipher),
            Command::Decrypt(args) => {
                validate_cipher_args(&args.cipher)?;

                if args.cipher.key.generate_key {
                    return Err(ConfigError::Conflict(
                        "--generate-key cannot be used to decrypt".to_string(),
                    ));
                }
                if args.cipher.cipher == names::SALSA20 && !args.cipher.nonce.is_given() {
                    return Err(ConfigError::MissingRequired(
                        "--nonce-hex or --nonce-file to decrypt SALSA20".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

fn validate_cipher_args(args: &CipherArgs) -> Result<(), ConfigError> {
    match args.key.source_count() {
        0 => {
            return Err(ConfigError::MissingRequired(
                "one of --key-hex, --key-file or --generate-key".to_string(),
            ));
        }
        1 => {}
        _ => {
            return Err(ConfigError::Conflict(
                "--key-hex, --key-file and --generate-key are mutually exclusive".to_string(),
            ));
        }
    }

    if args.nonce.nonce_hex.is_some() && args.nonce.nonce_file.is_some() {
        return Err(ConfigError::Conflict(
            "--nonce-hex and --nonce-file are mutually exclusive".to_string(),
        ));
    }

    check_exists(&args.input)
}

fn check_exists(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ConfigError::InputNotFound {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> HostConfig {
        HostConfig::try_parse_from(std::iter::once("streamcrypt").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    fn input_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"input").unwrap();
        file
    }

    #[test]
    fn test_default_modules() {
        let config = parse(&["list"]);
        assert_eq!(config.modules, vec!["VERNAM", "AUTOKEY", "SALSA20"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_modules_delimited() {
        let config = parse(&["--modules", "VERNAM,SALSA20", "list"]);
        assert_eq!(config.modules, vec!["VERNAM", "SALSA20"]);
    }

    #[test]
    fn test_encrypt_args() {
        let input = input_file();
        let path = input.path().to_str().unwrap();
        let config = parse(&[
            "encrypt",
            "-c",
            "SALSA20",
            "-i",
            path,
            "-o",
            "out.bin",
            "--key-hex",
            "00ff",
        ]);

        match &config.command {
            Command::Encrypt(args) => {
                assert_eq!(args.cipher.cipher, "SALSA20");
                assert_eq!(args.cipher.key.key_hex.as_deref(), Some("00ff"));
                assert_eq!(args.output, PathBuf::from("out.bin"));
                assert!(!args.cipher.nonce.is_given());
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_key_source() {
        let input = input_file();
        let path = input.path().to_str().unwrap();
        let config = parse(&["encrypt", "-c", "VERNAM", "-i", path, "-o", "out.bin"]);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_conflicting_key_sources() {
        let input = input_file();
        let path = input.path().to_str().unwrap();
        let config = parse(&[
            "roundtrip",
            "-c",
            "AUTOKEY",
            "-i",
            path,
            "--key-hex",
            "01",
            "--generate-key",
        ]);

        assert!(matches!(config.validate(), Err(ConfigError::Conflict(_))));
    }

    #[test]
    fn test_decrypt_rejects_generated_key() {
        let input = input_file();
        let path = input.path().to_str().unwrap();
        let config = parse(&[
            "decrypt",
            "-c",
            "VERNAM",
            "-i",
            path,
            "-o",
            "out.bin",
            "--generate-key",
        ]);

        assert!(matches!(config.validate(), Err(ConfigError::Conflict(_))));
    }

    #[test]
    fn test_decrypt_salsa20_needs_nonce() {
        let input = input_file();
        let path = input.path().to_str().unwrap();
        let base = ["decrypt", "-c", "SALSA20", "-i", path, "-o", "out.bin"];

        let mut args = base.to_vec();
        args.extend(["--key-hex", "00"]);
        let config = parse(&args);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));

        args.extend(["--nonce-hex", "0011"]);
        let config = parse(&args);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_input() {
        let config = parse(&[
            "encrypt",
            "-c",
            "VERNAM",
            "-i",
            "/nonexistent/streamcrypt/input.txt",
            "-o",
            "out.bin",
            "--generate-key",
        ]);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InputNotFound { .. })
        ));
    }

    #[test]
    fn test_roundtrip_default_output_dir() {
        let config = parse(&[
            "roundtrip",
            "-c",
            "VERNAM",
            "-i",
            "in.txt",
            "--generate-key",
        ]);
        match config.command {
            Command::Roundtrip(args) => assert_eq!(args.output_dir, PathBuf::from("output")),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
