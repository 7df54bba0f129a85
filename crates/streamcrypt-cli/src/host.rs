//! Host runtime.
//!
//! The host owns the module registry, resolves keys and nonces, reads the
//! input file, invokes the selected module by name and writes the results.
//! Modules themselves never touch the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use streamcrypt_core::{CipherModule, ModuleRegistry};
use tracing::{debug, info};

use crate::config::{CipherArgs, Command, HostConfig, RoundtripArgs, TransformArgs};
use crate::error::{ConfigError, HostError};
use crate::material::{
    Material, file_extension, read_file, resolve_key, resolve_nonce, sidecar_path, write_file,
    write_key_file,
};

/// Direction of a single transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Plaintext to ciphertext
    Encrypt,
    /// Ciphertext to plaintext
    Decrypt,
}

/// Result of an `encrypt` or `decrypt` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformReport {
    /// Module used
    pub cipher: String,
    /// File written
    pub output: PathBuf,
    /// Number of bytes written
    pub bytes: usize,
    /// Sidecar holding a generated key, if one was generated
    pub key_file: Option<PathBuf>,
    /// Sidecar holding a generated nonce, if one was generated
    pub nonce_file: Option<PathBuf>,
}

/// Result of a `roundtrip` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundtripReport {
    /// Module used
    pub cipher: String,
    /// Ciphertext file written
    pub encrypted: PathBuf,
    /// Recovered plaintext file written
    pub decrypted: PathBuf,
    /// Number of bytes processed
    pub bytes: usize,
    /// Sidecar holding a generated key, if one was generated
    pub key_file: Option<PathBuf>,
    /// Sidecar holding a generated nonce, if one was generated
    pub nonce_file: Option<PathBuf>,
}

/// Outcome of any host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Names of the loaded modules
    Listed(Vec<String>),
    /// A file was encrypted or decrypted
    Transformed(TransformReport),
    /// A file was encrypted and decrypted again
    RoundTripped(RoundtripReport),
}

/// Key, nonce and input resolved for one cipher invocation
struct Prepared<'a> {
    module: &'a CipherModule,
    input: Vec<u8>,
    key: Material,
    nonce: Option<Material>,
}

impl Prepared<'_> {
    fn nonce_bytes(&self) -> Option<&[u8]> {
        self.nonce.as_ref().map(|nonce| nonce.bytes.as_slice())
    }

    /// Write generated key and nonce next to `anchor` so the output can be
    /// decrypted later
    fn write_sidecars(
        &self,
        anchor: &Path,
    ) -> Result<(Option<PathBuf>, Option<PathBuf>), HostError> {
        let key_file = if self.key.generated {
            let path = sidecar_path(anchor, "key");
            write_key_file(&path, &self.key.bytes)?;
            info!("Generated key written to {}", path.display());
            Some(path)
        } else {
            None
        };

        let nonce_file = match &self.nonce {
            Some(nonce) if nonce.generated => {
                let path = sidecar_path(anchor, "nonce");
                write_file(&path, &nonce.bytes)?;
                info!("Generated nonce written to {}", path.display());
                Some(path)
            }
            _ => None,
        };

        Ok((key_file, nonce_file))
    }
}

/// Host holding the loaded cipher modules.
#[derive(Debug)]
pub struct Host {
    registry: ModuleRegistry,
}

impl Host {
    /// Create a host and load the named built-in modules.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Registry` if any module fails to load.
    pub fn new<I, S>(modules: I) -> Result<Self, HostError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = modules
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        let mut registry = ModuleRegistry::with_builtin();
        registry.load_all(&names)?;
        info!("Loaded cipher modules: {:?}", registry.names());
        Ok(Self::from_registry(registry))
    }

    /// Create a host and load the modules named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Registry` if any module fails to load.
    pub fn from_config(config: &HostConfig) -> Result<Self, HostError> {
        Self::new(&config.modules)
    }

    /// Wrap an already populated registry.
    pub fn from_registry(registry: ModuleRegistry) -> Self {
        Self { registry }
    }

    /// The registry backing this host.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Run one command.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the command.
    pub fn run(&self, command: &Command) -> Result<Outcome, HostError> {
        match command {
            Command::List => {
                let names = self.registry.names();
                Ok(Outcome::Listed(names.into_iter().map(String::from).collect()))
            }
            Command::Encrypt(args) => self
                .transform(args, Direction::Encrypt)
                .map(Outcome::Transformed),
            Command::Decrypt(args) => self
                .transform(args, Direction::Decrypt)
                .map(Outcome::Transformed),
            Command::Roundtrip(args) => self.roundtrip(args).map(Outcome::RoundTripped),
        }
    }

    fn prepare(&self, args: &CipherArgs, direction: Direction) -> Result<Prepared<'_>, HostError> {
        let module = self.registry.lookup(&args.cipher)?;
        let generate = direction == Direction::Encrypt;
        if args.key.generate_key && !generate {
            let reason = "--generate-key cannot be used to decrypt".to_string();
            return Err(ConfigError::Conflict(reason).into());
        }

        let input = read_file(&args.input)?;
        if input.is_empty() {
            return Err(ConfigError::EmptyInput {
                path: args.input.clone(),
            }
            .into());
        }
        debug!("Read {} bytes from {}", input.len(), args.input.display());

        let key = resolve_key(&args.key, module.name, input.len())?;
        let nonce = resolve_nonce(&args.nonce, module.name, generate)?;

        Ok(Prepared {
            module,
            input,
            key,
            nonce,
        })
    }

    /// Encrypt or decrypt one file.
    ///
    /// Keys and nonces generated while encrypting are written to
    /// `<output>.key` and `<output>.nonce`.
    ///
    /// # Errors
    ///
    /// Returns `HostError` if the module is not loaded, the key or nonce is
    /// rejected, or a file cannot be read or written. Asking to generate a
    /// key while decrypting and an empty input are configuration errors.
    pub fn transform(
        &self,
        args: &TransformArgs,
        direction: Direction,
    ) -> Result<TransformReport, HostError> {
        let prepared = self.prepare(&args.cipher, direction)?;
        let module = prepared.module;

        let key = &prepared.key.bytes;
        let nonce = prepared.nonce_bytes();

        let output = match direction {
            Direction::Encrypt => module.encrypt(&prepared.input, key, nonce)?,
            Direction::Decrypt => module.decrypt(&prepared.input, key, nonce)?,
        };

        write_file(&args.output, &output)?;
        let (key_file, nonce_file) = prepared.write_sidecars(&args.output)?;

        info!(
            "{:?} with {}: {} bytes written to {}",
            direction,
            module,
            output.len(),
            args.output.display()
        );

        Ok(TransformReport {
            cipher: module.name.to_string(),
            output: args.output.clone(),
            bytes: output.len(),
            key_file,
            nonce_file,
        })
    }

    /// Encrypt a file, decrypt the ciphertext, and write both results.
    ///
    /// Files are named `<CIPHER>_encrypted<ext>` and `<CIPHER>_decrypted<ext>`
    /// inside the output directory, where `<ext>` is the input's extension
    /// (empty when the input has none).
    ///
    /// # Errors
    ///
    /// Returns `HostError::RoundTripMismatch` if decryption does not reproduce
    /// the input, otherwise the same errors as [`Host::transform`].
    pub fn roundtrip(&self, args: &RoundtripArgs) -> Result<RoundtripReport, HostError> {
        let prepared = self.prepare(&args.cipher, Direction::Encrypt)?;
        let module = prepared.module;
        let key = &prepared.key.bytes;
        let nonce = prepared.nonce_bytes();

        let encrypted = module.encrypt(&prepared.input, key, nonce)?;
        let decrypted = module.decrypt(&encrypted, key, nonce)?;

        fs::create_dir_all(&args.output_dir)
            .map_err(|e| HostError::io(&args.output_dir, e))?;

        let extension = file_extension(&args.cipher.input);
        let encrypted_path = args
            .output_dir
            .join(format!("{}_encrypted{extension}", module.name));
        let decrypted_path = args
            .output_dir
            .join(format!("{}_decrypted{extension}", module.name));

        write_file(&encrypted_path, &encrypted)?;
        write_file(&decrypted_path, &decrypted)?;
        let (key_file, nonce_file) = prepared.write_sidecars(&encrypted_path)?;

        if decrypted != prepared.input {
            return Err(HostError::RoundTripMismatch(module.name.to_string()));
        }

        info!(
            "Round trip with {} complete, results in {}",
            module,
            args.output_dir.display()
        );

        Ok(RoundtripReport {
            cipher: module.name.to_string(),
            encrypted: encrypted_path,
            decrypted: decrypted_path,
            bytes: prepared.input.len(),
            key_file,
            nonce_file,
        })
    }

    /// Release every loaded module.
    pub fn shutdown(self) -> usize {
        self.registry.shutdown()
    }
}
