//! Command-line host for the streamcrypt cipher modules.
//!
//! The host loads cipher modules by name, reads an input file, acquires the
//! key and nonce, and writes the transformed bytes back to disk. The cipher
//! modules in `streamcrypt-core` never perform I/O themselves.
//!
//! # Architecture
//!
//! - `config`: command-line and environment configuration, validation
//! - `material`: key and nonce sources, random generation, sidecar files
//! - `host`: module registry ownership and command execution
//! - `error`: host error types
//!
//! # Example
//!
//! ```no_run
//! use streamcrypt_cli::{Host, HostConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = HostConfig::from_args();
//!     config.validate()?;
//!
//!     let host = Host::from_config(&config)?;
//!     host.run(&config.command)?;
//!     host.shutdown();
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod host;
pub mod material;

pub use config::{CipherArgs, Command, HostConfig, KeyArgs, NonceArgs, RoundtripArgs, TransformArgs};
pub use error::{ConfigError, HostError};
pub use host::{Direction, Host, Outcome, RoundtripReport, TransformReport};
