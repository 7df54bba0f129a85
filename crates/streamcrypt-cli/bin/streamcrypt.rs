//! streamcrypt binary entry point.
//!
//! Thin wrapper around the streamcrypt-cli library that:
//! 1. Initializes logging
//! 2. Parses and validates configuration
//! 3. Loads the cipher modules
//! 4. Runs the requested command and releases the modules

use anyhow::Result;
use streamcrypt_cli::{Host, HostConfig, Outcome};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = HostConfig::from_args();
    tracing::debug!("Configuration loaded: modules={:?}", config.modules);

    config.validate()?;

    let host = Host::from_config(&config)?;
    let outcome = host.run(&config.command);
    let released = host.shutdown();
    tracing::debug!("Released {} cipher modules", released);

    match outcome? {
        Outcome::Listed(names) => {
            for name in names {
                println!("{name}");
            }
        }
        Outcome::Transformed(report) => {
            let output = report.output.display();
            println!("{} bytes written to {output}", report.bytes);
            if let Some(path) = report.key_file {
                println!("key: {}", path.display());
            }
            if let Some(path) = report.nonce_file {
                println!("nonce: {}", path.display());
            }
        }
        Outcome::RoundTripped(report) => {
            println!("encrypted: {}", report.encrypted.display());
            println!("decrypted: {}", report.decrypted.display());
            if let Some(path) = report.key_file {
                println!("key: {}", path.display());
            }
            if let Some(path) = report.nonce_file {
                println!("nonce: {}", path.display());
            }
        }
    }

    Ok(())
}
