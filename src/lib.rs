//! Electoral registration and voting on SQLite
//!
//! Register candidates and voters, cast votes atomically, and read per-office
//! results. [`election::Election`] bundles the components over one
//! [`storage::Store`].

pub mod config;
pub mod election;
pub mod errors;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use election::Election;
pub use errors::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging from `RUST_LOG`, defaulting to `votebox=info`
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "votebox=info".into()),
        )
        .try_init()
        .map_err(|e| Error::configuration(format!("logging already initialized: {e}")))?;

    tracing::info!("🗳️  Election system v{} initialized", VERSION);
    Ok(())
}

/// Initialize logging from a [`config::LoggingConfig`]
///
/// `format` is one of `pretty`, `compact` or `json`.
pub fn init_with(logging: &config::LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(format!("votebox={}", logging.level))
        .map_err(|e| Error::configuration(format!("invalid LOG_LEVEL '{}': {e}", logging.level)))?;

    let initialized = match logging.format.as_str() {
        "pretty" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .pretty()
            .try_init(),
        "compact" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .try_init(),
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init(),
        other => {
            return Err(Error::configuration(format!(
                "unknown LOG_FORMAT '{other}', expected pretty, compact or json"
            )));
        }
    };
    initialized.map_err(|e| Error::configuration(format!("logging already initialized: {e}")))?;

    tracing::info!("🗳️  Election system v{} initialized", VERSION);
    Ok(())
}
