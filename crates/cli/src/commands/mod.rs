//! CLI command implementations.

pub mod admin;
pub mod history;
pub mod host;
pub mod init;

use thiserror::Error;

use hosthub_control::{ConfigError, ControlConfig, HttpStore};

/// Errors shared by all commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A gate operation failed.
    #[error(transparent)]
    Gate(#[from] hosthub_control::GateError),

    /// A ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] hosthub_control::LedgerError),

    /// A store round trip failed.
    #[error(transparent)]
    Store(#[from] hosthub_control::StoreError),

    /// Invalid command input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Load configuration from `.env`/environment and connect the store client.
pub fn connect() -> Result<(ControlConfig, HttpStore), CommandError> {
    dotenvy::dotenv().ok();
    let config = ControlConfig::from_env()?;
    let store = HttpStore::new(config.store.clone());
    Ok((config, store))
}
