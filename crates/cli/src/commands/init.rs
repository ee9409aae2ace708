//! Store initialization command.
//!
//! Seeds the documents the dashboard expects on first boot: one admin
//! record per bootstrap UID and the `systemConfig` singleton. Safe to run
//! repeatedly; existing documents are left alone.

use chrono::Utc;

use super::{CommandError, connect};

pub async fn run() -> Result<(), CommandError> {
    let (config, store) = connect()?;

    tracing::info!("Initializing store documents...");
    hosthub_control::init::initialize(&store, &config.bootstrap, Utc::now()).await;
    tracing::info!("Initialization complete");
    Ok(())
}
