//! Startup initialization.
//!
//! Seeds the well-known documents the rest of the system expects: an admin
//! record for every bootstrap identity and the `systemConfig` singleton.
//! Every failure here is logged and non-fatal; the gate self-heals bootstrap
//! records on first login and the ledger needs no seed data.

use chrono::{DateTime, Utc};

use crate::gate::BootstrapPolicy;
use crate::models::{AdminRecord, SystemConfig};
use crate::store::{DocumentStore, paths};

use hosthub_core::Role;

/// Ensure bootstrap admin records and the system config singleton exist.
///
/// Existing documents are never overwritten; only absent ones are created.
pub async fn initialize<S: DocumentStore + Sync>(
    store: &S,
    policy: &BootstrapPolicy,
    now: DateTime<Utc>,
) {
    for uid in policy.uids() {
        let path = paths::admin(uid);
        match store.get(&path).await {
            Ok(Some(_)) => {
                tracing::debug!(%uid, "bootstrap admin record already exists");
            }
            Ok(None) => {
                let record = AdminRecord {
                    username: "admin".to_owned(),
                    role: Role::Admin,
                    last_login: now,
                    email: None,
                };
                match store.put_typed(&path, &record).await {
                    Ok(()) => tracing::info!(%uid, "bootstrap admin record created"),
                    Err(err) => {
                        tracing::warn!(%uid, error = %err, "failed to create bootstrap admin record");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%uid, error = %err, "failed to check bootstrap admin record");
            }
        }
    }

    match store.get(paths::SYSTEM_CONFIG).await {
        Ok(Some(_)) => {
            tracing::debug!("system config already exists");
        }
        Ok(None) => {
            match store
                .put_typed(paths::SYSTEM_CONFIG, &SystemConfig::default())
                .await
            {
                Ok(()) => tracing::info!("system config initialized"),
                Err(err) => tracing::warn!(error = %err, "failed to initialize system config"),
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to check system config");
        }
    }
}
