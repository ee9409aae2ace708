//! Well-known store paths.
//!
//! The whole tree the core touches:
//!
//! - `admins/{uid}` - [`AdminRecord`](crate::models::AdminRecord)
//! - `hosts/{hostId}` - [`HostRecord`](crate::models::HostRecord)
//! - `subscriptionHistory/{hostId}/{entryKey}` -
//!   [`SubscriptionRecord`](crate::models::SubscriptionRecord)
//! - `systemConfig` - [`SystemConfig`](crate::models::SystemConfig)

use chrono::{DateTime, Utc};
use uuid::Uuid;

use hosthub_core::{HostId, Uid};

/// Root of the host account collection.
pub const HOSTS: &str = "hosts";

/// Root of the per-host audit history collection.
pub const HISTORY: &str = "subscriptionHistory";

/// The configuration singleton.
pub const SYSTEM_CONFIG: &str = "systemConfig";

/// Path of an operator's admin record.
#[must_use]
pub fn admin(uid: &Uid) -> String {
    format!("admins/{uid}")
}

/// Path of a host account record.
#[must_use]
pub fn host(id: &HostId) -> String {
    format!("{HOSTS}/{id}")
}

/// Path of a single field inside a host record.
#[must_use]
pub fn host_field(id: &HostId, field: &str) -> String {
    format!("{HOSTS}/{id}/{field}")
}

/// Path of a host's audit history.
#[must_use]
pub fn history(id: &HostId) -> String {
    format!("{HISTORY}/{id}")
}

/// Path of one audit entry.
#[must_use]
pub fn history_entry(id: &HostId, key: &str) -> String {
    format!("{HISTORY}/{id}/{key}")
}

/// Generate a fresh audit entry key.
///
/// Keys sort by transition timestamp (zero-padded milliseconds) and carry a
/// random suffix, so two transitions in the same clock tick never collide and
/// never overwrite each other. The timestamp stays a plain field on the
/// record; the key is only an identifier.
#[must_use]
pub fn new_entry_key(timestamp: DateTime<Utc>) -> String {
    format!(
        "{:013}-{}",
        timestamp.timestamp_millis(),
        Uuid::new_v4().simple()
    )
}
