//! Stored record types.
//!
//! Every record is decoded from the schemaless document store. Optional
//! fields tolerate absence; any other shape mismatch surfaces as
//! [`StoreError::MalformedRecord`](crate::store::StoreError::MalformedRecord)
//! at the decode step rather than propagating half-formed values.
//!
//! Timestamps are stored as epoch milliseconds, the store's native format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hosthub_core::{Email, HostStatus, Role, SubscriptionAction, Uid};

/// A privileged operator, stored at `admins/{uid}`.
///
/// Exactly one record per UID. `role` must be [`Role::Admin`] for the gate
/// to admit the identity; the record is never deleted by the core, only its
/// `last_login` is refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    /// Display name, derived from the email local part when bootstrapped.
    pub username: String,
    /// Role tag; anything but `admin` fails verification.
    pub role: Role,
    /// Last successful verification instant. Monotonic non-decreasing.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_login: DateTime<Utc>,
    /// Email the record was last verified with, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}

/// A tenant account with a paid-subscription lifecycle, stored at
/// `hosts/{hostId}`.
///
/// `status` is the stored activation flag; whether the subscription has
/// *expired* is derived from `subscription_end` on read and the two are not
/// automatically reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRecord {
    pub username: String,
    pub email: Email,
    pub status: HostStatus,
    /// Absolute expiry instant of the paid subscription.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub subscription_end: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_login: DateTime<Utc>,
    pub role: Role,
}

/// One immutable lifecycle transition, stored at
/// `subscriptionHistory/{hostId}/{entryKey}`.
///
/// Records are append-only: never reordered, never pruned, never rewritten.
/// For non-extend actions `previous_end` and `new_end` may be equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub action: SubscriptionAction,
    /// Extension length in days; present for `extend` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    /// Free-text operator note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Transition instant. A plain field, not the entry key.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub previous_end: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub new_end: DateTime<Utc>,
    /// UID of the administrator who issued the transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Uid>,
}

/// Process-wide configuration singleton at `systemConfig`.
///
/// Outside the core's real scope; seeded once at startup if absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    pub backup_frequency: String,
    pub retention_period: String,
    pub maintenance_mode: bool,
    /// Epoch milliseconds of the last backup; 0 when never run.
    pub last_backup: i64,
    /// Epoch milliseconds of the last maintenance pass; 0 when never run.
    pub last_maintenance: i64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            backup_frequency: "daily".to_owned(),
            retention_period: "30".to_owned(),
            maintenance_mode: false,
            last_backup: 0,
            last_maintenance: 0,
        }
    }
}
