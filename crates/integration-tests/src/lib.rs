//! End-to-end tests for Hosthub.
//!
//! Every test runs against the in-memory document and identity stores, which
//! mirror the remote protocols' observable semantics (null-as-absent reads,
//! multi-path atomic updates, guarded writes). No network, no external state.
//!
//! # Test Categories
//!
//! - `gate_flow` - login, bootstrap, denial and forced sign-out
//! - `subscription_lifecycle` - host provisioning and ledger transitions
//! - `audit_history` - history joins, filters and retention

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test-support code; panicking on malformed fixtures is the right behavior.
#![allow(clippy::unwrap_used)]

use chrono::{DateTime, TimeZone, Utc};

use hosthub_control::{BootstrapPolicy, MemoryIdentityStore, MemoryStore};
use hosthub_core::Uid;

/// UID designated as the bootstrap owner in every test context.
pub const OWNER_UID: &str = "owner-uid";

/// Owner credentials registered with the in-memory identity store.
pub const OWNER_EMAIL: &str = "owner@example.com";
pub const OWNER_PASSWORD: &str = "correct horse";

/// Shared fixture wiring the in-memory collaborators together.
pub struct TestContext {
    pub store: MemoryStore,
    pub identity: MemoryIdentityStore,
    pub policy: BootstrapPolicy,
}

impl TestContext {
    /// A fresh, empty context with one bootstrap UID and its credentials
    /// registered.
    pub async fn new() -> Self {
        let identity = MemoryIdentityStore::new();
        identity
            .register(OWNER_EMAIL, OWNER_PASSWORD, Uid::new(OWNER_UID))
            .await;
        Self {
            store: MemoryStore::new(),
            identity,
            policy: BootstrapPolicy::new(vec![Uid::new(OWNER_UID)]),
        }
    }

    #[must_use]
    pub fn owner(&self) -> Uid {
        Uid::new(OWNER_UID)
    }
}

/// A fixed reference instant so expiry arithmetic stays deterministic.
#[must_use]
pub fn reference_now() -> DateTime<Utc> {
    // 2026-03-01T12:00:00Z
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().unwrap()
}
