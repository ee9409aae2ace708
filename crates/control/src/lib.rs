//! Hosthub Control - administrative control plane for hosted tenant accounts.
//!
//! This crate is the core of the Hosthub admin surface. It gates dashboard
//! access to a small set of privileged operators and manages the lifecycle of
//! paying host accounts, with an auditable history of every change.
//!
//! # Architecture
//!
//! Three components own all real invariants:
//!
//! - [`gate`] - maps an authenticated identity to an administrator record,
//!   with a self-healing bootstrap path for pre-designated owner identities
//! - [`ledger`] - the only legal way to change a host's activation flag or
//!   subscription end, always coupled atomically with an audit entry
//! - [`audit`] - read-only, filterable access to the append-only history
//!
//! Everything is a client of two external collaborators:
//!
//! - [`store`] - a tree-structured key-value document store (REST client plus
//!   an in-memory implementation for tests)
//! - [`identity`] - a credential provider that authenticates email+password
//!   and yields a stable UID
//!
//! The crate performs no automatic retries and holds no cache; the store is
//! the single source of truth.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod audit;
pub mod config;
pub mod gate;
pub mod identity;
pub mod init;
pub mod ledger;
pub mod models;
pub mod store;

pub use audit::{AuditEntry, AuditTrail, HistoryFilter, HostHistory, filter_histories};
pub use config::{ConfigError, ControlConfig, IdentityConfig, StoreConfig};
pub use gate::{AuthorizationGate, BootstrapPolicy, GateError, Session, SessionState};
pub use identity::{
    AuthIdentity, HttpIdentityStore, IdentityError, IdentityStore, MemoryIdentityStore,
};
pub use ledger::{HostOverview, LedgerError, NewHost, SubscriptionLedger};
pub use models::{AdminRecord, HostRecord, SubscriptionRecord, SystemConfig};
pub use store::{DocumentStore, HttpStore, MemoryStore, MultiPathUpdate, StoreError};
