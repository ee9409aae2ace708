//! Hosthub Core - Shared types library.
//!
//! This crate provides common types used across all Hosthub components:
//! - `control` - Authorization gate, subscription ledger, and audit trail
//! - `cli` - Command-line tools for provisioning and management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no store access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles, statuses,
//!   and derived subscription health

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
