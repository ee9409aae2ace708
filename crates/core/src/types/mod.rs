//! Core types for Hosthub.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod status;
pub mod subscription;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
pub use subscription::{DAY_MS, SubscriptionHealth, days_remaining};
