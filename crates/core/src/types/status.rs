//! Role and status enums for stored records.

use serde::{Deserialize, Serialize};

/// Role tag carried by every stored account record.
///
/// The gate only admits identities whose record carries [`Role::Admin`];
/// tenant accounts are tagged [`Role::Host`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Host,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Host => write!(f, "host"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "host" => Ok(Self::Host),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Stored activation flag on a host account.
///
/// This is the flag an operator sets via suspend/reactivate. It is distinct
/// from the derived expiry classification
/// ([`SubscriptionHealth`](crate::SubscriptionHealth)); the two can disagree
/// until an explicit ledger operation reconciles them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    #[default]
    Active,
    Inactive,
}

impl std::fmt::Display for HostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for HostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(format!("invalid host status: {s}")),
        }
    }
}

/// Subscription lifecycle transition recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionAction {
    Extend,
    Suspend,
    Reactivate,
}

impl std::fmt::Display for SubscriptionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extend => write!(f, "extend"),
            Self::Suspend => write!(f, "suspend"),
            Self::Reactivate => write!(f, "reactivate"),
        }
    }
}
