//! Authorization gate.
//!
//! Decides whether an authenticated identity is allowed to act as an
//! administrator. A small allow-list of bootstrap identities always passes
//! and self-heals its own admin record, so the system is reachable even with
//! an empty store; everyone else must already have an `admins/{uid}` record
//! with the admin role.
//!
//! Verification is not read-only: every success refreshes the record's
//! `lastLogin`, so callers must tolerate write failure independently of
//! logical rejection.

use chrono::{DateTime, Utc};
use thiserror::Error;

use hosthub_core::{Email, Role, Uid};

use crate::identity::{AuthIdentity, IdentityError, IdentityStore};
use crate::models::AdminRecord;
use crate::store::{DocumentStore, StoreError, paths};

/// Allow-list of identities that always verify as administrators.
///
/// Resolved from configuration at process start; the gate never consults a
/// hard-coded constant.
#[derive(Debug, Clone)]
pub struct BootstrapPolicy {
    uids: Vec<Uid>,
}

impl BootstrapPolicy {
    #[must_use]
    pub fn new(uids: Vec<Uid>) -> Self {
        Self { uids }
    }

    /// Whether `uid` is a bootstrap identity.
    #[must_use]
    pub fn allows(&self, uid: &Uid) -> bool {
        self.uids.contains(uid)
    }

    /// The allow-listed identities, in configuration order.
    #[must_use]
    pub fn uids(&self) -> &[Uid] {
        &self.uids
    }
}

/// Errors from gate operations.
#[derive(Debug, Error)]
pub enum GateError {
    /// The identity provider rejected the credentials.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The authenticated identity has no valid admin record.
    #[error("not an administrator")]
    NotAnAdmin,

    /// A store round trip failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The identity provider failed transiently.
    #[error("identity provider unavailable: {0}")]
    Identity(String),
}

impl From<IdentityError> for GateError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => Self::InvalidCredentials,
            IdentityError::Unavailable(reason) | IdentityError::MalformedIdentity(reason) => {
                Self::Identity(reason)
            }
        }
    }
}

/// An authorized admin session.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: AuthIdentity,
    pub admin: AdminRecord,
}

/// Where a session stands after the gate has ruled on an identity change.
///
/// `Denied` and `TransientError` both mean the underlying identity session
/// has already been signed out; the gate never leaves an authenticated but
/// unauthorized session behind.
#[derive(Debug, Clone)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authorized(AdminRecord),
    Denied(String),
    TransientError(String),
}

/// The authorization gate.
pub struct AuthorizationGate<'a, S> {
    store: &'a S,
    policy: BootstrapPolicy,
}

impl<'a, S: DocumentStore + Sync> AuthorizationGate<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, policy: BootstrapPolicy) -> Self {
        Self { store, policy }
    }

    /// Verify that `uid` may act as an administrator.
    ///
    /// Bootstrap identities get their record overwritten to a known-good
    /// shape and pass unconditionally; a failed bootstrap write is logged and
    /// verification falls through to the stored record on a best-effort
    /// basis. Everyone else must have a stored record with the admin role,
    /// which gets its `lastLogin` refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::NotAnAdmin`] when no valid record exists, or
    /// [`GateError::Store`] when a required store round trip fails.
    pub async fn verify_admin(
        &self,
        uid: &Uid,
        email: &Email,
        now: DateTime<Utc>,
    ) -> Result<AdminRecord, GateError> {
        if self.policy.allows(uid) {
            let record = bootstrap_record(email, now);
            match self.store.put_typed(&paths::admin(uid), &record).await {
                Ok(()) => {
                    tracing::info!(%uid, "bootstrap admin record refreshed");
                    return Ok(record);
                }
                Err(err) => {
                    // Must not block login on its own; the stored record may
                    // still verify.
                    tracing::warn!(%uid, error = %err, "bootstrap admin write failed");
                }
            }
        }

        let path = paths::admin(uid);
        let Some(mut record) = self.store.get_typed::<AdminRecord>(&path).await? else {
            tracing::warn!(%uid, "no admin record for authenticated identity");
            return Err(GateError::NotAnAdmin);
        };

        if record.role != Role::Admin {
            tracing::warn!(%uid, role = %record.role, "admin record carries wrong role");
            return Err(GateError::NotAnAdmin);
        }

        record.last_login = now;
        self.store.put_typed(&path, &record).await?;
        tracing::info!(%uid, username = %record.username, "admin verification succeeded");
        Ok(record)
    }

    /// Authenticate credentials and verify admin access in one flow.
    ///
    /// On any failure after authentication succeeded, the identity session is
    /// signed out before the error is returned.
    ///
    /// # Errors
    ///
    /// [`GateError::InvalidCredentials`] from the provider passes through;
    /// verification failures are as in [`verify_admin`](Self::verify_admin).
    pub async fn login<I: IdentityStore>(
        &self,
        identity_store: &I,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, GateError> {
        let identity = identity_store.authenticate(email, password).await?;
        match self
            .verify_admin(&identity.uid, &identity.email, now)
            .await
        {
            Ok(admin) => Ok(Session { identity, admin }),
            Err(err) => {
                force_sign_out(identity_store).await;
                Err(err)
            }
        }
    }

    /// Rule on an identity-change notification from the provider.
    ///
    /// Drives the session state machine: no identity is `Unauthenticated`;
    /// a verified identity is `Authorized`; a rejected or errored one is
    /// signed out and reported as `Denied` or `TransientError`.
    pub async fn resolve_identity<I: IdentityStore>(
        &self,
        identity_store: &I,
        current: Option<&AuthIdentity>,
        now: DateTime<Utc>,
    ) -> SessionState {
        let Some(identity) = current else {
            return SessionState::Unauthenticated;
        };

        match self
            .verify_admin(&identity.uid, &identity.email, now)
            .await
        {
            Ok(admin) => SessionState::Authorized(admin),
            Err(err) => {
                force_sign_out(identity_store).await;
                match err {
                    GateError::NotAnAdmin | GateError::InvalidCredentials => {
                        SessionState::Denied(err.to_string())
                    }
                    GateError::Store(_) | GateError::Identity(_) => {
                        SessionState::TransientError(err.to_string())
                    }
                }
            }
        }
    }
}

fn bootstrap_record(email: &Email, now: DateTime<Utc>) -> AdminRecord {
    let local = email.local_part();
    AdminRecord {
        username: if local.is_empty() {
            "admin".to_owned()
        } else {
            local.to_owned()
        },
        role: Role::Admin,
        last_login: now,
        email: Some(email.clone()),
    }
}

async fn force_sign_out<I: IdentityStore>(identity_store: &I) {
    if let Err(err) = identity_store.sign_out().await {
        tracing::warn!(error = %err, "sign-out after failed verification also failed");
    }
}
