//! Identity provider client.
//!
//! The provider authenticates an email+password pair and yields a stable
//! UID. The core consumes nothing else from it beyond sign-out, which the
//! gate forces whenever verification fails after authentication.

use std::collections::HashMap;

use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

use hosthub_core::{Email, Uid};

use crate::config::IdentityConfig;

/// An authenticated identity as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub uid: Uid,
    pub email: Email,
}

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider rejected the email/password pair.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Transient provider or transport failure.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    /// The provider returned an identity the core cannot use.
    #[error("malformed identity from provider: {0}")]
    MalformedIdentity(String),
}

/// Client contract for the identity provider.
pub trait IdentityStore {
    /// Authenticate an email+password pair.
    fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<AuthIdentity, IdentityError>> + Send;

    /// Terminate the current identity session.
    fn sign_out(&self) -> impl Future<Output = Result<(), IdentityError>> + Send;
}

// =============================================================================
// HTTP implementation
// =============================================================================

/// REST client for the identity provider.
#[derive(Debug)]
pub struct HttpIdentityStore {
    client: reqwest::Client,
    config: IdentityConfig,
    session_token: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    #[serde(default)]
    id_token: Option<String>,
}

impl HttpIdentityStore {
    #[must_use]
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            session_token: Mutex::new(None),
        }
    }

    fn sign_in_endpoint(&self) -> String {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        format!("{base}/v1/accounts:signInWithPassword")
    }
}

impl IdentityStore for HttpIdentityStore {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthIdentity, IdentityError> {
        let response = self
            .client
            .post(self.sign_in_endpoint())
            .query(&[("key", self.config.api_key.expose_secret())])
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Unavailable(format!("{status}: {body}")));
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;

        let email = Email::parse(&body.email)
            .map_err(|err| IdentityError::MalformedIdentity(err.to_string()))?;

        *self.session_token.lock().await = body.id_token;

        Ok(AuthIdentity {
            uid: Uid::new(body.local_id),
            email,
        })
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        // Sessions are bearer tokens; discarding ours ends the session.
        self.session_token.lock().await.take();
        Ok(())
    }
}

// =============================================================================
// In-memory implementation (tests)
// =============================================================================

/// In-memory identity provider for tests.
///
/// Holds an email → (password, uid) table and counts sign-outs so tests can
/// assert the gate's forced-sign-out behavior.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    accounts: Mutex<HashMap<String, (String, Uid)>>,
    sign_outs: std::sync::atomic::AtomicUsize,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account the store will authenticate.
    pub async fn register(&self, email: &str, password: &str, uid: Uid) {
        self.accounts
            .lock()
            .await
            .insert(email.to_owned(), (password.to_owned(), uid));
    }

    /// Number of sign-outs issued so far.
    #[must_use]
    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl IdentityStore for MemoryIdentityStore {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthIdentity, IdentityError> {
        let accounts = self.accounts.lock().await;
        let Some((stored_password, uid)) = accounts.get(email) else {
            return Err(IdentityError::InvalidCredentials);
        };
        if stored_password != password {
            return Err(IdentityError::InvalidCredentials);
        }
        let email = Email::parse(email)
            .map_err(|err| IdentityError::MalformedIdentity(err.to_string()))?;
        Ok(AuthIdentity {
            uid: uid.clone(),
            email,
        })
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.sign_outs
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_authenticates_registered_account() {
        let store = MemoryIdentityStore::new();
        store
            .register("owner@example.com", "hunter2", Uid::new("u1"))
            .await;

        let identity = store
            .authenticate("owner@example.com", "hunter2")
            .await
            .unwrap();
        assert_eq!(identity.uid, Uid::new("u1"));
        assert_eq!(identity.email.as_str(), "owner@example.com");
    }

    #[tokio::test]
    async fn test_memory_store_rejects_bad_password() {
        let store = MemoryIdentityStore::new();
        store
            .register("owner@example.com", "hunter2", Uid::new("u1"))
            .await;

        let err = store.authenticate("owner@example.com", "wrong").await;
        assert!(matches!(err, Err(IdentityError::InvalidCredentials)));

        let err = store.authenticate("nobody@example.com", "hunter2").await;
        assert!(matches!(err, Err(IdentityError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_memory_store_counts_sign_outs() {
        let store = MemoryIdentityStore::new();
        assert_eq!(store.sign_out_count(), 0);
        store.sign_out().await.unwrap();
        store.sign_out().await.unwrap();
        assert_eq!(store.sign_out_count(), 2);
    }

    #[test]
    fn test_sign_in_response_decodes_provider_shape() {
        let body: SignInResponse = serde_json::from_str(
            r#"{"localId":"u1","email":"owner@example.com","idToken":"t"}"#,
        )
        .unwrap();
        assert_eq!(body.local_id, "u1");
        assert_eq!(body.id_token.as_deref(), Some("t"));
    }
}
