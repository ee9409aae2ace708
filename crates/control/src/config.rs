//! Control-plane configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `HOSTHUB_STORE_URL` - Base URL of the document store
//! - `HOSTHUB_BOOTSTRAP_UIDS` - Comma-separated UIDs that always verify as
//!   administrators (at least one)
//!
//! ## Optional
//! - `HOSTHUB_STORE_SECRET` - Auth secret for the document store
//! - `HOSTHUB_IDENTITY_URL` - Base URL of the identity provider REST API
//! - `HOSTHUB_IDENTITY_API_KEY` - Identity provider API key (required when
//!   `HOSTHUB_IDENTITY_URL` is set)

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use hosthub_core::Uid;

use crate::gate::BootstrapPolicy;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Document store connection settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the store's REST endpoint.
    pub base_url: Url,
    /// Auth secret appended to every request, when the store requires one.
    pub secret: Option<SecretString>,
}

/// Identity provider connection settings.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL of the provider's REST endpoint.
    pub base_url: Url,
    /// Provider API key.
    pub api_key: SecretString,
}

/// Control-plane configuration.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Document store settings.
    pub store: StoreConfig,
    /// Identity provider settings; absent for store-only tooling.
    pub identity: Option<IdentityConfig>,
    /// Allow-list of identities that always verify as administrators.
    pub bootstrap: BootstrapPolicy,
}

impl ControlConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Lets tests supply variables without mutating process state.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store_url = required(&lookup, "HOSTHUB_STORE_URL")?;
        let base_url = Url::parse(&store_url).map_err(|err| {
            ConfigError::InvalidEnvVar("HOSTHUB_STORE_URL".to_owned(), err.to_string())
        })?;

        let store = StoreConfig {
            base_url,
            secret: lookup("HOSTHUB_STORE_SECRET").map(SecretString::from),
        };

        let identity = match lookup("HOSTHUB_IDENTITY_URL") {
            None => None,
            Some(identity_url) => {
                let base_url = Url::parse(&identity_url).map_err(|err| {
                    ConfigError::InvalidEnvVar("HOSTHUB_IDENTITY_URL".to_owned(), err.to_string())
                })?;
                let api_key = required(&lookup, "HOSTHUB_IDENTITY_API_KEY")?;
                Some(IdentityConfig {
                    base_url,
                    api_key: SecretString::from(api_key),
                })
            }
        };

        let bootstrap = parse_bootstrap(&required(&lookup, "HOSTHUB_BOOTSTRAP_UIDS")?)?;

        Ok(Self {
            store,
            identity,
            bootstrap,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()))
}

fn parse_bootstrap(raw: &str) -> Result<BootstrapPolicy, ConfigError> {
    let uids: Vec<Uid> = raw
        .split(',')
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .map(Uid::new)
        .collect();

    if uids.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "HOSTHUB_BOOTSTRAP_UIDS".to_owned(),
            "must list at least one UID".to_owned(),
        ));
    }

    Ok(BootstrapPolicy::new(uids))
}
