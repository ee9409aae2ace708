//! REST client for the remote document store.
//!
//! Speaks the store's JSON-over-HTTP protocol: `GET`/`PUT`/`DELETE` on
//! `{base}/{path}.json`, and atomic multi-path writes as a `PATCH` of a
//! path-keyed object against the tree root. An optional auth secret rides
//! along as a query parameter.

use secrecy::ExposeSecret;
use serde_json::{Map, Value};

use crate::config::StoreConfig;

use super::{DocumentStore, MultiPathUpdate, StoreError};

/// HTTP client for the document store.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    config: StoreConfig,
}

impl HttpStore {
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!("{base}/.json")
        } else {
            format!("{base}/{path}.json")
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, self.endpoint(path));
        if let Some(secret) = &self.config.secret {
            builder = builder.query(&[("auth", secret.expose_secret())]);
        }
        builder
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(StoreError::Denied(format!("{status}: {body}")));
        }
        Err(StoreError::Unavailable(format!("{status}: {body}")))
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn patch_body(update: &MultiPathUpdate) -> Value {
    let mut body = Map::new();
    for (path, value) in update.entries() {
        // The store deletes a path when it is set to null.
        body.insert(path.to_owned(), value.cloned().unwrap_or(Value::Null));
    }
    Value::Object(body)
}

impl DocumentStore for HttpStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, path)
            .send()
            .await
            .map_err(transport)?;
        let value: Value = Self::check(response)
            .await?
            .json()
            .await
            .map_err(transport)?;
        Ok(match value {
            Value::Null => None,
            value => Some(value),
        })
    }

    async fn put(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::PUT, path)
            .json(&value)
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::DELETE, path)
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update(&self, update: MultiPathUpdate) -> Result<(), StoreError> {
        if update.is_empty() {
            return Ok(());
        }
        let response = self
            .request(reqwest::Method::PATCH, "")
            .json(&patch_body(&update))
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_guarded(
        &self,
        guard_path: &str,
        expected: Option<&Value>,
        update: MultiPathUpdate,
    ) -> Result<(), StoreError> {
        // The REST protocol has no conditional multi-path write, so the guard
        // is a fresh read immediately before the PATCH. This narrows the
        // lost-update window to one round trip; MemoryStore closes it fully.
        let current = self.get(guard_path).await?;
        if current.as_ref() != expected {
            return Err(StoreError::Conflict {
                path: guard_path.to_owned(),
            });
        }
        self.update(update).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use url::Url;

    fn config() -> StoreConfig {
        StoreConfig {
            base_url: Url::parse("https://store.example.com/").unwrap(),
            secret: None,
        }
    }

    #[test]
    fn test_endpoint_formatting() {
        let store = HttpStore::new(config());
        assert_eq!(
            store.endpoint("hosts/h1"),
            "https://store.example.com/hosts/h1.json"
        );
        assert_eq!(store.endpoint(""), "https://store.example.com/.json");
        assert_eq!(
            store.endpoint("/systemConfig/"),
            "https://store.example.com/systemConfig.json"
        );
    }

    #[test]
    fn test_patch_body_nulls_deletions() {
        let update = MultiPathUpdate::new()
            .set("hosts/h1/status", serde_json::json!("active"))
            .remove("hosts/h2");
        assert_eq!(
            patch_body(&update),
            serde_json::json!({
                "hosts/h1/status": "active",
                "hosts/h2": null,
            })
        );
    }
}
