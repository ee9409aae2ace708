//! Document store client.
//!
//! The store is a remote tree-structured key-value service: whole-value
//! reads and overwrites by slash-separated path, plus an atomic multi-path
//! update used to couple a host mutation with its audit entry. Last-write-wins
//! per path; the only concurrency control is the guarded update's
//! compare-and-swap precondition.
//!
//! Two implementations: [`HttpStore`] speaks the store's REST protocol,
//! [`MemoryStore`] is an in-process tree with identical semantics for tests.

mod http;
mod memory;
pub mod paths;

pub use http::HttpStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur on any store round trip.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure; the operation may or may not have applied.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the caller's credentials.
    #[error("store access denied: {0}")]
    Denied(String),

    /// A stored document did not decode into the expected record shape.
    #[error("malformed record at {path}: {reason}")]
    MalformedRecord { path: String, reason: String },

    /// A guarded update's precondition did not hold; nothing was applied.
    #[error("write precondition failed at {path}")]
    Conflict { path: String },
}

/// A batch of paths written in one atomic operation.
///
/// A `None` value deletes the path. Entries are keyed by path, so writing
/// the same path twice keeps only the last value.
#[derive(Debug, Clone, Default)]
pub struct MultiPathUpdate {
    entries: BTreeMap<String, Option<Value>>,
}

impl MultiPathUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a whole-value overwrite at `path`.
    #[must_use]
    pub fn set(mut self, path: impl Into<String>, value: Value) -> Self {
        self.entries.insert(path.into(), Some(value));
        self
    }

    /// Stage a deletion of `path`.
    #[must_use]
    pub fn remove(mut self, path: impl Into<String>) -> Self {
        self.entries.insert(path.into(), None);
        self
    }

    /// Iterate staged entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries
            .iter()
            .map(|(path, value)| (path.as_str(), value.as_ref()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Client contract for the remote document store.
///
/// All methods are single request/response round trips; callers impose their
/// own timeouts and retry policy. Reads of absent paths yield `Ok(None)`.
pub trait DocumentStore {
    /// Read the value at `path`, `None` when absent.
    fn get(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Overwrite the whole value at `path`.
    fn put(&self, path: &str, value: Value) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete the value at `path`. Deleting an absent path succeeds.
    fn delete(&self, path: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Apply every staged entry atomically: all paths land or none do.
    fn update(
        &self,
        update: MultiPathUpdate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Like [`update`](Self::update), but only if the current value at
    /// `guard_path` equals `expected` (`None` = absent). A failed
    /// precondition yields [`StoreError::Conflict`] and applies nothing.
    fn update_guarded(
        &self,
        guard_path: &str,
        expected: Option<&Value>,
        update: MultiPathUpdate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read and decode the record at `path`.
    ///
    /// Decode failures surface as [`StoreError::MalformedRecord`] so callers
    /// never see half-formed documents.
    fn get_typed<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<T>, StoreError>> + Send
    where
        Self: Sync,
    {
        async move {
            match self.get(path).await? {
                None | Some(Value::Null) => Ok(None),
                Some(value) => serde_json::from_value(value)
                    .map(Some)
                    .map_err(|err| StoreError::MalformedRecord {
                        path: path.to_owned(),
                        reason: err.to_string(),
                    }),
            }
        }
    }

    /// Encode and overwrite the record at `path`.
    fn put_typed<T: Serialize + Sync>(
        &self,
        path: &str,
        record: &T,
    ) -> impl Future<Output = Result<(), StoreError>> + Send
    where
        Self: Sync,
    {
        async move {
            let value = encode(path, record)?;
            self.put(path, value).await
        }
    }
}

/// Encode a record for storage, mapping serializer failures onto the
/// store's malformed-record error.
pub fn encode<T: Serialize>(path: &str, record: &T) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|err| StoreError::MalformedRecord {
        path: path.to_owned(),
        reason: err.to_string(),
    })
}
