//! In-memory document store.
//!
//! Same path and atomicity semantics as the remote store, held in one JSON
//! tree behind a mutex. Multi-path updates apply under a single lock, so they
//! are truly atomic; the guarded update's compare-and-swap actually closes
//! the lost-update race that the remote backend can only narrow.
//!
//! Used by unit and integration tests, and exported for downstream test use.

use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::{DocumentStore, MultiPathUpdate, StoreError};

/// An in-process tree store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: Mutex<Value>,
    fail_writes: AtomicU32,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` write operations fail with
    /// [`StoreError::Unavailable`]. Reads are unaffected.
    pub fn inject_write_failures(&self, n: u32) {
        self.fail_writes.store(n, Ordering::SeqCst);
    }

    /// Clone the whole tree, for test assertions.
    pub async fn snapshot(&self) -> Value {
        self.root.lock().await.clone()
    }

    fn check_write_allowed(&self) -> Result<(), StoreError> {
        let failed = self
            .fail_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StoreError::Unavailable("injected write failure".to_owned()));
        }
        Ok(())
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Resolve `path` in the tree. Null counts as absent, matching the remote
/// store's treatment of null values.
fn read<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = root;
    for seg in segments(path) {
        node = node.as_object()?.get(seg)?;
    }
    if node.is_null() { None } else { Some(node) }
}

/// Write or delete at `path`, creating intermediate objects as needed.
fn write(root: &mut Value, path: &str, value: Option<Value>) {
    let segs: Vec<&str> = segments(path).collect();
    write_at(root, &segs, value);
}

fn write_at(node: &mut Value, segs: &[&str], value: Option<Value>) {
    let Some((head, rest)) = segs.split_first() else {
        *node = value.unwrap_or(Value::Null);
        return;
    };

    if value.is_none() {
        // Deletions never materialize intermediate nodes.
        let Some(map) = node.as_object_mut() else {
            return;
        };
        if rest.is_empty() {
            map.remove(*head);
        } else if let Some(child) = map.get_mut(*head) {
            write_at(child, rest, None);
        }
        return;
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Some(map) = node.as_object_mut() {
        let child = map.entry((*head).to_owned()).or_insert(Value::Null);
        write_at(child, rest, value);
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let root = self.root.lock().await;
        Ok(read(&root, path).cloned())
    }

    async fn put(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.check_write_allowed()?;
        let mut root = self.root.lock().await;
        write(&mut root, path, Some(value));
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.check_write_allowed()?;
        let mut root = self.root.lock().await;
        write(&mut root, path, None);
        Ok(())
    }

    async fn update(&self, update: MultiPathUpdate) -> Result<(), StoreError> {
        self.check_write_allowed()?;
        let mut root = self.root.lock().await;
        for (path, value) in update.entries() {
            write(&mut root, path, value.cloned());
        }
        Ok(())
    }

    async fn update_guarded(
        &self,
        guard_path: &str,
        expected: Option<&Value>,
        update: MultiPathUpdate,
    ) -> Result<(), StoreError> {
        self.check_write_allowed()?;
        let mut root = self.root.lock().await;
        if read(&root, guard_path) != expected {
            return Err(StoreError::Conflict {
                path: guard_path.to_owned(),
            });
        }
        for (path, value) in update.entries() {
            write(&mut root, path, value.cloned());
        }
        Ok(())
    }
}
