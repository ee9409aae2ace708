//! Audit trail.
//!
//! Read-only, filterable access to the append-only subscription history.
//! History outlives its host: entries for a removed account stay queryable
//! by id, with display metadata falling back to placeholders.

use chrono::{DateTime, Duration, Utc};

use hosthub_core::{DAY_MS, HostId};

use crate::models::{HostRecord, SubscriptionRecord};
use crate::store::{DocumentStore, StoreError, paths};

/// Display name used when an entry's host no longer exists.
const UNKNOWN_HOST: &str = "Unknown Host";

/// Email placeholder for entries whose host no longer exists.
const UNKNOWN_EMAIL: &str = "N/A";

/// One audit entry with its store key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Entry key under `subscriptionHistory/{hostId}`.
    pub key: String,
    pub record: SubscriptionRecord,
}

/// A host's full history joined with display metadata.
#[derive(Debug, Clone)]
pub struct HostHistory {
    pub host_id: HostId,
    pub host_name: String,
    pub email: String,
    /// Newest-first by transition timestamp.
    pub entries: Vec<AuditEntry>,
}

/// Criteria for narrowing a set of host histories.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Keep only this host.
    pub host_id: Option<HostId>,
    /// Case-insensitive substring over host name or email.
    pub text_query: Option<String>,
    /// Keep hosts with at least one entry in the last N days.
    pub since_days: Option<i64>,
}

/// Read-only view over the audit history.
pub struct AuditTrail<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore + Sync> AuditTrail<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// One host's entries, newest first. Empty for hosts with no history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on a failed read or a malformed entry.
    pub async fn history(&self, id: &HostId) -> Result<Vec<AuditEntry>, StoreError> {
        let Some(value) = self.store.get(&paths::history(id)).await? else {
            return Ok(Vec::new());
        };
        decode_entries(&paths::history(id), value)
    }

    /// Every host's history joined with its display metadata.
    ///
    /// Hosts with no entries are omitted. History whose host record is gone
    /// keeps its id with placeholder metadata.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on a failed read or a malformed entry.
    pub async fn full_history(&self) -> Result<Vec<HostHistory>, StoreError> {
        let Some(history_value) = self.store.get(paths::HISTORY).await? else {
            return Ok(Vec::new());
        };
        let history_map =
            history_value
                .as_object()
                .ok_or_else(|| StoreError::MalformedRecord {
                    path: paths::HISTORY.to_owned(),
                    reason: "expected an object of per-host histories".to_owned(),
                })?;

        let hosts = self
            .store
            .get(paths::HOSTS)
            .await?
            .and_then(|value| value.as_object().cloned())
            .unwrap_or_default();

        let mut histories = Vec::with_capacity(history_map.len());
        for (raw_id, raw_entries) in history_map {
            let host_id = HostId::new(raw_id.clone());
            let entries = decode_entries(&paths::history(&host_id), raw_entries.clone())?;
            if entries.is_empty() {
                continue;
            }

            let (host_name, email) = match hosts.get(raw_id) {
                Some(raw_host) => {
                    let record: HostRecord = serde_json::from_value(raw_host.clone()).map_err(
                        |err| StoreError::MalformedRecord {
                            path: paths::host(&host_id),
                            reason: err.to_string(),
                        },
                    )?;
                    (record.username, record.email.into_inner())
                }
                None => (UNKNOWN_HOST.to_owned(), UNKNOWN_EMAIL.to_owned()),
            };

            histories.push(HostHistory {
                host_id,
                host_name,
                email,
                entries,
            });
        }
        Ok(histories)
    }
}

/// Apply a [`HistoryFilter`] to a set of histories. Pure function.
#[must_use]
pub fn filter_histories(
    histories: &[HostHistory],
    criteria: &HistoryFilter,
    now: DateTime<Utc>,
) -> Vec<HostHistory> {
    histories
        .iter()
        .filter(|history| {
            if let Some(host_id) = &criteria.host_id
                && &history.host_id != host_id
            {
                return false;
            }

            if let Some(query) = &criteria.text_query
                && !query.is_empty()
            {
                let query = query.to_lowercase();
                let name_hit = history.host_name.to_lowercase().contains(&query);
                let email_hit = history.email.to_lowercase().contains(&query);
                if !name_hit && !email_hit {
                    return false;
                }
            }

            if let Some(days) = criteria.since_days {
                let cutoff = now - Duration::milliseconds(days * DAY_MS);
                let recent = history
                    .entries
                    .iter()
                    .any(|entry| entry.record.timestamp >= cutoff);
                if !recent {
                    return false;
                }
            }

            true
        })
        .cloned()
        .collect()
}

fn decode_entries(
    base_path: &str,
    value: serde_json::Value,
) -> Result<Vec<AuditEntry>, StoreError> {
    let map = value.as_object().ok_or_else(|| StoreError::MalformedRecord {
        path: base_path.to_owned(),
        reason: "expected an object of audit entries".to_owned(),
    })?;

    let mut entries = Vec::with_capacity(map.len());
    for (key, raw) in map {
        let record: SubscriptionRecord =
            serde_json::from_value(raw.clone()).map_err(|err| StoreError::MalformedRecord {
                path: format!("{base_path}/{key}"),
                reason: err.to_string(),
            })?;
        entries.push(AuditEntry {
            key: key.clone(),
            record,
        });
    }

    // Newest first; the key's random suffix breaks same-tick ties stably.
    entries.sort_by(|a, b| {
        b.record
            .timestamp
            .cmp(&a.record.timestamp)
            .then_with(|| b.key.cmp(&a.key))
    });
    Ok(entries)
}
