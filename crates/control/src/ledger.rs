//! Subscription ledger.
//!
//! The only legal way to change a host's activation flag or subscription
//! end. Every transition writes the host fields and its audit entry in one
//! guarded multi-path update: either both land or neither does, and a
//! concurrent transition surfaces as [`LedgerError::OptimisticConflict`]
//! instead of silently losing an update.
//!
//! The acting administrator is an explicit parameter on every mutation; the
//! ledger never consults ambient session state.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use hosthub_core::{
    DAY_MS, Email, HostId, HostStatus, Role, SubscriptionAction, SubscriptionHealth, Uid,
    days_remaining,
};

use crate::models::{HostRecord, SubscriptionRecord};
use crate::store::{DocumentStore, MultiPathUpdate, StoreError, encode, paths};

/// Default paid period granted to a newly provisioned host.
const DEFAULT_SUBSCRIPTION_DAYS: i64 = 30;

/// Errors from ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The referenced host does not exist. Local and non-fatal.
    #[error("host not found: {0}")]
    HostNotFound(HostId),

    /// Another transition landed between our read and write; nothing was
    /// applied. Re-read and retry if still wanted.
    #[error("subscription for {0} changed concurrently")]
    OptimisticConflict(HostId),

    /// Extension length must be at least one day.
    #[error("invalid extension length: {0} days")]
    InvalidDuration(i64),

    /// A store round trip failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input for provisioning a new host account.
#[derive(Debug, Clone)]
pub struct NewHost {
    pub username: String,
    pub email: Email,
    /// Stored activation flag; defaults to active.
    pub status: HostStatus,
    /// Expiry instant; `None` grants the default 30 days from now.
    pub subscription_end: Option<DateTime<Utc>>,
}

impl NewHost {
    #[must_use]
    pub const fn new(username: String, email: Email) -> Self {
        Self {
            username,
            email,
            status: HostStatus::Active,
            subscription_end: None,
        }
    }
}

/// A host record joined with its derived expiry view.
#[derive(Debug, Clone)]
pub struct HostOverview {
    pub id: HostId,
    pub record: HostRecord,
    /// Whole days until expiry, rounded up; non-positive when expired.
    pub days_remaining: i64,
    /// Derived classification, independent of the stored `status` flag.
    pub health: SubscriptionHealth,
}

impl HostOverview {
    fn build(id: HostId, record: HostRecord, now: DateTime<Utc>) -> Self {
        let days = days_remaining(record.subscription_end, now);
        Self {
            id,
            record,
            days_remaining: days,
            health: SubscriptionHealth::classify(days),
        }
    }
}

/// The subscription ledger.
pub struct SubscriptionLedger<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore + Sync> SubscriptionLedger<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Provision a new host account.
    ///
    /// An account's birth is not a transition, so no audit entry is written.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Store`] when the write fails.
    pub async fn create(
        &self,
        actor: &Uid,
        id: &HostId,
        new_host: NewHost,
        now: DateTime<Utc>,
    ) -> Result<HostRecord, LedgerError> {
        let record = HostRecord {
            username: new_host.username,
            email: new_host.email,
            status: new_host.status,
            subscription_end: new_host
                .subscription_end
                .unwrap_or_else(|| now + Duration::days(DEFAULT_SUBSCRIPTION_DAYS)),
            last_login: now,
            role: Role::Host,
        };
        self.store.put_typed(&paths::host(id), &record).await?;
        tracing::info!(%actor, host = %id, username = %record.username, "host provisioned");
        Ok(record)
    }

    /// Extend a host's subscription by `days`.
    ///
    /// An extension always (re)activates the host, even one previously
    /// suspended or expired.
    ///
    /// # Errors
    ///
    /// [`LedgerError::HostNotFound`], [`LedgerError::InvalidDuration`],
    /// [`LedgerError::OptimisticConflict`], or [`LedgerError::Store`].
    pub async fn extend(
        &self,
        actor: &Uid,
        id: &HostId,
        days: i64,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<HostRecord, LedgerError> {
        if days < 1 {
            return Err(LedgerError::InvalidDuration(days));
        }

        let mut host = self.require(id).await?;
        let previous_end = host.subscription_end;
        let new_end = previous_end + Duration::milliseconds(days * DAY_MS);

        let entry = SubscriptionRecord {
            action: SubscriptionAction::Extend,
            duration: Some(days),
            note,
            timestamp: now,
            previous_end,
            new_end,
            actor: Some(actor.clone()),
        };
        self.apply_transition(id, previous_end, new_end, HostStatus::Active, &entry)
            .await?;

        tracing::info!(%actor, host = %id, days, "subscription extended");
        host.subscription_end = new_end;
        host.status = HostStatus::Active;
        Ok(host)
    }

    /// Suspend a host. The subscription end is left untouched.
    ///
    /// # Errors
    ///
    /// [`LedgerError::HostNotFound`], [`LedgerError::OptimisticConflict`],
    /// or [`LedgerError::Store`].
    pub async fn suspend(
        &self,
        actor: &Uid,
        id: &HostId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<HostRecord, LedgerError> {
        let mut host = self.require(id).await?;
        let current_end = host.subscription_end;

        let entry = SubscriptionRecord {
            action: SubscriptionAction::Suspend,
            duration: None,
            note,
            timestamp: now,
            previous_end: current_end,
            new_end: current_end,
            actor: Some(actor.clone()),
        };
        self.apply_transition(id, current_end, current_end, HostStatus::Inactive, &entry)
            .await?;

        tracing::info!(%actor, host = %id, "host suspended");
        host.status = HostStatus::Inactive;
        Ok(host)
    }

    /// Reactivate a host, optionally moving its subscription end.
    ///
    /// # Errors
    ///
    /// [`LedgerError::HostNotFound`], [`LedgerError::OptimisticConflict`],
    /// or [`LedgerError::Store`].
    pub async fn reactivate(
        &self,
        actor: &Uid,
        id: &HostId,
        new_end: Option<DateTime<Utc>>,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<HostRecord, LedgerError> {
        let mut host = self.require(id).await?;
        let previous_end = host.subscription_end;
        let new_end = new_end.unwrap_or(previous_end);

        let entry = SubscriptionRecord {
            action: SubscriptionAction::Reactivate,
            duration: None,
            note,
            timestamp: now,
            previous_end,
            new_end,
            actor: Some(actor.clone()),
        };
        self.apply_transition(id, previous_end, new_end, HostStatus::Active, &entry)
            .await?;

        tracing::info!(%actor, host = %id, "host reactivated");
        host.subscription_end = new_end;
        host.status = HostStatus::Active;
        Ok(host)
    }

    /// Read one host with its derived expiry view.
    ///
    /// # Errors
    ///
    /// [`LedgerError::HostNotFound`] or [`LedgerError::Store`].
    pub async fn query(&self, id: &HostId, now: DateTime<Utc>) -> Result<HostOverview, LedgerError> {
        let record = self.require(id).await?;
        Ok(HostOverview::build(id.clone(), record, now))
    }

    /// Read all hosts, sorted soonest-expiring first.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Store`]; a single malformed host record fails the
    /// whole read rather than being skipped silently.
    pub async fn query_all(&self, now: DateTime<Utc>) -> Result<Vec<HostOverview>, LedgerError> {
        let Some(value) = self.store.get(paths::HOSTS).await? else {
            return Ok(Vec::new());
        };
        let entries = value
            .as_object()
            .ok_or_else(|| StoreError::MalformedRecord {
                path: paths::HOSTS.to_owned(),
                reason: "expected an object of host records".to_owned(),
            })?;

        let mut overviews = Vec::with_capacity(entries.len());
        for (id, raw) in entries {
            let record: HostRecord =
                serde_json::from_value(raw.clone()).map_err(|err| StoreError::MalformedRecord {
                    path: format!("{}/{id}", paths::HOSTS),
                    reason: err.to_string(),
                })?;
            overviews.push(HostOverview::build(HostId::new(id.clone()), record, now));
        }
        overviews.sort_by_key(|overview| overview.days_remaining);
        Ok(overviews)
    }

    /// Delete a host account. Irreversible; no tombstone.
    ///
    /// Audit history for the id is retained and stays queryable.
    ///
    /// # Errors
    ///
    /// [`LedgerError::HostNotFound`] or [`LedgerError::Store`].
    pub async fn remove(&self, actor: &Uid, id: &HostId) -> Result<(), LedgerError> {
        self.require(id).await?;
        self.store.delete(&paths::host(id)).await?;
        tracing::info!(%actor, host = %id, "host removed; audit history retained");
        Ok(())
    }

    async fn require(&self, id: &HostId) -> Result<HostRecord, LedgerError> {
        self.store
            .get_typed(&paths::host(id))
            .await?
            .ok_or_else(|| LedgerError::HostNotFound(id.clone()))
    }

    /// Write the host fields and the audit entry in one guarded atomic
    /// update. The guard is the host's current `subscriptionEnd`: if it moved
    /// since our read, nothing is applied.
    async fn apply_transition(
        &self,
        id: &HostId,
        previous_end: DateTime<Utc>,
        new_end: DateTime<Utc>,
        status: HostStatus,
        entry: &SubscriptionRecord,
    ) -> Result<(), LedgerError> {
        let key = paths::new_entry_key(entry.timestamp);
        let entry_path = paths::history_entry(id, &key);
        let update = MultiPathUpdate::new()
            .set(
                paths::host_field(id, "subscriptionEnd"),
                serde_json::json!(new_end.timestamp_millis()),
            )
            .set(paths::host_field(id, "status"), encode(&paths::host(id), &status)?)
            .set(entry_path.clone(), encode(&entry_path, entry)?);

        let guard_path = paths::host_field(id, "subscriptionEnd");
        let expected = serde_json::json!(previous_end.timestamp_millis());
        match self
            .store
            .update_guarded(&guard_path, Some(&expected), update)
            .await
        {
            Err(StoreError::Conflict { .. }) => Err(LedgerError::OptimisticConflict(id.clone())),
            other => other.map_err(Into::into),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn actor() -> Uid {
        Uid::new("admin-1")
    }

    fn new_host(name: &str) -> NewHost {
        NewHost::new(
            name.to_owned(),
            Email::parse(&format!("{name}@example.com")).unwrap(),
        )
    }

    async fn history_records(store: &MemoryStore, id: &HostId) -> Vec<SubscriptionRecord> {
        match store.get(&paths::history(id)).await.unwrap() {
            None => Vec::new(),
            Some(value) => value
                .as_object()
                .unwrap()
                .values()
                .map(|raw| serde_json::from_value(raw.clone()).unwrap())
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_no_audit_entry() {
        let store = MemoryStore::new();
        let ledger = SubscriptionLedger::new(&store);
        let id = HostId::new("h1");
        let now = at(1_700_000_000_000);

        let record = ledger
            .create(&actor(), &id, new_host("acme"), now)
            .await
            .unwrap();

        assert_eq!(record.status, HostStatus::Active);
        assert_eq!(record.role, Role::Host);
        assert_eq!(record.subscription_end, now + Duration::days(30));
        assert!(history_records(&store, &id).await.is_empty());
    }

    #[tokio::test]
    async fn test_extend_moves_end_activates_and_audits() {
        let store = MemoryStore::new();
        let ledger = SubscriptionLedger::new(&store);
        let id = HostId::new("h1");
        let t0 = at(1_700_000_000_000);

        let mut host = new_host("acme");
        host.status = HostStatus::Inactive;
        host.subscription_end = Some(t0);
        ledger.create(&actor(), &id, host, t0).await.unwrap();

        let later = at(1_700_000_500_000);
        let updated = ledger
            .extend(&actor(), &id, 30, Some("renewal".to_owned()), later)
            .await
            .unwrap();

        assert_eq!(
            updated.subscription_end,
            t0 + Duration::milliseconds(30 * DAY_MS)
        );
        assert_eq!(updated.status, HostStatus::Active);

        let records = history_records(&store, &id).await;
        assert_eq!(records.len(), 1);
        let entry = &records[0];
        assert_eq!(entry.action, SubscriptionAction::Extend);
        assert_eq!(entry.duration, Some(30));
        assert_eq!(entry.note.as_deref(), Some("renewal"));
        assert_eq!(entry.timestamp, later);
        assert_eq!(entry.previous_end, t0);
        assert_eq!(entry.new_end, t0 + Duration::milliseconds(30 * DAY_MS));
        assert_eq!(entry.actor, Some(actor()));

        // The stored record agrees with the returned one.
        let stored: HostRecord = store.get_typed(&paths::host(&id)).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_extend_missing_host_leaves_no_audit_entry() {
        let store = MemoryStore::new();
        let ledger = SubscriptionLedger::new(&store);
        let id = HostId::new("h2");

        let err = ledger.extend(&actor(), &id, 30, None, at(1)).await;
        assert!(matches!(err, Err(LedgerError::HostNotFound(_))));
        assert!(history_records(&store, &id).await.is_empty());
    }

    #[tokio::test]
    async fn test_extend_rejects_non_positive_days() {
        let store = MemoryStore::new();
        let ledger = SubscriptionLedger::new(&store);
        let id = HostId::new("h1");
        ledger
            .create(&actor(), &id, new_host("acme"), at(0))
            .await
            .unwrap();

        assert!(matches!(
            ledger.extend(&actor(), &id, 0, None, at(1)).await,
            Err(LedgerError::InvalidDuration(0))
        ));
        assert!(matches!(
            ledger.extend(&actor(), &id, -7, None, at(1)).await,
            Err(LedgerError::InvalidDuration(-7))
        ));
    }

    #[tokio::test]
    async fn test_suspend_keeps_end_and_audits_equal_ends() {
        let store = MemoryStore::new();
        let ledger = SubscriptionLedger::new(&store);
        let id = HostId::new("h1");
        let t0 = at(1_700_000_000_000);

        let mut host = new_host("acme");
        host.subscription_end = Some(t0);
        ledger.create(&actor(), &id, host, t0).await.unwrap();

        let updated = ledger
            .suspend(&actor(), &id, Some("nonpayment".to_owned()), at(2))
            .await
            .unwrap();
        assert_eq!(updated.status, HostStatus::Inactive);
        assert_eq!(updated.subscription_end, t0);

        let records = history_records(&store, &id).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, SubscriptionAction::Suspend);
        assert_eq!(records[0].duration, None);
        assert_eq!(records[0].previous_end, records[0].new_end);
    }

    #[tokio::test]
    async fn test_reactivate_with_and_without_new_end() {
        let store = MemoryStore::new();
        let ledger = SubscriptionLedger::new(&store);
        let id = HostId::new("h1");
        let t0 = at(1_700_000_000_000);

        let mut host = new_host("acme");
        host.status = HostStatus::Inactive;
        host.subscription_end = Some(t0);
        ledger.create(&actor(), &id, host, t0).await.unwrap();

        let updated = ledger
            .reactivate(&actor(), &id, None, None, at(2))
            .await
            .unwrap();
        assert_eq!(updated.status, HostStatus::Active);
        assert_eq!(updated.subscription_end, t0);

        let new_end = t0 + Duration::days(90);
        let updated = ledger
            .reactivate(&actor(), &id, Some(new_end), None, at(3))
            .await
            .unwrap();
        assert_eq!(updated.subscription_end, new_end);

        let records = history_records(&store, &id).await;
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|r| r.action == SubscriptionAction::Reactivate));
    }

    /// Store wrapper that lands a competing extend between the ledger's read
    /// of the host record and its guarded write, reproducing two operators
    /// computing from the same `previousEnd`.
    struct RacingStore {
        inner: MemoryStore,
        host_path: String,
        raced: std::sync::atomic::AtomicBool,
        competing_end: DateTime<Utc>,
    }

    impl DocumentStore for RacingStore {
        async fn get(&self, path: &str) -> Result<Option<serde_json::Value>, StoreError> {
            let value = self.inner.get(path).await?;
            let first = path == self.host_path
                && !self.raced.swap(true, std::sync::atomic::Ordering::SeqCst);
            if first {
                let update = MultiPathUpdate::new()
                    .set(
                        format!("{}/subscriptionEnd", self.host_path),
                        json!(self.competing_end.timestamp_millis()),
                    )
                    .set(
                        "subscriptionHistory/h3/competing".to_owned(),
                        json!({
                            "action": "extend",
                            "duration": 90,
                            "timestamp": 0,
                            "previousEnd": 0,
                            "newEnd": self.competing_end.timestamp_millis(),
                        }),
                    );
                self.inner.update(update).await?;
            }
            Ok(value)
        }

        async fn put(&self, path: &str, value: serde_json::Value) -> Result<(), StoreError> {
            self.inner.put(path, value).await
        }

        async fn delete(&self, path: &str) -> Result<(), StoreError> {
            self.inner.delete(path).await
        }

        async fn update(&self, update: MultiPathUpdate) -> Result<(), StoreError> {
            self.inner.update(update).await
        }

        async fn update_guarded(
            &self,
            guard_path: &str,
            expected: Option<&serde_json::Value>,
            update: MultiPathUpdate,
        ) -> Result<(), StoreError> {
            self.inner.update_guarded(guard_path, expected, update).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_extends_conflict_instead_of_losing_one() {
        let inner = MemoryStore::new();
        let id = HostId::new("h3");
        let t0 = at(1_700_000_000_000);

        {
            let setup = SubscriptionLedger::new(&inner);
            let mut host = new_host("acme");
            host.subscription_end = Some(t0);
            setup.create(&actor(), &id, host, t0).await.unwrap();
        }

        let competing_end = t0 + Duration::milliseconds(90 * DAY_MS);
        let store = RacingStore {
            inner,
            host_path: paths::host(&id),
            raced: std::sync::atomic::AtomicBool::new(false),
            competing_end,
        };

        // Our extend computes from t0; the competing one lands first.
        let ledger = SubscriptionLedger::new(&store);
        let err = ledger.extend(&actor(), &id, 30, None, at(10)).await;
        assert!(matches!(err, Err(LedgerError::OptimisticConflict(_))));

        // Nothing of the losing extend applied: only the competing entry
        // exists and the end reflects only the applied write.
        let records = history_records(&store.inner, &id).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duration, Some(90));
        let stored: HostRecord = store
            .inner
            .get_typed(&paths::host(&id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.subscription_end, competing_end);
    }

    #[tokio::test]
    async fn test_query_derives_days_and_health() {
        let store = MemoryStore::new();
        let ledger = SubscriptionLedger::new(&store);
        let id = HostId::new("h1");
        let now = at(1_700_000_000_000);

        let mut host = new_host("acme");
        host.subscription_end = Some(now + Duration::days(5));
        ledger.create(&actor(), &id, host, now).await.unwrap();

        let overview = ledger.query(&id, now).await.unwrap();
        assert_eq!(overview.days_remaining, 5);
        assert_eq!(overview.health, SubscriptionHealth::AtRisk);
    }

    #[tokio::test]
    async fn test_query_stored_status_and_derived_health_can_disagree() {
        let store = MemoryStore::new();
        let ledger = SubscriptionLedger::new(&store);
        let id = HostId::new("h1");
        let now = at(1_700_000_000_000);

        // Active flag, but the end already passed. The ledger does not
        // auto-suspend; the disagreement is surfaced, not reconciled.
        let mut host = new_host("acme");
        host.subscription_end = Some(now - Duration::days(3));
        ledger.create(&actor(), &id, host, now).await.unwrap();

        let overview = ledger.query(&id, now).await.unwrap();
        assert_eq!(overview.record.status, HostStatus::Active);
        assert_eq!(overview.health, SubscriptionHealth::Expired);
    }

    #[tokio::test]
    async fn test_query_all_sorts_soonest_expiring_first() {
        let store = MemoryStore::new();
        let ledger = SubscriptionLedger::new(&store);
        let now = at(1_700_000_000_000);

        for (name, days) in [("late", 200), ("soon", 2), ("mid", 40)] {
            let mut host = new_host(name);
            host.subscription_end = Some(now + Duration::days(days));
            ledger
                .create(&actor(), &HostId::new(name), host, now)
                .await
                .unwrap();
        }

        let all = ledger.query_all(now).await.unwrap();
        let order: Vec<&str> = all.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(order, vec!["soon", "mid", "late"]);
    }

    #[tokio::test]
    async fn test_query_all_empty_store() {
        let store = MemoryStore::new();
        let ledger = SubscriptionLedger::new(&store);
        assert!(ledger.query_all(at(0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_all_propagates_malformed_record() {
        let store = MemoryStore::new();
        store
            .put("hosts/bad", json!({ "status": "active" }))
            .await
            .unwrap();

        let ledger = SubscriptionLedger::new(&store);
        let err = ledger.query_all(at(0)).await;
        assert!(matches!(
            err,
            Err(LedgerError::Store(StoreError::MalformedRecord { .. }))
        ));
    }

    #[tokio::test]
    async fn test_remove_keeps_audit_history() {
        let store = MemoryStore::new();
        let ledger = SubscriptionLedger::new(&store);
        let id = HostId::new("h1");
        let t0 = at(1_700_000_000_000);

        ledger.create(&actor(), &id, new_host("acme"), t0).await.unwrap();
        ledger.extend(&actor(), &id, 30, None, at(2)).await.unwrap();
        ledger.remove(&actor(), &id).await.unwrap();

        assert!(store.get(&paths::host(&id)).await.unwrap().is_none());
        assert_eq!(history_records(&store, &id).await.len(), 1);

        // Removing again reports HostNotFound.
        let err = ledger.remove(&actor(), &id).await;
        assert!(matches!(err, Err(LedgerError::HostNotFound(_))));
    }
}
