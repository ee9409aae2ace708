//! Audit history joins, filters and retention, end to end.

#![allow(clippy::unwrap_used)]

use chrono::Duration;

use hosthub_control::{
    AuditTrail, HistoryFilter, NewHost, SubscriptionLedger, filter_histories,
};
use hosthub_core::{Email, HostId};

use hosthub_integration_tests::{TestContext, reference_now};

fn new_host(username: &str, domain: &str) -> NewHost {
    NewHost::new(
        username.to_owned(),
        Email::parse(&format!("{username}@{domain}")).unwrap(),
    )
}

#[tokio::test]
async fn test_full_history_joins_host_metadata() {
    let ctx = TestContext::new().await;
    let ledger = SubscriptionLedger::new(&ctx.store);
    let now = reference_now();

    let id = HostId::new("acme");
    ledger
        .create(&ctx.owner(), &id, new_host("acme", "acme.example"), now)
        .await
        .unwrap();
    ledger
        .extend(&ctx.owner(), &id, 30, None, now)
        .await
        .unwrap();

    // A host with no transitions never shows up.
    ledger
        .create(
            &ctx.owner(),
            &HostId::new("quiet"),
            new_host("quiet", "quiet.example"),
            now,
        )
        .await
        .unwrap();

    let trail = AuditTrail::new(&ctx.store);
    let histories = trail.full_history().await.unwrap();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0].host_id, id);
    assert_eq!(histories[0].host_name, "acme");
    assert_eq!(histories[0].email, "acme@acme.example");
    assert_eq!(histories[0].entries.len(), 1);
}

#[tokio::test]
async fn test_history_outlives_its_host() {
    let ctx = TestContext::new().await;
    let ledger = SubscriptionLedger::new(&ctx.store);
    let now = reference_now();
    let id = HostId::new("doomed");

    ledger
        .create(&ctx.owner(), &id, new_host("doomed", "example.com"), now)
        .await
        .unwrap();
    ledger
        .suspend(&ctx.owner(), &id, Some("non-payment".to_owned()), now)
        .await
        .unwrap();
    ledger.remove(&ctx.owner(), &id).await.unwrap();

    let trail = AuditTrail::new(&ctx.store);
    let histories = trail.full_history().await.unwrap();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0].host_id, id);
    assert_eq!(histories[0].host_name, "Unknown Host");
    assert_eq!(histories[0].email, "N/A");
    assert_eq!(histories[0].entries.len(), 1);
}

#[tokio::test]
async fn test_entries_come_back_newest_first() {
    let ctx = TestContext::new().await;
    let ledger = SubscriptionLedger::new(&ctx.store);
    let now = reference_now();
    let id = HostId::new("acme");
    ledger
        .create(&ctx.owner(), &id, new_host("acme", "example.com"), now)
        .await
        .unwrap();

    for (days, offset_hours) in [(30, 1), (60, 2), (90, 3)] {
        ledger
            .extend(&ctx.owner(), &id, days, None, now + Duration::hours(offset_hours))
            .await
            .unwrap();
    }

    let trail = AuditTrail::new(&ctx.store);
    let entries = trail.history(&id).await.unwrap();
    let durations: Vec<Option<i64>> = entries.iter().map(|e| e.record.duration).collect();
    assert_eq!(durations, [Some(90), Some(60), Some(30)]);
}

#[tokio::test]
async fn test_same_instant_transitions_both_survive() {
    let ctx = TestContext::new().await;
    let ledger = SubscriptionLedger::new(&ctx.store);
    let now = reference_now();
    let id = HostId::new("acme");
    ledger
        .create(&ctx.owner(), &id, new_host("acme", "example.com"), now)
        .await
        .unwrap();

    // Two transitions in the same clock tick get distinct entry keys.
    ledger.extend(&ctx.owner(), &id, 30, None, now).await.unwrap();
    ledger.extend(&ctx.owner(), &id, 60, None, now).await.unwrap();

    let trail = AuditTrail::new(&ctx.store);
    let entries = trail.history(&id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_ne!(entries[0].key, entries[1].key);
}

#[tokio::test]
async fn test_filters_narrow_by_id_text_and_recency() {
    let ctx = TestContext::new().await;
    let ledger = SubscriptionLedger::new(&ctx.store);
    let now = reference_now();

    // Host A last acted 10 days ago, host B 3 days ago.
    let a = HostId::new("host-a");
    let b = HostId::new("host-b");
    ledger
        .create(&ctx.owner(), &a, new_host("Alpha", "alpha.example"), now - Duration::days(40))
        .await
        .unwrap();
    ledger
        .create(&ctx.owner(), &b, new_host("Beta", "beta.example"), now - Duration::days(40))
        .await
        .unwrap();
    ledger
        .extend(&ctx.owner(), &a, 30, None, now - Duration::days(10))
        .await
        .unwrap();
    ledger
        .extend(&ctx.owner(), &b, 30, None, now - Duration::days(3))
        .await
        .unwrap();

    let trail = AuditTrail::new(&ctx.store);
    let histories = trail.full_history().await.unwrap();
    assert_eq!(histories.len(), 2);

    // Recency: a seven-day window keeps only B.
    let recent = filter_histories(
        &histories,
        &HistoryFilter {
            since_days: Some(7),
            ..HistoryFilter::default()
        },
        now,
    );
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].host_id, b);

    // Text match is case-insensitive over name and email.
    let by_name = filter_histories(
        &histories,
        &HistoryFilter {
            text_query: Some("ALPHA".to_owned()),
            ..HistoryFilter::default()
        },
        now,
    );
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].host_id, a);

    let by_email = filter_histories(
        &histories,
        &HistoryFilter {
            text_query: Some("beta.example".to_owned()),
            ..HistoryFilter::default()
        },
        now,
    );
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0].host_id, b);

    // Id filter is exact.
    let by_id = filter_histories(
        &histories,
        &HistoryFilter {
            host_id: Some(a.clone()),
            ..HistoryFilter::default()
        },
        now,
    );
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].host_id, a);

    // Filters compose: text match with a window excluding the host.
    let none = filter_histories(
        &histories,
        &HistoryFilter {
            text_query: Some("alpha".to_owned()),
            since_days: Some(7),
            ..HistoryFilter::default()
        },
        now,
    );
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_history_for_unknown_host_is_empty() {
    let ctx = TestContext::new().await;
    let trail = AuditTrail::new(&ctx.store);
    assert!(trail.history(&HostId::new("nobody")).await.unwrap().is_empty());
    assert!(trail.full_history().await.unwrap().is_empty());
}
