//! Host account and subscription management.

use chrono::{Duration, Utc};

use hosthub_control::{ControlConfig, NewHost, SubscriptionLedger};
use hosthub_core::{Email, HostId, Uid};

use super::{CommandError, connect};

/// Resolve the acting admin UID: the explicit flag, or the first bootstrap
/// UID as the operational default.
fn resolve_actor(config: &ControlConfig, actor: Option<&str>) -> Result<Uid, CommandError> {
    match actor {
        Some(uid) => Ok(Uid::new(uid)),
        None => config
            .bootstrap
            .uids()
            .first()
            .cloned()
            .ok_or_else(|| CommandError::InvalidInput("no bootstrap UID to act as".to_owned())),
    }
}

pub async fn create(
    uid: &str,
    username: &str,
    email: &str,
    days: Option<i64>,
) -> Result<(), CommandError> {
    let (config, store) = connect()?;
    let email =
        Email::parse(email).map_err(|err| CommandError::InvalidInput(err.to_string()))?;
    if let Some(days) = days
        && days < 1
    {
        return Err(CommandError::InvalidInput(format!(
            "initial period must be at least one day, got {days}"
        )));
    }

    let actor = resolve_actor(&config, None)?;
    let now = Utc::now();
    let mut new_host = NewHost::new(username.to_owned(), email);
    new_host.subscription_end = days.map(|days| now + Duration::days(days));

    let ledger = SubscriptionLedger::new(&store);
    let id = HostId::new(uid);
    let record = ledger.create(&actor, &id, new_host, now).await?;
    tracing::info!(
        host = %id,
        username = %record.username,
        subscription_end = %record.subscription_end,
        "host created"
    );
    Ok(())
}

pub async fn list() -> Result<(), CommandError> {
    let (_, store) = connect()?;
    let ledger = SubscriptionLedger::new(&store);
    let overviews = ledger.query_all(Utc::now()).await?;

    if overviews.is_empty() {
        tracing::info!("no hosts");
        return Ok(());
    }
    for overview in overviews {
        tracing::info!(
            host = %overview.id,
            username = %overview.record.username,
            email = %overview.record.email,
            status = %overview.record.status,
            days_remaining = overview.days_remaining,
            health = %overview.health,
            "host"
        );
    }
    Ok(())
}

pub async fn extend(
    id: &str,
    days: i64,
    note: Option<String>,
    actor: Option<&str>,
) -> Result<(), CommandError> {
    let (config, store) = connect()?;
    let actor = resolve_actor(&config, actor)?;
    let ledger = SubscriptionLedger::new(&store);
    let id = HostId::new(id);
    let record = ledger.extend(&actor, &id, days, note, Utc::now()).await?;
    tracing::info!(
        host = %id,
        days,
        new_end = %record.subscription_end,
        "subscription extended"
    );
    Ok(())
}

pub async fn suspend(
    id: &str,
    note: Option<String>,
    actor: Option<&str>,
) -> Result<(), CommandError> {
    let (config, store) = connect()?;
    let actor = resolve_actor(&config, actor)?;
    let ledger = SubscriptionLedger::new(&store);
    let id = HostId::new(id);
    ledger.suspend(&actor, &id, note, Utc::now()).await?;
    tracing::info!(host = %id, "host suspended");
    Ok(())
}

pub async fn reactivate(
    id: &str,
    note: Option<String>,
    actor: Option<&str>,
) -> Result<(), CommandError> {
    let (config, store) = connect()?;
    let actor = resolve_actor(&config, actor)?;
    let ledger = SubscriptionLedger::new(&store);
    let id = HostId::new(id);
    let record = ledger
        .reactivate(&actor, &id, None, note, Utc::now())
        .await?;
    tracing::info!(
        host = %id,
        subscription_end = %record.subscription_end,
        "host reactivated"
    );
    Ok(())
}

pub async fn remove(id: &str, actor: Option<&str>) -> Result<(), CommandError> {
    let (config, store) = connect()?;
    let actor = resolve_actor(&config, actor)?;
    let ledger = SubscriptionLedger::new(&store);
    let id = HostId::new(id);
    ledger.remove(&actor, &id).await?;
    tracing::info!(host = %id, "host removed; audit history retained");
    Ok(())
}
