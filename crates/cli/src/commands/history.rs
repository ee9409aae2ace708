//! Audit history browsing.

use chrono::Utc;

use hosthub_control::{AuditTrail, HistoryFilter, filter_histories};
use hosthub_core::HostId;

use super::{CommandError, connect};

pub async fn show(
    host: Option<&str>,
    query: Option<&str>,
    since_days: Option<i64>,
) -> Result<(), CommandError> {
    let (_, store) = connect()?;
    let trail = AuditTrail::new(&store);
    let histories = trail.full_history().await?;

    let filter = HistoryFilter {
        host_id: host.map(HostId::new),
        text_query: query.map(str::to_owned),
        since_days,
    };
    let histories = filter_histories(&histories, &filter, Utc::now());

    if histories.is_empty() {
        tracing::info!("no matching history");
        return Ok(());
    }
    for history in histories {
        tracing::info!(
            host = %history.host_id,
            name = %history.host_name,
            email = %history.email,
            entries = history.entries.len(),
            "host history"
        );
        for entry in &history.entries {
            tracing::info!(
                key = %entry.key,
                action = %entry.record.action,
                timestamp = %entry.record.timestamp,
                duration = ?entry.record.duration,
                previous_end = %entry.record.previous_end,
                new_end = %entry.record.new_end,
                note = ?entry.record.note,
                actor = ?entry.record.actor,
                "entry"
            );
        }
    }
    Ok(())
}
