//! Admin record management.

use chrono::Utc;

use hosthub_control::AdminRecord;
use hosthub_control::store::{DocumentStore, paths};
use hosthub_core::{Role, Uid};

use super::{CommandError, connect};

/// Create an admin record for `uid` if one does not already exist.
///
/// Existing records are never overwritten; promoting a new operator and
/// re-running on an existing one are both safe.
pub async fn ensure(uid: &str, username: Option<&str>) -> Result<(), CommandError> {
    let (_, store) = connect()?;
    let uid = Uid::new(uid);
    let path = paths::admin(&uid);

    if let Some(existing) = store.get_typed::<AdminRecord>(&path).await? {
        tracing::info!(%uid, username = %existing.username, "admin record already exists");
        return Ok(());
    }

    let record = AdminRecord {
        username: username.unwrap_or("admin").to_owned(),
        role: Role::Admin,
        last_login: Utc::now(),
        email: None,
    };
    store.put_typed(&path, &record).await?;
    tracing::info!(%uid, username = %record.username, "admin record created");
    Ok(())
}
