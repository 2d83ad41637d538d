//! Stamps for broker audit events: a coarse timestamp and a sortable id.

use std::time::SystemTime;
use ulid::Ulid;

/// Seconds since the unix epoch, suffixed with `Z`. A clock set before 1970
/// yields `0Z`.
pub fn now_epoch_z() -> String {
    let secs = SystemTime::UNIX_EPOCH
        .elapsed()
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    format!("{secs}Z")
}

/// Event ids are ULIDs so the audit log sorts by creation time.
pub fn new_event_id() -> String {
    Ulid::new().to_string()
}
