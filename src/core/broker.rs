use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The DB Broker is the single entry point for state access.
///
/// Each call opens its own connection, hands it to the closure, and drops it
/// before returning, whatever the closure's outcome. Nothing is cached between
/// calls.
pub struct DbBroker {
    audit_log_path: Option<PathBuf>,
    actor: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

impl DbBroker {
    /// Broker that appends audit events to `<root>/broker.events.jsonl`.
    pub fn new(root: &Path, actor: &str) -> Self {
        Self {
            audit_log_path: Some(root.join(schemas::BROKER_AUDIT_LOG_NAME)),
            actor: actor.to_string(),
        }
    }

    /// Broker that writes no audit trail.
    pub fn unaudited(actor: &str) -> Self {
        Self {
            audit_log_path: None,
            actor: actor.to_string(),
        }
    }

    pub fn audit_log_path(&self) -> Option<&Path> {
        self.audit_log_path.as_deref()
    }

    /// Execute a closure with a fresh connection to the specified DB.
    pub fn with_conn<F, R>(&self, db_path: &Path, op_name: &str, f: F) -> Result<R, error::MedbotError>
    where
        F: FnOnce(&Connection) -> Result<R, error::MedbotError>,
    {
        let db_id = db_path.file_name().unwrap_or_default().to_string_lossy().to_string();

        let result = db::db_connect(&db_path.to_string_lossy()).and_then(|conn| f(&conn));

        let status = if result.is_ok() { "success" } else { "error" };
        tracing::trace!(op = op_name, db = %db_id, status, "broker call");
        if let Err(err) = self.log_event(op_name, &db_id, status) {
            tracing::warn!(op = op_name, db = %db_id, error = %err, "audit log append failed");
        }

        result
    }

    fn log_event(&self, op: &str, db_id: &str, status: &str) -> Result<(), error::MedbotError> {
        use std::fs::OpenOptions;
        use std::io::Write;

        let Some(path) = &self.audit_log_path else {
            return Ok(());
        };

        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            actor: self.actor.clone(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(error::MedbotError::IoError)?;

        writeln!(f, "{}", serde_json::to_string(&ev)?).map_err(error::MedbotError::IoError)?;
        Ok(())
    }
}
