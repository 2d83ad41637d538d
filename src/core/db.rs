use crate::core::broker::DbBroker;
use crate::core::error;
use crate::core::schemas;
use crate::core::store::Store;
use rusqlite::Connection;
use std::fs;

pub fn db_connect(db_path: &str) -> Result<Connection, error::MedbotError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::MedbotError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::MedbotError::RusqliteError)?;
    Ok(conn)
}

/// Create the patient and diagnosis tables if they do not exist yet.
pub fn initialize_intake_db(store: &Store, broker: &DbBroker) -> Result<(), error::MedbotError> {
    if let Some(parent) = store.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            error::MedbotError::DatabaseInitializationError(format!(
                "cannot create {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    broker.with_conn(&store.db_path, "intake.init", |conn| {
        conn.execute(schemas::PATIENT_DB_SCHEMA, [])?;
        conn.execute(schemas::DIAGNOSIS_DB_SCHEMA, [])?;
        conn.execute(schemas::DIAGNOSIS_DB_SCHEMA_INDEX, [])?;
        Ok(())
    })?;

    tracing::debug!(db = %store.db_path.display(), "intake database ready");
    Ok(())
}
