//! Store handle for the intake record database.
//!
//! A `Store` only names where records live. It never owns a connection:
//! every read or write goes through `DbBroker::with_conn`, which opens and
//! releases its own connection per call.

use crate::core::schemas;
use std::path::{Path, PathBuf};

/// Store handle representing one intake workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    /// Directory holding the database and the broker audit log
    pub root: PathBuf,
    /// Absolute or root-relative path to the SQLite file
    pub db_path: PathBuf,
}

impl Store {
    /// Store rooted at `root` with the default database file name.
    pub fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            db_path: root.join(schemas::INTAKE_DB_NAME),
        }
    }

    /// Store whose database lives at an explicit path. The audit log sits next to it.
    pub fn with_db_path(db_path: &Path) -> Self {
        let root = db_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            root,
            db_path: db_path.to_path_buf(),
        }
    }
}
