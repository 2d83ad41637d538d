//! Database schema definitions for the intake store.
//!
//! Two tables: `patient` and `diagnosis`. A diagnosis row always references
//! a patient row; the foreign key is enforced by SQLite (`PRAGMA foreign_keys=ON`
//! in `db::db_connect`) as well as by `DiagnosisService`.

pub const INTAKE_DB_NAME: &str = "medbot.db";
pub const BROKER_AUDIT_LOG_NAME: &str = "broker.events.jsonl";

pub const PATIENT_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS patient (
        patient_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        age INTEGER NOT NULL,
        gender TEXT NOT NULL,
        height INTEGER NOT NULL,
        weight INTEGER NOT NULL
    )
";

pub const DIAGNOSIS_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS diagnosis (
        diagnosis_id INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id INTEGER NOT NULL,
        diagnosis TEXT NOT NULL,
        FOREIGN KEY(patient_id) REFERENCES patient(patient_id)
    )
";
pub const DIAGNOSIS_DB_SCHEMA_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_diagnosis_patient ON diagnosis(patient_id)";
