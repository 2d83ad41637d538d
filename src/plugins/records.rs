//! Record store: durable storage for patients and diagnoses.
//!
//! `RecordStore` is the boundary the intake workflow consumes. Its methods
//! return sentinels (`None`, empty `Vec`, `false`) rather than errors; storage
//! failures are logged here and never travel further up.

use crate::core::broker::DbBroker;
use crate::core::error::MedbotError;
use crate::core::store::Store;
use crate::plugins::diagnosis::Diagnosis;
use crate::plugins::patient::Patient;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub trait RecordStore {
    fn get_patient(&self, patient_id: i64) -> Option<Patient>;
    fn list_patients(&self) -> Vec<Patient>;
    /// Inserts and returns the patient with its assigned id.
    fn create_patient(&self, patient: &Patient) -> Option<Patient>;
    fn update_patient(&self, patient: &Patient) -> Option<Patient>;
    fn delete_patient(&self, patient_id: i64) -> bool;

    fn get_diagnosis(&self, diagnosis_id: i64) -> Option<Diagnosis>;
    fn list_diagnoses_by_patient(&self, patient_id: i64) -> Vec<Diagnosis>;
    fn list_all_diagnoses(&self) -> Vec<Diagnosis>;
    fn create_diagnosis(&self, diagnosis: &Diagnosis) -> Option<Diagnosis>;
    fn update_diagnosis(&self, diagnosis: &Diagnosis) -> Option<Diagnosis>;
    fn delete_diagnosis(&self, diagnosis_id: i64) -> bool;
}

/// SQLite-backed record store. Each operation is one broker call on its own connection.
pub struct SqliteRecordStore {
    store: Store,
    broker: DbBroker,
}

const PATIENT_COLUMNS: &str = "patient_id, name, age, gender, height, weight";
const DIAGNOSIS_COLUMNS: &str = "diagnosis_id, patient_id, diagnosis";

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        height: row.get(4)?,
        weight: row.get(5)?,
    })
}

fn diagnosis_from_row(row: &Row<'_>) -> rusqlite::Result<Diagnosis> {
    Ok(Diagnosis {
        id: Some(row.get(0)?),
        patient_id: Some(row.get(1)?),
        diagnosis: row.get(2)?,
    })
}

/// Ambiguous lookups (more than one row) resolve to `None`.
fn single<T>(rows: Vec<T>) -> Option<T> {
    if rows.len() > 1 {
        return None;
    }
    rows.into_iter().next()
}

fn query_patients(conn: &Connection, sql: &str, id: Option<i64>) -> Result<Vec<Patient>, MedbotError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = match id {
        Some(id) => stmt.query_map(params![id], patient_from_row)?,
        None => stmt.query_map([], patient_from_row)?,
    };
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(MedbotError::RusqliteError)
}

fn query_diagnoses(conn: &Connection, sql: &str, id: Option<i64>) -> Result<Vec<Diagnosis>, MedbotError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = match id {
        Some(id) => stmt.query_map(params![id], diagnosis_from_row)?,
        None => stmt.query_map([], diagnosis_from_row)?,
    };
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(MedbotError::RusqliteError)
}

impl SqliteRecordStore {
    pub fn new(store: Store, broker: DbBroker) -> Self {
        Self { store, broker }
    }

    fn with_conn<F, R>(&self, op: &str, f: F) -> Result<R, MedbotError>
    where
        F: FnOnce(&Connection) -> Result<R, MedbotError>,
    {
        self.broker.with_conn(&self.store.db_path, op, f)
    }

    /// Convert a storage failure into the boundary sentinel, logging it once.
    fn settle<R: Default>(op: &str, result: Result<R, MedbotError>) -> R {
        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(op, error = %e, "record store operation failed");
                R::default()
            }
        }
    }

    pub fn try_get_patient(&self, patient_id: i64) -> Result<Option<Patient>, MedbotError> {
        self.with_conn("patient.get", |conn| {
            let sql = format!("SELECT {PATIENT_COLUMNS} FROM patient WHERE patient_id = ?1");
            Ok(single(query_patients(conn, &sql, Some(patient_id))?))
        })
    }

    pub fn try_list_patients(&self) -> Result<Vec<Patient>, MedbotError> {
        self.with_conn("patient.list", |conn| {
            let sql = format!("SELECT {PATIENT_COLUMNS} FROM patient ORDER BY patient_id");
            query_patients(conn, &sql, None)
        })
    }

    pub fn try_create_patient(&self, patient: &Patient) -> Result<Patient, MedbotError> {
        self.with_conn("patient.create", |conn| {
            conn.execute(
                "INSERT INTO patient(name, age, gender, height, weight) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![patient.name, patient.age, patient.gender, patient.height, patient.weight],
            )?;
            let created = patient.clone().with_id(conn.last_insert_rowid());
            tracing::debug!(patient = %created, "patient created");
            Ok(created)
        })
    }

    pub fn try_update_patient(&self, patient: &Patient) -> Result<Option<Patient>, MedbotError> {
        let Some(id) = patient.id else {
            return Ok(None);
        };
        self.with_conn("patient.update", |conn| {
            let sql = format!(
                "UPDATE patient SET name = ?1, age = ?2, gender = ?3, height = ?4, weight = ?5 \
                 WHERE patient_id = ?6 RETURNING {PATIENT_COLUMNS}"
            );
            conn.query_row(
                &sql,
                params![patient.name, patient.age, patient.gender, patient.height, patient.weight, id],
                patient_from_row,
            )
            .optional()
            .map_err(MedbotError::RusqliteError)
        })
    }

    pub fn try_delete_patient(&self, patient_id: i64) -> Result<bool, MedbotError> {
        self.with_conn("patient.delete", |conn| {
            let changed = conn.execute("DELETE FROM patient WHERE patient_id = ?1", params![patient_id])?;
            Ok(changed > 0)
        })
    }

    pub fn try_get_diagnosis(&self, diagnosis_id: i64) -> Result<Option<Diagnosis>, MedbotError> {
        self.with_conn("diagnosis.get", |conn| {
            let sql = format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnosis WHERE diagnosis_id = ?1");
            Ok(single(query_diagnoses(conn, &sql, Some(diagnosis_id))?))
        })
    }

    pub fn try_list_diagnoses_by_patient(&self, patient_id: i64) -> Result<Vec<Diagnosis>, MedbotError> {
        self.with_conn("diagnosis.list_by_patient", |conn| {
            let sql = format!(
                "SELECT {DIAGNOSIS_COLUMNS} FROM diagnosis WHERE patient_id = ?1 ORDER BY diagnosis_id"
            );
            query_diagnoses(conn, &sql, Some(patient_id))
        })
    }

    pub fn try_list_all_diagnoses(&self) -> Result<Vec<Diagnosis>, MedbotError> {
        self.with_conn("diagnosis.list", |conn| {
            let sql = format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnosis ORDER BY diagnosis_id");
            query_diagnoses(conn, &sql, None)
        })
    }

    pub fn try_create_diagnosis(&self, diagnosis: &Diagnosis) -> Result<Diagnosis, MedbotError> {
        let patient_id = diagnosis.patient_id.ok_or_else(|| {
            MedbotError::ValidationError("diagnosis has no patient id".to_string())
        })?;
        self.with_conn("diagnosis.create", |conn| {
            conn.execute(
                "INSERT INTO diagnosis(patient_id, diagnosis) VALUES (?1, ?2)",
                params![patient_id, diagnosis.diagnosis],
            )?;
            Ok(diagnosis.clone().with_id(conn.last_insert_rowid()))
        })
    }

    pub fn try_update_diagnosis(&self, diagnosis: &Diagnosis) -> Result<Option<Diagnosis>, MedbotError> {
        let (Some(id), Some(patient_id)) = (diagnosis.id, diagnosis.patient_id) else {
            return Ok(None);
        };
        self.with_conn("diagnosis.update", |conn| {
            let sql = format!(
                "UPDATE diagnosis SET patient_id = ?1, diagnosis = ?2 WHERE diagnosis_id = ?3 \
                 RETURNING {DIAGNOSIS_COLUMNS}"
            );
            conn.query_row(&sql, params![patient_id, diagnosis.diagnosis, id], diagnosis_from_row)
                .optional()
                .map_err(MedbotError::RusqliteError)
        })
    }

    pub fn try_delete_diagnosis(&self, diagnosis_id: i64) -> Result<bool, MedbotError> {
        self.with_conn("diagnosis.delete", |conn| {
            let changed = conn.execute(
                "DELETE FROM diagnosis WHERE diagnosis_id = ?1",
                params![diagnosis_id],
            )?;
            Ok(changed > 0)
        })
    }
}

impl RecordStore for SqliteRecordStore {
    fn get_patient(&self, patient_id: i64) -> Option<Patient> {
        Self::settle("patient.get", self.try_get_patient(patient_id))
    }

    fn list_patients(&self) -> Vec<Patient> {
        Self::settle("patient.list", self.try_list_patients())
    }

    fn create_patient(&self, patient: &Patient) -> Option<Patient> {
        Self::settle("patient.create", self.try_create_patient(patient).map(Some))
    }

    fn update_patient(&self, patient: &Patient) -> Option<Patient> {
        Self::settle("patient.update", self.try_update_patient(patient))
    }

    fn delete_patient(&self, patient_id: i64) -> bool {
        Self::settle("patient.delete", self.try_delete_patient(patient_id))
    }

    fn get_diagnosis(&self, diagnosis_id: i64) -> Option<Diagnosis> {
        Self::settle("diagnosis.get", self.try_get_diagnosis(diagnosis_id))
    }

    fn list_diagnoses_by_patient(&self, patient_id: i64) -> Vec<Diagnosis> {
        Self::settle(
            "diagnosis.list_by_patient",
            self.try_list_diagnoses_by_patient(patient_id),
        )
    }

    fn list_all_diagnoses(&self) -> Vec<Diagnosis> {
        Self::settle("diagnosis.list", self.try_list_all_diagnoses())
    }

    fn create_diagnosis(&self, diagnosis: &Diagnosis) -> Option<Diagnosis> {
        Self::settle("diagnosis.create", self.try_create_diagnosis(diagnosis).map(Some))
    }

    fn update_diagnosis(&self, diagnosis: &Diagnosis) -> Option<Diagnosis> {
        Self::settle("diagnosis.update", self.try_update_diagnosis(diagnosis))
    }

    fn delete_diagnosis(&self, diagnosis_id: i64) -> bool {
        Self::settle("diagnosis.delete", self.try_delete_diagnosis(diagnosis_id))
    }
}
