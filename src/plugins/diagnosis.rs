//! Diagnosis records and their validation service.

use crate::core::error;
use crate::plugins::patient::fmt_id;
use crate::plugins::records::RecordStore;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A diagnosis label attached to one patient.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: Option<i64>,
    /// Foreign key to `Patient::id`; unset until the patient is persisted.
    pub patient_id: Option<i64>,
    pub diagnosis: String,
}

impl Diagnosis {
    pub fn new(label: &str) -> Self {
        Self {
            id: None,
            patient_id: None,
            diagnosis: label.to_string(),
        }
    }

    pub fn for_patient(mut self, patient_id: i64) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Diagnosis [diagnosisID = {}, patientID = {}, diagnosis = {}]",
            fmt_id(self.id),
            fmt_id(self.patient_id),
            self.diagnosis
        )
    }
}

/// An empty label is never written, on any path.
pub fn has_label(diagnosis: &Diagnosis) -> bool {
    !diagnosis.diagnosis.is_empty()
}

/// Referential and label checks for diagnosis writes.
pub struct DiagnosisService<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> DiagnosisService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    fn patient_exists(&self, diagnosis: &Diagnosis) -> bool {
        diagnosis
            .patient_id
            .is_some_and(|id| self.store.get_patient(id).is_some())
    }

    pub fn get_all(&self) -> Vec<Diagnosis> {
        self.store.list_all_diagnoses()
    }

    /// `None` when the patient itself does not exist.
    pub fn get_by_patient_id(&self, patient_id: i64) -> Option<Vec<Diagnosis>> {
        self.store.get_patient(patient_id)?;
        Some(self.store.list_diagnoses_by_patient(patient_id))
    }

    pub fn get_by_id(&self, diagnosis_id: i64) -> Option<Diagnosis> {
        self.store.get_diagnosis(diagnosis_id)
    }

    pub fn create(&self, diagnosis: &Diagnosis) -> Option<Diagnosis> {
        if !self.patient_exists(diagnosis) {
            tracing::info!(patient_id = ?diagnosis.patient_id, "diagnosis rejected: unknown patient");
            return None;
        }
        if !has_label(diagnosis) {
            tracing::info!("diagnosis rejected: empty label");
            return None;
        }
        self.store.create_diagnosis(diagnosis)
    }

    pub fn update(&self, diagnosis: &Diagnosis) -> Option<Diagnosis> {
        if !self.patient_exists(diagnosis) || !has_label(diagnosis) {
            return None;
        }
        let id = diagnosis.id?;
        self.store.get_diagnosis(id)?;
        self.store.update_diagnosis(diagnosis)
    }

    pub fn delete(&self, diagnosis_id: i64) -> bool {
        if self.store.get_diagnosis(diagnosis_id).is_none() {
            return false;
        }
        self.store.delete_diagnosis(diagnosis_id)
    }
}

#[derive(Parser, Debug)]
#[clap(name = "diagnosis", about = "Inspect and maintain diagnosis records")]
pub struct DiagnosisCli {
    #[clap(subcommand)]
    pub command: DiagnosisCommand,
}

#[derive(Subcommand, Debug)]
pub enum DiagnosisCommand {
    /// Show one diagnosis.
    Get {
        #[clap(long)]
        id: i64,
    },
    /// List diagnoses, optionally for a single patient.
    List {
        #[clap(long)]
        patient_id: Option<i64>,
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Relabel a diagnosis or move it to another patient.
    Update {
        #[clap(long)]
        id: i64,
        #[clap(long)]
        label: Option<String>,
        #[clap(long)]
        patient_id: Option<i64>,
    },
    Delete {
        #[clap(long)]
        id: i64,
    },
}

pub fn run_diagnosis_cli<S: RecordStore + ?Sized>(
    store: &S,
    cli: DiagnosisCli,
) -> Result<(), error::MedbotError> {
    use colored::Colorize;

    let service = DiagnosisService::new(store);
    match cli.command {
        DiagnosisCommand::Get { id } => {
            let diagnosis = service
                .get_by_id(id)
                .ok_or_else(|| error::MedbotError::NotFound(format!("diagnosis {}", id)))?;
            println!("{}", diagnosis);
        }
        DiagnosisCommand::List { patient_id, format } => {
            let diagnoses = match patient_id {
                Some(pid) => service
                    .get_by_patient_id(pid)
                    .ok_or_else(|| error::MedbotError::NotFound(format!("patient {}", pid)))?,
                None => service.get_all(),
            };
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&diagnoses)?);
            } else if diagnoses.is_empty() {
                println!("No diagnoses recorded.");
            } else {
                for diagnosis in &diagnoses {
                    println!("{}", diagnosis);
                }
            }
        }
        DiagnosisCommand::Update {
            id,
            label,
            patient_id,
        } => {
            let current = service
                .get_by_id(id)
                .ok_or_else(|| error::MedbotError::NotFound(format!("diagnosis {}", id)))?;
            let changed = Diagnosis {
                id: current.id,
                patient_id: patient_id.or(current.patient_id),
                diagnosis: label.unwrap_or(current.diagnosis),
            };
            let updated = service.update(&changed).ok_or_else(|| {
                error::MedbotError::ValidationError(format!("diagnosis {} was not updated", id))
            })?;
            println!("{} {}", "✓".bright_green(), updated);
        }
        DiagnosisCommand::Delete { id } => {
            if !service.delete(id) {
                return Err(error::MedbotError::NotFound(format!("diagnosis {}", id)));
            }
            println!("{} Diagnosis {} deleted", "✓".bright_green(), id);
        }
    }
    Ok(())
}
