//! Patient records and the validation layer in front of the record store.

use crate::core::error;
use crate::plugins::records::RecordStore;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Patient demographics. `id` stays `None` until the store assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Patient {
    pub id: Option<i64>,
    pub name: String,
    pub age: i64,
    pub gender: String,
    /// Inches
    pub height: i64,
    /// Pounds
    pub weight: i64,
}

impl Patient {
    pub fn new(name: &str, age: i64, gender: &str, height: i64, weight: i64) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            age,
            gender: gender.to_string(),
            height,
            weight,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

pub(crate) fn fmt_id(id: Option<i64>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "None".to_string(),
    }
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [patientID = {}, age = {}, gender = {}, height = {}, weight = {}]",
            self.name,
            fmt_id(self.id),
            self.age,
            self.gender,
            self.height,
            self.weight
        )
    }
}

pub fn has_name(patient: &Patient) -> bool {
    !patient.name.is_empty()
}

/// Field-level and existence checks for patient writes.
///
/// Rejections come back as `None`/`false`, never as errors, and a rejected
/// write never reaches the store.
pub struct PatientService<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> PatientService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn get_all(&self) -> Vec<Patient> {
        self.store.list_patients()
    }

    pub fn get_by_id(&self, patient_id: i64) -> Option<Patient> {
        self.store.get_patient(patient_id)
    }

    pub fn create(&self, patient: &Patient) -> Option<Patient> {
        if !has_name(patient) {
            tracing::info!("patient rejected: empty name");
            return None;
        }
        self.store.create_patient(patient)
    }

    pub fn update(&self, patient: &Patient) -> Option<Patient> {
        let id = patient.id?;
        if self.store.get_patient(id).is_none() {
            tracing::info!(patient_id = id, "patient update rejected: unknown id");
            return None;
        }
        if !has_name(patient) {
            tracing::info!(patient_id = id, "patient update rejected: empty name");
            return None;
        }
        self.store.update_patient(patient)
    }

    pub fn delete(&self, patient_id: i64) -> bool {
        if self.store.get_patient(patient_id).is_none() {
            return false;
        }
        self.store.delete_patient(patient_id)
    }
}

#[derive(Parser, Debug)]
#[clap(name = "patient", about = "Inspect and maintain patient records")]
pub struct PatientCli {
    #[clap(subcommand)]
    pub command: PatientCommand,
}

#[derive(Subcommand, Debug)]
pub enum PatientCommand {
    /// Show one patient.
    Get {
        #[clap(long)]
        id: i64,
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Change stored demographics. Omitted fields keep their value.
    Update {
        #[clap(long)]
        id: i64,
        #[clap(long)]
        name: Option<String>,
        #[clap(long)]
        age: Option<i64>,
        #[clap(long)]
        gender: Option<String>,
        #[clap(long)]
        height: Option<i64>,
        #[clap(long)]
        weight: Option<i64>,
    },
    /// Remove a patient that has no diagnoses.
    Delete {
        #[clap(long)]
        id: i64,
    },
}

pub fn run_patient_cli<S: RecordStore + ?Sized>(
    store: &S,
    cli: PatientCli,
) -> Result<(), error::MedbotError> {
    use colored::Colorize;

    let service = PatientService::new(store);
    match cli.command {
        PatientCommand::Get { id, format } => {
            let patient = service
                .get_by_id(id)
                .ok_or_else(|| error::MedbotError::NotFound(format!("patient {}", id)))?;
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&patient)?);
            } else {
                println!("{}", patient);
            }
        }
        PatientCommand::Update {
            id,
            name,
            age,
            gender,
            height,
            weight,
        } => {
            let current = service
                .get_by_id(id)
                .ok_or_else(|| error::MedbotError::NotFound(format!("patient {}", id)))?;
            let changed = Patient {
                id: current.id,
                name: name.unwrap_or(current.name),
                age: age.unwrap_or(current.age),
                gender: gender.unwrap_or(current.gender),
                height: height.unwrap_or(current.height),
                weight: weight.unwrap_or(current.weight),
            };
            match service.update(&changed) {
                Some(updated) => println!("{} {}", "✓".bright_green(), updated),
                None => {
                    return Err(error::MedbotError::ValidationError(format!(
                        "patient {} was not updated",
                        id
                    )));
                }
            }
        }
        PatientCommand::Delete { id } => {
            if service.delete(id) {
                println!("{} Patient {} deleted", "✓".bright_green(), id);
            } else {
                return Err(error::MedbotError::ValidationError(format!(
                    "patient {} was not deleted (unknown id or diagnoses still attached)",
                    id
                )));
            }
        }
    }
    Ok(())
}
