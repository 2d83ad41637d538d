//! Intake workflow: identify the patient, run the assessment, save both records.
//!
//! The save is two-phase. A new patient is created first, then the diagnosis
//! that references it. Each phase is its own store call, so a failure in the
//! second phase can leave a patient with no diagnosis; that case is reported
//! as `Rejection::Diagnosis { orphaned_patient: Some(..) }` rather than hidden.

use crate::core::error::MedbotError;
use crate::plugins::assessment::{self, Assessment, InvalidAnswerPolicy};
use crate::plugins::diagnosis::{Diagnosis, DiagnosisService, has_label};
use crate::plugins::patient::{Patient, PatientService};
use crate::plugins::prompts::{AnswerProvider, Question, ask_integer};
use crate::plugins::records::RecordStore;
use serde::Serialize;

/// Outcome of resolving which patient an intake concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckIn {
    /// Freshly collected demographics, not yet stored.
    New(Patient),
    /// Returning patient, as stored.
    Returning(Patient),
    NotFound(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rejection {
    /// Patient creation refused; nothing was written.
    Patient,
    /// Diagnosis creation refused. `orphaned_patient` is set when a new
    /// patient had already been stored in the first phase.
    Diagnosis { orphaned_patient: Option<Patient> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeSave {
    Saved { patient: Patient, diagnosis: Diagnosis },
    Rejected(Rejection),
}

/// Terminal outcome of one intake session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    PatientNotFound(i64),
    Saved {
        patient: Patient,
        diagnosis: Diagnosis,
        assessment: Assessment,
    },
    SaveRejected {
        rejection: Rejection,
        assessment: Assessment,
    },
}

/// One row of the patient listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientHistory {
    pub patient: Patient,
    pub diagnoses: Vec<Diagnosis>,
}

pub struct IntakeWorkflow<'a, S: RecordStore + ?Sized> {
    patients: PatientService<'a, S>,
    diagnoses: DiagnosisService<'a, S>,
    policy: InvalidAnswerPolicy,
}

impl<'a, S: RecordStore + ?Sized> IntakeWorkflow<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            patients: PatientService::new(store),
            diagnoses: DiagnosisService::new(store),
            policy: InvalidAnswerPolicy::Degrade,
        }
    }

    pub fn with_policy(mut self, policy: InvalidAnswerPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Collect demographics for a new patient. Fails on the first non-numeric
    /// age, height or weight; later questions are not asked.
    pub fn collect_patient<P: AnswerProvider + ?Sized>(
        &self,
        answers: &mut P,
    ) -> Result<Patient, MedbotError> {
        let name = answers.answer(Question::Name)?;
        let age = ask_integer(answers, Question::Age)?;
        let gender = answers.answer(Question::Gender)?;
        let height = ask_integer(answers, Question::Height)?;
        let weight = ask_integer(answers, Question::Weight)?;
        Ok(Patient::new(&name, age, &gender, height, weight))
    }

    pub fn check_in<P: AnswerProvider + ?Sized>(
        &self,
        patient_id: Option<i64>,
        answers: &mut P,
    ) -> Result<CheckIn, MedbotError> {
        match patient_id {
            None => Ok(CheckIn::New(self.collect_patient(answers)?)),
            Some(id) => Ok(match self.patients.get_by_id(id) {
                Some(patient) => CheckIn::Returning(patient),
                None => {
                    tracing::info!(patient_id = id, "returning patient not found");
                    CheckIn::NotFound(id)
                }
            }),
        }
    }

    pub fn save_intake(&self, patient: &Patient, diagnosis: &Diagnosis) -> IntakeSave {
        // Checked up front so an unusable label never leaves a patient behind.
        if !has_label(diagnosis) {
            tracing::info!("intake rejected: empty diagnosis label");
            return IntakeSave::Rejected(Rejection::Diagnosis {
                orphaned_patient: None,
            });
        }

        let (stored, created_now) = match patient.id {
            Some(_) => (patient.clone(), false),
            None => match self.patients.create(patient) {
                Some(created) => (created, true),
                None => return IntakeSave::Rejected(Rejection::Patient),
            },
        };
        let Some(patient_id) = stored.id else {
            return IntakeSave::Rejected(Rejection::Patient);
        };

        let attached = Diagnosis {
            patient_id: Some(patient_id),
            ..diagnosis.clone()
        };
        match self.diagnoses.create(&attached) {
            Some(saved) => IntakeSave::Saved {
                patient: stored,
                diagnosis: saved,
            },
            None => {
                if created_now {
                    tracing::warn!(patient_id, "patient stored without a diagnosis");
                }
                IntakeSave::Rejected(Rejection::Diagnosis {
                    orphaned_patient: created_now.then_some(stored),
                })
            }
        }
    }

    /// Check in, assess, save. No step is retried.
    pub fn run_new_diagnosis<P: AnswerProvider + ?Sized>(
        &self,
        patient_id: Option<i64>,
        answers: &mut P,
    ) -> Result<IntakeOutcome, MedbotError> {
        let patient = match self.check_in(patient_id, answers)? {
            CheckIn::New(p) | CheckIn::Returning(p) => p,
            CheckIn::NotFound(id) => return Ok(IntakeOutcome::PatientNotFound(id)),
        };

        let assessment = assessment::assess_with_policy(answers, self.policy)?;
        let diagnosis = Diagnosis::new(assessment.label());

        Ok(match self.save_intake(&patient, &diagnosis) {
            IntakeSave::Saved { patient, diagnosis } => {
                tracing::info!(patient = %patient, label = %diagnosis.diagnosis, "intake saved");
                IntakeOutcome::Saved {
                    patient,
                    diagnosis,
                    assessment,
                }
            }
            IntakeSave::Rejected(rejection) => IntakeOutcome::SaveRejected {
                rejection,
                assessment,
            },
        })
    }

    /// Every patient in store order, each with its diagnoses.
    pub fn list_all(&self) -> Vec<PatientHistory> {
        self.patients
            .get_all()
            .into_iter()
            .map(|patient| {
                let diagnoses = patient
                    .id
                    .and_then(|id| self.diagnoses.get_by_patient_id(id))
                    .unwrap_or_default();
                PatientHistory { patient, diagnoses }
            })
            .collect()
    }
}
