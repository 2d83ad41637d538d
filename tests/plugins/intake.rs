use medbot::core::broker::DbBroker;
use medbot::core::db;
use medbot::core::error::MedbotError;
use medbot::core::store::Store;
use medbot::plugins::assessment::{Assessment, DehydrationLevel};
use medbot::plugins::diagnosis::Diagnosis;
use medbot::plugins::intake::{
    CheckIn, IntakeOutcome, IntakeSave, IntakeWorkflow, PatientHistory, Rejection,
};
use medbot::plugins::patient::Patient;
use medbot::plugins::prompts::{Question, ScriptedAnswers};
use medbot::plugins::records::{RecordStore, SqliteRecordStore};
use std::cell::{Cell, RefCell};
use tempfile::tempdir;

/// In-memory store that counts writes. `fail_diagnosis_writes` simulates a
/// store that accepts patients but refuses diagnoses.
#[derive(Default)]
struct CountingStore {
    patients: RefCell<Vec<Patient>>,
    diagnoses: RefCell<Vec<Diagnosis>>,
    next_id: Cell<i64>,
    patient_creates: Cell<usize>,
    diagnosis_creates: Cell<usize>,
    fail_diagnosis_writes: bool,
}

impl CountingStore {
    fn next(&self) -> i64 {
        self.next_id.set(self.next_id.get() + 1);
        self.next_id.get()
    }
}

impl RecordStore for CountingStore {
    fn get_patient(&self, patient_id: i64) -> Option<Patient> {
        self.patients
            .borrow()
            .iter()
            .find(|p| p.id == Some(patient_id))
            .cloned()
    }

    fn list_patients(&self) -> Vec<Patient> {
        self.patients.borrow().clone()
    }

    fn create_patient(&self, patient: &Patient) -> Option<Patient> {
        self.patient_creates.set(self.patient_creates.get() + 1);
        let created = patient.clone().with_id(self.next());
        self.patients.borrow_mut().push(created.clone());
        Some(created)
    }

    fn update_patient(&self, patient: &Patient) -> Option<Patient> {
        let mut patients = self.patients.borrow_mut();
        let slot = patients.iter_mut().find(|p| p.id == patient.id)?;
        *slot = patient.clone();
        Some(patient.clone())
    }

    fn delete_patient(&self, patient_id: i64) -> bool {
        let mut patients = self.patients.borrow_mut();
        let before = patients.len();
        patients.retain(|p| p.id != Some(patient_id));
        patients.len() != before
    }

    fn get_diagnosis(&self, diagnosis_id: i64) -> Option<Diagnosis> {
        self.diagnoses
            .borrow()
            .iter()
            .find(|d| d.id == Some(diagnosis_id))
            .cloned()
    }

    fn list_diagnoses_by_patient(&self, patient_id: i64) -> Vec<Diagnosis> {
        self.diagnoses
            .borrow()
            .iter()
            .filter(|d| d.patient_id == Some(patient_id))
            .cloned()
            .collect()
    }

    fn list_all_diagnoses(&self) -> Vec<Diagnosis> {
        self.diagnoses.borrow().clone()
    }

    fn create_diagnosis(&self, diagnosis: &Diagnosis) -> Option<Diagnosis> {
        self.diagnosis_creates.set(self.diagnosis_creates.get() + 1);
        if self.fail_diagnosis_writes {
            return None;
        }
        let created = diagnosis.clone().with_id(self.next());
        self.diagnoses.borrow_mut().push(created.clone());
        Some(created)
    }

    fn update_diagnosis(&self, diagnosis: &Diagnosis) -> Option<Diagnosis> {
        let mut diagnoses = self.diagnoses.borrow_mut();
        let slot = diagnoses.iter_mut().find(|d| d.id == diagnosis.id)?;
        *slot = diagnosis.clone();
        Some(diagnosis.clone())
    }

    fn delete_diagnosis(&self, diagnosis_id: i64) -> bool {
        let mut diagnoses = self.diagnoses.borrow_mut();
        let before = diagnoses.len();
        diagnoses.retain(|d| d.id != Some(diagnosis_id));
        diagnoses.len() != before
    }
}

fn sqlite_records() -> (tempfile::TempDir, SqliteRecordStore) {
    let tmp = tempdir().unwrap();
    let store = Store::at(tmp.path());
    let broker = DbBroker::new(&store.root, "tester");
    db::initialize_intake_db(&store, &broker).unwrap();
    (tmp, SqliteRecordStore::new(store, broker))
}

fn new_patient_answers(tail: &[&str]) -> ScriptedAnswers {
    let mut answers = ScriptedAnswers::new(["Ada", "34", "F", "65", "130"]);
    for a in tail {
        answers.push(*a);
    }
    answers
}

#[test]
fn test_create_patient_with_empty_name_never_writes() {
    let store = CountingStore::default();
    let workflow = IntakeWorkflow::new(&store);
    let save = workflow.save_intake(
        &Patient::new("", 30, "M", 70, 160),
        &Diagnosis::new("No dehydration"),
    );
    assert_eq!(save, IntakeSave::Rejected(Rejection::Patient));
    assert_eq!(store.patient_creates.get(), 0);
    assert_eq!(store.diagnosis_creates.get(), 0);
}

#[test]
fn test_empty_label_is_rejected_before_any_write() {
    let store = CountingStore::default();
    let workflow = IntakeWorkflow::new(&store);
    let save = workflow.save_intake(
        &Patient::new("Ada", 34, "F", 65, 130),
        &Diagnosis::new(Assessment::Undetermined.label()),
    );
    assert_eq!(
        save,
        IntakeSave::Rejected(Rejection::Diagnosis {
            orphaned_patient: None
        })
    );
    assert_eq!(store.patient_creates.get(), 0);
    assert!(store.list_patients().is_empty());
}

#[test]
fn test_second_phase_failure_reports_orphan() {
    let store = CountingStore {
        fail_diagnosis_writes: true,
        ..CountingStore::default()
    };
    let workflow = IntakeWorkflow::new(&store);
    let save = workflow.save_intake(
        &Patient::new("Ada", 34, "F", 65, 130),
        &Diagnosis::new("Some dehydration"),
    );
    let stored = store.list_patients();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        save,
        IntakeSave::Rejected(Rejection::Diagnosis {
            orphaned_patient: Some(stored[0].clone())
        })
    );
}

#[test]
fn test_existing_patient_is_not_recreated() {
    let store = CountingStore::default();
    let existing = store
        .create_patient(&Patient::new("Bo", 8, "M", 50, 60))
        .unwrap();
    let workflow = IntakeWorkflow::new(&store);
    let save = workflow.save_intake(&existing, &Diagnosis::new("Severe dehydration"));
    match save {
        IntakeSave::Saved { patient, diagnosis } => {
            assert_eq!(patient, existing);
            assert_eq!(diagnosis.patient_id, existing.id);
        }
        other => panic!("expected save, got {other:?}"),
    }
    assert_eq!(store.patient_creates.get(), 1);
}

#[test]
fn test_check_in_returning_patient() {
    let (_tmp, records) = sqlite_records();
    let stored = records
        .create_patient(&Patient::new("Ada", 34, "F", 65, 130))
        .unwrap();
    let workflow = IntakeWorkflow::new(&records);

    let mut answers = ScriptedAnswers::default();
    let check_in = workflow.check_in(stored.id, &mut answers).unwrap();
    assert_eq!(check_in, CheckIn::Returning(stored));
    assert!(answers.asked().is_empty());
}

#[test]
fn test_unknown_patient_stops_the_intake() {
    let store = CountingStore::default();
    let workflow = IntakeWorkflow::new(&store);
    let mut answers = ScriptedAnswers::new(["1", "1"]);
    let outcome = workflow.run_new_diagnosis(Some(77), &mut answers).unwrap();
    assert_eq!(outcome, IntakeOutcome::PatientNotFound(77));
    assert!(answers.asked().is_empty(), "no assessment after NotFound");
    assert_eq!(store.patient_creates.get(), 0);
    assert_eq!(store.diagnosis_creates.get(), 0);
}

#[test]
fn test_new_patient_intake_saves_both_records() {
    let (_tmp, records) = sqlite_records();
    let workflow = IntakeWorkflow::new(&records);
    let mut answers = new_patient_answers(&["2", "1"]);

    let outcome = workflow.run_new_diagnosis(None, &mut answers).unwrap();
    let IntakeOutcome::Saved {
        patient,
        diagnosis,
        assessment,
    } = outcome
    else {
        panic!("expected saved outcome, got {outcome:?}");
    };
    assert_eq!(assessment, Assessment::Determined(DehydrationLevel::Some));
    assert_eq!(diagnosis.diagnosis, "Some dehydration");
    assert_eq!(diagnosis.patient_id, patient.id);
    assert_eq!(records.get_patient(patient.id.unwrap()), Some(patient.clone()));
    assert_eq!(
        records.list_diagnoses_by_patient(patient.id.unwrap()),
        vec![diagnosis]
    );
}

#[test]
fn test_saved_diagnoses_always_resolve_to_a_patient() {
    let (_tmp, records) = sqlite_records();
    let workflow = IntakeWorkflow::new(&records);
    let tails: [&[&str]; 4] = [&["1", "1"], &["2", "2"], &["3"], &["1", "x"]];
    for tail in tails {
        let mut answers = new_patient_answers(tail);
        workflow.run_new_diagnosis(None, &mut answers).unwrap();
    }
    let diagnoses = records.list_all_diagnoses();
    assert_eq!(diagnoses.len(), 2);
    for d in diagnoses {
        let pid = d.patient_id.expect("foreign key set");
        assert!(records.get_patient(pid).is_some());
        assert!(!d.diagnosis.is_empty());
    }
    // Undetermined intakes leave no patient rows behind.
    assert_eq!(records.list_patients().len(), 2);
}

#[test]
fn test_unwritable_audit_log_does_not_mask_committed_writes() {
    let (tmp, records) = sqlite_records();
    let audit_log = tmp.path().join("broker.events.jsonl");
    std::fs::remove_file(&audit_log).unwrap();
    std::fs::create_dir(&audit_log).unwrap();

    let workflow = IntakeWorkflow::new(&records);
    let patient = Patient::new("Ada", 36, "F", 65, 130);
    let IntakeSave::Saved { patient, diagnosis } =
        workflow.save_intake(&patient, &Diagnosis::new("Some dehydration"))
    else {
        panic!("expected saved intake");
    };
    assert_eq!(records.list_patients(), vec![patient.clone()]);
    assert_eq!(
        records.list_diagnoses_by_patient(patient.id.unwrap()),
        vec![diagnosis]
    );
}

#[test]
fn test_undetermined_assessment_is_save_rejected() {
    let store = CountingStore::default();
    let workflow = IntakeWorkflow::new(&store);
    let mut answers = new_patient_answers(&["5"]);
    let outcome = workflow.run_new_diagnosis(None, &mut answers).unwrap();
    assert_eq!(
        outcome,
        IntakeOutcome::SaveRejected {
            rejection: Rejection::Diagnosis {
                orphaned_patient: None
            },
            assessment: Assessment::Undetermined,
        }
    );
}

#[test]
fn test_non_numeric_demographics_are_recoverable() {
    let store = CountingStore::default();
    let workflow = IntakeWorkflow::new(&store);
    let mut answers = ScriptedAnswers::new(["Ada", "thirty"]);
    let err = workflow.run_new_diagnosis(None, &mut answers).unwrap_err();
    assert!(matches!(err, MedbotError::InputParse { field: "age", .. }));
    assert_eq!(answers.asked(), &[Question::Name, Question::Age]);
    assert_eq!(store.patient_creates.get(), 0);
}

#[test]
fn test_list_all_pairs_patients_with_diagnoses() {
    let (_tmp, records) = sqlite_records();
    let p = records
        .create_patient(&Patient::new("P", 40, "M", 70, 180))
        .unwrap();
    let q = records
        .create_patient(&Patient::new("Q", 3, "F", 36, 30))
        .unwrap();
    let qid = q.id.unwrap();
    let d1 = records
        .create_diagnosis(&Diagnosis::new("Some dehydration").for_patient(qid))
        .unwrap();
    let d2 = records
        .create_diagnosis(&Diagnosis::new("No dehydration").for_patient(qid))
        .unwrap();

    let workflow = IntakeWorkflow::new(&records);
    let listing = workflow.list_all();
    assert_eq!(
        listing,
        vec![
            PatientHistory {
                patient: p,
                diagnoses: vec![],
            },
            PatientHistory {
                patient: q,
                diagnoses: vec![d1, d2],
            },
        ]
    );
    assert_eq!(workflow.list_all(), listing, "listing is stable without writes");
}
