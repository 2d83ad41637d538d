use medbot::core::broker::DbBroker;
use medbot::core::db;
use medbot::core::store::Store;
use medbot::plugins::diagnosis::{Diagnosis, DiagnosisService};
use medbot::plugins::patient::{Patient, PatientService};
use medbot::plugins::records::{RecordStore, SqliteRecordStore};
use tempfile::tempdir;

fn test_records() -> (tempfile::TempDir, SqliteRecordStore) {
    let tmp = tempdir().unwrap();
    let store = Store::at(tmp.path());
    let broker = DbBroker::new(&store.root, "tester");
    db::initialize_intake_db(&store, &broker).unwrap();
    (tmp, SqliteRecordStore::new(store, broker))
}

fn ada() -> Patient {
    Patient::new("Ada", 34, "F", 65, 130)
}

#[test]
fn test_create_assigns_ids_in_order() {
    let (_tmp, records) = test_records();
    let a = records.create_patient(&ada()).unwrap();
    let b = records
        .create_patient(&Patient::new("Bo", 8, "M", 50, 60))
        .unwrap();
    assert!(a.id.is_some());
    assert!(b.id > a.id);
    assert_eq!(records.list_patients(), vec![a.clone(), b]);
    assert_eq!(records.get_patient(a.id.unwrap()), Some(a));
}

#[test]
fn test_missing_rows_are_sentinels() {
    let (_tmp, records) = test_records();
    assert_eq!(records.get_patient(42), None);
    assert_eq!(records.get_diagnosis(42), None);
    assert!(records.list_diagnoses_by_patient(42).is_empty());
    assert!(!records.delete_patient(42));
    assert!(!records.delete_diagnosis(42));
    assert_eq!(records.update_patient(&ada().with_id(42)), None);
}

#[test]
fn test_diagnosis_round_trip() {
    let (_tmp, records) = test_records();
    let p = records.create_patient(&ada()).unwrap();
    let pid = p.id.unwrap();
    let d = records
        .create_diagnosis(&Diagnosis::new("Some dehydration").for_patient(pid))
        .unwrap();
    assert_eq!(d.patient_id, Some(pid));
    assert_eq!(records.get_diagnosis(d.id.unwrap()), Some(d.clone()));
    assert_eq!(records.list_diagnoses_by_patient(pid), vec![d.clone()]);
    assert_eq!(records.list_all_diagnoses(), vec![d.clone()]);

    let relabeled = Diagnosis {
        diagnosis: "Severe dehydration".to_string(),
        ..d.clone()
    };
    assert_eq!(records.update_diagnosis(&relabeled), Some(relabeled.clone()));
    assert!(records.delete_diagnosis(d.id.unwrap()));
    assert!(records.list_all_diagnoses().is_empty());
}

#[test]
fn test_foreign_key_enforced_by_store() {
    let (_tmp, records) = test_records();
    // Bypasses DiagnosisService on purpose; SQLite must still refuse.
    let orphan = Diagnosis::new("No dehydration").for_patient(999);
    assert_eq!(records.create_diagnosis(&orphan), None);
    assert!(records.list_all_diagnoses().is_empty());
}

#[test]
fn test_storage_failure_becomes_sentinel() {
    let tmp = tempdir().unwrap();
    // Directory where the database file should be: every open fails.
    let db_path = tmp.path().join("not-a-file");
    std::fs::create_dir(&db_path).unwrap();
    let records = SqliteRecordStore::new(
        Store::with_db_path(&db_path),
        DbBroker::unaudited("tester"),
    );
    assert!(records.list_patients().is_empty());
    assert_eq!(records.create_patient(&ada()), None);
    assert!(!records.delete_patient(1));
}

#[test]
fn test_patient_service_validation() {
    let (_tmp, records) = test_records();
    let service = PatientService::new(&records);

    assert_eq!(service.create(&Patient::new("", 1, "F", 1, 1)), None);
    assert!(records.list_patients().is_empty());

    let p = service.create(&ada()).unwrap();
    let renamed = Patient {
        name: "Ada L.".to_string(),
        ..p.clone()
    };
    assert_eq!(service.update(&renamed), Some(renamed.clone()));

    let blanked = Patient {
        name: String::new(),
        ..p.clone()
    };
    assert_eq!(service.update(&blanked), None);
    assert_eq!(service.update(&ada()), None, "unassigned id cannot be updated");
    assert_eq!(records.get_patient(p.id.unwrap()), Some(renamed));

    assert!(!service.delete(999));
    assert!(service.delete(p.id.unwrap()));
}

#[test]
fn test_patient_with_diagnoses_cannot_be_deleted() {
    let (_tmp, records) = test_records();
    let p = records.create_patient(&ada()).unwrap();
    let pid = p.id.unwrap();
    records
        .create_diagnosis(&Diagnosis::new("No dehydration").for_patient(pid))
        .unwrap();
    assert!(!PatientService::new(&records).delete(pid));
    assert_eq!(records.get_patient(pid), Some(p));
}

#[test]
fn test_diagnosis_service_validation() {
    let (_tmp, records) = test_records();
    let service = DiagnosisService::new(&records);
    let pid = records.create_patient(&ada()).unwrap().id.unwrap();

    assert_eq!(service.create(&Diagnosis::new("No dehydration")), None);
    assert_eq!(service.create(&Diagnosis::new("").for_patient(pid)), None);
    assert_eq!(
        service.create(&Diagnosis::new("No dehydration").for_patient(pid + 1)),
        None
    );
    assert!(records.list_all_diagnoses().is_empty());

    let d = service
        .create(&Diagnosis::new("No dehydration").for_patient(pid))
        .unwrap();
    assert_eq!(service.get_by_patient_id(pid), Some(vec![d.clone()]));
    assert_eq!(service.get_by_patient_id(pid + 1), None);

    let blank = Diagnosis {
        diagnosis: String::new(),
        ..d.clone()
    };
    assert_eq!(service.update(&blank), None);
    let unknown = Diagnosis {
        id: Some(999),
        ..d.clone()
    };
    assert_eq!(service.update(&unknown), None);

    assert!(!service.delete(999));
    assert!(service.delete(d.id.unwrap()));
}
