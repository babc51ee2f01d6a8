mod common;

use common::{indexed_db, new_patient};
use medrec_core::{
    dispatch, Command, CommandOutput, DeleteOutcome, ErrorKind, GroupCount, Mutation,
    PatientRecord, PatientService, PatientStore, Pipeline, SearchFilter, SqlitePatientStore,
    StatRow, StoreResult, UpdateOutcome,
};
use std::cell::RefCell;
use std::collections::HashMap;

/// Store double that records every call and matches nothing.
#[derive(Default)]
struct RecordingStore {
    calls: RefCell<Vec<&'static str>>,
}

impl RecordingStore {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }
}

impl PatientStore for RecordingStore {
    fn create_indexes(&self) -> StoreResult<()> {
        self.record("create_indexes");
        Ok(())
    }

    fn insert_one(&self, _record: &PatientRecord) -> StoreResult<()> {
        self.record("insert_one");
        Ok(())
    }

    fn find(&self, _filter: &SearchFilter) -> StoreResult<Vec<PatientRecord>> {
        self.record("find");
        Ok(Vec::new())
    }

    fn update_one(&self, _filter: &SearchFilter, _mutation: &Mutation) -> StoreResult<UpdateOutcome> {
        self.record("update_one");
        Ok(UpdateOutcome::default())
    }

    fn delete_one(&self, _filter: &SearchFilter) -> StoreResult<DeleteOutcome> {
        self.record("delete_one");
        Ok(DeleteOutcome::default())
    }

    fn aggregate(&self, _pipeline: &Pipeline) -> StoreResult<Vec<GroupCount>> {
        self.record("aggregate");
        Ok(Vec::new())
    }
}

fn search(field: &str, value: &str) -> Command {
    Command::Search {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn update(patient_id: &str, field: &str, value: &str) -> Command {
    Command::Update {
        patient_id: patient_id.to_string(),
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn delete(patient_id: &str) -> Command {
    Command::Delete {
        patient_id: patient_id.to_string(),
    }
}

#[test]
fn search_on_unsupported_field_makes_no_store_call() {
    let service = PatientService::new(RecordingStore::default());

    let err = dispatch(&service, search("foo", "bar")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidSearchField);
    assert!(service.store().calls().is_empty());
}

#[test]
fn rejected_input_never_reaches_the_store() {
    let service = PatientService::new(RecordingStore::default());

    let mut bad_add = new_patient("P1", "Flu");
    bad_add.email = "not-an-email".to_string();
    let err = dispatch(&service, Command::Add(bad_add)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValidationError);

    let err = dispatch(&service, search("visit_date", "June 1st")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValidationError);

    let err = dispatch(&service, update("P1", "phone", "555")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValidationError);

    let err = dispatch(&service, update("P1", "age", "forty")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedNumber);

    let err = dispatch(&service, update("P1", "patient_id", "P2")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidUpdateField);

    assert!(service.store().calls().is_empty());
}

#[test]
fn zero_matches_are_not_found_not_errors() {
    let service = PatientService::new(RecordingStore::default());

    let output = dispatch(&service, update("ghost", "condition", "Flu")).unwrap();
    assert_eq!(
        output,
        CommandOutput::NotFound {
            patient_id: "ghost".to_string()
        }
    );
    let output = dispatch(&service, delete("ghost")).unwrap();
    assert!(matches!(output, CommandOutput::NotFound { .. }));

    assert_eq!(service.store().calls(), vec!["update_one", "delete_one"]);
}

#[test]
fn add_search_update_delete_scenario() {
    let conn = indexed_db();
    let service = PatientService::new(SqlitePatientStore::new(&conn));

    let added = dispatch(&service, Command::Add(new_patient("P1", "Hypertension"))).unwrap();
    assert!(matches!(added, CommandOutput::Added(ref record) if record.patient_id == "P1"));

    let CommandOutput::Found(found) = dispatch(&service, search("patient_id", "P1")).unwrap()
    else {
        panic!("search should return records");
    };
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].condition, "Hypertension");
    let original_phone = found[0].phone.clone();

    let err = dispatch(&service, update("P1", "phone", "555")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValidationError);
    let unchanged = service.search("patient_id", "P1").unwrap();
    assert_eq!(unchanged[0].phone, original_phone);

    let deleted = dispatch(&service, delete("P1")).unwrap();
    assert_eq!(
        deleted,
        CommandOutput::Deleted(DeleteOutcome { deleted_count: 1 })
    );
    let again = dispatch(&service, delete("P1")).unwrap();
    assert_eq!(
        again,
        CommandOutput::NotFound {
            patient_id: "P1".to_string()
        }
    );
}

#[test]
fn repeated_update_is_idempotent() {
    let conn = indexed_db();
    let service = PatientService::new(SqlitePatientStore::new(&conn));
    service.add(new_patient("P1", "Flu")).unwrap();

    for _ in 0..2 {
        let output = dispatch(&service, update("P1", "allergies", "Penicillin")).unwrap();
        let CommandOutput::Updated(outcome) = output else {
            panic!("existing patient should be updated");
        };
        assert_eq!(outcome.matched_count, 1);
    }
    let record = service.search("patient_id", "P1").unwrap().remove(0);
    assert_eq!(record.allergies, vec!["Penicillin".to_string()]);

    for _ in 0..2 {
        let output = dispatch(&service, update("P9", "allergies", "Penicillin")).unwrap();
        assert!(matches!(output, CommandOutput::NotFound { .. }));
    }
}

#[test]
fn update_writes_typed_values() {
    let conn = indexed_db();
    let service = PatientService::new(SqlitePatientStore::new(&conn));
    service.add(new_patient("P1", "Flu")).unwrap();

    dispatch(&service, update("P1", "age", "61")).unwrap();
    dispatch(&service, update("P1", "history", "Fracture, 2019")).unwrap();
    dispatch(&service, update("P1", "gender", "Other")).unwrap();

    let record = service.search("patient_id", "P1").unwrap().remove(0);
    assert_eq!(record.age, 61);
    assert_eq!(record.medical_history, vec!["Fracture, 2019".to_string()]);
    assert_eq!(record.gender.as_str(), "Other");
}

#[test]
fn duplicate_add_surfaces_store_error() {
    let conn = indexed_db();
    let service = PatientService::new(SqlitePatientStore::new(&conn));

    dispatch(&service, Command::Add(new_patient("TEST001", "Test"))).unwrap();
    let err = dispatch(&service, Command::Add(new_patient("TEST001", "Test"))).unwrap_err();
    assert_eq!(err.kind, ErrorKind::StoreError);
    assert!(err.message.contains("TEST001"));
}

#[test]
fn text_and_range_search_through_commands() {
    let conn = indexed_db();
    let service = PatientService::new(SqlitePatientStore::new(&conn));
    let mut early = new_patient("P1", "Chronic migraine");
    early.visit_date = "2024-02-10".to_string();
    let mut late = new_patient("P2", "Asthma");
    late.visit_date = "2025-03-15".to_string();
    service.add(early).unwrap();
    service.add(late).unwrap();

    let CommandOutput::Found(by_condition) =
        dispatch(&service, search("condition", "migraine")).unwrap()
    else {
        panic!("search should return records");
    };
    assert_eq!(by_condition.len(), 1);
    assert_eq!(by_condition[0].patient_id, "P1");

    let CommandOutput::Found(recent) = dispatch(&service, search("visit_date", "2025-01-01")).unwrap()
    else {
        panic!("search should return records");
    };
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].patient_id, "P2");
}

#[test]
fn stats_counts_patients_per_condition() {
    let conn = indexed_db();
    let service = PatientService::new(SqlitePatientStore::new(&conn));
    for (id, condition) in [("P1", "A"), ("P2", "A"), ("P3", "B")] {
        service.add(new_patient(id, condition)).unwrap();
    }

    let CommandOutput::Stats(rows) = dispatch(&service, Command::Stats).unwrap() else {
        panic!("stats should return rows");
    };
    assert_eq!(
        rows[0],
        StatRow {
            condition: "A".to_string(),
            count: 2,
        }
    );
    let counts = rows
        .into_iter()
        .map(|row| (row.condition, row.count))
        .collect::<HashMap<_, _>>();
    assert_eq!(counts, HashMap::from([("A".to_string(), 2), ("B".to_string(), 1)]));
}
