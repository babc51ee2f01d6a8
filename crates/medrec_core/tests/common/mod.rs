#![allow(dead_code)]

use medrec_core::db::open_db_in_memory;
use medrec_core::{NewPatient, PatientStore, SqlitePatientStore};
use rusqlite::Connection;

pub fn new_patient(patient_id: &str, condition: &str) -> NewPatient {
    NewPatient {
        patient_id: patient_id.to_string(),
        name: "Test Patient".to_string(),
        gender: "Male".to_string(),
        age: 25,
        phone: "1234567890".to_string(),
        email: "test@example.com".to_string(),
        allergy: "None".to_string(),
        medical_history: "None".to_string(),
        condition: condition.to_string(),
        visit_date: "2025-06-01".to_string(),
    }
}

/// In-memory database with indexes created, as after startup.
pub fn indexed_db() -> Connection {
    let conn = open_db_in_memory().unwrap();
    SqlitePatientStore::new(&conn).create_indexes().unwrap();
    conn
}
