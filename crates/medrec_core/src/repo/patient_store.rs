//! Patient document store contract and SQLite implementation.
//!
//! # Responsibility
//! - Expose insert/find/update/delete/aggregate over patient documents.
//! - Own the unique `patient_id` index and the `name`+`condition` text index.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Inserts call `PatientRecord::validate()` before touching SQL.
//! - Reads reject invalid persisted state instead of masking it.
//! - `update_one`/`delete_one` touch at most one document (lowest rowid).
//! - `patient_id` uniqueness is enforced by the index, not by callers.

use crate::db::DbError;
use crate::model::patient::{FieldValue, Gender, PatientField, PatientRecord};
use crate::model::validation::ValidationError;
use crate::query::aggregate::{GroupCount, Pipeline, Stage};
use crate::query::filter::SearchFilter;
use crate::query::mutation::Mutation;
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

const PATIENT_SELECT_COLUMNS: &str = "
    patients.record_id AS record_id,
    patients.patient_id AS patient_id,
    patients.name AS name,
    patients.gender AS gender,
    patients.age AS age,
    patients.phone AS phone,
    patients.email AS email,
    patients.allergies AS allergies,
    patients.medical_history AS medical_history,
    patients.condition AS condition,
    patients.visit_date AS visit_date";

const TEXT_INDEX_TABLE: &str = "patients_text";

const UNIQUE_INDEX_SQL: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_patients_patient_id ON patients(patient_id);";

const TEXT_INDEX_SQL: &str = "
CREATE VIRTUAL TABLE IF NOT EXISTS patients_text USING fts5(
    name,
    condition,
    content='patients',
    content_rowid='id'
);
CREATE TRIGGER IF NOT EXISTS patients_text_ai AFTER INSERT ON patients BEGIN
    INSERT INTO patients_text(rowid, name, condition)
    VALUES (new.id, new.name, new.condition);
END;
CREATE TRIGGER IF NOT EXISTS patients_text_ad AFTER DELETE ON patients BEGIN
    INSERT INTO patients_text(patients_text, rowid, name, condition)
    VALUES ('delete', old.id, old.name, old.condition);
END;
CREATE TRIGGER IF NOT EXISTS patients_text_au AFTER UPDATE OF name, condition ON patients BEGIN
    INSERT INTO patients_text(patients_text, rowid, name, condition)
    VALUES ('delete', old.id, old.name, old.condition);
    INSERT INTO patients_text(rowid, name, condition)
    VALUES (new.id, new.name, new.condition);
END;
INSERT INTO patients_text(patients_text) VALUES ('rebuild');";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer error for patient persistence and queries.
#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    Db(DbError),
    /// Insert collided with the unique `patient_id` index.
    DuplicatePatientId(String),
    /// Text search issued before `create_indexes`.
    TextIndexMissing,
    /// Text search expression rejected by FTS5.
    InvalidQuery {
        query: String,
        message: String,
    },
    UnsupportedPipeline(String),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicatePatientId(patient_id) => {
                write!(f, "duplicate key: patient_id `{patient_id}` already exists")
            }
            Self::TextIndexMissing => write!(f, "text index over name/condition does not exist"),
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid text search `{query}`: {message}")
            }
            Self::UnsupportedPipeline(message) => {
                write!(f, "unsupported aggregation pipeline: {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted patient data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of `update_one`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    /// Zero when the stored value already equals the new value.
    pub modified_count: u64,
}

/// Result of `delete_one`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

/// Document store operations over the patients collection.
pub trait PatientStore {
    /// Creates the unique `patient_id` index and the text index. Idempotent.
    fn create_indexes(&self) -> StoreResult<()>;
    fn insert_one(&self, record: &PatientRecord) -> StoreResult<()>;
    fn find(&self, filter: &SearchFilter) -> StoreResult<Vec<PatientRecord>>;
    fn update_one(&self, filter: &SearchFilter, mutation: &Mutation) -> StoreResult<UpdateOutcome>;
    fn delete_one(&self, filter: &SearchFilter) -> StoreResult<DeleteOutcome>;
    fn aggregate(&self, pipeline: &Pipeline) -> StoreResult<Vec<GroupCount>>;
}

/// SQLite-backed patient store.
pub struct SqlitePatientStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePatientStore<'conn> {
    /// Wraps a migrated connection from [`crate::db::open_db`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Returns the rowid of the first document matching `filter`.
    fn first_match(&self, filter: &SearchFilter) -> StoreResult<Option<i64>> {
        let Some((clause, bind_values)) = where_clause(filter) else {
            return Ok(None);
        };

        self.conn
            .query_row(
                &format!("SELECT patients.id FROM patients WHERE {clause} ORDER BY patients.id LIMIT 1;"),
                params_from_iter(bind_values),
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map_err(|err| map_filter_error(err, filter))
    }

    fn find_text(&self, filter: &SearchFilter) -> StoreResult<Vec<PatientRecord>> {
        let Some((_, bind_values)) = where_clause(filter) else {
            return Ok(Vec::new());
        };

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {PATIENT_SELECT_COLUMNS}
                 FROM patients_text
                 JOIN patients ON patients.id = patients_text.rowid
                 WHERE patients_text MATCH ?1
                 ORDER BY bm25(patients_text), patients.id;"
            ))
            .map_err(|err| map_filter_error(err, filter))?;
        collect_patients(&mut stmt, bind_values, filter)
    }
}

impl PatientStore for SqlitePatientStore<'_> {
    fn create_indexes(&self) -> StoreResult<()> {
        let started_at = Instant::now();
        self.conn.execute_batch(UNIQUE_INDEX_SQL)?;

        let text_index_created = !table_exists(self.conn, TEXT_INDEX_TABLE)?;
        if text_index_created {
            self.conn.execute_batch(TEXT_INDEX_SQL)?;
        }

        info!(
            "event=store_indexes module=repo status=ok text_index_created={} duration_ms={}",
            text_index_created,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn insert_one(&self, record: &PatientRecord) -> StoreResult<()> {
        record.validate()?;

        self.conn
            .execute(
                "INSERT INTO patients (
                    record_id,
                    patient_id,
                    name,
                    gender,
                    age,
                    phone,
                    email,
                    allergies,
                    medical_history,
                    condition,
                    visit_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
                params![
                    record.record_id.to_string(),
                    record.patient_id.as_str(),
                    record.name.as_str(),
                    record.gender.as_str(),
                    record.age,
                    record.phone.as_str(),
                    record.email.as_str(),
                    list_to_db(&record.allergies)?,
                    list_to_db(&record.medical_history)?,
                    record.condition.as_str(),
                    record.visit_date.as_str(),
                ],
            )
            .map_err(|err| map_insert_error(err, &record.patient_id))?;

        Ok(())
    }

    fn find(&self, filter: &SearchFilter) -> StoreResult<Vec<PatientRecord>> {
        if matches!(filter, SearchFilter::Text { .. }) {
            return self.find_text(filter);
        }

        let Some((clause, bind_values)) = where_clause(filter) else {
            return Ok(Vec::new());
        };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PATIENT_SELECT_COLUMNS}
             FROM patients
             WHERE {clause}
             ORDER BY patients.id;"
        ))?;
        collect_patients(&mut stmt, bind_values, filter)
    }

    fn update_one(&self, filter: &SearchFilter, mutation: &Mutation) -> StoreResult<UpdateOutcome> {
        let Some(row_id) = self.first_match(filter)? else {
            return Ok(UpdateOutcome::default());
        };

        let column = mutation.field.as_str();
        let value = field_value_to_db(&mutation.value)?;
        let modified = self.conn.execute(
            &format!(
                "UPDATE patients
                 SET
                    {column} = ?1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?2
                   AND {column} IS NOT ?1;"
            ),
            params![value, row_id],
        )?;

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: modified as u64,
        })
    }

    fn delete_one(&self, filter: &SearchFilter) -> StoreResult<DeleteOutcome> {
        let Some(row_id) = self.first_match(filter)? else {
            return Ok(DeleteOutcome::default());
        };

        let deleted = self
            .conn
            .execute("DELETE FROM patients WHERE id = ?1;", [row_id])?;
        Ok(DeleteOutcome {
            deleted_count: deleted as u64,
        })
    }

    fn aggregate(&self, pipeline: &Pipeline) -> StoreResult<Vec<GroupCount>> {
        let mut stages = pipeline.stages.iter();
        let key = match stages.next() {
            Some(Stage::GroupCount { key }) if !key.is_list() => *key,
            Some(Stage::GroupCount { key }) => {
                return Err(StoreError::UnsupportedPipeline(format!(
                    "cannot group by list field `{}`",
                    key.as_str()
                )));
            }
            _ => {
                return Err(StoreError::UnsupportedPipeline(
                    "pipeline must start with a group stage".to_string(),
                ));
            }
        };

        let mut order = None;
        for stage in stages {
            match stage {
                Stage::SortByCount { descending } => order = Some(*descending),
                Stage::GroupCount { .. } => {
                    return Err(StoreError::UnsupportedPipeline(
                        "only one group stage is supported".to_string(),
                    ));
                }
            }
        }

        let column = key.as_str();
        let mut sql = format!(
            "SELECT CAST(patients.{column} AS TEXT) AS group_key, COUNT(*) AS group_count
             FROM patients
             GROUP BY patients.{column}"
        );
        match order {
            Some(true) => sql.push_str(" ORDER BY group_count DESC"),
            Some(false) => sql.push_str(" ORDER BY group_count ASC"),
            None => {}
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            let count = row.get::<_, i64>("group_count")?;
            groups.push(GroupCount {
                key: row.get("group_key")?,
                count: u64::try_from(count).map_err(|_| {
                    StoreError::InvalidData(format!("negative group count {count}"))
                })?,
            });
        }

        Ok(groups)
    }
}

fn collect_patients(
    stmt: &mut rusqlite::Statement<'_>,
    bind_values: Vec<Value>,
    filter: &SearchFilter,
) -> StoreResult<Vec<PatientRecord>> {
    let mut rows = stmt
        .query(params_from_iter(bind_values))
        .map_err(|err| map_filter_error(err, filter))?;
    let mut records = Vec::new();

    while let Some(row) = rows.next().map_err(|err| map_filter_error(err, filter))? {
        records.push(parse_patient_row(row)?);
    }

    Ok(records)
}

/// SQL predicate over `patients` for `filter`.
///
/// `None` means the filter can match nothing (blank text search).
fn where_clause(filter: &SearchFilter) -> Option<(String, Vec<Value>)> {
    match filter {
        SearchFilter::Equals { field, value } => Some(comparison(*field, "=", value)),
        SearchFilter::AtLeast { field, value } => Some(comparison(*field, ">=", value)),
        SearchFilter::Text { search } => build_match_expression(search).map(|expr| {
            (
                "patients.id IN (SELECT rowid FROM patients_text WHERE patients_text MATCH ?)"
                    .to_string(),
                vec![Value::Text(expr)],
            )
        }),
    }
}

fn comparison(field: PatientField, operator: &str, value: &str) -> (String, Vec<Value>) {
    let column = field.as_str();
    let sql = if field.is_list() {
        // List fields match when any element satisfies the comparison.
        format!(
            "EXISTS (SELECT 1 FROM json_each(patients.{column}) WHERE json_each.value {operator} ?)"
        )
    } else {
        format!("patients.{column} {operator} ?")
    };
    (sql, vec![Value::Text(value.to_string())])
}

/// Any-term match: each whitespace-separated term is quoted and OR-ed.
fn build_match_expression(text: &str) -> Option<String> {
    let terms = text
        .split_whitespace()
        .map(escape_fts_term)
        .collect::<Vec<_>>();

    if terms.is_empty() {
        return None;
    }
    Some(terms.join(" OR "))
}

fn escape_fts_term(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn parse_patient_row(row: &Row<'_>) -> StoreResult<PatientRecord> {
    let record_text: String = row.get("record_id")?;
    let record_id = Uuid::parse_str(&record_text).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid uuid value `{record_text}` in patients.record_id"
        ))
    })?;

    let gender_text: String = row.get("gender")?;
    let gender = Gender::parse(&gender_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid gender `{gender_text}` in patients.gender"))
    })?;

    let record = PatientRecord {
        record_id,
        patient_id: row.get("patient_id")?,
        name: row.get("name")?,
        gender,
        age: row.get("age")?,
        phone: row.get("phone")?,
        email: row.get("email")?,
        allergies: list_from_db(row, "allergies")?,
        medical_history: list_from_db(row, "medical_history")?,
        condition: row.get("condition")?,
        visit_date: row.get("visit_date")?,
    };
    record.validate()?;
    Ok(record)
}

fn list_to_db(values: &[String]) -> StoreResult<String> {
    serde_json::to_string(values)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode list field: {err}")))
}

fn list_from_db(row: &Row<'_>, column: &str) -> StoreResult<Vec<String>> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|err| {
        StoreError::InvalidData(format!("invalid list value in patients.{column}: {err}"))
    })
}

fn field_value_to_db(value: &FieldValue) -> StoreResult<Value> {
    Ok(match value {
        FieldValue::Text(text) => Value::Text(text.clone()),
        FieldValue::Integer(number) => Value::Integer(*number),
        FieldValue::List(values) => Value::Text(list_to_db(values)?),
    })
}

fn table_exists(conn: &Connection, name: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE name = ?1);",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn map_insert_error(err: rusqlite::Error, patient_id: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::DuplicatePatientId(patient_id.to_string())
        }
        _ => StoreError::from(err),
    }
}

fn map_filter_error(err: rusqlite::Error, filter: &SearchFilter) -> StoreError {
    let SearchFilter::Text { search } = filter else {
        return StoreError::from(err);
    };

    if let rusqlite::Error::SqliteFailure(_, Some(message)) = &err {
        let msg = message.to_lowercase();
        if msg.contains("no such table") && msg.contains(TEXT_INDEX_TABLE) {
            return StoreError::TextIndexMissing;
        }
        if (msg.contains("fts5") && msg.contains("syntax"))
            || msg.contains("malformed match expression")
            || msg.contains("unterminated")
        {
            return StoreError::InvalidQuery {
                query: search.clone(),
                message: message.clone(),
            };
        }
    }

    StoreError::from(err)
}
