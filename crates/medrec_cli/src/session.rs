//! Interactive prompt loop.
//!
//! # Responsibility
//! - Collect command input line by line and hand it to core dispatch.
//! - Print results as JSON lines and outcomes as fixed operator messages.
//!
//! # Invariants
//! - A failed command prints `Error: <message>` and the loop continues.
//! - End of input at any prompt ends the session cleanly.

use medrec_core::{
    dispatch, Command, CommandError, CommandName, CommandOutput, NewPatient, PatientService,
    PatientStore, ServiceError,
};
use serde::Serialize;
use std::io::{self, BufRead, Write};

const BANNER: &str = "Healthcare Patient Management System";
const COMMAND_LIST: &str = "Commands: add, search, update, delete, stats, exit";

/// Runs the prompt loop until `exit` or end of input.
pub fn run_session<S, R, W>(service: &PatientService<S>, input: R, output: W) -> io::Result<()>
where
    S: PatientStore,
    R: BufRead,
    W: Write,
{
    let mut prompt = Prompt { input, output };
    loop {
        writeln!(prompt.output, "\n{BANNER}")?;
        writeln!(prompt.output, "{COMMAND_LIST}")?;
        let Some(word) = prompt.ask("Enter command: ")? else {
            break;
        };

        let command = match CommandName::parse(&word) {
            Some(CommandName::Exit) => break,
            Some(name) => match prompt.collect(name)? {
                Collected::Command(command) => command,
                Collected::Rejected(err) => {
                    prompt.report_error(&err)?;
                    continue;
                }
                Collected::EndOfInput => break,
            },
            None => {
                writeln!(prompt.output, "Error: Invalid command")?;
                continue;
            }
        };

        match dispatch(service, command) {
            Ok(result) => prompt.report(result)?,
            Err(err) => prompt.report_error(&err)?,
        }
    }
    prompt.output.flush()
}

enum Collected {
    Command(Command),
    Rejected(CommandError),
    EndOfInput,
}

struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    /// Prints `label`, then reads one trimmed line. `None` on end of input.
    fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn collect(&mut self, name: CommandName) -> io::Result<Collected> {
        match name {
            CommandName::Add => self.collect_add(),
            CommandName::Search => {
                let Some(field) = self.ask("Search by (patient_id/name/condition/visit_date): ")?
                else {
                    return Ok(Collected::EndOfInput);
                };
                let Some(value) = self.ask("Enter value: ")? else {
                    return Ok(Collected::EndOfInput);
                };
                Ok(Collected::Command(Command::Search { field, value }))
            }
            CommandName::Update => {
                let Some(patient_id) = self.ask("Enter patient_id: ")? else {
                    return Ok(Collected::EndOfInput);
                };
                let Some(field) = self.ask(
                    "Field to update (name/gender/age/phone/email/allergies/history/condition/visit_date): ",
                )?
                else {
                    return Ok(Collected::EndOfInput);
                };
                let Some(value) = self.ask("Enter new value: ")? else {
                    return Ok(Collected::EndOfInput);
                };
                Ok(Collected::Command(Command::Update {
                    patient_id,
                    field,
                    value,
                }))
            }
            CommandName::Delete => match self.ask("Enter patient_id: ")? {
                Some(patient_id) => Ok(Collected::Command(Command::Delete { patient_id })),
                None => Ok(Collected::EndOfInput),
            },
            CommandName::Stats => Ok(Collected::Command(Command::Stats)),
            CommandName::Exit => Ok(Collected::EndOfInput),
        }
    }

    fn collect_add(&mut self) -> io::Result<Collected> {
        const LABELS: [&str; 10] = [
            "Enter patient_id: ",
            "Enter name: ",
            "Enter gender (Male/Female/Other): ",
            "Enter age: ",
            "Enter phone (10 digits): ",
            "Enter email: ",
            "Enter allergy: ",
            "Enter medical history: ",
            "Enter condition: ",
            "Enter visit date (YYYY-MM-DD): ",
        ];

        let mut answers: [String; 10] = Default::default();
        for (answer, label) in answers.iter_mut().zip(LABELS) {
            match self.ask(label)? {
                Some(line) => *answer = line,
                None => return Ok(Collected::EndOfInput),
            }
        }
        let [patient_id, name, gender, age, phone, email, allergy, medical_history, condition, visit_date] =
            answers;

        let age = match age.parse::<i64>() {
            Ok(age) => age,
            Err(_) => {
                let err = ServiceError::MalformedNumber {
                    field: "age",
                    value: age,
                };
                return Ok(Collected::Rejected(err.into()));
            }
        };

        Ok(Collected::Command(Command::Add(NewPatient {
            patient_id,
            name,
            gender,
            age,
            phone,
            email,
            allergy,
            medical_history,
            condition,
            visit_date,
        })))
    }

    fn report(&mut self, result: CommandOutput) -> io::Result<()> {
        match result {
            CommandOutput::Added(_) => writeln!(self.output, "Patient added successfully"),
            CommandOutput::Found(records) => self.write_json_lines(&records),
            CommandOutput::Updated(_) => writeln!(self.output, "Patient updated successfully"),
            CommandOutput::Deleted(_) => writeln!(self.output, "Patient deleted successfully"),
            CommandOutput::NotFound { .. } => writeln!(self.output, "Patient not found"),
            CommandOutput::Stats(rows) => self.write_json_lines(&rows),
        }
    }

    fn report_error(&mut self, err: &CommandError) -> io::Result<()> {
        writeln!(self.output, "Error: {err}")
    }

    fn write_json_lines<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        for item in items {
            let line = serde_json::to_string(item).map_err(io::Error::other)?;
            writeln!(self.output, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::run_session;
    use medrec_core::db::open_db_in_memory;
    use medrec_core::{PatientService, PatientStore, SqlitePatientStore};
    use std::io::Cursor;

    const ADD_P1: &str = "add\nP1\nAda Lovelace\nFemale\n36\n1234567890\nada@example.com\nNone\nNone\nHypertension\n2025-06-01\n";

    fn run(script: &str) -> String {
        let conn = open_db_in_memory().unwrap();
        let store = SqlitePatientStore::new(&conn);
        store.create_indexes().unwrap();
        let service = PatientService::new(store);

        let mut output = Vec::new();
        run_session(&service, Cursor::new(script.as_bytes()), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn full_record_lifecycle() {
        let script = format!(
            "{ADD_P1}search\npatient_id\nP1\nupdate\nP1\nphone\n555\ndelete\nP1\ndelete\nP1\nexit\n"
        );
        let output = run(&script);

        assert!(output.contains("Healthcare Patient Management System"));
        assert!(output.contains("Patient added successfully"));
        assert!(output.contains("\"patient_id\":\"P1\""));
        assert!(output.contains("\"allergies\":[\"None\"]"));
        assert!(output.contains("Error: invalid phone number"));
        assert!(output.contains("Patient deleted successfully"));
        assert!(output.contains("Patient not found"));
    }

    #[test]
    fn stats_print_group_documents() {
        let output = run(&format!("{ADD_P1}stats\n"));
        assert!(output.contains("{\"_id\":\"Hypertension\",\"count\":1}"));
    }

    #[test]
    fn bad_input_reports_and_continues() {
        let script = "list\nadd\nP2\nAlan\nMale\nforty\n1234567890\na@b.co\nNone\nNone\nFlu\n2025-06-01\nsearch\nfoo\nbar\nstats\n";
        let output = run(script);

        assert!(output.contains("Error: Invalid command"));
        assert!(output.contains("Error: invalid age format"));
        assert!(output.contains("Error: invalid search field `foo`"));
        assert!(!output.contains("Patient added successfully"));
        // Loop kept prompting after each failure.
        assert_eq!(output.matches("Enter command: ").count(), 5);
    }

    #[test]
    fn end_of_input_mid_command_ends_session() {
        let output = run("add\nP1\nAda\n");
        assert!(output.ends_with("Enter gender (Male/Female/Other): "));
    }
}
