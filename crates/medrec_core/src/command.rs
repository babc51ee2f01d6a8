//! Operator command routing.
//!
//! # Responsibility
//! - Decide the command variant once, at the boundary.
//! - Route each command to the patient service and tag the result.
//!
//! # Invariants
//! - Every command yields `Ok(CommandOutput)` or `Err(CommandError)`; a
//!   failed command never ends the session.
//! - A zero-match update or delete is `CommandOutput::NotFound`, not an error.

use crate::model::patient::{NewPatient, PatientRecord};
use crate::query::aggregate::StatRow;
use crate::repo::patient_store::{DeleteOutcome, PatientStore, UpdateOutcome};
use crate::service::patient_service::{ErrorKind, PatientService, ServiceError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Command words accepted at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    Add,
    Search,
    Update,
    Delete,
    Stats,
    Exit,
}

impl CommandName {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "add" => Some(Self::Add),
            "search" => Some(Self::Search),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "stats" => Some(Self::Stats),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// A fully collected operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(NewPatient),
    Search { field: String, value: String },
    Update {
        patient_id: String,
        field: String,
        value: String,
    },
    Delete { patient_id: String },
    Stats,
}

/// Successful command payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Added(PatientRecord),
    Found(Vec<PatientRecord>),
    Updated(UpdateOutcome),
    Deleted(DeleteOutcome),
    /// Update or delete matched no document.
    NotFound { patient_id: String },
    Stats(Vec<StatRow>),
}

/// Failed command: error category plus operator-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub kind: ErrorKind,
    pub message: String,
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CommandError {}

impl From<ServiceError> for CommandError {
    fn from(value: ServiceError) -> Self {
        Self {
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

pub type CommandResult = Result<CommandOutput, CommandError>;

/// Executes one command against the service.
pub fn dispatch<S: PatientStore>(service: &PatientService<S>, command: Command) -> CommandResult {
    let output = match command {
        Command::Add(input) => CommandOutput::Added(service.add(input)?),
        Command::Search { field, value } => CommandOutput::Found(service.search(&field, &value)?),
        Command::Update {
            patient_id,
            field,
            value,
        } => {
            let outcome = service.update(&patient_id, &field, &value)?;
            if outcome.matched_count == 0 {
                CommandOutput::NotFound { patient_id }
            } else {
                CommandOutput::Updated(outcome)
            }
        }
        Command::Delete { patient_id } => {
            let outcome = service.delete(&patient_id)?;
            if outcome.deleted_count == 0 {
                CommandOutput::NotFound { patient_id }
            } else {
                CommandOutput::Deleted(outcome)
            }
        }
        Command::Stats => CommandOutput::Stats(service.stats()?),
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::CommandName;

    #[test]
    fn command_words_are_exact() {
        assert_eq!(CommandName::parse("add"), Some(CommandName::Add));
        assert_eq!(CommandName::parse(" stats\n"), Some(CommandName::Stats));
        assert_eq!(CommandName::parse("exit"), Some(CommandName::Exit));
        assert_eq!(CommandName::parse("ADD"), None);
        assert_eq!(CommandName::parse("list"), None);
    }
}
