//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validators, expression builders and store calls into
//!   patient use-case APIs.
//! - Keep the command layer decoupled from storage details.

pub mod patient_service;
