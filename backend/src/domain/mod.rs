//! # Domain Module
//!
//! Business logic for caregiving reminders, independent of HTTP and of the
//! storage format.
//!
//! ## Module Organization
//!
//! - **models**: templates, recurrence rules and occurrence identities
//! - **occurrence_generator**: turns a template into concrete occurrences over a window
//! - **completion_ledger**: completion state keyed by `(template_id, scheduled_at)`
//! - **edit_scope**: decides what an edit or delete changes for a given scope
//! - **reminder_service**: the store; owns templates and merges everything into one view
//! - **due_service**: answers "what's due" for an external poller
//!
//! ## Core Concepts
//!
//! - **Template**: the persisted recurring definition
//! - **Occurrence**: one scheduled instant derived from a template, never stored
//! - **Ledger**: completion records addressed by occurrence identity
//! - **Scope**: how far an edit or delete reaches (one occurrence, this and future, everything)
//!
//! ## Business Rules
//!
//! - Generation is deterministic, so completion records stay valid without migration
//! - Completing one occurrence never affects another
//! - Every template mutation is serialized per template and revision-checked
//! - Only a full delete discards completion history

pub mod commands;
pub mod completion_ledger;
pub mod due_service;
pub mod edit_scope;
pub mod errors;
pub mod models;
pub mod occurrence_generator;
pub mod reminder_service;

pub use completion_ledger::CompletionLedger;
pub use due_service::{DueOccurrence, DueService, LoggingDueHook, OccurrenceDueHook};
pub use edit_scope::{EditScope, EditScopeResolver, ScopePlan};
pub use errors::{ReminderError, ReminderResult};
pub use occurrence_generator::OccurrenceGenerator;
pub use reminder_service::ReminderService;
