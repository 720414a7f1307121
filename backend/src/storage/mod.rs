//! # Storage Module
//!
//! Persistence for templates, completion records and occurrence suppressions.
//!
//! The domain layer depends only on the traits in [`traits`]; the `csv`
//! module is the file-backed implementation used by the server. Its layout
//! mirrors the logical tables: a template table keyed by ID, and two tables
//! keyed by the `(template_id, scheduled_at)` occurrence identity.

pub mod csv;
pub mod traits;

pub use self::csv::{CompletionRepository, CsvConnection, SuppressionRepository, TemplateRepository};
pub use traits::{CompletionStorage, SuppressionStorage, TemplateStorage};
