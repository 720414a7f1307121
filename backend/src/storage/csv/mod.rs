//! # File-backed storage
//!
//! Templates are YAML documents, one per file; completion records and
//! suppressions are CSV tables. All writes are atomic renames.

pub mod completion_repository;
pub mod connection;
mod rows;
pub mod suppression_repository;
pub mod template_repository;

#[cfg(test)]
pub mod test_utils;

pub use completion_repository::CompletionRepository;
pub use connection::CsvConnection;
pub use suppression_repository::SuppressionRepository;
pub use template_repository::TemplateRepository;
