//! # Storage Traits
//!
//! Storage abstractions the domain layer works against. Each trait maps to one
//! logical table: templates keyed by ID, completion records and suppressions
//! keyed by `(template_id, scheduled_at)`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::models::{CompletionRecord, ReminderTemplate, Suppression};

/// Interface for template storage operations
#[async_trait]
pub trait TemplateStorage: Send + Sync {
    /// Insert or replace a template as a single atomic write
    async fn store_template(&self, template: &ReminderTemplate) -> Result<()>;

    /// Retrieve a template by ID, including retired and deleted ones
    async fn get_template(&self, template_id: &str) -> Result<Option<ReminderTemplate>>;

    /// List every stored template ordered by ID
    async fn list_templates(&self) -> Result<Vec<ReminderTemplate>>;

    /// Remove a template record. Only used to roll back a half-applied edit.
    async fn remove_template(&self, template_id: &str) -> Result<bool>;
}

/// Interface for completion record storage
#[async_trait]
pub trait CompletionStorage: Send + Sync {
    /// Insert or replace the record for the record's occurrence identity
    async fn upsert_completion(&self, record: &CompletionRecord) -> Result<()>;

    async fn get_completion(
        &self,
        template_id: &str,
        scheduled_at: NaiveDateTime,
    ) -> Result<Option<CompletionRecord>>;

    async fn list_completions(&self) -> Result<Vec<CompletionRecord>>;

    /// Delete all records of a template, returning how many were removed
    async fn delete_completions_for_template(&self, template_id: &str) -> Result<u32>;
}

/// Interface for single-occurrence suppression storage
#[async_trait]
pub trait SuppressionStorage: Send + Sync {
    /// Record a suppression; returns false if it already existed
    async fn add_suppression(&self, suppression: &Suppression) -> Result<bool>;

    async fn list_suppressions(&self) -> Result<Vec<Suppression>>;

    async fn list_suppressions_for_template(&self, template_id: &str) -> Result<Vec<Suppression>>;

    async fn remove_suppression(&self, template_id: &str, scheduled_at: NaiveDateTime) -> Result<bool>;

    async fn delete_suppressions_for_template(&self, template_id: &str) -> Result<u32>;
}
