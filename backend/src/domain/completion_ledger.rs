//! Completion state per occurrence identity.
//!
//! The ledger knows nothing about recurrence: it is addressed only by
//! `(template_id, scheduled_at)`. An identity without a record is pending, so
//! tomorrow's occurrence of a daily reminder is pending without any reset.

use chrono::{Local, NaiveDateTime};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::domain::errors::ReminderResult;
use crate::domain::models::{CompletionRecord, Occurrence};
use crate::storage::{CompletionRepository, CompletionStorage};

#[derive(Clone)]
pub struct CompletionLedger {
    completion_repository: CompletionRepository,
}

impl CompletionLedger {
    pub fn new(completion_repository: CompletionRepository) -> Self {
        Self {
            completion_repository,
        }
    }

    /// Upsert the completion state of one occurrence and return the previous value.
    ///
    /// Setting the value it already has is a no-op. `completed_at` is stamped
    /// only on a false→true transition.
    pub async fn set_completed(
        &self,
        template_id: &str,
        scheduled_at: NaiveDateTime,
        value: bool,
    ) -> ReminderResult<bool> {
        let existing = self
            .completion_repository
            .get_completion(template_id, scheduled_at)
            .await?;
        let previous = existing.as_ref().is_some_and(|r| r.completed);

        if previous == value {
            debug!(
                "Completion for '{}' at {} already {}",
                template_id, scheduled_at, value
            );
            return Ok(previous);
        }

        let record = CompletionRecord {
            template_id: template_id.to_string(),
            scheduled_at,
            completed: value,
            completed_at: value.then(|| Local::now().naive_local()),
        };
        self.completion_repository.upsert_completion(&record).await?;

        info!(
            "Marked '{}' at {} as {}",
            template_id,
            scheduled_at,
            if value { "completed" } else { "pending" }
        );
        Ok(previous)
    }

    /// False for any identity that has no record
    pub async fn is_completed(&self, template_id: &str, scheduled_at: NaiveDateTime) -> ReminderResult<bool> {
        let record = self
            .completion_repository
            .get_completion(template_id, scheduled_at)
            .await?;
        Ok(record.is_some_and(|r| r.completed))
    }

    /// All records, keyed by occurrence identity, for batch lookups
    pub async fn snapshot(&self) -> ReminderResult<HashMap<Occurrence, CompletionRecord>> {
        let records = self.completion_repository.list_completions().await?;
        Ok(records.into_iter().map(|r| (r.occurrence(), r)).collect())
    }

    /// Remove every record of a template. Only a full delete calls this.
    pub async fn purge_template(&self, template_id: &str) -> ReminderResult<u32> {
        let removed = self
            .completion_repository
            .delete_completions_for_template(template_id)
            .await?;
        Ok(removed)
    }
}
