//! # Completion Repository
//!
//! Completion records live in a single `completions.csv`, one row per
//! occurrence identity. Writers serialize on the connection's completions
//! lock and replace the file atomically; readers never block.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::connection::{CsvConnection, COMPLETIONS_HEADER};
use super::rows::{read_rows, write_rows};
use crate::domain::models::CompletionRecord;
use crate::storage::traits::CompletionStorage;

#[derive(Clone)]
pub struct CompletionRepository {
    connection: CsvConnection,
}

impl CompletionRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_records(&self) -> Result<Vec<CompletionRecord>> {
        read_rows(&self.connection.completions_file_path())
    }

    fn write_records(&self, records: &[CompletionRecord]) -> Result<()> {
        let path = self.connection.completions_file_path();
        write_rows(&path, COMPLETIONS_HEADER, records)
    }
}

#[async_trait]
impl CompletionStorage for CompletionRepository {
    async fn upsert_completion(&self, record: &CompletionRecord) -> Result<()> {
        let lock = self.connection.completions_lock();
        let _guard = lock.lock().await;

        let mut records = self.read_records()?;
        match records
            .iter_mut()
            .find(|r| r.template_id == record.template_id && r.scheduled_at == record.scheduled_at)
        {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.write_records(&records)?;

        debug!(
            "Upserted completion for '{}' at {} (completed: {})",
            record.template_id, record.scheduled_at, record.completed
        );
        Ok(())
    }

    async fn get_completion(
        &self,
        template_id: &str,
        scheduled_at: NaiveDateTime,
    ) -> Result<Option<CompletionRecord>> {
        let records = self.read_records()?;
        Ok(records
            .into_iter()
            .find(|r| r.template_id == template_id && r.scheduled_at == scheduled_at))
    }

    async fn list_completions(&self) -> Result<Vec<CompletionRecord>> {
        self.read_records()
    }

    async fn delete_completions_for_template(&self, template_id: &str) -> Result<u32> {
        let lock = self.connection.completions_lock();
        let _guard = lock.lock().await;

        let records = self.read_records()?;
        let before = records.len();
        let remaining: Vec<CompletionRecord> = records
            .into_iter()
            .filter(|r| r.template_id != template_id)
            .collect();
        let removed = (before - remaining.len()) as u32;

        if removed > 0 {
            self.write_records(&remaining)?;
        }
        info!("Deleted {} completion records for template '{}'", removed, template_id);
        Ok(removed)
    }
}
