//! # Suppression Repository
//!
//! Single-occurrence deletions, stored in `suppressions.csv` keyed by
//! `(template_id, scheduled_at)`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::connection::{CsvConnection, SUPPRESSIONS_HEADER};
use super::rows::{read_rows, write_rows};
use crate::domain::models::Suppression;
use crate::storage::traits::SuppressionStorage;

#[derive(Clone)]
pub struct SuppressionRepository {
    connection: CsvConnection,
}

impl SuppressionRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn read_suppressions(&self) -> Result<Vec<Suppression>> {
        read_rows(&self.connection.suppressions_file_path())
    }

    fn write_suppressions(&self, suppressions: &[Suppression]) -> Result<()> {
        let path = self.connection.suppressions_file_path();
        write_rows(&path, SUPPRESSIONS_HEADER, suppressions)
    }

    /// Remove every row matching `predicate` under the write lock
    async fn remove_where<F>(&self, predicate: F) -> Result<u32>
    where
        F: Fn(&Suppression) -> bool + Send,
    {
        let lock = self.connection.suppressions_lock();
        let _guard = lock.lock().await;

        let suppressions = self.read_suppressions()?;
        let before = suppressions.len();
        let remaining: Vec<Suppression> = suppressions.into_iter().filter(|s| !predicate(s)).collect();
        let removed = (before - remaining.len()) as u32;
        if removed > 0 {
            self.write_suppressions(&remaining)?;
        }
        Ok(removed)
    }
}

#[async_trait]
impl SuppressionStorage for SuppressionRepository {
    async fn add_suppression(&self, suppression: &Suppression) -> Result<bool> {
        let lock = self.connection.suppressions_lock();
        let _guard = lock.lock().await;

        let mut suppressions = self.read_suppressions()?;
        let exists = suppressions.iter().any(|s| {
            s.template_id == suppression.template_id && s.scheduled_at == suppression.scheduled_at
        });
        if exists {
            debug!(
                "Occurrence '{}' at {} already suppressed",
                suppression.template_id, suppression.scheduled_at
            );
            return Ok(false);
        }

        suppressions.push(suppression.clone());
        self.write_suppressions(&suppressions)?;
        info!(
            "Suppressed occurrence '{}' at {}",
            suppression.template_id, suppression.scheduled_at
        );
        Ok(true)
    }

    async fn list_suppressions(&self) -> Result<Vec<Suppression>> {
        self.read_suppressions()
    }

    async fn list_suppressions_for_template(&self, template_id: &str) -> Result<Vec<Suppression>> {
        Ok(self
            .read_suppressions()?
            .into_iter()
            .filter(|s| s.template_id == template_id)
            .collect())
    }

    async fn remove_suppression(&self, template_id: &str, scheduled_at: NaiveDateTime) -> Result<bool> {
        let removed = self
            .remove_where(|s| s.template_id == template_id && s.scheduled_at == scheduled_at)
            .await?;
        Ok(removed > 0)
    }

    async fn delete_suppressions_for_template(&self, template_id: &str) -> Result<u32> {
        let removed = self.remove_where(|s| s.template_id == template_id).await?;
        info!("Deleted {} suppressions for template '{}'", removed, template_id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::csv::test_utils::TestEnvironment;

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn suppression(template_id: &str, scheduled_at: &str) -> Suppression {
        Suppression {
            template_id: template_id.to_string(),
            scheduled_at: at(scheduled_at),
            suppressed_at: at("2025-01-01T07:00:00"),
        }
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SuppressionRepository::new(env.connection.clone());

        assert!(repo.add_suppression(&suppression("reminder::a", "2025-01-02T09:00:00")).await.unwrap());
        assert!(!repo.add_suppression(&suppression("reminder::a", "2025-01-02T09:00:00")).await.unwrap());
        assert_eq!(repo.list_suppressions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_and_delete_for_template() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SuppressionRepository::new(env.connection.clone());

        repo.add_suppression(&suppression("reminder::a", "2025-01-02T09:00:00")).await.unwrap();
        repo.add_suppression(&suppression("reminder::a", "2025-01-03T09:00:00")).await.unwrap();
        repo.add_suppression(&suppression("reminder::b", "2025-01-02T09:00:00")).await.unwrap();

        assert_eq!(repo.list_suppressions_for_template("reminder::a").await.unwrap().len(), 2);
        assert_eq!(repo.delete_suppressions_for_template("reminder::a").await.unwrap(), 2);
        assert!(repo.list_suppressions_for_template("reminder::a").await.unwrap().is_empty());
        assert_eq!(repo.list_suppressions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_single_suppression() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = SuppressionRepository::new(env.connection.clone());

        repo.add_suppression(&suppression("reminder::a", "2025-01-02T09:00:00")).await.unwrap();
        assert!(repo.remove_suppression("reminder::a", at("2025-01-02T09:00:00")).await.unwrap());
        assert!(!repo.remove_suppression("reminder::a", at("2025-01-02T09:00:00")).await.unwrap());
    }
}
