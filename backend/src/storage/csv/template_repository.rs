//! # Template Repository
//!
//! Stores each reminder template as its own YAML file under `templates/`.
//! Replacing a template is a single atomic rename, which gives readers
//! template-granularity isolation without taking any lock.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use tracing::{debug, info, warn};

use super::connection::{write_atomically, CsvConnection};
use crate::domain::models::ReminderTemplate;
use crate::storage::traits::TemplateStorage;

#[derive(Clone)]
pub struct TemplateRepository {
    connection: CsvConnection,
}

impl TemplateRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn load_template_file(&self, path: &std::path::Path) -> Result<ReminderTemplate> {
        let yaml_content = fs::read_to_string(path)?;
        let template: ReminderTemplate = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Malformed template file {}", path.display()))?;
        Ok(template)
    }
}

#[async_trait]
impl TemplateStorage for TemplateRepository {
    async fn store_template(&self, template: &ReminderTemplate) -> Result<()> {
        let yaml_path = self.connection.template_file_path(&template.id);
        let yaml_content = serde_yaml::to_string(template)?;
        write_atomically(&yaml_path, yaml_content.as_bytes())?;

        debug!(
            "Stored template '{}' (revision {}) at {}",
            template.id,
            template.revision,
            yaml_path.display()
        );
        Ok(())
    }

    async fn get_template(&self, template_id: &str) -> Result<Option<ReminderTemplate>> {
        let yaml_path = self.connection.template_file_path(template_id);
        if !yaml_path.exists() {
            debug!("No template found with ID '{}'", template_id);
            return Ok(None);
        }
        let template = self.load_template_file(&yaml_path)?;
        Ok(Some(template))
    }

    async fn list_templates(&self) -> Result<Vec<ReminderTemplate>> {
        let templates_dir = self.connection.templates_directory();
        let mut templates = Vec::new();

        if !templates_dir.exists() {
            return Ok(templates);
        }

        for entry in fs::read_dir(&templates_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            match self.load_template_file(&path) {
                Ok(template) => templates.push(template),
                Err(e) => warn!("Skipping unreadable template file {}: {:#}", path.display(), e),
            }
        }

        templates.sort_by(|a, b| a.id.cmp(&b.id));
        debug!("Listed {} templates", templates.len());
        Ok(templates)
    }

    async fn remove_template(&self, template_id: &str) -> Result<bool> {
        let yaml_path = self.connection.template_file_path(template_id);
        if yaml_path.exists() {
            fs::remove_file(&yaml_path)?;
            info!("Removed template file for '{}'", template_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
