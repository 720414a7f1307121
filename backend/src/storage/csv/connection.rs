//! # CSV Connection
//!
//! Owns the data directory and the on-disk layout:
//!
//! ```text
//! data/
//! ├── config.yaml
//! ├── templates/
//! │   └── reminder_<id>.yaml     one file per template
//! ├── completions.csv            template_id,scheduled_at,completed,completed_at
//! └── suppressions.csv           template_id,scheduled_at,suppressed_at
//! ```
//!
//! Every write goes to a temp file that is renamed over the target, so a
//! reader always sees a complete file.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const COMPLETIONS_HEADER: &str = "template_id,scheduled_at,completed,completed_at\n";
pub const SUPPRESSIONS_HEADER: &str = "template_id,scheduled_at,suppressed_at\n";

/// CsvConnection manages file paths and the write locks for shared CSV files
#[derive(Clone)]
pub struct CsvConnection {
    base_directory: PathBuf,
    completions_lock: Arc<Mutex<()>>,
    suppressions_lock: Arc<Mutex<()>>,
}

impl CsvConnection {
    /// Create a new CSV connection rooted at `base_directory`, creating it if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();
        let templates_dir = base_path.join("templates");

        if !templates_dir.exists() {
            fs::create_dir_all(&templates_dir)?;
            info!("Created data directory: {}", base_path.display());
        }

        let connection = Self {
            base_directory: base_path,
            completions_lock: Arc::new(Mutex::new(())),
            suppressions_lock: Arc::new(Mutex::new(())),
        };
        connection.ensure_csv_file_exists(&connection.completions_file_path(), COMPLETIONS_HEADER)?;
        connection.ensure_csv_file_exists(&connection.suppressions_file_path(), SUPPRESSIONS_HEADER)?;
        Ok(connection)
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn templates_directory(&self) -> PathBuf {
        self.base_directory.join("templates")
    }

    /// File path for a template. `::` in IDs is not portable in file names.
    pub fn template_file_path(&self, template_id: &str) -> PathBuf {
        let file_stem = template_id.replace("::", "_");
        self.templates_directory().join(format!("{}.yaml", file_stem))
    }

    pub fn completions_file_path(&self) -> PathBuf {
        self.base_directory.join("completions.csv")
    }

    pub fn suppressions_file_path(&self) -> PathBuf {
        self.base_directory.join("suppressions.csv")
    }

    /// Lock held by writers of `completions.csv`; readers never take it
    pub fn completions_lock(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.completions_lock)
    }

    /// Lock held by writers of `suppressions.csv`; readers never take it
    pub fn suppressions_lock(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.suppressions_lock)
    }

    /// Ensure a CSV file exists with its header row
    pub fn ensure_csv_file_exists(&self, path: &Path, header: &str) -> Result<()> {
        if !path.exists() {
            write_atomically(path, header.as_bytes())?;
            debug!("Created {}", path.display());
        }
        Ok(())
    }
}

/// Write to `<path>.tmp` and rename over `path`
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, contents)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
