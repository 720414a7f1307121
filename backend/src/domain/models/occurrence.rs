//! Occurrence identity and the records keyed by it.
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One concrete scheduled instance of a template. Identity is the pair
/// `(template_id, scheduled_at)`; nothing else is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    pub template_id: String,
    pub scheduled_at: NaiveDateTime,
}

impl Occurrence {
    pub fn new(template_id: impl Into<String>, scheduled_at: NaiveDateTime) -> Self {
        Self {
            template_id: template_id.into(),
            scheduled_at,
        }
    }

    /// Ordering used for every merged listing: time first, then template ID
    pub fn sort_key(&self) -> (NaiveDateTime, &str) {
        (self.scheduled_at, self.template_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub template_id: String,
    pub scheduled_at: NaiveDateTime,
    pub completed: bool,
    pub completed_at: Option<NaiveDateTime>,
}

impl CompletionRecord {
    pub fn occurrence(&self) -> Occurrence {
        Occurrence::new(self.template_id.clone(), self.scheduled_at)
    }
}

/// A single occurrence removed from a template's visible set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suppression {
    pub template_id: String,
    pub scheduled_at: NaiveDateTime,
    pub suppressed_at: NaiveDateTime,
}
