use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a reminder. Purely cosmetic for the engine; the presentation
/// layer uses it to pick icons and colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderType {
    Medication,
    Meal,
    Activity,
    Hydration,
    Message,
}

impl fmt::Display for ReminderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReminderType::Medication => "medication",
            ReminderType::Meal => "meal",
            ReminderType::Activity => "activity",
            ReminderType::Hydration => "hydration",
            ReminderType::Message => "message",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Wire representation of a recurrence rule.
///
/// `weekdays` and `weekends` are input presets; responses always use
/// `weekly` with an explicit day list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recurrence {
    Daily,
    Weekly { days: Vec<DayOfWeek> },
    Weekdays,
    Weekends,
    IntervalHours { hours: u32 },
    Once,
}

/// Blast radius of an edit or delete against a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditScope {
    ThisOccurrenceOnly,
    ThisAndFuture,
    EntireTemplate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceStatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderTemplate {
    pub id: String,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub title: String,
    /// Wall-clock time in `HH:MM` format
    pub time_of_day: String,
    pub recurrence: Recurrence,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub active_from: NaiveDateTime,
    pub retired_at: Option<NaiveDateTime>,
    pub revision: u64,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub title: String,
    /// Wall-clock time in `HH:MM` format
    pub time_of_day: String,
    pub recurrence: Recurrence,
    pub notes: Option<String>,
    /// Defaults to the creation instant, rounded up to a whole minute
    pub active_from: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTemplateResponse {
    pub template: ReminderTemplate,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateResponse {
    pub template: ReminderTemplate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateListResponse {
    pub templates: Vec<ReminderTemplate>,
}

/// Fields to change on a template. Absent fields are left untouched; an
/// empty `notes` string clears the notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateChanges {
    #[serde(rename = "type", default)]
    pub reminder_type: Option<ReminderType>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditTemplateRequest {
    pub scope: Option<EditScope>,
    /// The occurrence the edit is anchored on; required unless the scope is
    /// `entire_template`
    pub scheduled_at: Option<NaiveDateTime>,
    pub expected_revision: u64,
    pub changes: TemplateChanges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditTemplateResponse {
    /// The template the edit was addressed to, after the edit
    pub template: ReminderTemplate,
    /// A template created by the edit, if the scope required one
    pub created_template: Option<ReminderTemplate>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTemplateRequest {
    pub scope: Option<EditScope>,
    pub scheduled_at: Option<NaiveDateTime>,
    pub expected_revision: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteTemplateResponse {
    pub template: ReminderTemplate,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEnabledRequest {
    pub expected_revision: u64,
    pub enabled: bool,
}

/// A concrete scheduled instance together with its completion state and the
/// template fields a caller needs to render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleOccurrence {
    pub template_id: String,
    pub scheduled_at: NaiveDateTime,
    pub completed: bool,
    pub completed_at: Option<NaiveDateTime>,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub title: String,
    pub notes: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceListResponse {
    pub occurrences: Vec<VisibleOccurrence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceSummary {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleCompletionRequest {
    pub template_id: String,
    pub scheduled_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleCompletionResponse {
    pub template_id: String,
    pub scheduled_at: NaiveDateTime,
    pub completed: bool,
    pub previously_completed: bool,
}

/// Body returned with every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
