//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the public DTOs defined in
//! the `shared` crate to these internal types.

pub mod templates {
    use chrono::NaiveDateTime;

    use crate::domain::edit_scope::EditScope;
    use crate::domain::models::{RecurrenceRule, ReminderTemplate, ReminderType, TimeOfDay};

    /// Input for creating a new template.
    #[derive(Debug, Clone)]
    pub struct CreateTemplateCommand {
        pub reminder_type: ReminderType,
        pub title: String,
        pub time_of_day: TimeOfDay,
        pub recurrence: RecurrenceRule,
        pub notes: Option<String>,
        pub active_from: Option<NaiveDateTime>,
    }

    /// Query parameters for listing templates.
    #[derive(Debug, Clone, Default)]
    pub struct TemplateListQuery {
        pub reminder_type: Option<ReminderType>,
        pub include_retired: bool,
    }

    /// Field changes for an edit. `notes: Some(None)` clears the notes.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct TemplateChanges {
        pub reminder_type: Option<ReminderType>,
        pub title: Option<String>,
        pub time_of_day: Option<TimeOfDay>,
        pub recurrence: Option<RecurrenceRule>,
        pub notes: Option<Option<String>>,
    }

    impl TemplateChanges {
        pub fn is_empty(&self) -> bool {
            self.reminder_type.is_none()
                && self.title.is_none()
                && self.time_of_day.is_none()
                && self.recurrence.is_none()
                && self.notes.is_none()
        }

        /// True when the change would alter when occurrences happen
        pub fn touches_schedule(&self, template: &ReminderTemplate) -> bool {
            self.time_of_day.is_some_and(|t| t != template.time_of_day)
                || self
                    .recurrence
                    .as_ref()
                    .is_some_and(|r| *r != template.recurrence)
        }

        /// Copy `template` with these changes applied
        pub fn apply_to(&self, template: &ReminderTemplate) -> ReminderTemplate {
            let mut changed = template.clone();
            if let Some(reminder_type) = self.reminder_type {
                changed.reminder_type = reminder_type;
            }
            if let Some(title) = &self.title {
                changed.title = title.trim().to_string();
            }
            if let Some(time_of_day) = self.time_of_day {
                changed.time_of_day = time_of_day;
            }
            if let Some(recurrence) = &self.recurrence {
                changed.recurrence = recurrence.clone();
            }
            if let Some(notes) = &self.notes {
                changed.notes = notes.clone();
            }
            changed
        }
    }

    /// Input for editing a template. `scope` must be supplied explicitly.
    #[derive(Debug, Clone)]
    pub struct EditTemplateCommand {
        pub template_id: String,
        pub scope: Option<EditScope>,
        pub scheduled_at: Option<NaiveDateTime>,
        pub expected_revision: u64,
        pub changes: TemplateChanges,
    }

    /// Input for deleting a template or some of its occurrences.
    #[derive(Debug, Clone)]
    pub struct DeleteTemplateCommand {
        pub template_id: String,
        pub scope: Option<EditScope>,
        pub scheduled_at: Option<NaiveDateTime>,
        pub expected_revision: u64,
    }

    /// Input for pausing or resuming a template's due notifications.
    #[derive(Debug, Clone)]
    pub struct SetEnabledCommand {
        pub template_id: String,
        pub expected_revision: u64,
        pub enabled: bool,
    }

    /// Result of an edit.
    #[derive(Debug, Clone)]
    pub struct EditTemplateResult {
        pub template: ReminderTemplate,
        pub created_template: Option<ReminderTemplate>,
        pub success_message: String,
    }

    /// Result of a delete.
    #[derive(Debug, Clone)]
    pub struct DeleteTemplateResult {
        pub template: ReminderTemplate,
        pub purged_completions: u32,
        pub success_message: String,
    }
}

pub mod occurrences {
    use chrono::NaiveDateTime;

    use crate::domain::models::{Occurrence, ReminderType};

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub enum StatusFilter {
        #[default]
        All,
        Pending,
        Completed,
    }

    impl StatusFilter {
        pub fn accepts(&self, completed: bool) -> bool {
            match self {
                StatusFilter::All => true,
                StatusFilter::Pending => !completed,
                StatusFilter::Completed => completed,
            }
        }
    }

    /// Query for the merged occurrence view over a window (both ends inclusive).
    #[derive(Debug, Clone)]
    pub struct OccurrenceQuery {
        pub window_start: NaiveDateTime,
        pub window_end: NaiveDateTime,
        pub reminder_type: Option<ReminderType>,
        pub status: StatusFilter,
    }

    impl OccurrenceQuery {
        pub fn window(window_start: NaiveDateTime, window_end: NaiveDateTime) -> Self {
            Self {
                window_start,
                window_end,
                reminder_type: None,
                status: StatusFilter::All,
            }
        }
    }

    /// One occurrence with its completion state and the template fields
    /// needed to render it.
    #[derive(Debug, Clone, PartialEq)]
    pub struct OccurrenceView {
        pub occurrence: Occurrence,
        pub completed: bool,
        pub completed_at: Option<NaiveDateTime>,
        pub reminder_type: ReminderType,
        pub title: String,
        pub notes: Option<String>,
        pub enabled: bool,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct OccurrenceSummary {
        pub total: usize,
        pub completed: usize,
        pub pending: usize,
    }

    /// Result of toggling an occurrence's completion.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ToggleCompletionResult {
        pub occurrence: Occurrence,
        pub completed: bool,
        pub previously_completed: bool,
    }
}
