//! Domain models: templates, recurrence rules and occurrence identities.

pub mod occurrence;
pub mod recurrence;
pub mod reminder;

pub use occurrence::{CompletionRecord, Occurrence, Suppression};
pub use recurrence::RecurrenceRule;
pub use reminder::{ceil_to_minute, ReminderTemplate, ReminderType, TemplateValidationError, TimeOfDay};
