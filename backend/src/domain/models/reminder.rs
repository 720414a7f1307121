//! Domain model for a reminder template, the recurring definition that
//! occurrences are derived from.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::recurrence::RecurrenceRule;

pub const MAX_TITLE_LENGTH: usize = 256;

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
        f.write_str(name)
    }
}

/// Wall-clock time of day with minute precision, 00:00 through 23:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeOfDay")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, TemplateValidationError> {
        if hour > 23 || minute > 59 {
            return Err(TemplateValidationError::TimeOfDayOutOfRange(format!(
                "{:02}:{:02}",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }

    /// Parse `HH:MM` (a single-digit hour is accepted).
    pub fn parse(value: &str) -> Result<Self, TemplateValidationError> {
        let malformed = || TemplateValidationError::MalformedTimeOfDay(value.to_string());
        let (hour, minute) = value.trim().split_once(':').ok_or_else(malformed)?;
        if minute.len() != 2 || hour.is_empty() || hour.len() > 2 {
            return Err(malformed());
        }
        let hour: u8 = hour.parse().map_err(|_| malformed())?;
        let minute: u8 = minute.parse().map_err(|_| malformed())?;
        Self::new(hour, minute)
    }

    /// Hour and minute of `moment`; seconds are dropped
    pub fn of(moment: NaiveDateTime) -> Self {
        Self {
            hour: moment.hour() as u8,
            minute: moment.minute() as u8,
        }
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        // Range is enforced by the constructor
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

#[derive(Deserialize)]
struct RawTimeOfDay {
    hour: u8,
    minute: u8,
}

impl TryFrom<RawTimeOfDay> for TimeOfDay {
    type Error = TemplateValidationError;

    fn try_from(raw: RawTimeOfDay) -> Result<Self, Self::Error> {
        TimeOfDay::new(raw.hour, raw.minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderTemplate {
    pub id: String,
    pub reminder_type: ReminderType,
    pub title: String,
    pub time_of_day: TimeOfDay,
    pub recurrence: RecurrenceRule,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub active_from: NaiveDateTime,
    /// No occurrence at or after this instant is generated. Never unset.
    pub retired_at: Option<NaiveDateTime>,
    /// Set only by an entire-template delete
    #[serde(default)]
    pub deleted_at: Option<NaiveDateTime>,
    /// Incremented on every template-level mutation
    pub revision: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ReminderTemplate {
    /// Generate a fresh template ID; IDs are never reused.
    pub fn generate_id() -> String {
        format!("reminder::{}", Uuid::new_v4().simple())
    }

    pub fn validate(&self) -> Result<(), TemplateValidationError> {
        validate_title(&self.title)?;
        self.recurrence.validate()?;
        if let Some(retired_at) = self.retired_at {
            if retired_at < self.active_from {
                return Err(TemplateValidationError::RetiredBeforeActive);
            }
        }
        Ok(())
    }

    /// True once the template was deleted in its entirety
    pub fn is_purged(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// True when no further occurrences at or after `moment` are generated
    pub fn is_retired_at(&self, moment: NaiveDateTime) -> bool {
        self.retired_at.is_some_and(|retired_at| moment >= retired_at)
    }
}

/// Smallest whole minute at or after `moment`.
///
/// Occurrence instants stay on minute boundaries so a detached copy can
/// reproduce them from a [`TimeOfDay`].
pub fn ceil_to_minute(moment: NaiveDateTime) -> NaiveDateTime {
    let truncated = moment
        .with_second(0)
        .and_then(|m| m.with_nanosecond(0))
        .unwrap_or(moment);
    if truncated < moment {
        truncated + Duration::minutes(1)
    } else {
        truncated
    }
}

pub fn validate_title(title: &str) -> Result<(), TemplateValidationError> {
    if title.trim().is_empty() {
        return Err(TemplateValidationError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(TemplateValidationError::TitleTooLong);
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateValidationError {
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("Title is too long (max {} characters)", MAX_TITLE_LENGTH)]
    TitleTooLong,
    #[error("Time of day must be HH:MM, got '{0}'")]
    MalformedTimeOfDay(String),
    #[error("Time of day {0} is outside 00:00-23:59")]
    TimeOfDayOutOfRange(String),
    #[error("Weekly recurrence requires at least one day")]
    EmptyWeekdaySet,
    #[error("Interval recurrence requires at least 1 hour")]
    ZeroInterval,
    #[error("Retirement cannot precede the active-from moment")]
    RetiredBeforeActive,
}
