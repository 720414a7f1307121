//! Domain model for recurrence rules and next-occurrence evaluation.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use super::reminder::{TemplateValidationError, TimeOfDay};

/// Closed set of recurrence patterns a template can follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecurrenceRule {
    /// Every calendar day at the template's time of day
    Daily,
    /// On the listed weekdays at the template's time of day
    WeeklyOnDays { days: Vec<Weekday> },
    /// Every `hours` hours of elapsed time from `active_from`; ignores time of day
    IntervalHours { hours: u32 },
    /// A single occurrence, no recurrence
    Once,
}

impl RecurrenceRule {
    /// Build a weekly rule with the day list sorted Monday-first and deduplicated.
    pub fn weekly<I: IntoIterator<Item = Weekday>>(days: I) -> Self {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();
        RecurrenceRule::WeeklyOnDays { days }
    }

    pub fn weekdays() -> Self {
        Self::weekly([Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri])
    }

    pub fn weekends() -> Self {
        Self::weekly([Weekday::Sat, Weekday::Sun])
    }

    pub fn validate(&self) -> Result<(), TemplateValidationError> {
        match self {
            RecurrenceRule::WeeklyOnDays { days } if days.is_empty() => {
                Err(TemplateValidationError::EmptyWeekdaySet)
            }
            RecurrenceRule::IntervalHours { hours } if *hours == 0 => {
                Err(TemplateValidationError::ZeroInterval)
            }
            _ => Ok(()),
        }
    }

    /// Smallest scheduled moment at or after `after` (closed interval).
    ///
    /// Returns `None` when the rule has nothing left to produce, or when the
    /// next moment is outside the representable calendar.
    pub fn next_occurrence(
        &self,
        active_from: NaiveDateTime,
        time_of_day: TimeOfDay,
        after: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        let wall_clock = time_of_day.as_naive_time();
        match self {
            RecurrenceRule::Daily => {
                let first_day = after.date().max(active_from.date());
                first_matching_day(first_day, after, wall_clock, |_| true)
            }
            RecurrenceRule::WeeklyOnDays { days } => {
                if days.is_empty() {
                    return None;
                }
                let first_day = after.date().max(active_from.date());
                first_matching_day(first_day, after, wall_clock, |date| {
                    days.contains(&date.weekday())
                })
            }
            RecurrenceRule::IntervalHours { hours } => {
                if *hours == 0 {
                    return None;
                }
                if after <= active_from {
                    return Some(active_from);
                }
                let step_seconds = i64::from(*hours) * 3600;
                let elapsed_seconds = (after - active_from).num_seconds();
                let mut steps = elapsed_seconds / step_seconds;
                loop {
                    let candidate = active_from
                        .checked_add_signed(Duration::seconds(steps.checked_mul(step_seconds)?))?;
                    if candidate >= after {
                        return Some(candidate);
                    }
                    steps += 1;
                }
            }
            RecurrenceRule::Once => {
                let single = first_matching_day(active_from.date(), active_from, wall_clock, |_| true)?;
                (single >= after).then_some(single)
            }
        }
    }
}

/// Walk forward from `start_day` for at most one week plus a day and return
/// the first `day + wall_clock` that is at or after `after` and accepted by
/// `matches`.
fn first_matching_day<F>(
    start_day: NaiveDate,
    after: NaiveDateTime,
    wall_clock: chrono::NaiveTime,
    matches: F,
) -> Option<NaiveDateTime>
where
    F: Fn(NaiveDate) -> bool,
{
    let mut day = start_day;
    for _ in 0..8 {
        let candidate = day.and_time(wall_clock);
        if candidate >= after && matches(day) {
            return Some(candidate);
        }
        day = day.succ_opt()?;
    }
    None
}
