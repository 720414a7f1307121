//! Materializes concrete occurrences from a template over a bounded window.
//!
//! Generation is pure: the same template and window always yield the same
//! occurrence identities, which is what keeps completion records keyed by
//! `(template_id, scheduled_at)` valid across regenerations.

use chrono::{Duration, NaiveDateTime};
use std::collections::HashSet;

use crate::domain::models::{Occurrence, ReminderTemplate};

#[derive(Debug, Clone, Copy, Default)]
pub struct OccurrenceGenerator;

impl OccurrenceGenerator {
    pub fn new() -> Self {
        Self
    }

    /// All occurrences of `template` in `[window_start, window_end]`, ascending.
    ///
    /// Excludes anything before `active_from` and anything at or after
    /// `retired_at`. Cost is proportional to the occurrences in the window.
    pub fn materialize(
        &self,
        template: &ReminderTemplate,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();
        if window_end < window_start {
            return occurrences;
        }

        let mut cursor = window_start.max(template.active_from);
        while let Some(scheduled_at) =
            template
                .recurrence
                .next_occurrence(template.active_from, template.time_of_day, cursor)
        {
            if scheduled_at > window_end || template.is_retired_at(scheduled_at) {
                break;
            }
            if scheduled_at >= template.active_from {
                occurrences.push(Occurrence::new(template.id.clone(), scheduled_at));
            }
            // Timestamps are strictly increasing, so the loop is bounded by the window
            cursor = match scheduled_at.checked_add_signed(Duration::nanoseconds(1)) {
                Some(next) => next,
                None => break,
            };
        }

        occurrences
    }

    /// Like [`materialize`](Self::materialize) but drops single-occurrence
    /// suppressions.
    pub fn materialize_visible(
        &self,
        template: &ReminderTemplate,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
        suppressed: &HashSet<NaiveDateTime>,
    ) -> Vec<Occurrence> {
        let mut occurrences = self.materialize(template, window_start, window_end);
        if !suppressed.is_empty() {
            occurrences.retain(|o| !suppressed.contains(&o.scheduled_at));
        }
        occurrences
    }

    /// Whether the template currently produces an occurrence at exactly `scheduled_at`
    pub fn produces(
        &self,
        template: &ReminderTemplate,
        scheduled_at: NaiveDateTime,
        suppressed: &HashSet<NaiveDateTime>,
    ) -> bool {
        !self
            .materialize_visible(template, scheduled_at, scheduled_at, suppressed)
            .is_empty()
    }
}
