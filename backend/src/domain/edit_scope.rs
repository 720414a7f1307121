//! Edit and delete scope resolution.
//!
//! Given a request against a template (and usually one of its occurrences),
//! the resolver decides what changes: a single-occurrence suppression, a
//! retirement plus successor template, or an in-place change to the whole
//! template. It is pure; the reminder service applies the resulting plan.

use chrono::{NaiveDateTime, NaiveTime};
use std::collections::HashSet;

use crate::domain::commands::templates::TemplateChanges;
use crate::domain::errors::{ReminderError, ReminderResult};
use crate::domain::models::{RecurrenceRule, ReminderTemplate, TimeOfDay};
use crate::domain::occurrence_generator::OccurrenceGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    ThisOccurrenceOnly,
    ThisAndFuture,
    EntireTemplate,
}

/// The effects of one scoped operation, applied all-or-nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopePlan {
    /// The addressed template after the operation, with its revision bumped
    pub updated: ReminderTemplate,
    /// Occurrence of `updated` to hide
    pub suppress: Option<NaiveDateTime>,
    /// New template that takes over the changed occurrences
    pub successor: Option<ReminderTemplate>,
    /// Suppressions the successor inherits, ascending
    pub carried_suppressions: Vec<NaiveDateTime>,
    /// Drop all completion records of `updated`
    pub purge: bool,
}

impl ScopePlan {
    fn for_template(updated: ReminderTemplate) -> Self {
        Self {
            updated,
            suppress: None,
            successor: None,
            carried_suppressions: Vec::new(),
            purge: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditScopeResolver {
    generator: OccurrenceGenerator,
}

impl EditScopeResolver {
    pub fn new(generator: OccurrenceGenerator) -> Self {
        Self { generator }
    }

    pub fn resolve_edit(
        &self,
        template: &ReminderTemplate,
        scope: Option<EditScope>,
        scheduled_at: Option<NaiveDateTime>,
        changes: &TemplateChanges,
        suppressed: &HashSet<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> ReminderResult<ScopePlan> {
        let scope = require_scope(scope)?;
        if changes.is_empty() {
            return Err(ReminderError::validation("No changes supplied"));
        }

        match scope {
            EditScope::ThisOccurrenceOnly => {
                if changes.recurrence.is_some() {
                    return Err(ReminderError::validation(
                        "Recurrence cannot be changed for a single occurrence",
                    ));
                }
                let target = self.require_occurrence(template, scheduled_at, suppressed)?;

                let mut detached = changes.apply_to(template);
                detached.recurrence = RecurrenceRule::Once;
                // Interval occurrences ignore time of day; keep the instant itself
                detached.time_of_day = changes.time_of_day.unwrap_or_else(|| TimeOfDay::of(target));
                detached.active_from = target.date().and_time(NaiveTime::MIN);
                detached.retired_at = None;
                reset_identity(&mut detached, now);
                detached.validate()?;

                let mut plan = ScopePlan::for_template(bump_revision(template));
                plan.suppress = Some(target);
                plan.successor = Some(detached);
                Ok(plan)
            }
            EditScope::ThisAndFuture => {
                let target = self.require_occurrence(template, scheduled_at, suppressed)?;

                let mut successor = changes.apply_to(template);
                successor.active_from = target;
                // An earlier retirement still bounds the new template
                successor.retired_at = template.retired_at;
                reset_identity(&mut successor, now);
                successor.validate()?;

                let mut updated = bump_revision(template);
                updated.retired_at = Some(target);

                let mut plan = ScopePlan::for_template(updated);
                if !changes.touches_schedule(template) {
                    let mut carried: Vec<NaiveDateTime> =
                        suppressed.iter().copied().filter(|s| *s >= target).collect();
                    carried.sort();
                    plan.carried_suppressions = carried;
                }
                plan.successor = Some(successor);
                Ok(plan)
            }
            EditScope::EntireTemplate => {
                if changes.touches_schedule(template) {
                    return Err(ReminderError::validation(
                        "Time of day and recurrence cannot be changed for the entire template; \
                         use the this_and_future scope",
                    ));
                }
                let mut updated = changes.apply_to(template);
                updated.revision = template.revision + 1;
                updated.validate()?;
                Ok(ScopePlan::for_template(updated))
            }
        }
    }

    pub fn resolve_delete(
        &self,
        template: &ReminderTemplate,
        scope: Option<EditScope>,
        scheduled_at: Option<NaiveDateTime>,
        suppressed: &HashSet<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> ReminderResult<ScopePlan> {
        let scope = require_scope(scope)?;

        match scope {
            EditScope::ThisOccurrenceOnly => {
                let target = self.require_occurrence(template, scheduled_at, suppressed)?;
                let mut plan = ScopePlan::for_template(bump_revision(template));
                plan.suppress = Some(target);
                Ok(plan)
            }
            EditScope::ThisAndFuture => {
                let target = self.require_occurrence(template, scheduled_at, suppressed)?;
                let mut updated = bump_revision(template);
                updated.retired_at = Some(target);
                Ok(ScopePlan::for_template(updated))
            }
            EditScope::EntireTemplate => {
                let mut updated = bump_revision(template);
                updated.retired_at = Some(template.active_from);
                updated.deleted_at = Some(now);
                let mut plan = ScopePlan::for_template(updated);
                plan.purge = true;
                Ok(plan)
            }
        }
    }

    fn require_occurrence(
        &self,
        template: &ReminderTemplate,
        scheduled_at: Option<NaiveDateTime>,
        suppressed: &HashSet<NaiveDateTime>,
    ) -> ReminderResult<NaiveDateTime> {
        let scheduled_at = scheduled_at.ok_or_else(|| {
            ReminderError::validation("scheduled_at is required for occurrence-scoped changes")
        })?;
        if !self.generator.produces(template, scheduled_at, suppressed) {
            return Err(ReminderError::not_found(format!(
                "Template '{}' has no occurrence at {}",
                template.id, scheduled_at
            )));
        }
        Ok(scheduled_at)
    }
}

fn require_scope(scope: Option<EditScope>) -> ReminderResult<EditScope> {
    scope.ok_or_else(|| {
        ReminderError::validation(
            "An explicit scope is required: this_occurrence_only, this_and_future or entire_template",
        )
    })
}

fn bump_revision(template: &ReminderTemplate) -> ReminderTemplate {
    let mut updated = template.clone();
    updated.revision += 1;
    updated
}

fn reset_identity(template: &mut ReminderTemplate, now: NaiveDateTime) {
    template.id = ReminderTemplate::generate_id();
    template.created_at = now;
    template.deleted_at = None;
    template.revision = 1;
}
