use chrono::{Duration, Local, NaiveDateTime, Timelike};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

use crate::domain::commands::occurrences::{
    OccurrenceQuery, OccurrenceSummary, OccurrenceView, ToggleCompletionResult,
};
use crate::domain::commands::templates::{
    CreateTemplateCommand, DeleteTemplateCommand, DeleteTemplateResult, EditTemplateCommand,
    EditTemplateResult, SetEnabledCommand, TemplateListQuery,
};
use crate::domain::completion_ledger::CompletionLedger;
use crate::domain::edit_scope::{EditScopeResolver, ScopePlan};
use crate::domain::errors::{ReminderError, ReminderResult};
use crate::domain::models::{ceil_to_minute, Occurrence, ReminderTemplate, Suppression};
use crate::domain::occurrence_generator::OccurrenceGenerator;
use crate::storage::csv::{CompletionRepository, CsvConnection, SuppressionRepository, TemplateRepository};
use crate::storage::traits::{SuppressionStorage, TemplateStorage};

/// Service owning reminder templates and the occurrences derived from them
#[derive(Clone)]
pub struct ReminderService {
    template_repository: TemplateRepository,
    suppression_repository: SuppressionRepository,
    ledger: CompletionLedger,
    generator: OccurrenceGenerator,
    resolver: EditScopeResolver,
    /// Serializes mutations per template; reads never take these
    template_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    max_window: Duration,
}

impl ReminderService {
    pub fn new(csv_conn: Arc<CsvConnection>, max_window_days: u32) -> Self {
        let generator = OccurrenceGenerator::new();
        Self {
            template_repository: TemplateRepository::new((*csv_conn).clone()),
            suppression_repository: SuppressionRepository::new((*csv_conn).clone()),
            ledger: CompletionLedger::new(CompletionRepository::new((*csv_conn).clone())),
            generator,
            resolver: EditScopeResolver::new(generator),
            template_locks: Arc::new(DashMap::new()),
            max_window: Duration::days(i64::from(max_window_days)),
        }
    }

    /// Create a new template with a fresh ID
    pub async fn create_template(&self, command: CreateTemplateCommand) -> ReminderResult<ReminderTemplate> {
        info!("Creating template: {:?}", command);

        let now = Local::now().naive_local();
        let now = now.with_nanosecond(0).unwrap_or(now);
        let active_from = ceil_to_minute(command.active_from.unwrap_or(now));

        let template = ReminderTemplate {
            id: ReminderTemplate::generate_id(),
            reminder_type: command.reminder_type,
            title: command.title.trim().to_string(),
            time_of_day: command.time_of_day,
            recurrence: command.recurrence,
            notes: command.notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
            active_from,
            retired_at: None,
            deleted_at: None,
            revision: 1,
            enabled: true,
        };
        template.validate()?;

        self.template_repository.store_template(&template).await?;
        info!("Created template '{}' ({})", template.title, template.id);
        Ok(template)
    }

    /// Fetch a template that has not been fully deleted
    pub async fn get_template(&self, template_id: &str) -> ReminderResult<ReminderTemplate> {
        match self.template_repository.get_template(template_id).await? {
            Some(template) if !template.is_purged() => Ok(template),
            _ => Err(ReminderError::not_found(format!("Template '{}' not found", template_id))),
        }
    }

    /// Non-deleted templates, ordered by time of day and then ID
    pub async fn list_templates(&self, query: TemplateListQuery) -> ReminderResult<Vec<ReminderTemplate>> {
        let now = Local::now().naive_local();
        let mut templates: Vec<ReminderTemplate> = self
            .template_repository
            .list_templates()
            .await?
            .into_iter()
            .filter(|t| !t.is_purged())
            .filter(|t| query.reminder_type.map_or(true, |rt| t.reminder_type == rt))
            .filter(|t| query.include_retired || !t.is_retired_at(now))
            .collect();

        templates.sort_by(|a, b| a.time_of_day.cmp(&b.time_of_day).then_with(|| a.id.cmp(&b.id)));
        Ok(templates)
    }

    /// Merged occurrences of every template in the window with their completion state.
    ///
    /// Sorted by `scheduled_at`, ties broken by template ID.
    pub async fn list_visible_occurrences(&self, query: &OccurrenceQuery) -> ReminderResult<Vec<OccurrenceView>> {
        self.validate_window(query.window_start, query.window_end)?;

        let templates = self.template_repository.list_templates().await?;
        let suppressed = self.suppressions_by_template().await?;
        let completions = self.ledger.snapshot().await?;
        let no_suppressions = HashSet::new();

        let mut views = Vec::new();
        for template in templates.iter().filter(|t| !t.is_purged()) {
            if query.reminder_type.is_some_and(|rt| rt != template.reminder_type) {
                continue;
            }
            let template_suppressed = suppressed.get(&template.id).unwrap_or(&no_suppressions);
            for occurrence in self.generator.materialize_visible(
                template,
                query.window_start,
                query.window_end,
                template_suppressed,
            ) {
                let record = completions.get(&occurrence);
                let completed = record.is_some_and(|r| r.completed);
                if !query.status.accepts(completed) {
                    continue;
                }
                views.push(OccurrenceView {
                    completed,
                    completed_at: record.and_then(|r| r.completed_at),
                    reminder_type: template.reminder_type,
                    title: template.title.clone(),
                    notes: template.notes.clone(),
                    enabled: template.enabled,
                    occurrence,
                });
            }
        }

        views.sort_by(|a, b| a.occurrence.sort_key().cmp(&b.occurrence.sort_key()));
        Ok(views)
    }

    /// Completed and pending counts over a window
    pub async fn occurrence_summary(
        &self,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
    ) -> ReminderResult<OccurrenceSummary> {
        let views = self
            .list_visible_occurrences(&OccurrenceQuery::window(window_start, window_end))
            .await?;
        let completed = views.iter().filter(|v| v.completed).count();
        Ok(OccurrenceSummary {
            total: views.len(),
            completed,
            pending: views.len() - completed,
        })
    }

    /// Flip the completion of one occurrence the template currently produces
    pub async fn toggle_completion(
        &self,
        template_id: &str,
        scheduled_at: NaiveDateTime,
    ) -> ReminderResult<ToggleCompletionResult> {
        info!("Toggling completion of '{}' at {}", template_id, scheduled_at);
        let _guard = self.lock_template(template_id).await;

        let template = self.get_template(template_id).await?;
        let suppressed = self.suppressed_for(template_id).await?;
        if !self.generator.produces(&template, scheduled_at, &suppressed) {
            warn!("Rejected toggle of unscheduled occurrence '{}' at {}", template_id, scheduled_at);
            return Err(ReminderError::not_found(format!(
                "Template '{}' has no occurrence at {}",
                template_id, scheduled_at
            )));
        }

        let current = self.ledger.is_completed(template_id, scheduled_at).await?;
        let previously_completed = self.ledger.set_completed(template_id, scheduled_at, !current).await?;

        Ok(ToggleCompletionResult {
            occurrence: Occurrence::new(template_id, scheduled_at),
            completed: !previously_completed,
            previously_completed,
        })
    }

    /// Edit a template within an explicit scope
    pub async fn edit_template(&self, command: EditTemplateCommand) -> ReminderResult<EditTemplateResult> {
        info!("Editing template: {:?}", command);
        let _guard = self.lock_template(&command.template_id).await;

        let template = self.get_template(&command.template_id).await?;
        let suppressed = self.suppressed_for(&template.id).await?;
        let now = Local::now().naive_local();
        let plan = self.resolver.resolve_edit(
            &template,
            command.scope,
            command.scheduled_at,
            &command.changes,
            &suppressed,
            now,
        )?;
        check_revision(&template, command.expected_revision)?;

        self.apply_plan(&plan, now).await?;

        let success_message = match &plan.successor {
            Some(successor) => format!(
                "Template '{}' updated; changes continue as template '{}'",
                template.title, successor.id
            ),
            None => format!("Template '{}' updated", plan.updated.title),
        };
        info!("{}", success_message);

        Ok(EditTemplateResult {
            template: plan.updated,
            created_template: plan.successor,
            success_message,
        })
    }

    /// Delete a template, or some of its occurrences, within an explicit scope
    pub async fn delete_template(&self, command: DeleteTemplateCommand) -> ReminderResult<DeleteTemplateResult> {
        info!("Deleting template: {:?}", command);
        let _guard = self.lock_template(&command.template_id).await;

        let template = self.get_template(&command.template_id).await?;
        let suppressed = self.suppressed_for(&template.id).await?;
        let now = Local::now().naive_local();
        let plan = self.resolver.resolve_delete(
            &template,
            command.scope,
            command.scheduled_at,
            &suppressed,
            now,
        )?;
        check_revision(&template, command.expected_revision)?;

        self.apply_plan(&plan, now).await?;

        let mut purged_completions = 0;
        if plan.purge {
            purged_completions = match self.ledger.purge_template(&template.id).await {
                Ok(removed) => removed,
                Err(e) => {
                    error!("Failed to purge completions of '{}', restoring template: {}", template.id, e);
                    if let Err(restore_error) = self.template_repository.store_template(&template).await {
                        error!("Failed to restore template '{}': {}", template.id, restore_error);
                    }
                    return Err(e);
                }
            };
            self.suppression_repository
                .delete_suppressions_for_template(&template.id)
                .await?;
        }

        let success_message = if plan.purge {
            format!(
                "Template '{}' deleted along with {} completion records",
                template.title, purged_completions
            )
        } else if let Some(scheduled_at) = plan.suppress {
            format!("Occurrence of '{}' at {} deleted", template.title, scheduled_at)
        } else {
            format!("Template '{}' stopped from {}", template.title, command.scheduled_at.unwrap_or(now))
        };
        info!("{}", success_message);

        Ok(DeleteTemplateResult {
            template: plan.updated,
            purged_completions,
            success_message,
        })
    }

    /// Pause or resume due notifications for a template
    pub async fn set_enabled(&self, command: SetEnabledCommand) -> ReminderResult<ReminderTemplate> {
        info!("Setting enabled: {:?}", command);
        let _guard = self.lock_template(&command.template_id).await;

        let template = self.get_template(&command.template_id).await?;
        check_revision(&template, command.expected_revision)?;
        if template.enabled == command.enabled {
            return Ok(template);
        }

        let mut updated = template;
        updated.enabled = command.enabled;
        updated.revision += 1;
        self.template_repository.store_template(&updated).await?;

        info!(
            "Template '{}' {}",
            updated.id,
            if updated.enabled { "enabled" } else { "disabled" }
        );
        Ok(updated)
    }

    fn validate_window(&self, window_start: NaiveDateTime, window_end: NaiveDateTime) -> ReminderResult<()> {
        if window_end < window_start {
            return Err(ReminderError::validation("Window end must not precede window start"));
        }
        if window_end - window_start > self.max_window {
            return Err(ReminderError::validation(format!(
                "Window is wider than the maximum of {} days",
                self.max_window.num_days()
            )));
        }
        Ok(())
    }

    async fn lock_template(&self, template_id: &str) -> TemplateLockGuard {
        let lock = self
            .template_locks
            .entry(template_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        TemplateLockGuard {
            guard: Some(lock.lock_owned().await),
            template_id: template_id.to_string(),
            locks: Arc::clone(&self.template_locks),
        }
    }

    async fn suppressed_for(&self, template_id: &str) -> ReminderResult<HashSet<NaiveDateTime>> {
        let suppressions = self
            .suppression_repository
            .list_suppressions_for_template(template_id)
            .await?;
        Ok(suppressions.into_iter().map(|s| s.scheduled_at).collect())
    }

    async fn suppressions_by_template(&self) -> ReminderResult<HashMap<String, HashSet<NaiveDateTime>>> {
        let mut by_template: HashMap<String, HashSet<NaiveDateTime>> = HashMap::new();
        for suppression in self.suppression_repository.list_suppressions().await? {
            by_template
                .entry(suppression.template_id)
                .or_default()
                .insert(suppression.scheduled_at);
        }
        Ok(by_template)
    }

    /// Write a resolved plan: successor with its inherited suppressions, then
    /// the suppression, then the updated template.
    ///
    /// A failed step undoes the steps before it.
    async fn apply_plan(&self, plan: &ScopePlan, now: NaiveDateTime) -> ReminderResult<()> {
        if let Some(successor) = &plan.successor {
            self.template_repository.store_template(successor).await?;

            for scheduled_at in &plan.carried_suppressions {
                let carried = Suppression {
                    template_id: successor.id.clone(),
                    scheduled_at: *scheduled_at,
                    suppressed_at: now,
                };
                if let Err(e) = self.suppression_repository.add_suppression(&carried).await {
                    self.rollback(plan, false).await;
                    return Err(e.into());
                }
            }
        }

        let mut suppression_written = false;
        if let Some(scheduled_at) = plan.suppress {
            let suppression = Suppression {
                template_id: plan.updated.id.clone(),
                scheduled_at,
                suppressed_at: now,
            };
            match self.suppression_repository.add_suppression(&suppression).await {
                Ok(added) => suppression_written = added,
                Err(e) => {
                    self.rollback(plan, false).await;
                    return Err(e.into());
                }
            }
        }

        if let Err(e) = self.template_repository.store_template(&plan.updated).await {
            self.rollback(plan, suppression_written).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn rollback(&self, plan: &ScopePlan, suppression_written: bool) {
        if let (true, Some(scheduled_at)) = (suppression_written, plan.suppress) {
            if let Err(e) = self
                .suppression_repository
                .remove_suppression(&plan.updated.id, scheduled_at)
                .await
            {
                error!("Rollback of suppression for '{}' failed: {}", plan.updated.id, e);
            }
        }
        if let Some(successor) = &plan.successor {
            if !plan.carried_suppressions.is_empty() {
                if let Err(e) = self
                    .suppression_repository
                    .delete_suppressions_for_template(&successor.id)
                    .await
                {
                    error!("Rollback of suppressions for '{}' failed: {}", successor.id, e);
                }
            }
            if let Err(e) = self.template_repository.remove_template(&successor.id).await {
                error!("Rollback of template '{}' failed: {}", successor.id, e);
            }
        }
    }
}

/// Holds a per-template lock; drops the map entry once nobody else wants it.
struct TemplateLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    template_id: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Drop for TemplateLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        // A waiter holds its own clone of the mutex, so the count is above one
        self.locks
            .remove_if(&self.template_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

fn check_revision(template: &ReminderTemplate, expected: u64) -> ReminderResult<()> {
    if template.revision != expected {
        warn!(
            "Revision conflict on '{}': expected {}, actual {}",
            template.id, expected, template.revision
        );
        return Err(ReminderError::Conflict {
            expected,
            actual: template.revision,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::occurrences::StatusFilter;
    use crate::domain::commands::templates::TemplateChanges;
    use crate::domain::edit_scope::EditScope;
    use crate::domain::models::{RecurrenceRule, ReminderType, TimeOfDay};
    use crate::storage::csv::test_utils::TestEnvironment;
    use chrono::{Datelike, Weekday};

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    async fn setup_test() -> (ReminderService, TestEnvironment) {
        let env = TestEnvironment::new().await.expect("Failed to create test environment");
        let service = ReminderService::new(Arc::new(env.connection.clone()), 31);
        (service, env)
    }

    fn daily_medication() -> CreateTemplateCommand {
        CreateTemplateCommand {
            reminder_type: ReminderType::Medication,
            title: "Morning Medication".to_string(),
            time_of_day: TimeOfDay::new(9, 0).unwrap(),
            recurrence: RecurrenceRule::Daily,
            notes: Some("Two tablets".to_string()),
            active_from: Some(at("2025-01-01T00:00:00")),
        }
    }

    fn january(start_day: u32, end_day: u32) -> OccurrenceQuery {
        OccurrenceQuery::window(
            at(&format!("2025-01-{:02}T00:00:00", start_day)),
            at(&format!("2025-01-{:02}T23:59:59", end_day)),
        )
    }

    fn times(views: &[OccurrenceView]) -> Vec<NaiveDateTime> {
        views.iter().map(|v| v.occurrence.scheduled_at).collect()
    }

    #[tokio::test]
    async fn test_create_and_get_template() {
        let (service, _env) = setup_test().await;
        let created = service.create_template(daily_medication()).await.unwrap();

        assert!(created.id.starts_with("reminder::"));
        assert_eq!(created.revision, 1);
        assert!(created.enabled);

        let loaded = service.get_template(&created.id).await.unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_fields() {
        let (service, _env) = setup_test().await;

        let mut blank = daily_medication();
        blank.title = "   ".to_string();
        assert!(matches!(
            service.create_template(blank).await,
            Err(ReminderError::Validation(_))
        ));

        let mut no_days = daily_medication();
        no_days.recurrence = RecurrenceRule::WeeklyOnDays { days: vec![] };
        assert!(matches!(
            service.create_template(no_days).await,
            Err(ReminderError::Validation(_))
        ));

        assert!(service
            .list_templates(TemplateListQuery::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_template() {
        let (service, _env) = setup_test().await;
        assert!(matches!(
            service.get_template("reminder::missing").await,
            Err(ReminderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_templates_filters_and_orders() {
        let (service, _env) = setup_test().await;
        let morning = service.create_template(daily_medication()).await.unwrap();

        let mut lunch = daily_medication();
        lunch.reminder_type = ReminderType::Meal;
        lunch.title = "Lunch".to_string();
        lunch.time_of_day = TimeOfDay::new(12, 30).unwrap();
        let lunch = service.create_template(lunch).await.unwrap();

        let mut early = daily_medication();
        early.reminder_type = ReminderType::Hydration;
        early.title = "Glass of water".to_string();
        early.time_of_day = TimeOfDay::new(7, 0).unwrap();
        let early = service.create_template(early).await.unwrap();

        let all = service.list_templates(TemplateListQuery::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![early.id.as_str(), morning.id.as_str(), lunch.id.as_str()]);

        let meals = service
            .list_templates(TemplateListQuery {
                reminder_type: Some(ReminderType::Meal),
                include_retired: false,
            })
            .await
            .unwrap();
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].id, lunch.id);
    }

    #[tokio::test]
    async fn test_daily_scenario_with_one_completion() {
        let (service, _env) = setup_test().await;
        let template = service.create_template(daily_medication()).await.unwrap();

        let toggled = service
            .toggle_completion(&template.id, at("2025-01-01T09:00:00"))
            .await
            .unwrap();
        assert!(toggled.completed);
        assert!(!toggled.previously_completed);

        let views = service.list_visible_occurrences(&january(1, 3)).await.unwrap();
        assert_eq!(
            times(&views),
            vec![
                at("2025-01-01T09:00:00"),
                at("2025-01-02T09:00:00"),
                at("2025-01-03T09:00:00"),
            ]
        );
        assert!(views[0].completed);
        assert!(views[0].completed_at.is_some());
        assert!(!views[1].completed);
        assert!(!views[2].completed);
        assert_eq!(views[0].title, "Morning Medication");
        assert_eq!(views[0].notes.as_deref(), Some("Two tablets"));
    }

    #[tokio::test]
    async fn test_toggle_twice_returns_to_pending() {
        let (service, _env) = setup_test().await;
        let template = service.create_template(daily_medication()).await.unwrap();
        let t1 = at("2025-01-02T09:00:00");

        service.toggle_completion(&template.id, t1).await.unwrap();
        let second = service.toggle_completion(&template.id, t1).await.unwrap();
        assert!(!second.completed);
        assert!(second.previously_completed);

        let summary = service
            .occurrence_summary(at("2025-01-01T00:00:00"), at("2025-01-03T23:59:59"))
            .await
            .unwrap();
        assert_eq!(summary, OccurrenceSummary { total: 3, completed: 0, pending: 3 });
    }

    #[tokio::test]
    async fn test_toggle_rejects_unscheduled_instant() {
        let (service, _env) = setup_test().await;
        let template = service.create_template(daily_medication()).await.unwrap();

        assert!(matches!(
            service.toggle_completion(&template.id, at("2025-01-02T09:30:00")).await,
            Err(ReminderError::NotFound(_))
        ));
        assert!(matches!(
            service.toggle_completion("reminder::missing", at("2025-01-02T09:00:00")).await,
            Err(ReminderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_merge_order_breaks_ties_by_template_id() {
        let (service, _env) = setup_test().await;
        let first = service.create_template(daily_medication()).await.unwrap();

        let mut meal = daily_medication();
        meal.reminder_type = ReminderType::Meal;
        meal.title = "Breakfast".to_string();
        let second = service.create_template(meal).await.unwrap();

        let mut walk = daily_medication();
        walk.reminder_type = ReminderType::Activity;
        walk.title = "Walk".to_string();
        walk.time_of_day = TimeOfDay::new(8, 0).unwrap();
        let walk = service.create_template(walk).await.unwrap();

        let views = service.list_visible_occurrences(&january(1, 1)).await.unwrap();
        assert_eq!(views.len(), 3);
        assert_eq!(views[0].occurrence.template_id, walk.id);

        let mut tied = vec![first.id.clone(), second.id.clone()];
        tied.sort();
        assert_eq!(views[1].occurrence.template_id, tied[0]);
        assert_eq!(views[2].occurrence.template_id, tied[1]);
    }

    #[tokio::test]
    async fn test_occurrence_filters() {
        let (service, _env) = setup_test().await;
        let medication = service.create_template(daily_medication()).await.unwrap();

        let mut water = daily_medication();
        water.reminder_type = ReminderType::Hydration;
        water.title = "Water".to_string();
        water.recurrence = RecurrenceRule::IntervalHours { hours: 6 };
        service.create_template(water).await.unwrap();

        service
            .toggle_completion(&medication.id, at("2025-01-01T09:00:00"))
            .await
            .unwrap();

        let mut query = january(1, 1);
        query.reminder_type = Some(ReminderType::Hydration);
        let hydration = service.list_visible_occurrences(&query).await.unwrap();
        assert_eq!(hydration.len(), 4);
        assert!(hydration.iter().all(|v| v.reminder_type == ReminderType::Hydration));

        let mut query = january(1, 1);
        query.status = StatusFilter::Completed;
        let completed = service.list_visible_occurrences(&query).await.unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].occurrence.template_id, medication.id);

        let mut query = january(1, 1);
        query.status = StatusFilter::Pending;
        assert_eq!(service.list_visible_occurrences(&query).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_window_validation() {
        let (service, _env) = setup_test().await;

        let inverted = OccurrenceQuery::window(at("2025-01-03T00:00:00"), at("2025-01-01T00:00:00"));
        assert!(matches!(
            service.list_visible_occurrences(&inverted).await,
            Err(ReminderError::Validation(_))
        ));

        let too_wide = OccurrenceQuery::window(at("2025-01-01T00:00:00"), at("2025-03-01T00:00:00"));
        assert!(matches!(
            service.list_visible_occurrences(&too_wide).await,
            Err(ReminderError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_weekly_scenario() {
        let (service, _env) = setup_test().await;
        let mut command = daily_medication();
        command.recurrence = RecurrenceRule::weekly([Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        service.create_template(command).await.unwrap();

        // 2025-01-05 is a Sunday
        let query = OccurrenceQuery::window(at("2025-01-05T00:00:00"), at("2025-01-11T23:59:59"));
        let views = service.list_visible_occurrences(&query).await.unwrap();
        let weekdays: Vec<Weekday> = views.iter().map(|v| v.occurrence.scheduled_at.weekday()).collect();
        assert_eq!(weekdays, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
    }

    #[tokio::test]
    async fn test_delete_this_occurrence_only() {
        let (service, _env) = setup_test().await;
        let template = service.create_template(daily_medication()).await.unwrap();

        let result = service
            .delete_template(DeleteTemplateCommand {
                template_id: template.id.clone(),
                scope: Some(EditScope::ThisOccurrenceOnly),
                scheduled_at: Some(at("2025-01-02T09:00:00")),
                expected_revision: 1,
            })
            .await
            .unwrap();
        assert_eq!(result.template.revision, 2);

        let views = service.list_visible_occurrences(&january(1, 3)).await.unwrap();
        assert_eq!(times(&views), vec![at("2025-01-01T09:00:00"), at("2025-01-03T09:00:00")]);

        // The suppressed instant can no longer be completed
        assert!(matches!(
            service.toggle_completion(&template.id, at("2025-01-02T09:00:00")).await,
            Err(ReminderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_requires_scope() {
        let (service, _env) = setup_test().await;
        let template = service.create_template(daily_medication()).await.unwrap();

        let result = service
            .delete_template(DeleteTemplateCommand {
                template_id: template.id.clone(),
                scope: None,
                scheduled_at: None,
                expected_revision: 1,
            })
            .await;
        assert!(matches!(result, Err(ReminderError::Validation(_))));
        assert_eq!(service.get_template(&template.id).await.unwrap().revision, 1);
    }

    #[tokio::test]
    async fn test_delete_entire_template_purges_completions() {
        let (service, env) = setup_test().await;
        let template = service.create_template(daily_medication()).await.unwrap();
        service
            .toggle_completion(&template.id, at("2025-01-01T09:00:00"))
            .await
            .unwrap();
        service
            .toggle_completion(&template.id, at("2025-01-02T09:00:00"))
            .await
            .unwrap();

        let result = service
            .delete_template(DeleteTemplateCommand {
                template_id: template.id.clone(),
                scope: Some(EditScope::EntireTemplate),
                scheduled_at: None,
                expected_revision: 1,
            })
            .await
            .unwrap();
        assert_eq!(result.purged_completions, 2);

        assert!(service.list_visible_occurrences(&january(1, 31)).await.unwrap().is_empty());
        assert!(matches!(
            service.get_template(&template.id).await,
            Err(ReminderError::NotFound(_))
        ));

        let ledger = CompletionLedger::new(CompletionRepository::new(env.connection.clone()));
        assert!(ledger.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edit_this_and_future_scenario() {
        let (service, _env) = setup_test().await;
        let original = service.create_template(daily_medication()).await.unwrap();
        service
            .toggle_completion(&original.id, at("2025-01-01T09:00:00"))
            .await
            .unwrap();
        service
            .toggle_completion(&original.id, at("2025-01-02T09:00:00"))
            .await
            .unwrap();

        let result = service
            .edit_template(EditTemplateCommand {
                template_id: original.id.clone(),
                scope: Some(EditScope::ThisAndFuture),
                scheduled_at: Some(at("2025-01-03T09:00:00")),
                expected_revision: 1,
                changes: TemplateChanges {
                    title: Some("Morning Medication (half dose)".to_string()),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        assert_eq!(result.template.retired_at, Some(at("2025-01-03T09:00:00")));
        let successor = result.created_template.unwrap();
        assert_eq!(successor.active_from, at("2025-01-03T09:00:00"));

        let views = service.list_visible_occurrences(&january(1, 4)).await.unwrap();
        let owners: Vec<(&str, bool)> = views
            .iter()
            .map(|v| (v.occurrence.template_id.as_str(), v.completed))
            .collect();
        assert_eq!(
            owners,
            vec![
                (original.id.as_str(), true),
                (original.id.as_str(), true),
                (successor.id.as_str(), false),
                (successor.id.as_str(), false),
            ]
        );
        assert_eq!(views[2].title, "Morning Medication (half dose)");
        assert_eq!(views[2].occurrence.scheduled_at, at("2025-01-03T09:00:00"));
    }

    #[tokio::test]
    async fn test_edit_this_occurrence_only_moves_single_occurrence() {
        let (service, _env) = setup_test().await;
        let original = service.create_template(daily_medication()).await.unwrap();

        let result = service
            .edit_template(EditTemplateCommand {
                template_id: original.id.clone(),
                scope: Some(EditScope::ThisOccurrenceOnly),
                scheduled_at: Some(at("2025-01-02T09:00:00")),
                expected_revision: 1,
                changes: TemplateChanges {
                    time_of_day: Some(TimeOfDay::new(11, 0).unwrap()),
                    ..Default::default()
                },
            })
            .await
            .unwrap();
        let detached = result.created_template.unwrap();

        let views = service.list_visible_occurrences(&january(1, 3)).await.unwrap();
        assert_eq!(
            times(&views),
            vec![
                at("2025-01-01T09:00:00"),
                at("2025-01-02T11:00:00"),
                at("2025-01-03T09:00:00"),
            ]
        );
        assert_eq!(views[1].occurrence.template_id, detached.id);
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let (service, _env) = setup_test().await;
        let template = service.create_template(daily_medication()).await.unwrap();

        service
            .edit_template(EditTemplateCommand {
                template_id: template.id.clone(),
                scope: Some(EditScope::EntireTemplate),
                scheduled_at: None,
                expected_revision: 1,
                changes: TemplateChanges {
                    notes: Some(None),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        let stale = service
            .edit_template(EditTemplateCommand {
                template_id: template.id.clone(),
                scope: Some(EditScope::EntireTemplate),
                scheduled_at: None,
                expected_revision: 1,
                changes: TemplateChanges {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            })
            .await;
        assert!(matches!(
            stale,
            Err(ReminderError::Conflict { expected: 1, actual: 2 })
        ));

        let current = service.get_template(&template.id).await.unwrap();
        assert_eq!(current.title, "Morning Medication");
        assert!(current.notes.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_edits_with_same_revision_admit_one() {
        let (service, _env) = setup_test().await;
        let template = service.create_template(daily_medication()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..4 {
            let service = service.clone();
            let template_id = template.id.clone();
            handles.push(tokio::spawn(async move {
                service
                    .edit_template(EditTemplateCommand {
                        template_id,
                        scope: Some(EditScope::EntireTemplate),
                        scheduled_at: None,
                        expected_revision: 1,
                        changes: TemplateChanges {
                            title: Some(format!("Title {}", i)),
                            ..Default::default()
                        },
                    })
                    .await
            }));
        }

        let mut succeeded = 0;
        let mut conflicted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(ReminderError::Conflict { .. }) => conflicted += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(succeeded, 1);
        assert_eq!(conflicted, 3);
        assert_eq!(service.get_template(&template.id).await.unwrap().revision, 2);
    }

    #[tokio::test]
    async fn test_set_enabled() {
        let (service, _env) = setup_test().await;
        let template = service.create_template(daily_medication()).await.unwrap();

        let disabled = service
            .set_enabled(SetEnabledCommand {
                template_id: template.id.clone(),
                expected_revision: 1,
                enabled: false,
            })
            .await
            .unwrap();
        assert!(!disabled.enabled);
        assert_eq!(disabled.revision, 2);

        let views = service.list_visible_occurrences(&january(1, 1)).await.unwrap();
        assert_eq!(views.len(), 1);
        assert!(!views[0].enabled);

        let stale = service
            .set_enabled(SetEnabledCommand {
                template_id: template.id.clone(),
                expected_revision: 1,
                enabled: true,
            })
            .await;
        assert!(matches!(stale, Err(ReminderError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_default_active_from_never_precedes_creation() {
        let (service, _env) = setup_test().await;
        let mut command = daily_medication();
        command.recurrence = RecurrenceRule::IntervalHours { hours: 5 };
        command.active_from = None;
        let template = service.create_template(command).await.unwrap();

        assert!(template.active_from >= template.created_at);
        assert!(template.active_from - template.created_at < Duration::minutes(1));

        let day_start = template.created_at.date().and_hms_opt(0, 0, 0).unwrap();
        let query = OccurrenceQuery::window(day_start, day_start + Duration::days(2));
        let views = service.list_visible_occurrences(&query).await.unwrap();
        assert_eq!(views[0].occurrence.scheduled_at, template.active_from);
        assert!(views.iter().all(|v| v.occurrence.scheduled_at >= template.created_at));
    }

    #[tokio::test]
    async fn test_edit_this_and_future_keeps_deleted_occurrences_deleted() {
        let (service, _env) = setup_test().await;
        let original = service.create_template(daily_medication()).await.unwrap();
        service
            .delete_template(DeleteTemplateCommand {
                template_id: original.id.clone(),
                scope: Some(EditScope::ThisOccurrenceOnly),
                scheduled_at: Some(at("2025-01-05T09:00:00")),
                expected_revision: 1,
            })
            .await
            .unwrap();

        let result = service
            .edit_template(EditTemplateCommand {
                template_id: original.id.clone(),
                scope: Some(EditScope::ThisAndFuture),
                scheduled_at: Some(at("2025-01-03T09:00:00")),
                expected_revision: 2,
                changes: TemplateChanges {
                    title: Some("Morning Medication (half dose)".to_string()),
                    ..Default::default()
                },
            })
            .await
            .unwrap();
        let successor = result.created_template.unwrap();

        let views = service.list_visible_occurrences(&january(1, 6)).await.unwrap();
        assert_eq!(
            times(&views),
            vec![
                at("2025-01-01T09:00:00"),
                at("2025-01-02T09:00:00"),
                at("2025-01-03T09:00:00"),
                at("2025-01-04T09:00:00"),
                at("2025-01-06T09:00:00"),
            ]
        );
        assert!(matches!(
            service.toggle_completion(&successor.id, at("2025-01-05T09:00:00")).await,
            Err(ReminderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_template_locks_are_released() {
        let (service, _env) = setup_test().await;
        let template = service.create_template(daily_medication()).await.unwrap();
        service
            .toggle_completion(&template.id, at("2025-01-01T09:00:00"))
            .await
            .unwrap();
        let _ = service
            .toggle_completion("reminder::missing", at("2025-01-01T09:00:00"))
            .await;
        service
            .delete_template(DeleteTemplateCommand {
                template_id: template.id.clone(),
                scope: Some(EditScope::EntireTemplate),
                scheduled_at: None,
                expected_revision: 1,
            })
            .await
            .unwrap();

        assert!(service.template_locks.is_empty());
    }
}
