//! "What's due" answers for an external poller.
//!
//! The engine never runs a timer. A caller polls [`DueService::dispatch_due`]
//! on its own schedule and receives each pending occurrence of an enabled
//! template once per process lifetime through an [`OccurrenceDueHook`].
//! Only occurrences still inside the horizon are remembered.

use chrono::{Duration, NaiveDateTime};
use dashmap::DashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::commands::occurrences::{OccurrenceQuery, OccurrenceView, StatusFilter};
use crate::domain::errors::ReminderResult;
use crate::domain::models::Occurrence;
use crate::domain::reminder_service::ReminderService;

pub type DueOccurrence = OccurrenceView;

/// Receiver for due occurrences (display, sound, messaging).
pub trait OccurrenceDueHook: Send + Sync {
    fn on_occurrence_due(&self, due: &DueOccurrence);
}

/// Hook that only logs, used by the server binary.
#[derive(Debug, Default)]
pub struct LoggingDueHook;

impl OccurrenceDueHook for LoggingDueHook {
    fn on_occurrence_due(&self, due: &DueOccurrence) {
        info!(
            "Reminder due: [{}] '{}' at {}",
            due.reminder_type, due.title, due.occurrence.scheduled_at
        );
    }
}

#[derive(Clone)]
pub struct DueService {
    reminder_service: ReminderService,
    horizon: Duration,
    dispatched: Arc<DashSet<Occurrence>>,
}

impl DueService {
    pub fn new(reminder_service: ReminderService, due_horizon_hours: u32) -> Self {
        Self {
            reminder_service,
            horizon: Duration::hours(i64::from(due_horizon_hours)),
            dispatched: Arc::new(DashSet::new()),
        }
    }

    /// Invoke `hook` for each pending occurrence of an enabled template
    /// scheduled in `[now - horizon, now]` that was not dispatched before.
    /// Returns how many were dispatched.
    pub async fn dispatch_due(&self, now: NaiveDateTime, hook: &dyn OccurrenceDueHook) -> ReminderResult<usize> {
        let cutoff = now - self.horizon;
        // Anything older can never be due again
        self.dispatched.retain(|occurrence| occurrence.scheduled_at >= cutoff);

        let mut query = OccurrenceQuery::window(cutoff, now);
        query.status = StatusFilter::Pending;
        let candidates = self.reminder_service.list_visible_occurrences(&query).await?;

        let mut dispatched = 0;
        for due in candidates.iter().filter(|v| v.enabled) {
            if !self.dispatched.insert(due.occurrence.clone()) {
                continue;
            }
            hook.on_occurrence_due(due);
            dispatched += 1;
        }

        if dispatched > 0 {
            info!("Dispatched {} due occurrences", dispatched);
        } else {
            debug!("Nothing due at {}", now);
        }
        Ok(dispatched)
    }

    /// Occurrences in `[now, now + horizon]`
    pub async fn upcoming(&self, now: NaiveDateTime) -> ReminderResult<Vec<OccurrenceView>> {
        self.reminder_service
            .list_visible_occurrences(&OccurrenceQuery::window(now, now + self.horizon))
            .await
    }
}
