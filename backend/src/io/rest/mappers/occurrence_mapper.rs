use shared::{
    OccurrenceListResponse, OccurrenceStatusFilter, OccurrenceSummary as DtoOccurrenceSummary,
    ToggleCompletionResponse, VisibleOccurrence,
};

use super::template_mapper::TemplateMapper;
use crate::domain::commands::occurrences::{
    OccurrenceSummary, OccurrenceView, StatusFilter, ToggleCompletionResult,
};

pub struct OccurrenceMapper;

impl OccurrenceMapper {
    pub fn status_to_domain(status: OccurrenceStatusFilter) -> StatusFilter {
        match status {
            OccurrenceStatusFilter::All => StatusFilter::All,
            OccurrenceStatusFilter::Pending => StatusFilter::Pending,
            OccurrenceStatusFilter::Completed => StatusFilter::Completed,
        }
    }

    pub fn to_dto(view: OccurrenceView) -> VisibleOccurrence {
        VisibleOccurrence {
            template_id: view.occurrence.template_id,
            scheduled_at: view.occurrence.scheduled_at,
            completed: view.completed,
            completed_at: view.completed_at,
            reminder_type: TemplateMapper::reminder_type_to_dto(view.reminder_type),
            title: view.title,
            notes: view.notes,
            enabled: view.enabled,
        }
    }

    pub fn to_list_response(views: Vec<OccurrenceView>) -> OccurrenceListResponse {
        OccurrenceListResponse {
            occurrences: views.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn summary_to_dto(summary: OccurrenceSummary) -> DtoOccurrenceSummary {
        DtoOccurrenceSummary {
            total: summary.total,
            completed: summary.completed,
            pending: summary.pending,
        }
    }

    pub fn to_toggle_response(result: ToggleCompletionResult) -> ToggleCompletionResponse {
        ToggleCompletionResponse {
            template_id: result.occurrence.template_id,
            scheduled_at: result.occurrence.scheduled_at,
            completed: result.completed,
            previously_completed: result.previously_completed,
        }
    }
}
