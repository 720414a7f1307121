use chrono::Weekday;
use shared::{
    CreateTemplateRequest, CreateTemplateResponse, DayOfWeek, DeleteTemplateRequest,
    DeleteTemplateResponse, EditScope as DtoEditScope, EditTemplateRequest, EditTemplateResponse,
    Recurrence, ReminderTemplate as DtoTemplate, ReminderType as DtoReminderType,
    TemplateChanges as DtoTemplateChanges, TemplateListResponse, TemplateResponse,
};

use crate::domain::commands::templates::{
    CreateTemplateCommand, DeleteTemplateCommand, DeleteTemplateResult, EditTemplateCommand,
    EditTemplateResult, TemplateChanges,
};
use crate::domain::edit_scope::EditScope;
use crate::domain::errors::ReminderResult;
use crate::domain::models::{RecurrenceRule, ReminderTemplate, ReminderType, TimeOfDay};

pub struct TemplateMapper;

impl TemplateMapper {
    pub fn reminder_type_to_domain(dto_type: DtoReminderType) -> ReminderType {
        match dto_type {
            DtoReminderType::Medication => ReminderType::Medication,
            DtoReminderType::Meal => ReminderType::Meal,
            DtoReminderType::Activity => ReminderType::Activity,
            DtoReminderType::Hydration => ReminderType::Hydration,
            DtoReminderType::Message => ReminderType::Message,
        }
    }

    pub fn reminder_type_to_dto(domain_type: ReminderType) -> DtoReminderType {
        match domain_type {
            ReminderType::Medication => DtoReminderType::Medication,
            ReminderType::Meal => DtoReminderType::Meal,
            ReminderType::Activity => DtoReminderType::Activity,
            ReminderType::Hydration => DtoReminderType::Hydration,
            ReminderType::Message => DtoReminderType::Message,
        }
    }

    fn day_to_domain(day: DayOfWeek) -> Weekday {
        match day {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }

    fn day_to_dto(day: Weekday) -> DayOfWeek {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }

    /// Presets are normalized to an explicit weekly day list
    pub fn recurrence_to_domain(dto: Recurrence) -> RecurrenceRule {
        match dto {
            Recurrence::Daily => RecurrenceRule::Daily,
            Recurrence::Weekly { days } => RecurrenceRule::weekly(days.into_iter().map(Self::day_to_domain)),
            Recurrence::Weekdays => RecurrenceRule::weekdays(),
            Recurrence::Weekends => RecurrenceRule::weekends(),
            Recurrence::IntervalHours { hours } => RecurrenceRule::IntervalHours { hours },
            Recurrence::Once => RecurrenceRule::Once,
        }
    }

    pub fn recurrence_to_dto(rule: RecurrenceRule) -> Recurrence {
        match rule {
            RecurrenceRule::Daily => Recurrence::Daily,
            RecurrenceRule::WeeklyOnDays { days } => Recurrence::Weekly {
                days: days.into_iter().map(Self::day_to_dto).collect(),
            },
            RecurrenceRule::IntervalHours { hours } => Recurrence::IntervalHours { hours },
            RecurrenceRule::Once => Recurrence::Once,
        }
    }

    pub fn scope_to_domain(scope: DtoEditScope) -> EditScope {
        match scope {
            DtoEditScope::ThisOccurrenceOnly => EditScope::ThisOccurrenceOnly,
            DtoEditScope::ThisAndFuture => EditScope::ThisAndFuture,
            DtoEditScope::EntireTemplate => EditScope::EntireTemplate,
        }
    }

    pub fn to_dto(domain: ReminderTemplate) -> DtoTemplate {
        DtoTemplate {
            id: domain.id,
            reminder_type: Self::reminder_type_to_dto(domain.reminder_type),
            title: domain.title,
            time_of_day: domain.time_of_day.to_string(),
            recurrence: Self::recurrence_to_dto(domain.recurrence),
            notes: domain.notes,
            created_at: domain.created_at,
            active_from: domain.active_from,
            retired_at: domain.retired_at,
            revision: domain.revision,
            enabled: domain.enabled,
        }
    }

    pub fn to_template_response(domain: ReminderTemplate) -> TemplateResponse {
        TemplateResponse {
            template: Self::to_dto(domain),
        }
    }

    pub fn to_list_response(templates: Vec<ReminderTemplate>) -> TemplateListResponse {
        TemplateListResponse {
            templates: templates.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_create_command(request: CreateTemplateRequest) -> ReminderResult<CreateTemplateCommand> {
        Ok(CreateTemplateCommand {
            reminder_type: Self::reminder_type_to_domain(request.reminder_type),
            title: request.title,
            time_of_day: TimeOfDay::parse(&request.time_of_day)?,
            recurrence: Self::recurrence_to_domain(request.recurrence),
            notes: request.notes,
            active_from: request.active_from,
        })
    }

    pub fn to_create_response(domain: ReminderTemplate) -> CreateTemplateResponse {
        let success_message = format!("Reminder '{}' created", domain.title);
        CreateTemplateResponse {
            template: Self::to_dto(domain),
            success_message,
        }
    }

    /// An empty `notes` string clears the notes
    pub fn to_changes(dto: DtoTemplateChanges) -> ReminderResult<TemplateChanges> {
        let time_of_day = match dto.time_of_day {
            Some(value) => Some(TimeOfDay::parse(&value)?),
            None => None,
        };
        Ok(TemplateChanges {
            reminder_type: dto.reminder_type.map(Self::reminder_type_to_domain),
            title: dto.title,
            time_of_day,
            recurrence: dto.recurrence.map(Self::recurrence_to_domain),
            notes: dto
                .notes
                .map(|notes| if notes.trim().is_empty() { None } else { Some(notes) }),
        })
    }

    pub fn to_edit_command(template_id: String, request: EditTemplateRequest) -> ReminderResult<EditTemplateCommand> {
        Ok(EditTemplateCommand {
            template_id,
            scope: request.scope.map(Self::scope_to_domain),
            scheduled_at: request.scheduled_at,
            expected_revision: request.expected_revision,
            changes: Self::to_changes(request.changes)?,
        })
    }

    pub fn to_edit_response(result: EditTemplateResult) -> EditTemplateResponse {
        EditTemplateResponse {
            template: Self::to_dto(result.template),
            created_template: result.created_template.map(Self::to_dto),
            success_message: result.success_message,
        }
    }

    pub fn to_delete_command(template_id: String, request: DeleteTemplateRequest) -> DeleteTemplateCommand {
        DeleteTemplateCommand {
            template_id,
            scope: request.scope.map(Self::scope_to_domain),
            scheduled_at: request.scheduled_at,
            expected_revision: request.expected_revision,
        }
    }

    pub fn to_delete_response(result: DeleteTemplateResult) -> DeleteTemplateResponse {
        DeleteTemplateResponse {
            template: Self::to_dto(result.template),
            success_message: result.success_message,
        }
    }
}
