//! Conversions between the `shared` DTOs and domain types.

pub mod occurrence_mapper;
pub mod template_mapper;

pub use occurrence_mapper::OccurrenceMapper;
pub use template_mapper::TemplateMapper;
