//! Public API surface for the calendar backend.
//!
//! This file consolidates the identifier newtypes and the DTO types of the
//! HTTP API. All types derive Serialize/Deserialize for JSON serialization.

pub use crate::routes::curriculum::DistributeRequest;
pub use crate::routes::curriculum::DistributeResult;
pub use crate::routes::drafts::CollisionRecord;
pub use crate::routes::drafts::CollisionType;
pub use crate::routes::drafts::DraftLessonInput;
pub use crate::routes::drafts::DraftValidationReport;
pub use crate::routes::drafts::DraftValidationRequest;
pub use crate::routes::drafts::NormalizedLesson;
pub use crate::routes::drafts::WeeklyNorm;
pub use crate::routes::generation::BindingWarning;
pub use crate::routes::generation::CollisionDetail;
pub use crate::routes::generation::CollisionReport;
pub use crate::routes::generation::GenerateCalendarRequest;
pub use crate::routes::generation::GenerationSummary;
pub use crate::routes::occurrences::ConductRequest;
pub use crate::routes::occurrences::ConductResult;
pub use crate::routes::occurrences::ManualOccurrenceRequest;
pub use crate::routes::occurrences::OccurrenceQuery;
pub use crate::routes::templates::PublishDraftRequest;
pub use crate::routes::templates::PublishResult;

pub use crate::models::TemplateSummary;

use crate::define_id_type;

define_id_type!(i64, TemplateId);
define_id_type!(i64, SlotId);
define_id_type!(i64, TeacherId);
define_id_type!(i64, ClassId);
define_id_type!(i64, SubjectId);
define_id_type!(i64, RoomId);
define_id_type!(i64, CurriculumPlanId);
define_id_type!(i64, CurriculumSectionId);
define_id_type!(i64, CurriculumEntryId);
define_id_type!(i64, OccurrenceId);

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;
