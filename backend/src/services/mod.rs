//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the repository traits. Pure
//! pieces (expansion, binding, draft validation) take plain values; the
//! orchestrating ones take any [`FullRepository`](crate::db::repository::FullRepository)
//! and run their writes inside one transaction.

pub mod binder;
pub mod conduct;
pub mod curriculum_planner;
pub mod date_window;
pub mod draft_validator;
pub mod expander;
pub mod generator;
pub mod publish;

pub use binder::{BindingContext, CurriculumBinder, MissCause};
pub use conduct::{add_manual_occurrence, mark_conducted};
pub use curriculum_planner::distribute_planned_dates;
pub use date_window::{default_school_week, DateWindow, DateWindowError};
pub use draft_validator::validate_draft;
pub use expander::{FixedHolidays, HolidayCalendar, NoHolidays, TemplateExpander};
pub use generator::{generate, GenerationError, GenerationSettings};
pub use publish::{publish_draft, template_changed_for, PublishError};
