use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::api::{ClassId, CurriculumEntryId, RoomId, SubjectId, TeacherId};
use crate::models::{default_lesson_kind, hhmm, LessonOccurrence};

/// Query string of the occurrence listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// A lesson added by hand outside any template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOccurrenceRequest {
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    pub duration_minutes: i32,
    #[serde(default = "default_lesson_kind")]
    pub kind: String,
    #[serde(default)]
    pub topic_title: Option<String>,
    #[serde(default)]
    pub curriculum_entry_id: Option<CurriculumEntryId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConductRequest {
    /// Defaults to the current local time.
    #[serde(default)]
    pub at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConductResult {
    pub occurrence: LessonOccurrence,
    /// Whether the bound curriculum entry received its actual date now.
    pub entry_stamped: bool,
}

/// Occurrence route function name constants
pub const LIST_OCCURRENCES: &str = "list_occurrences";
pub const ADD_MANUAL_OCCURRENCE: &str = "add_manual_occurrence";
pub const MARK_CONDUCTED: &str = "mark_conducted";
