use serde::{Deserialize, Serialize};

use crate::algorithms::Severity;
use crate::api::{ClassId, RoomId, SubjectId, TeacherId};
use crate::models::default_lesson_kind;

/// One lesson of an unpublished draft, as sent by the editor.
///
/// `weekday`, `start` and `duration_minutes` are kept loose so that bad values
/// come back as `invalid_time` records instead of a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLessonInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub class_id: Option<ClassId>,
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    pub weekday: i32,
    pub start: String,
    #[serde(default)]
    pub duration_minutes: i32,
    #[serde(default)]
    pub curriculum_hint: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

/// Expected lessons per week for one (class, subject, kind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyNorm {
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    #[serde(default = "default_lesson_kind")]
    pub kind: String,
    pub lessons_per_week: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftValidationRequest {
    pub lessons: Vec<DraftLessonInput>,
    #[serde(default)]
    pub weekly_norms: Vec<WeeklyNorm>,
}

/// A draft lesson with a stable id and canonical `"HH:MM"` times.
///
/// Lessons sent without an id get `-(position + 1)`. `end` is absent when the
/// start or duration could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedLesson {
    pub id: i64,
    pub teacher_id: Option<TeacherId>,
    pub class_id: Option<ClassId>,
    pub subject_id: Option<SubjectId>,
    pub room_id: Option<RoomId>,
    pub weekday: i32,
    pub start: String,
    pub end: Option<String>,
    pub duration_minutes: i32,
    pub kind: String,
    pub curriculum_hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionType {
    Teacher,
    Class,
    Room,
    MissingFields,
    InvalidTime,
    WeeklyNorm,
}

impl CollisionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionType::Teacher => "teacher",
            CollisionType::Class => "class",
            CollisionType::Room => "room",
            CollisionType::MissingFields => "missing_fields",
            CollisionType::InvalidTime => "invalid_time",
            CollisionType::WeeklyNorm => "weekly_norm",
        }
    }
}

/// One finding of the draft validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionRecord {
    #[serde(rename = "type")]
    pub kind: CollisionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<i32>,
    pub lesson_ids: Vec<i64>,
    pub severity: Severity,
    pub message: String,
}

/// Dry-run report. `collisions` holds every record; `errors` and `warnings`
/// split the same records by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftValidationReport {
    pub lessons: Vec<NormalizedLesson>,
    pub collisions: Vec<CollisionRecord>,
    pub errors: Vec<CollisionRecord>,
    pub warnings: Vec<CollisionRecord>,
}

impl DraftValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether any lesson lacks a teacher, class or subject.
    pub fn has_missing_fields(&self) -> bool {
        self.collisions
            .iter()
            .any(|record| record.kind == CollisionType::MissingFields)
    }
}

/// Draft route function name constant
pub const VALIDATE_DRAFT: &str = "validate_draft";
