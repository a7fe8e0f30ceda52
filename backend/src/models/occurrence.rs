//! Dated lesson occurrences.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::algorithms::clustering::{ResourceKind, Timed};
use crate::api::{
    ClassId, CurriculumEntryId, OccurrenceId, RoomId, SlotId, SubjectId, TeacherId, TemplateId,
};

/// Where an occurrence came from. Only generated rows are replaced on
/// regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccurrenceSource {
    Template,
    Manual,
    Import,
}

impl OccurrenceSource {
    pub fn is_generated(&self) -> bool {
        matches!(self, OccurrenceSource::Template)
    }
}

/// One concrete, dated lesson.
///
/// Times are school-local wall-clock values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonOccurrence {
    pub id: Option<OccurrenceId>,
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_minutes: i32,
    pub kind: String,
    pub source: OccurrenceSource,
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    #[serde(default)]
    pub origin_slot_id: Option<SlotId>,
    pub version: u32,
    #[serde(default)]
    pub batch_id: Option<Uuid>,
    #[serde(default)]
    pub curriculum_entry_id: Option<CurriculumEntryId>,
    #[serde(default)]
    pub topic_ordinal: Option<u32>,
    pub topic_title: String,
    #[serde(default)]
    pub conducted_at: Option<NaiveDateTime>,
}

impl LessonOccurrence {
    pub fn is_conducted(&self) -> bool {
        self.conducted_at.is_some()
    }
}

impl Timed for LessonOccurrence {
    type Id = i64;
    type Day = NaiveDate;
    type Instant = NaiveDateTime;

    fn item_id(&self) -> i64 {
        self.id.map(|id| id.value()).unwrap_or_default()
    }

    fn day(&self) -> NaiveDate {
        self.date
    }

    fn start(&self) -> NaiveDateTime {
        self.start
    }

    fn end(&self) -> NaiveDateTime {
        self.end
    }

    fn resource(&self, kind: ResourceKind) -> Option<i64> {
        match kind {
            ResourceKind::Teacher => Some(self.teacher_id.value()),
            ResourceKind::Class => Some(self.class_id.value()),
            ResourceKind::Room => self.room_id.map(|id| id.value()),
        }
    }
}
