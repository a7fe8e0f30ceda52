//! Weekly lesson templates and their recurring slots.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{ClassId, RoomId, SlotId, SubjectId, TeacherId, TemplateId};
use crate::db::checksum::calculate_checksum;
use crate::models::time::{format_time_of_day, hhmm};

/// Default lesson kind when none is given.
pub const DEFAULT_LESSON_KIND: &str = "lesson";

pub fn default_lesson_kind() -> String {
    DEFAULT_LESSON_KIND.to_string()
}

/// One lesson of the weekly pattern.
///
/// Resource references are optional because template rows come from an
/// external store; the generator refuses to expand a slot with a missing
/// teacher, class or subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringSlot {
    pub id: Option<SlotId>,
    pub class_id: Option<ClassId>,
    pub subject_id: Option<SubjectId>,
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u8,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    pub duration_minutes: i32,
    #[serde(default = "default_lesson_kind")]
    pub kind: String,
}

impl RecurringSlot {
    /// Names of the required resource references that are absent.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.teacher_id.is_none() {
            missing.push("teacher");
        }
        if self.class_id.is_none() {
            missing.push("class");
        }
        if self.subject_id.is_none() {
            missing.push("subject");
        }
        missing
    }

    /// Whether this slot teaches `subject` to `class`.
    pub fn serves(&self, subject: SubjectId, class: ClassId) -> bool {
        self.subject_id == Some(subject) && self.class_id == Some(class)
    }
}

/// A named bag of recurring slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: Option<TemplateId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub slots: Vec<RecurringSlot>,
}

impl Template {
    pub fn new(name: impl Into<String>, slots: Vec<RecurringSlot>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            created_at: Utc::now(),
            slots,
        }
    }

    /// Slots serving one (subject, class) pair in `(weekday, start)` order.
    pub fn slots_for(&self, subject: SubjectId, class: ClassId) -> Vec<&RecurringSlot> {
        let mut slots: Vec<&RecurringSlot> = self
            .slots
            .iter()
            .filter(|slot| slot.serves(subject, class))
            .collect();
        slots.sort_by_key(|slot| (slot.weekday, slot.start, slot.id));
        slots
    }

    /// SHA-256 over the normalized slot list.
    ///
    /// Slot ids and template metadata are excluded, so two templates with the
    /// same lessons share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut rows: Vec<String> = self
            .slots
            .iter()
            .map(|slot| {
                format!(
                    "{}|{}|{}|{}|{}|{}|{}|{}",
                    slot.weekday,
                    format_time_of_day(slot.start),
                    slot.duration_minutes,
                    opt(slot.teacher_id.map(|id| id.value())),
                    opt(slot.class_id.map(|id| id.value())),
                    opt(slot.subject_id.map(|id| id.value())),
                    opt(slot.room_id.map(|id| id.value())),
                    slot.kind
                )
            })
            .collect();
        rows.sort();
        calculate_checksum(&rows.join("\n"))
    }
}

fn opt(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Whether the weekly pattern of one (subject, class) pair differs between
/// two templates, comparing `(weekday, start, teacher)` sets.
pub fn pattern_changed(old: &Template, new: &Template, subject: SubjectId, class: ClassId) -> bool {
    use std::collections::BTreeSet;

    let key = |template: &Template| -> BTreeSet<(u8, NaiveTime, Option<TeacherId>)> {
        template
            .slots_for(subject, class)
            .into_iter()
            .map(|slot| (slot.weekday, slot.start, slot.teacher_id))
            .collect()
    };
    key(old) != key(new)
}

/// Lightweight listing row for templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub template_id: TemplateId,
    pub name: String,
    pub slot_count: usize,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
