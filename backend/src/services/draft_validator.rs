//! Dry-run validation of an unpublished weekly draft.
//!
//! Nothing here touches the repository. Each lesson is normalized, checked
//! for missing references and unusable times, then every lesson with a usable
//! span goes through the shared clustering engine with the weekday as the
//! grouping day and minutes since midnight as the instant.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Timelike;

use crate::algorithms::{detect_collisions, ResourceKind, Severity, SeverityPolicy, Timed};
use crate::api::{
    ClassId, CollisionRecord, CollisionType, DraftLessonInput, DraftValidationReport,
    DraftValidationRequest, NormalizedLesson, SubjectId,
};
use crate::models::{format_time_of_day, parse_time_of_day, DEFAULT_LESSON_KIND, WEEKDAY_NAMES};

const MINUTES_PER_DAY: i32 = 24 * 60;

/// A lesson that passed the time checks, in minutes since midnight.
#[derive(Debug, Clone)]
struct DraftSpan {
    id: i64,
    weekday: u8,
    start: i32,
    end: i32,
    teacher: Option<i64>,
    class: Option<i64>,
    room: Option<i64>,
}

impl Timed for DraftSpan {
    type Id = i64;
    type Day = u8;
    type Instant = i32;

    fn item_id(&self) -> i64 {
        self.id
    }

    fn day(&self) -> u8 {
        self.weekday
    }

    fn start(&self) -> i32 {
        self.start
    }

    fn end(&self) -> i32 {
        self.end
    }

    fn resource(&self, kind: ResourceKind) -> Option<i64> {
        match kind {
            ResourceKind::Teacher => self.teacher,
            ResourceKind::Class => self.class,
            ResourceKind::Room => self.room,
        }
    }
}

fn collision_type(kind: ResourceKind) -> CollisionType {
    match kind {
        ResourceKind::Teacher => CollisionType::Teacher,
        ResourceKind::Class => CollisionType::Class,
        ResourceKind::Room => CollisionType::Room,
    }
}

fn weekday_label(weekday: u8) -> &'static str {
    WEEKDAY_NAMES
        .get(weekday as usize)
        .copied()
        .unwrap_or("unknown day")
}

fn format_minutes(minutes: i32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Names of the absent required references, in `teacher, class, subject` order.
fn missing_fields(lesson: &DraftLessonInput) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if lesson.teacher_id.is_none() {
        missing.push("teacher");
    }
    if lesson.class_id.is_none() {
        missing.push("class");
    }
    if lesson.subject_id.is_none() {
        missing.push("subject");
    }
    missing
}

/// Interpret weekday, start and duration. The error string describes the
/// first problem found.
fn lesson_minutes(lesson: &DraftLessonInput) -> Result<(u8, i32, i32), String> {
    let weekday = u8::try_from(lesson.weekday)
        .ok()
        .filter(|day| usize::from(*day) < WEEKDAY_NAMES.len())
        .ok_or_else(|| format!("weekday {} is outside 0..6", lesson.weekday))?;
    let start = parse_time_of_day(&lesson.start).map_err(|err| err.to_string())?;
    if lesson.duration_minutes <= 0 {
        return Err(format!(
            "duration {} minutes is not positive",
            lesson.duration_minutes
        ));
    }
    let start_minute = (start.hour() * 60 + start.minute()) as i32;
    let end_minute = start_minute
        .checked_add(lesson.duration_minutes)
        .filter(|end| *end <= MINUTES_PER_DAY)
        .ok_or_else(|| {
            format!(
                "lesson starting at {} runs past midnight",
                format_time_of_day(start)
            )
        })?;
    Ok((weekday, start_minute, end_minute))
}

/// Validate a draft and build the report.
///
/// Record order: per-lesson findings in input order, then overlap clusters
/// by `(dimension, resource, weekday)`, then weekly norm mismatches.
pub fn validate_draft(
    request: &DraftValidationRequest,
    policy: &SeverityPolicy,
) -> DraftValidationReport {
    let mut lessons = Vec::with_capacity(request.lessons.len());
    let mut records = Vec::new();
    let mut spans = Vec::new();
    let mut counts: BTreeMap<(ClassId, SubjectId, String), Vec<i64>> = BTreeMap::new();

    // Synthetic ids start at -(position + 1) and skip ids the caller already uses.
    let mut taken: BTreeSet<i64> = request.lessons.iter().filter_map(|l| l.id).collect();

    for (index, input) in request.lessons.iter().enumerate() {
        let id = match input.id {
            Some(id) => id,
            None => {
                let mut id = -(index as i64 + 1);
                while taken.contains(&id) {
                    id -= 1;
                }
                taken.insert(id);
                id
            }
        };
        let kind = input
            .kind
            .clone()
            .filter(|kind| !kind.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LESSON_KIND.to_string());

        let missing = missing_fields(input);
        if !missing.is_empty() {
            records.push(CollisionRecord {
                kind: CollisionType::MissingFields,
                resource_id: None,
                weekday: Some(input.weekday),
                lesson_ids: vec![id],
                severity: Severity::Warning,
                message: format!("Lesson {} is missing fields: {}", id, missing.join(", ")),
            });
        }

        let mut start = input.start.trim().to_string();
        let mut end = None;
        match lesson_minutes(input) {
            Ok((weekday, start_minute, end_minute)) => {
                start = format_minutes(start_minute);
                end = Some(format_minutes(end_minute));
                spans.push(DraftSpan {
                    id,
                    weekday,
                    start: start_minute,
                    end: end_minute,
                    teacher: input.teacher_id.map(|t| t.value()),
                    class: input.class_id.map(|c| c.value()),
                    room: input.room_id.map(|r| r.value()),
                });
                if let (Some(class), Some(subject)) = (input.class_id, input.subject_id) {
                    counts
                        .entry((class, subject, kind.clone()))
                        .or_default()
                        .push(id);
                }
            }
            Err(problem) => records.push(CollisionRecord {
                kind: CollisionType::InvalidTime,
                resource_id: None,
                weekday: Some(input.weekday),
                lesson_ids: vec![id],
                severity: Severity::Error,
                message: format!("Lesson {} has an invalid time: {}", id, problem),
            }),
        }

        lessons.push(NormalizedLesson {
            id,
            teacher_id: input.teacher_id,
            class_id: input.class_id,
            subject_id: input.subject_id,
            room_id: input.room_id,
            weekday: input.weekday,
            start,
            end,
            duration_minutes: input.duration_minutes,
            kind,
            curriculum_hint: input.curriculum_hint.clone(),
        });
    }

    for cluster in detect_collisions(&spans, policy) {
        records.push(CollisionRecord {
            kind: collision_type(cluster.kind),
            resource_id: Some(cluster.resource_id),
            weekday: Some(i32::from(cluster.day)),
            message: format!(
                "Overlapping lessons for {} {} on {}",
                cluster.kind,
                cluster.resource_id,
                weekday_label(cluster.day)
            ),
            lesson_ids: cluster.members,
            severity: cluster.severity,
        });
    }

    for norm in &request.weekly_norms {
        if norm.lessons_per_week == 0 {
            continue;
        }
        let key = (norm.class_id, norm.subject_id, norm.kind.clone());
        let ids = counts.get(&key).cloned().unwrap_or_default();
        if ids.len() != norm.lessons_per_week as usize {
            records.push(CollisionRecord {
                kind: CollisionType::WeeklyNorm,
                resource_id: Some(norm.class_id.value()),
                weekday: None,
                message: format!(
                    "Class {} subject {} ({}): {} of {} weekly lessons",
                    norm.class_id,
                    norm.subject_id,
                    norm.kind,
                    ids.len(),
                    norm.lessons_per_week
                ),
                lesson_ids: ids,
                severity: Severity::Warning,
            });
        }
    }

    let (errors, warnings): (Vec<_>, Vec<_>) = records
        .iter()
        .cloned()
        .partition(|record| record.severity == Severity::Error);

    log::debug!(
        "Draft validation: {} lessons, {} errors, {} warnings",
        lessons.len(),
        errors.len(),
        warnings.len()
    );

    DraftValidationReport {
        lessons,
        collisions: records,
        errors,
        warnings,
    }
}
