//! Draft promotion: validate, store as a template, swap the active pointer.

use log::info;

use crate::algorithms::SeverityPolicy;
use crate::api::{
    ClassId, CollisionRecord, CollisionType, DraftValidationReport, DraftValidationRequest,
    NormalizedLesson, PublishDraftRequest, PublishResult, SubjectId, TemplateId,
};
use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{parse_time_of_day, pattern_changed, RecurringSlot, Template};
use crate::services::draft_validator::validate_draft;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("template name must not be empty")]
    EmptyName,

    #[error("draft has no lessons")]
    EmptyDraft,

    #[error("draft has {} blocking problem(s)", .errors.len())]
    Rejected { errors: Vec<CollisionRecord> },

    #[error("draft has lessons without teacher, class or subject")]
    MissingFields { records: Vec<CollisionRecord> },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl PublishError {
    /// Machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            PublishError::EmptyName => "EMPTY_NAME",
            PublishError::EmptyDraft => "EMPTY_DRAFT",
            PublishError::Rejected { .. } => "DRAFT_HAS_ERRORS",
            PublishError::MissingFields { .. } => "MISSING_RESOURCE",
            PublishError::Repository(_) => "REPOSITORY_ERROR",
        }
    }

    /// Records that caused the rejection, if any.
    pub fn records(&self) -> &[CollisionRecord] {
        match self {
            PublishError::Rejected { errors } => errors,
            PublishError::MissingFields { records } => records,
            _ => &[],
        }
    }
}

/// Turn a normalized draft lesson into a slot.
///
/// Only called after validation passed, so every reference is present and the
/// time parses; anything else yields `None`.
fn slot_from_lesson(lesson: &NormalizedLesson) -> Option<RecurringSlot> {
    let weekday = u8::try_from(lesson.weekday).ok()?;
    let start = parse_time_of_day(&lesson.start).ok()?;
    Some(RecurringSlot {
        // Draft ids are editor-local; stored slots get fresh ids.
        id: None,
        class_id: Some(lesson.class_id?),
        subject_id: Some(lesson.subject_id?),
        teacher_id: Some(lesson.teacher_id?),
        room_id: lesson.room_id,
        weekday,
        start,
        duration_minutes: lesson.duration_minutes,
        kind: lesson.kind.clone(),
    })
}

/// Check a draft for publication without writing anything.
pub fn check_publishable(
    request: &PublishDraftRequest,
    policy: &SeverityPolicy,
) -> Result<DraftValidationReport, PublishError> {
    if request.name.trim().is_empty() {
        return Err(PublishError::EmptyName);
    }
    if request.lessons.is_empty() {
        return Err(PublishError::EmptyDraft);
    }
    let report = validate_draft(
        &DraftValidationRequest {
            lessons: request.lessons.clone(),
            weekly_norms: request.weekly_norms.clone(),
        },
        policy,
    );
    if report.has_errors() {
        return Err(PublishError::Rejected {
            errors: report.errors,
        });
    }
    if report.has_missing_fields() {
        let records = report
            .warnings
            .into_iter()
            .filter(|record| record.kind == CollisionType::MissingFields)
            .collect();
        return Err(PublishError::MissingFields { records });
    }
    Ok(report)
}

/// Validate a draft and, if clean, store it as a new template and make it
/// the active one in a single transaction.
pub async fn publish_draft<R: FullRepository + ?Sized>(
    repo: &R,
    request: &PublishDraftRequest,
    policy: &SeverityPolicy,
) -> Result<PublishResult, PublishError> {
    let report = check_publishable(request, policy)?;

    let slots: Vec<RecurringSlot> = report.lessons.iter().filter_map(slot_from_lesson).collect();
    let mut template = Template::new(request.name.trim(), slots);
    template.description = request.description.clone().unwrap_or_default();

    let mut tx = repo.begin().await?;
    let stored = tx.store_template(&template).await?;
    let template_id = stored.id.ok_or_else(|| {
        RepositoryError::internal("stored template came back without an id")
    })?;
    tx.set_active_template(template_id).await?;
    tx.commit().await?;

    info!(
        "Published template {} '{}' with {} slots",
        template_id,
        stored.name,
        stored.slots.len()
    );

    Ok(PublishResult {
        template_id,
        slot_count: stored.slots.len(),
        fingerprint: stored.fingerprint(),
    })
}

/// Whether the weekly pattern of one (subject, class) pair differs between
/// two stored templates.
pub async fn template_changed_for<R: FullRepository + ?Sized>(
    repo: &R,
    old: TemplateId,
    new: TemplateId,
    subject: SubjectId,
    class: ClassId,
) -> Result<bool, RepositoryError> {
    let old = repo.get_template(old).await?;
    let new = repo.get_template(new).await?;
    Ok(pattern_changed(&old, &new, subject, class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DraftLessonInput, TeacherId};

    fn lesson(teacher: i64, weekday: i32, start: &str) -> DraftLessonInput {
        DraftLessonInput {
            id: None,
            teacher_id: Some(TeacherId::new(teacher)),
            class_id: Some(ClassId::new(1)),
            subject_id: Some(SubjectId::new(2)),
            room_id: None,
            weekday,
            start: start.to_string(),
            duration_minutes: 45,
            curriculum_hint: None,
            kind: None,
        }
    }

    fn request(lessons: Vec<DraftLessonInput>) -> PublishDraftRequest {
        PublishDraftRequest {
            name: "Autumn".to_string(),
            description: None,
            lessons,
            weekly_norms: Vec::new(),
        }
    }

    #[test]
    fn test_clean_draft_is_publishable() {
        let report = check_publishable(
            &request(vec![lesson(1, 0, "09:00"), lesson(1, 0, "10:00")]),
            &SeverityPolicy::default(),
        )
        .unwrap();
        let slots: Vec<RecurringSlot> = report.lessons.iter().filter_map(slot_from_lesson).collect();
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|slot| slot.id.is_none()));
    }

    #[test]
    fn test_overlap_blocks_publish() {
        let err = check_publishable(
            &request(vec![lesson(1, 0, "09:00"), lesson(1, 0, "09:30")]),
            &SeverityPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), "DRAFT_HAS_ERRORS");
        assert_eq!(err.records().len(), 2);
    }

    #[test]
    fn test_missing_fields_block_publish() {
        let mut incomplete = lesson(1, 0, "09:00");
        incomplete.teacher_id = None;
        let err = check_publishable(&request(vec![incomplete]), &SeverityPolicy::default())
            .unwrap_err();
        assert!(matches!(err, PublishError::MissingFields { .. }));
        assert_eq!(err.code(), "MISSING_RESOURCE");
    }

    #[test]
    fn test_empty_name_and_draft() {
        let mut req = request(vec![lesson(1, 0, "09:00")]);
        req.name = "  ".to_string();
        assert!(matches!(
            check_publishable(&req, &SeverityPolicy::default()),
            Err(PublishError::EmptyName)
        ));
        assert!(matches!(
            check_publishable(&request(vec![]), &SeverityPolicy::default()),
            Err(PublishError::EmptyDraft)
        ));
    }
}
