//! Multi-step flows: publishing drafts, distributing curricula and generating
//! from the result.

mod support;

use support::{date, seed_active_template, seed_plan, slot};

use lesson_calendar::api::{
    ClassId, CollisionType, DistributeRequest, DraftLessonInput, DraftValidationRequest,
    GenerateCalendarRequest, PublishDraftRequest, SubjectId, TeacherId, WeeklyNorm,
};
use lesson_calendar::db::repositories::LocalRepository;
use lesson_calendar::db::repository::{CurriculumRepository, OccurrenceRepository, TemplateRepository};
use lesson_calendar::db::services::{audit_collisions, get_active_template, list_templates};
use lesson_calendar::services::conduct::mark_conducted;
use lesson_calendar::services::curriculum_planner::distribute_planned_dates;
use lesson_calendar::services::draft_validator::validate_draft;
use lesson_calendar::services::expander::{FixedHolidays, NoHolidays};
use lesson_calendar::services::generator::{generate, GenerationSettings};
use lesson_calendar::services::publish::{publish_draft, template_changed_for};
use lesson_calendar::algorithms::{ResourceKind, SeverityPolicy};

fn lesson(teacher: i64, class: i64, weekday: i32, start: &str) -> DraftLessonInput {
    DraftLessonInput {
        id: None,
        teacher_id: Some(TeacherId::new(teacher)),
        class_id: Some(ClassId::new(class)),
        subject_id: Some(SubjectId::new(1)),
        room_id: None,
        weekday,
        start: start.to_string(),
        duration_minutes: 45,
        curriculum_hint: None,
        kind: None,
    }
}

fn draft(name: &str, lessons: Vec<DraftLessonInput>) -> PublishDraftRequest {
    PublishDraftRequest {
        name: name.to_string(),
        description: None,
        lessons,
        weekly_norms: vec![],
    }
}

#[tokio::test]
async fn test_publish_generate_conduct() {
    let repo = LocalRepository::new();
    let policy = SeverityPolicy::default();
    let published = publish_draft(
        &repo,
        &draft("Autumn", vec![lesson(7, 1, 0, "09:00"), lesson(7, 1, 3, "11:00")]),
        &policy,
    )
    .await
    .unwrap();
    assert_eq!(published.slot_count, 2);
    assert_eq!(published.fingerprint.len(), 64);

    let active = get_active_template(&repo).await.unwrap();
    assert_eq!(active.id, Some(published.template_id));
    assert_eq!(active.name, "Autumn");

    let plan = seed_plan(&repo, 1, 4).await;
    let summary = generate(
        &repo,
        &GenerateCalendarRequest::new(date(9, 1), date(9, 7)),
        &GenerationSettings::default(),
        &NoHolidays,
    )
    .await
    .unwrap();
    assert_eq!(summary.template_id, published.template_id);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.created_with_binding, 2);

    let rows = repo.list_occurrences(date(9, 1), date(9, 7)).await.unwrap();
    assert_eq!(rows[1].date, date(9, 4));
    assert_eq!(rows[1].topic_title, "Topic 2");

    let thursday = rows[1].id.unwrap();
    mark_conducted(&repo, thursday, None).await.unwrap();
    let plan = repo.get_plan(plan.id.unwrap()).await.unwrap();
    let entries = plan.entries_in_order();
    assert_eq!(entries[0].actual_date, None);
    assert_eq!(entries[1].actual_date, Some(date(9, 4)));
    assert!(repo.get_occurrence(thursday).await.unwrap().is_conducted());
}

#[tokio::test]
async fn test_rejected_draft_keeps_active_template() {
    let repo = LocalRepository::new();
    let policy = SeverityPolicy::default();
    let first = publish_draft(&repo, &draft("Clean", vec![lesson(7, 1, 0, "09:00")]), &policy)
        .await
        .unwrap();

    let err = publish_draft(
        &repo,
        &draft(
            "Clash",
            vec![lesson(7, 1, 0, "09:00"), lesson(7, 2, 0, "09:15")],
        ),
        &policy,
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "DRAFT_HAS_ERRORS");
    assert_eq!(err.records()[0].kind, CollisionType::Teacher);

    let mut incomplete = lesson(7, 1, 1, "09:00");
    incomplete.subject_id = None;
    let err = publish_draft(&repo, &draft("Incomplete", vec![incomplete]), &policy)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "MISSING_RESOURCE");

    assert_eq!(repo.active_template_id().await.unwrap(), Some(first.template_id));
    assert_eq!(list_templates(&repo).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_pattern_change_between_templates() {
    let repo = LocalRepository::new();
    let policy = SeverityPolicy::default();
    let old = publish_draft(
        &repo,
        &draft("v1", vec![lesson(7, 1, 0, "09:00"), lesson(8, 2, 0, "09:00")]),
        &policy,
    )
    .await
    .unwrap();
    let new = publish_draft(
        &repo,
        &draft("v2", vec![lesson(7, 1, 1, "09:00"), lesson(8, 2, 0, "09:00")]),
        &policy,
    )
    .await
    .unwrap();

    let subject = SubjectId::new(1);
    assert!(
        template_changed_for(&repo, old.template_id, new.template_id, subject, ClassId::new(1))
            .await
            .unwrap()
    );
    assert!(
        !template_changed_for(&repo, old.template_id, new.template_id, subject, ClassId::new(2))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_distributed_dates_drive_binding() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1), slot(2, "10:00", 7, 1)]).await;
    let plan = seed_plan(&repo, 1, 4).await;
    let plan_id = plan.id.unwrap();

    let result = distribute_planned_dates(
        &repo,
        plan_id,
        &DistributeRequest {
            template_id: None,
            start_date: Some(date(9, 1)),
        },
        &NoHolidays,
    )
    .await
    .unwrap();
    assert_eq!(result.updated, 4);
    assert_eq!(result.last_date, Some(date(9, 10)));

    let planned: Vec<_> = repo
        .get_plan(plan_id)
        .await
        .unwrap()
        .entries_in_order()
        .into_iter()
        .map(|entry| entry.planned_date)
        .collect();
    assert_eq!(
        planned,
        vec![
            Some(date(9, 1)),
            Some(date(9, 3)),
            Some(date(9, 8)),
            Some(date(9, 10))
        ]
    );

    // The second week is generated first; exact dates pick topics 3 and 4.
    let summary = generate(
        &repo,
        &GenerateCalendarRequest::new(date(9, 8), date(9, 14)),
        &GenerationSettings::default(),
        &NoHolidays,
    )
    .await
    .unwrap();
    assert_eq!(summary.created_with_binding, 2);
    let titles: Vec<String> = repo
        .list_occurrences(date(9, 8), date(9, 14))
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.topic_title)
        .collect();
    assert_eq!(titles, vec!["Topic 3", "Topic 4"]);
}

#[tokio::test]
async fn test_distribution_skips_holidays() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1)]).await;
    let plan = seed_plan(&repo, 1, 2).await;
    let holidays: FixedHolidays = [date(9, 1)].into_iter().collect();

    let result = distribute_planned_dates(
        &repo,
        plan.id.unwrap(),
        &DistributeRequest {
            template_id: None,
            start_date: Some(date(9, 1)),
        },
        &holidays,
    )
    .await
    .unwrap();
    assert_eq!(result.last_date, Some(date(9, 15)));
}

#[tokio::test]
async fn test_distribution_requires_template() {
    let repo = LocalRepository::new();
    let plan = seed_plan(&repo, 1, 2).await;
    let err = distribute_planned_dates(&repo, plan.id.unwrap(), &DistributeRequest::default(), &NoHolidays)
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    assert!(err.to_string().contains("No active template"));
}

#[tokio::test]
async fn test_audit_finds_manual_overlaps() {
    use lesson_calendar::api::ManualOccurrenceRequest;
    use lesson_calendar::models::parse_time_of_day;
    use lesson_calendar::services::conduct::add_manual_occurrence;

    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1)]).await;
    generate(
        &repo,
        &GenerateCalendarRequest::new(date(9, 1), date(9, 7)),
        &GenerationSettings::default(),
        &NoHolidays,
    )
    .await
    .unwrap();

    add_manual_occurrence(
        &repo,
        &ManualOccurrenceRequest {
            class_id: ClassId::new(5),
            subject_id: SubjectId::new(2),
            teacher_id: TeacherId::new(7),
            room_id: None,
            date: date(9, 1),
            start: parse_time_of_day("09:30").unwrap(),
            duration_minutes: 30,
            kind: "consultation".to_string(),
            topic_title: None,
            curriculum_entry_id: None,
        },
    )
    .await
    .unwrap();

    let clusters = audit_collisions(&repo, date(9, 1), date(9, 7), &SeverityPolicy::default())
        .await
        .unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].kind, ResourceKind::Teacher);
    assert_eq!(clusters[0].resource_id, 7);
    assert_eq!(clusters[0].members.len(), 2);
}

#[test]
fn test_draft_validation_report() {
    let mut loose = lesson(9, 3, 4, "12:00");
    loose.teacher_id = None;
    let request = DraftValidationRequest {
        lessons: vec![
            lesson(7, 1, 0, "09:00"),
            lesson(7, 2, 0, "09:30"),
            lesson(8, 1, 1, "25:00"),
            loose,
        ],
        weekly_norms: vec![WeeklyNorm {
            class_id: ClassId::new(1),
            subject_id: SubjectId::new(1),
            kind: "lesson".to_string(),
            lessons_per_week: 3,
        }],
    };

    let report = validate_draft(&request, &SeverityPolicy::default());
    assert_eq!(report.lessons.len(), 4);
    assert_eq!(report.lessons[0].id, -1);
    assert_eq!(report.lessons[0].end.as_deref(), Some("09:45"));
    assert_eq!(report.lessons[2].end, None);

    let kinds: Vec<CollisionType> = report.errors.iter().map(|r| r.kind).collect();
    assert!(kinds.contains(&CollisionType::Teacher));
    assert!(kinds.contains(&CollisionType::InvalidTime));

    let warnings: Vec<CollisionType> = report.warnings.iter().map(|r| r.kind).collect();
    assert!(warnings.contains(&CollisionType::MissingFields));
    assert!(warnings.contains(&CollisionType::WeeklyNorm));
    assert_eq!(
        report.collisions.len(),
        report.errors.len() + report.warnings.len()
    );
}
