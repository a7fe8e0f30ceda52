//! End-to-end generation runs against the in-memory repository.

mod support;

use support::{date, seed_active_template, seed_plan, slot, slot_in_room};

use lesson_calendar::algorithms::{ResourceKind, Severity};
use lesson_calendar::api::{ClassId, GenerateCalendarRequest, ManualOccurrenceRequest, SubjectId, TemplateId};
use lesson_calendar::config::DEFAULT_FALLBACK_TOPIC;
use lesson_calendar::db::repositories::LocalRepository;
use lesson_calendar::db::repository::{CurriculumRepository, OccurrenceRepository, TemplateRepository};
use lesson_calendar::models::{CurriculumEntry, CurriculumPlan, LessonOccurrence, OccurrenceSource};
use lesson_calendar::services::binder::MissCause;
use lesson_calendar::services::conduct::{add_manual_occurrence, mark_conducted};
use lesson_calendar::services::expander::{FixedHolidays, NoHolidays};
use lesson_calendar::services::generator::{generate, GenerationError, GenerationSettings};

fn week() -> GenerateCalendarRequest {
    GenerateCalendarRequest::new(date(9, 1), date(9, 7))
}

async fn run(
    repo: &LocalRepository,
    request: &GenerateCalendarRequest,
) -> Result<lesson_calendar::api::GenerationSummary, GenerationError> {
    generate(repo, request, &GenerationSettings::default(), &NoHolidays).await
}

async fn stored(repo: &LocalRepository) -> Vec<LessonOccurrence> {
    repo.list_occurrences(date(8, 1), date(12, 31)).await.unwrap()
}

#[tokio::test]
async fn test_monday_lesson_bound_to_first_topic() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1)]).await;
    let mut plan = CurriculumPlan::new(SubjectId::new(1), ClassId::new(1), "Plan").with_section(
        "Unit 1",
        vec![
            CurriculumEntry::new(1, "Topic 1"),
            CurriculumEntry::new(2, "Topic 2").planned_on(date(9, 8)),
        ],
    );
    plan.is_current = true;
    repo.store_plan(&plan).await.unwrap();

    let summary = run(&repo, &week()).await.unwrap();
    assert_eq!(summary.version, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.created_with_binding, 1);
    assert_eq!(summary.created_without_binding, 0);
    assert_eq!(summary.warnings_count, 0);

    let rows = stored(&repo).await;
    assert_eq!(rows.len(), 1);
    let lesson = &rows[0];
    assert_eq!(lesson.date, date(9, 1));
    assert_eq!(lesson.start, date(9, 1).and_hms_opt(9, 0, 0).unwrap());
    assert_eq!(lesson.end, date(9, 1).and_hms_opt(9, 45, 0).unwrap());
    assert_eq!(lesson.topic_title, "Topic 1");
    assert_eq!(lesson.topic_ordinal, Some(1));
    assert_eq!(lesson.source, OccurrenceSource::Template);
    assert_eq!(lesson.batch_id, Some(summary.batch_id));

    // The following Monday is the date Topic 2 was planned for.
    run(&repo, &GenerateCalendarRequest::new(date(9, 8), date(9, 14)))
        .await
        .unwrap();
    let next = repo.list_occurrences(date(9, 8), date(9, 14)).await.unwrap();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].topic_title, "Topic 2");
    assert_eq!(next[0].topic_ordinal, Some(2));
}

#[tokio::test]
async fn test_regeneration_is_idempotent() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1), slot(2, "10:00", 7, 1)]).await;
    seed_plan(&repo, 1, 5).await;

    let first = run(&repo, &week()).await.unwrap();
    let before: Vec<(chrono::NaiveDateTime, String)> = stored(&repo)
        .await
        .into_iter()
        .map(|o| (o.start, o.topic_title))
        .collect();

    let second = run(&repo, &week()).await.unwrap();
    let after: Vec<(chrono::NaiveDateTime, String)> = stored(&repo)
        .await
        .into_iter()
        .map(|o| (o.start, o.topic_title))
        .collect();

    assert_eq!(second.deleted, first.created);
    assert_eq!(second.created, first.created);
    assert_eq!(second.version, first.version + 1);
    assert_ne!(second.batch_id, first.batch_id);
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_rewrite_from_keeps_earlier_days() {
    let repo = LocalRepository::new();
    let daily = (0..7).map(|day| slot(day, "09:00", 7, 1)).collect();
    seed_active_template(&repo, daily).await;

    let first = run(&repo, &week()).await.unwrap();
    assert_eq!(first.created, 7);

    let mut request = week();
    request.rewrite_from = Some(date(9, 3));
    let second = run(&repo, &request).await.unwrap();
    assert_eq!(second.deleted, 5);
    assert_eq!(second.created, 5);

    let rows = stored(&repo).await;
    assert_eq!(rows.len(), 7);
    for row in rows {
        let expected = if row.date < date(9, 3) { 1 } else { 2 };
        assert_eq!(row.version, expected, "version of {}", row.date);
    }
}

#[tokio::test]
async fn test_curriculum_exhaustion_falls_back() {
    let repo = LocalRepository::new();
    seed_active_template(
        &repo,
        vec![slot(0, "09:00", 7, 1), slot(1, "09:00", 7, 1), slot(2, "09:00", 7, 1)],
    )
    .await;
    seed_plan(&repo, 1, 2).await;

    let summary = run(&repo, &week()).await.unwrap();
    assert_eq!(summary.created, 3);
    assert_eq!(summary.created_with_binding, 2);
    assert_eq!(summary.created_without_binding, 1);
    assert_eq!(summary.warnings_count, 1);
    assert_eq!(summary.warnings[0].code, MissCause::PlanExhausted);
    assert_eq!(summary.warnings[0].date, date(9, 3));
    assert_eq!(summary.warnings_summary.get("PLAN_EXHAUSTED"), Some(&1));
    assert_eq!(summary.warnings_by_pair.get("1/1"), Some(&1));

    let titles: Vec<String> = stored(&repo).await.into_iter().map(|o| o.topic_title).collect();
    assert_eq!(
        titles,
        vec!["Topic 1", "Topic 2", DEFAULT_FALLBACK_TOPIC]
    );
}

#[tokio::test]
async fn test_missing_plan_warns() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1)]).await;

    let summary = run(&repo, &week()).await.unwrap();
    assert_eq!(summary.created_without_binding, 1);
    assert_eq!(summary.warnings[0].code, MissCause::NoPlan);
    assert_eq!(summary.warnings_summary.get("NO_PLAN"), Some(&1));
}

#[tokio::test]
async fn test_custom_fallback_topic() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1)]).await;
    let settings = GenerationSettings {
        fallback_topic: "Free topic".to_string(),
        ..GenerationSettings::default()
    };
    generate(&repo, &week(), &settings, &NoHolidays).await.unwrap();
    assert_eq!(stored(&repo).await[0].topic_title, "Free topic");
}

#[tokio::test]
async fn test_touching_lessons_do_not_collide() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1), slot(0, "09:45", 7, 2)]).await;

    let summary = run(&repo, &week()).await.unwrap();
    assert_eq!(summary.created, 2);
    assert!(summary.collision_warnings.is_empty());
}

#[tokio::test]
async fn test_teacher_overlap_aborts_without_writes() {
    let repo = LocalRepository::new();
    let clean = seed_active_template(&repo, vec![slot(0, "09:00", 7, 1)]).await;
    run(&repo, &week()).await.unwrap();

    let conflicting = repo
        .store_template(&lesson_calendar::models::Template::new(
            "Conflicting",
            vec![slot(0, "09:00", 7, 1), slot(0, "09:30", 7, 2)],
        ))
        .await
        .unwrap();
    let mut request = week();
    request.template_id = conflicting.id;

    let err = run(&repo, &request).await.unwrap_err();
    assert_eq!(err.code(), "COLLISIONS_FOUND");
    let GenerationError::Collisions { message, collisions } = err else {
        panic!("expected collisions");
    };
    assert_eq!(message, "OVERLAP_TEACHER on (2025-09-01, 7)");
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].resource_type, ResourceKind::Teacher);
    assert_eq!(collisions[0].resource_id, 7);
    assert_eq!(collisions[0].date, date(9, 1));
    assert_eq!(collisions[0].cluster_of_occurrence_ids, vec![0, 1]);
    assert!(collisions[0].members.is_none());

    // The earlier run is untouched: nothing deleted, no new version.
    let rows = stored(&repo).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].template_id, clean.id);
    assert_eq!(repo.latest_version().await.unwrap(), 1);
}

#[tokio::test]
async fn test_class_overlap_aborts() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(1, "10:00", 7, 1), slot(1, "10:15", 8, 1)]).await;

    let err = run(&repo, &week()).await.unwrap_err();
    let GenerationError::Collisions { collisions, .. } = err else {
        panic!("expected collisions");
    };
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].resource_type, ResourceKind::Class);
    assert_eq!(collisions[0].date, date(9, 2));
    assert_eq!(repo.occurrence_count(), 0);
}

#[tokio::test]
async fn test_transitive_overlap_forms_one_cluster() {
    let repo = LocalRepository::new();
    seed_active_template(
        &repo,
        vec![
            slot(0, "09:00", 7, 1),
            slot(0, "09:30", 7, 2),
            slot(0, "10:00", 7, 3),
        ],
    )
    .await;
    let mut request = week();
    request.verbose = true;

    let GenerationError::Collisions { collisions, .. } = run(&repo, &request).await.unwrap_err()
    else {
        panic!("expected collisions");
    };
    assert_eq!(collisions.len(), 1);
    assert_eq!(collisions[0].cluster_of_occurrence_ids, vec![0, 1, 2]);
    let members = collisions[0].members.as_ref().unwrap();
    assert_eq!(members.len(), 3);
    assert_eq!(members[2].start, date(9, 1).and_hms_opt(10, 0, 0).unwrap());
}

#[tokio::test]
async fn test_room_overlap_is_a_warning() {
    let repo = LocalRepository::new();
    seed_active_template(
        &repo,
        vec![slot_in_room(0, "09:00", 7, 1, 12), slot_in_room(0, "09:20", 8, 2, 12)],
    )
    .await;

    let summary = run(&repo, &week()).await.unwrap();
    assert_eq!(summary.created, 2);
    assert_eq!(summary.collision_warnings.len(), 1);
    assert_eq!(summary.collision_warnings[0].resource_type, ResourceKind::Room);
    assert_eq!(summary.collision_warnings[0].severity, Severity::Warning);
}

#[tokio::test]
async fn test_room_overlap_can_be_fatal() {
    let repo = LocalRepository::new();
    seed_active_template(
        &repo,
        vec![slot_in_room(0, "09:00", 7, 1, 12), slot_in_room(0, "09:20", 8, 2, 12)],
    )
    .await;
    let mut settings = GenerationSettings::default();
    settings.severity.room = Severity::Error;

    let err = generate(&repo, &week(), &settings, &NoHolidays)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "COLLISIONS_FOUND");
}

#[tokio::test]
async fn test_setup_errors() {
    let repo = LocalRepository::new();
    assert_eq!(
        run(&repo, &week()).await.unwrap_err().code(),
        "NO_ACTIVE_TEMPLATE"
    );

    let mut request = week();
    request.template_id = Some(TemplateId::new(99));
    assert_eq!(
        run(&repo, &request).await.unwrap_err().code(),
        "TEMPLATE_NOT_FOUND"
    );

    let inverted = GenerateCalendarRequest::new(date(9, 7), date(9, 1));
    assert_eq!(run(&repo, &inverted).await.unwrap_err().code(), "INVALID_RANGE");

    let wide = GenerateCalendarRequest::new(date(9, 1), date(10, 2));
    assert_eq!(run(&repo, &wide).await.unwrap_err().code(), "RANGE_TOO_WIDE");
}

#[tokio::test]
async fn test_bad_slots_abort_the_batch() {
    let repo = LocalRepository::new();
    let mut missing_teacher = slot(0, "09:00", 7, 1);
    missing_teacher.teacher_id = None;
    seed_active_template(&repo, vec![slot(0, "08:00", 7, 1), missing_teacher]).await;
    let err = run(&repo, &week()).await.unwrap_err();
    assert_eq!(err.code(), "MISSING_RESOURCE");
    assert_eq!(repo.occurrence_count(), 0);

    let repo = LocalRepository::new();
    let mut zero = slot(0, "09:00", 7, 1);
    zero.duration_minutes = 0;
    seed_active_template(&repo, vec![zero]).await;
    let err = run(&repo, &week()).await.unwrap_err();
    assert_eq!(err.code(), "MISSING_OR_INVALID_DURATION");
}

#[tokio::test]
async fn test_manual_lessons_survive_regeneration() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1)]).await;
    run(&repo, &week()).await.unwrap();

    let manual = ManualOccurrenceRequest {
        class_id: lesson_calendar::api::ClassId::new(1),
        subject_id: lesson_calendar::api::SubjectId::new(1),
        teacher_id: lesson_calendar::api::TeacherId::new(8),
        room_id: None,
        date: date(9, 4),
        start: lesson_calendar::models::parse_time_of_day("13:00").unwrap(),
        duration_minutes: 45,
        kind: "lesson".to_string(),
        topic_title: Some("Museum visit".to_string()),
        curriculum_entry_id: None,
    };
    add_manual_occurrence(&repo, &manual).await.unwrap();

    let summary = run(&repo, &week()).await.unwrap();
    assert_eq!(summary.deleted, 1);
    let rows = stored(&repo).await;
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .any(|o| o.source == OccurrenceSource::Manual && o.topic_title == "Museum visit"));
}

#[tokio::test]
async fn test_holidays_produce_no_lessons() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1)]).await;
    let holidays: FixedHolidays = [date(9, 8)].into_iter().collect();
    let request = GenerateCalendarRequest::new(date(9, 1), date(9, 14));

    let summary = generate(&repo, &request, &GenerationSettings::default(), &holidays)
        .await
        .unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(stored(&repo).await[0].date, date(9, 1));
}

#[tokio::test]
async fn test_conducted_lesson_stamps_entry() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1)]).await;
    let plan = seed_plan(&repo, 1, 2).await;
    run(&repo, &week()).await.unwrap();

    let lesson = stored(&repo).await.remove(0);
    let at = date(9, 1).and_hms_opt(9, 50, 0).unwrap();
    let result = mark_conducted(&repo, lesson.id.unwrap(), Some(at)).await.unwrap();
    assert!(result.entry_stamped);

    let plan = repo.get_plan(plan.id.unwrap()).await.unwrap();
    let first = plan.entries_in_order()[0];
    assert_eq!(first.actual_date, Some(date(9, 1)));

    let again = mark_conducted(&repo, lesson.id.unwrap(), None).await.unwrap();
    assert!(!again.entry_stamped);
    assert_eq!(again.occurrence.conducted_at, Some(at));
}

#[tokio::test]
async fn test_bindings_continue_across_weeks() {
    let repo = LocalRepository::new();
    seed_active_template(&repo, vec![slot(0, "09:00", 7, 1)]).await;
    seed_plan(&repo, 1, 3).await;

    run(&repo, &week()).await.unwrap();
    let next_week = GenerateCalendarRequest::new(date(9, 8), date(9, 14));
    run(&repo, &next_week).await.unwrap();

    let titles: Vec<String> = stored(&repo).await.into_iter().map(|o| o.topic_title).collect();
    assert_eq!(titles, vec!["Topic 1", "Topic 2"]);
}
