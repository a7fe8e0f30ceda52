#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDate;

use lesson_calendar::api::{ClassId, RoomId, SubjectId, TeacherId, TemplateId};
use lesson_calendar::db::repositories::LocalRepository;
use lesson_calendar::db::repository::{CurriculumRepository, TemplateRepository};
use lesson_calendar::models::{
    default_lesson_kind, parse_time_of_day, CurriculumEntry, CurriculumPlan, RecurringSlot,
    Template,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).expect("valid test date")
}

/// A 45-minute slot of subject 1.
pub fn slot(weekday: u8, start: &str, teacher: i64, class: i64) -> RecurringSlot {
    RecurringSlot {
        id: None,
        class_id: Some(ClassId::new(class)),
        subject_id: Some(SubjectId::new(1)),
        teacher_id: Some(TeacherId::new(teacher)),
        room_id: None,
        weekday,
        start: parse_time_of_day(start).expect("valid test time"),
        duration_minutes: 45,
        kind: default_lesson_kind(),
    }
}

pub fn slot_in_room(weekday: u8, start: &str, teacher: i64, class: i64, room: i64) -> RecurringSlot {
    RecurringSlot {
        room_id: Some(RoomId::new(room)),
        ..slot(weekday, start, teacher, class)
    }
}

/// Store a template and make it the active one.
pub async fn seed_active_template(repo: &LocalRepository, slots: Vec<RecurringSlot>) -> Template {
    let stored = repo
        .store_template(&Template::new("Week", slots))
        .await
        .expect("store template");
    let template_id: TemplateId = stored.id.expect("template id");
    repo.set_active_template(template_id)
        .await
        .expect("activate template");
    stored
}

/// Store a current plan of floating topics `Topic 1..=count` for subject 1.
pub async fn seed_plan(repo: &LocalRepository, class: i64, count: u32) -> CurriculumPlan {
    let entries = (1..=count)
        .map(|n| CurriculumEntry::new(n, format!("Topic {}", n)))
        .collect();
    let mut plan =
        CurriculumPlan::new(SubjectId::new(1), ClassId::new(class), "Plan").with_section("Unit 1", entries);
    plan.is_current = true;
    repo.store_plan(&plan).await.expect("store plan")
}
