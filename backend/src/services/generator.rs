//! Schedule generation: active template to dated, curriculum-bound lessons.
//!
//! One run is one transaction:
//!
//! 1. resolve the template (explicit id or the active one);
//! 2. delete generated rows dated on or after `rewrite_from`;
//! 3. stamp a fresh version and batch id;
//! 4. expand the template over `[max(from, rewrite_from), to]`;
//! 5. reject candidates with missing resources or non-positive durations;
//! 6. bind each candidate to a curriculum entry or the fallback topic;
//! 7. cluster the candidate batch and abort on any error-severity collision;
//! 8. insert and commit.
//!
//! Any failure drops the transaction, so nothing written earlier in the run
//! survives.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::algorithms::clustering::{
    detect_collisions, Cluster, ResourceKind, Severity, SeverityPolicy, Timed,
};
use crate::api::{
    BindingWarning, CollisionDetail, CollisionReport, GenerateCalendarRequest, GenerationSummary,
    SlotId, TemplateId,
};
use crate::config::{DEFAULT_FALLBACK_TOPIC, DEFAULT_MAX_RANGE_DAYS};
use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{lesson_span, LessonOccurrence, OccurrenceSource, RecurringSlot};
use crate::services::binder::{BindingContext, CurriculumBinder};
use crate::services::date_window::{DateWindow, DateWindowError};
use crate::services::expander::{HolidayCalendar, TemplateExpander};

/// Tunables of a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub max_range_days: i64,
    pub fallback_topic: String,
    pub severity: SeverityPolicy,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_range_days: DEFAULT_MAX_RANGE_DAYS,
            fallback_topic: DEFAULT_FALLBACK_TOPIC.to_string(),
            severity: SeverityPolicy::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("date range spans {days} days, the limit is {max_days}")]
    RangeTooWide { days: i64, max_days: i64 },

    #[error("no active template")]
    NoActiveTemplate,

    #[error("template {0} not found")]
    TemplateNotFound(TemplateId),

    #[error("slot {} on {date} has non-positive duration {duration_minutes}", fmt_slot(.slot_id))]
    InvalidDuration {
        slot_id: Option<SlotId>,
        date: NaiveDate,
        duration_minutes: i32,
    },

    #[error("slot {} on {date} is missing {}", fmt_slot(.slot_id), .fields.join(", "))]
    MissingResource {
        slot_id: Option<SlotId>,
        date: NaiveDate,
        fields: Vec<&'static str>,
    },

    #[error("{message}")]
    Collisions {
        message: String,
        collisions: Vec<CollisionReport>,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn fmt_slot(slot_id: &Option<SlotId>) -> String {
    slot_id.map_or_else(|| "<unsaved>".to_string(), |id| id.to_string())
}

impl GenerationError {
    /// Machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::InvalidRange { .. } => "INVALID_RANGE",
            GenerationError::RangeTooWide { .. } => "RANGE_TOO_WIDE",
            GenerationError::NoActiveTemplate => "NO_ACTIVE_TEMPLATE",
            GenerationError::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            GenerationError::InvalidDuration { .. } => "MISSING_OR_INVALID_DURATION",
            GenerationError::MissingResource { .. } => "MISSING_RESOURCE",
            GenerationError::Collisions { .. } => "COLLISIONS_FOUND",
            GenerationError::Repository(_) => "REPOSITORY_ERROR",
        }
    }
}

impl From<DateWindowError> for GenerationError {
    fn from(err: DateWindowError) -> Self {
        match err {
            DateWindowError::Inverted { from, to } => GenerationError::InvalidRange { from, to },
            DateWindowError::TooWide { days, max_days } => {
                GenerationError::RangeTooWide { days, max_days }
            }
        }
    }
}

/// A candidate as seen by the clustering engine, identified by batch index.
struct Candidate<'a> {
    index: i64,
    occurrence: &'a LessonOccurrence,
}

impl Timed for Candidate<'_> {
    type Id = i64;
    type Day = NaiveDate;
    type Instant = NaiveDateTime;

    fn item_id(&self) -> i64 {
        self.index
    }

    fn day(&self) -> NaiveDate {
        self.occurrence.date
    }

    fn start(&self) -> NaiveDateTime {
        self.occurrence.start
    }

    fn end(&self) -> NaiveDateTime {
        self.occurrence.end
    }

    fn resource(&self, kind: ResourceKind) -> Option<i64> {
        self.occurrence.resource(kind)
    }
}

/// Human-readable label of a collision cluster, e.g. `OVERLAP_TEACHER on (2025-09-01, 7)`.
pub fn collision_message(kind: ResourceKind, resource_id: i64, date: NaiveDate) -> String {
    format!(
        "OVERLAP_{} on ({}, {})",
        kind.as_str().to_uppercase(),
        date,
        resource_id
    )
}

fn collision_report(
    cluster: Cluster<NaiveDate, i64>,
    batch: &[LessonOccurrence],
    verbose: bool,
) -> CollisionReport {
    let members = verbose.then(|| {
        cluster
            .members
            .iter()
            .filter_map(|&index| {
                let occ = batch.get(usize::try_from(index).ok()?)?;
                Some(CollisionDetail {
                    index,
                    origin_slot_id: occ.origin_slot_id,
                    start: occ.start,
                    end: occ.end,
                    teacher_id: occ.teacher_id,
                    class_id: occ.class_id,
                    subject_id: occ.subject_id,
                    room_id: occ.room_id,
                })
            })
            .collect()
    });
    CollisionReport {
        resource_type: cluster.kind,
        resource_id: cluster.resource_id,
        date: cluster.day,
        message: collision_message(cluster.kind, cluster.resource_id, cluster.day),
        cluster_of_occurrence_ids: cluster.members,
        severity: cluster.severity,
        members,
    }
}

/// Turn a dated slot into an unbound candidate.
fn candidate_for(
    date: NaiveDate,
    slot: &RecurringSlot,
    template_id: TemplateId,
    version: u32,
    batch_id: Uuid,
) -> Result<LessonOccurrence, GenerationError> {
    let (Some(class_id), Some(subject_id), Some(teacher_id)) =
        (slot.class_id, slot.subject_id, slot.teacher_id)
    else {
        return Err(GenerationError::MissingResource {
            slot_id: slot.id,
            date,
            fields: slot.missing_fields(),
        });
    };
    if slot.duration_minutes <= 0 {
        return Err(GenerationError::InvalidDuration {
            slot_id: slot.id,
            date,
            duration_minutes: slot.duration_minutes,
        });
    }

    let (start, end) = lesson_span(date, slot.start, slot.duration_minutes);
    Ok(LessonOccurrence {
        id: None,
        class_id,
        subject_id,
        teacher_id,
        room_id: slot.room_id,
        date,
        start,
        end,
        duration_minutes: slot.duration_minutes,
        kind: slot.kind.clone(),
        source: OccurrenceSource::Template,
        template_id: Some(template_id),
        origin_slot_id: slot.id,
        version,
        batch_id: Some(batch_id),
        curriculum_entry_id: None,
        topic_ordinal: None,
        topic_title: String::new(),
        conducted_at: None,
    })
}

/// Run one generation.
///
/// # Returns
/// * `Ok(GenerationSummary)` - Counts, version, batch id and binding warnings
/// * `Err(GenerationError)` - Setup, data or collision failure; nothing is written
pub async fn generate<R: FullRepository + ?Sized>(
    repo: &R,
    request: &GenerateCalendarRequest,
    settings: &GenerationSettings,
    holidays: &dyn HolidayCalendar,
) -> Result<GenerationSummary, GenerationError> {
    let window = DateWindow::new(request.from, request.to, settings.max_range_days)?;
    let rewrite_from = request.rewrite_from.unwrap_or(window.from);

    let mut tx = repo.begin().await?;

    let template_id = match request.template_id {
        Some(id) => id,
        None => tx
            .active_template_id()
            .await?
            .ok_or(GenerationError::NoActiveTemplate)?,
    };
    let template = tx.get_template(template_id).await.map_err(|e| {
        if e.is_not_found() {
            GenerationError::TemplateNotFound(template_id)
        } else {
            GenerationError::Repository(e)
        }
    })?;

    let deleted = tx.delete_generated_from(rewrite_from).await?;
    let version = tx.next_version().await?;
    let batch_id = Uuid::new_v4();
    debug!(
        "Generating {}..{} from template {} (rewrite_from={}, version={}, batch={}, deleted={})",
        window.from, window.to, template_id, rewrite_from, version, batch_id, deleted
    );

    let expansion_from = window.from.max(rewrite_from);
    let expander =
        TemplateExpander::new(&template.slots, expansion_from, window.to).with_holidays(holidays);

    let mut batch = Vec::new();
    for (date, slot) in expander.iter() {
        batch.push(candidate_for(date, slot, template_id, version, batch_id)?);
    }

    // Bind in batch order, seeded with bindings that survived the deletion.
    let mut ctx = BindingContext::seeded(tx.bound_entry_ids().await?);
    let mut binder = CurriculumBinder::new();
    let mut warnings = Vec::new();
    for occ in &mut batch {
        if !binder.has_pair(occ.subject_id, occ.class_id) {
            let plans = tx.plans_for(occ.subject_id, occ.class_id).await?;
            binder.load_pair(occ.subject_id, occ.class_id, &plans);
        }
        match binder.bind(occ.subject_id, occ.class_id, occ.date, occ.origin_slot_id, &mut ctx) {
            Ok(bound) => {
                occ.curriculum_entry_id = Some(bound.entry_id);
                occ.topic_ordinal = Some(bound.ordinal);
                occ.topic_title = bound.title;
            }
            Err(cause) => {
                occ.topic_title = settings.fallback_topic.clone();
                let message = format!(
                    "No curriculum entry for {} {}/{} ({})",
                    occ.date, occ.class_id, occ.subject_id, cause
                );
                warn!("{}", message);
                warnings.push(BindingWarning {
                    code: cause,
                    message,
                    date: occ.date,
                    class_id: occ.class_id,
                    subject_id: occ.subject_id,
                    origin_slot_id: occ.origin_slot_id,
                });
            }
        }
    }

    let reports: Vec<CollisionReport> = {
        let candidates: Vec<Candidate<'_>> = batch
            .iter()
            .enumerate()
            .map(|(index, occurrence)| Candidate {
                index: index as i64,
                occurrence,
            })
            .collect();
        detect_collisions(&candidates, &settings.severity)
            .into_iter()
            .map(|cluster| collision_report(cluster, &batch, request.verbose))
            .collect()
    };
    let (errors, collision_warnings): (Vec<_>, Vec<_>) = reports
        .into_iter()
        .partition(|report| report.severity == Severity::Error);

    if let Some(first) = errors.first() {
        let message = first.message.clone();
        warn!(
            "Generation aborted: {} ({} error clusters)",
            message,
            errors.len()
        );
        return Err(GenerationError::Collisions {
            message,
            collisions: errors,
        });
    }

    let created = batch.len();
    let created_with_binding = batch
        .iter()
        .filter(|occ| occ.curriculum_entry_id.is_some())
        .count();
    tx.insert_occurrences(batch).await?;
    tx.commit().await?;

    let mut warnings_summary: BTreeMap<String, usize> = BTreeMap::new();
    let mut warnings_by_pair: BTreeMap<String, usize> = BTreeMap::new();
    for warning in &warnings {
        *warnings_summary
            .entry(warning.code.code().to_string())
            .or_default() += 1;
        *warnings_by_pair
            .entry(format!("{}/{}", warning.class_id, warning.subject_id))
            .or_default() += 1;
    }

    info!(
        "Generated {} lessons ({} bound, {} deleted) version={} batch={}",
        created, created_with_binding, deleted, version, batch_id
    );

    Ok(GenerationSummary {
        template_id,
        version,
        batch_id,
        deleted,
        created,
        created_with_binding,
        created_without_binding: created - created_with_binding,
        warnings_count: warnings.len(),
        warnings,
        warnings_summary,
        warnings_by_pair,
        collision_warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(GenerationError::NoActiveTemplate.code(), "NO_ACTIVE_TEMPLATE");
        assert_eq!(
            GenerationError::TemplateNotFound(TemplateId::new(3)).code(),
            "TEMPLATE_NOT_FOUND"
        );
        let date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let err = GenerationError::InvalidDuration {
            slot_id: Some(SlotId::new(4)),
            date,
            duration_minutes: 0,
        };
        assert_eq!(err.code(), "MISSING_OR_INVALID_DURATION");
        assert_eq!(
            err.to_string(),
            "slot 4 on 2025-09-01 has non-positive duration 0"
        );
        let err = GenerationError::MissingResource {
            slot_id: None,
            date,
            fields: vec!["teacher", "class"],
        };
        assert_eq!(err.to_string(), "slot <unsaved> on 2025-09-01 is missing teacher, class");
    }

    #[test]
    fn test_window_errors_map_to_setup_codes() {
        let from = NaiveDate::from_ymd_opt(2025, 9, 2).unwrap();
        let to = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let err: GenerationError = DateWindowError::Inverted { from, to }.into();
        assert_eq!(err.code(), "INVALID_RANGE");
        let err: GenerationError = DateWindowError::TooWide {
            days: 40,
            max_days: 31,
        }
        .into();
        assert_eq!(err.code(), "RANGE_TOO_WIDE");
    }

    #[test]
    fn test_collision_message() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        assert_eq!(
            collision_message(ResourceKind::Class, 12, date),
            "OVERLAP_CLASS on (2025-09-01, 12)"
        );
    }
}
