//! Recording held lessons and hand-made occurrences.

use chrono::{Local, NaiveDateTime};
use log::{debug, info};

use crate::api::{ConductResult, ManualOccurrenceRequest, OccurrenceId};
use crate::db::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::models::{lesson_span, LessonOccurrence, OccurrenceSource};

/// Mark an occurrence as conducted.
///
/// The first timestamp wins; repeating the call leaves it untouched. The bound
/// curriculum entry, if any, gets the occurrence date as its actual date unless
/// it already has one.
pub async fn mark_conducted<R: FullRepository + ?Sized>(
    repo: &R,
    occurrence_id: OccurrenceId,
    at: Option<NaiveDateTime>,
) -> RepositoryResult<ConductResult> {
    let at = at.unwrap_or_else(|| Local::now().naive_local());

    let mut tx = repo.begin().await?;
    let occurrence = tx.mark_conducted(occurrence_id, at).await?;
    let entry_stamped = match occurrence.curriculum_entry_id {
        Some(entry_id) => tx.stamp_actual_date(entry_id, occurrence.date).await?,
        None => false,
    };
    tx.commit().await?;

    debug!(
        "Occurrence {} conducted at {:?}, entry stamped: {}",
        occurrence_id, occurrence.conducted_at, entry_stamped
    );
    Ok(ConductResult {
        occurrence,
        entry_stamped,
    })
}

/// Store a manual occurrence. Manual rows survive every regeneration.
pub async fn add_manual_occurrence<R: FullRepository + ?Sized>(
    repo: &R,
    request: &ManualOccurrenceRequest,
) -> RepositoryResult<LessonOccurrence> {
    if request.duration_minutes <= 0 {
        return Err(RepositoryError::validation(format!(
            "duration must be positive, got {}",
            request.duration_minutes
        )));
    }
    let (start, end) = lesson_span(request.date, request.start, request.duration_minutes);

    // Binding an entry that is already taken fails inside the insert.
    let topic_title = request.topic_title.clone().unwrap_or_default();
    let occurrence = LessonOccurrence {
        id: None,
        class_id: request.class_id,
        subject_id: request.subject_id,
        teacher_id: request.teacher_id,
        room_id: request.room_id,
        date: request.date,
        start,
        end,
        duration_minutes: request.duration_minutes,
        kind: request.kind.clone(),
        source: OccurrenceSource::Manual,
        template_id: None,
        origin_slot_id: None,
        version: 0,
        batch_id: None,
        curriculum_entry_id: request.curriculum_entry_id,
        topic_ordinal: None,
        topic_title,
        conducted_at: None,
    };
    let mut tx = repo.begin().await?;
    let mut stored = tx.insert_occurrences(vec![occurrence]).await?;
    tx.commit().await?;

    let occurrence = stored
        .pop()
        .ok_or_else(|| RepositoryError::internal("insert returned no rows"))?;
    info!(
        "Manual occurrence {:?} added on {} for class {}",
        occurrence.id, occurrence.date, occurrence.class_id
    );
    Ok(occurrence)
}
