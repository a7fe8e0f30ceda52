//! Occurrence repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::api::OccurrenceId;
use crate::models::LessonOccurrence;

/// Read access to dated lessons. Writes go through a
/// [`CalendarTransaction`](super::CalendarTransaction).
#[async_trait]
pub trait OccurrenceRepository: Send + Sync {
    /// Occurrences dated within `[from, to]`, ordered by start then id.
    async fn list_occurrences(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<LessonOccurrence>>;

    /// Retrieve one occurrence.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the occurrence doesn't exist
    async fn get_occurrence(&self, occurrence_id: OccurrenceId)
        -> RepositoryResult<LessonOccurrence>;

    /// Highest version stamped on any stored occurrence, `0` when empty.
    async fn latest_version(&self) -> RepositoryResult<u32>;
}
