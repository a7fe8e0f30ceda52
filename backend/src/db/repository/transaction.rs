//! Atomic units of work.
//!
//! Every mutating service (generation, publishing, conduct marking, date
//! distribution) runs inside one [`CalendarTransaction`]. Nothing is visible
//! to other readers until [`CalendarTransaction::commit`] succeeds; dropping
//! the transaction without committing discards every change.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use super::error::RepositoryResult;
use crate::api::{
    ClassId, CurriculumEntryId, CurriculumPlanId, OccurrenceId, SubjectId, TemplateId,
};
use crate::models::{CurriculumPlan, LessonOccurrence, Template};

#[async_trait]
pub trait TransactionalRepository: Send + Sync {
    /// Open a transaction over the current state of the store.
    async fn begin(&self) -> RepositoryResult<Box<dyn CalendarTransaction>>;
}

#[async_trait]
pub trait CalendarTransaction: Send + Sync {
    // ==================== Templates ====================

    async fn active_template_id(&self) -> RepositoryResult<Option<TemplateId>>;

    async fn get_template(&self, template_id: TemplateId) -> RepositoryResult<Template>;

    async fn store_template(&mut self, template: &Template) -> RepositoryResult<Template>;

    async fn set_active_template(&mut self, template_id: TemplateId) -> RepositoryResult<()>;

    // ==================== Curriculum ====================

    async fn get_plan(&self, plan_id: CurriculumPlanId) -> RepositoryResult<CurriculumPlan>;

    async fn plans_for(
        &self,
        subject_id: SubjectId,
        class_id: ClassId,
    ) -> RepositoryResult<Vec<CurriculumPlan>>;

    /// Overwrite `planned_date` of the listed entries of one plan.
    ///
    /// # Returns
    /// Number of entries updated.
    async fn set_planned_dates(
        &mut self,
        plan_id: CurriculumPlanId,
        dates: &[(CurriculumEntryId, NaiveDate)],
    ) -> RepositoryResult<usize>;

    /// Stamp `actual_date` on an entry unless it already has one.
    ///
    /// # Returns
    /// `true` when the entry was updated.
    async fn stamp_actual_date(
        &mut self,
        entry_id: CurriculumEntryId,
        date: NaiveDate,
    ) -> RepositoryResult<bool>;

    // ==================== Occurrences ====================

    async fn get_occurrence(&self, occurrence_id: OccurrenceId)
        -> RepositoryResult<LessonOccurrence>;

    /// Delete generated (non-manual) occurrences dated on or after `from`.
    ///
    /// # Returns
    /// Number of deleted rows.
    async fn delete_generated_from(&mut self, from: NaiveDate) -> RepositoryResult<usize>;

    /// Curriculum entries currently bound to a stored occurrence.
    async fn bound_entry_ids(&self) -> RepositoryResult<BTreeSet<CurriculumEntryId>>;

    /// Version for the next generation batch.
    ///
    /// Always greater than every version ever stamped, including versions of
    /// rows deleted earlier in this transaction.
    async fn next_version(&self) -> RepositoryResult<u32>;

    /// Insert occurrences, assigning ids.
    async fn insert_occurrences(
        &mut self,
        occurrences: Vec<LessonOccurrence>,
    ) -> RepositoryResult<Vec<LessonOccurrence>>;

    /// Set `conducted_at` unless already set and return the stored row.
    async fn mark_conducted(
        &mut self,
        occurrence_id: OccurrenceId,
        at: NaiveDateTime,
    ) -> RepositoryResult<LessonOccurrence>;

    /// Publish every change made in this transaction.
    ///
    /// # Returns
    /// * `Err(RepositoryError::TransactionError)` - If the store changed since
    ///   [`TransactionalRepository::begin`]
    async fn commit(self: Box<Self>) -> RepositoryResult<()>;
}
