//! In-memory local repository implementation.
//!
//! All data lives in one [`LocalData`] snapshot behind a lock. A transaction
//! clones the snapshot, mutates its private copy and swaps it back on commit
//! when the store revision is still the one it started from. A concurrent
//! commit in between makes the later commit fail with a retryable
//! [`RepositoryError::TransactionError`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;

use crate::api::*;
use crate::db::repository::*;
use crate::models::{CurriculumPlan, LessonOccurrence, Template};

/// In-memory local repository.
///
/// Ideal for unit tests and local development that need isolation and speed.
///
/// # Example
/// ```ignore
/// use lesson_calendar::db::repositories::LocalRepository;
///
/// #[tokio::test]
/// async fn test_template_storage() {
///     let repo = LocalRepository::new();
///     let stored = repo.store_template(&template).await.unwrap();
///     repo.set_active_template(stored.id.unwrap()).await.unwrap();
/// }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

#[derive(Clone)]
struct LocalData {
    templates: BTreeMap<TemplateId, Template>,
    active_template: Option<TemplateId>,
    plans: BTreeMap<CurriculumPlanId, CurriculumPlan>,
    occurrences: BTreeMap<OccurrenceId, LessonOccurrence>,

    // Highest version ever stamped, survives deletion of its rows
    version_high_water: u32,

    // ID counters
    next_template_id: i64,
    next_slot_id: i64,
    next_plan_id: i64,
    next_section_id: i64,
    next_entry_id: i64,
    next_occurrence_id: i64,

    // Bumped on every committed change
    revision: u64,

    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            templates: BTreeMap::new(),
            active_template: None,
            plans: BTreeMap::new(),
            occurrences: BTreeMap::new(),
            version_high_water: 0,
            next_template_id: 1,
            next_slot_id: 1,
            next_plan_id: 1,
            next_section_id: 1,
            next_entry_id: 1,
            next_occurrence_id: 1,
            revision: 0,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.is_healthy {
            return Err(RepositoryError::internal("Local store is not healthy")
                .with_operation("check_health"));
        }
        Ok(())
    }

    fn store_template(&mut self, template: &Template) -> Template {
        let mut stored = template.clone();
        let template_id = TemplateId::new(self.next_template_id);
        self.next_template_id += 1;
        stored.id = Some(template_id);
        for slot in &mut stored.slots {
            slot.id = Some(SlotId::new(self.next_slot_id));
            self.next_slot_id += 1;
        }
        self.templates.insert(template_id, stored.clone());
        stored
    }

    fn get_template(&self, template_id: TemplateId) -> RepositoryResult<Template> {
        self.templates.get(&template_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Template {} not found", template_id),
                ErrorContext::new("get_template")
                    .with_entity("template")
                    .with_entity_id(template_id),
            )
        })
    }

    fn set_active_template(&mut self, template_id: TemplateId) -> RepositoryResult<()> {
        if !self.templates.contains_key(&template_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Template {} not found", template_id),
                ErrorContext::new("set_active_template")
                    .with_entity("template")
                    .with_entity_id(template_id),
            ));
        }
        self.active_template = Some(template_id);
        Ok(())
    }

    fn list_templates(&self) -> Vec<TemplateSummary> {
        self.templates
            .iter()
            .map(|(id, template)| TemplateSummary {
                template_id: *id,
                name: template.name.clone(),
                slot_count: template.slots.len(),
                is_active: self.active_template == Some(*id),
                created_at: template.created_at,
            })
            .collect()
    }

    fn store_plan(&mut self, plan: &CurriculumPlan) -> CurriculumPlan {
        let mut stored = plan.clone();
        let plan_id = CurriculumPlanId::new(self.next_plan_id);
        self.next_plan_id += 1;
        stored.id = Some(plan_id);
        for section in &mut stored.sections {
            section.id = Some(CurriculumSectionId::new(self.next_section_id));
            self.next_section_id += 1;
            for entry in &mut section.entries {
                entry.id = Some(CurriculumEntryId::new(self.next_entry_id));
                self.next_entry_id += 1;
            }
        }
        self.plans.insert(plan_id, stored.clone());
        stored
    }

    fn get_plan(&self, plan_id: CurriculumPlanId) -> RepositoryResult<CurriculumPlan> {
        self.plans.get(&plan_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Curriculum plan {} not found", plan_id),
                ErrorContext::new("get_plan")
                    .with_entity("curriculum_plan")
                    .with_entity_id(plan_id),
            )
        })
    }

    fn plans_for(&self, subject_id: SubjectId, class_id: ClassId) -> Vec<CurriculumPlan> {
        self.plans
            .values()
            .filter(|plan| plan.subject_id == subject_id && plan.class_id == class_id)
            .cloned()
            .collect()
    }

    fn set_planned_dates(
        &mut self,
        plan_id: CurriculumPlanId,
        dates: &[(CurriculumEntryId, NaiveDate)],
    ) -> RepositoryResult<usize> {
        let plan = self.plans.get_mut(&plan_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Curriculum plan {} not found", plan_id),
                ErrorContext::new("set_planned_dates")
                    .with_entity("curriculum_plan")
                    .with_entity_id(plan_id),
            )
        })?;

        let mut updated = 0;
        for (entry_id, date) in dates {
            if let Some(entry) = plan.entry_mut(*entry_id) {
                entry.planned_date = Some(*date);
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn stamp_actual_date(&mut self, entry_id: CurriculumEntryId, date: NaiveDate) -> bool {
        for plan in self.plans.values_mut() {
            if let Some(entry) = plan.entry_mut(entry_id) {
                if entry.actual_date.is_none() {
                    entry.actual_date = Some(date);
                    return true;
                }
                return false;
            }
        }
        false
    }

    fn list_occurrences(&self, from: NaiveDate, to: NaiveDate) -> Vec<LessonOccurrence> {
        let mut rows: Vec<LessonOccurrence> = self
            .occurrences
            .values()
            .filter(|occ| occ.date >= from && occ.date <= to)
            .cloned()
            .collect();
        rows.sort_by_key(|occ| (occ.start, occ.id));
        rows
    }

    fn get_occurrence(&self, occurrence_id: OccurrenceId) -> RepositoryResult<LessonOccurrence> {
        self.occurrences.get(&occurrence_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Occurrence {} not found", occurrence_id),
                ErrorContext::new("get_occurrence")
                    .with_entity("occurrence")
                    .with_entity_id(occurrence_id),
            )
        })
    }

    fn latest_version(&self) -> u32 {
        self.occurrences
            .values()
            .map(|occ| occ.version)
            .max()
            .unwrap_or(0)
    }

    fn delete_generated_from(&mut self, from: NaiveDate) -> usize {
        let before = self.occurrences.len();
        self.occurrences
            .retain(|_, occ| !(occ.source.is_generated() && occ.date >= from));
        before - self.occurrences.len()
    }

    fn bound_entry_ids(&self) -> BTreeSet<CurriculumEntryId> {
        self.occurrences
            .values()
            .filter_map(|occ| occ.curriculum_entry_id)
            .collect()
    }

    fn insert_occurrences(
        &mut self,
        occurrences: Vec<LessonOccurrence>,
    ) -> RepositoryResult<Vec<LessonOccurrence>> {
        let bound = self.bound_entry_ids();
        let mut seen = BTreeSet::new();
        for occ in &occurrences {
            if let Some(entry_id) = occ.curriculum_entry_id {
                if bound.contains(&entry_id) || !seen.insert(entry_id) {
                    return Err(RepositoryError::validation_with_context(
                        format!("Curriculum entry {} is already bound", entry_id),
                        ErrorContext::new("insert_occurrences")
                            .with_entity("curriculum_entry")
                            .with_entity_id(entry_id),
                    ));
                }
            }
        }

        let mut stored = Vec::with_capacity(occurrences.len());
        for mut occ in occurrences {
            let occurrence_id = OccurrenceId::new(self.next_occurrence_id);
            self.next_occurrence_id += 1;
            occ.id = Some(occurrence_id);
            self.version_high_water = self.version_high_water.max(occ.version);
            self.occurrences.insert(occurrence_id, occ.clone());
            stored.push(occ);
        }
        Ok(stored)
    }

    fn mark_conducted(
        &mut self,
        occurrence_id: OccurrenceId,
        at: NaiveDateTime,
    ) -> RepositoryResult<LessonOccurrence> {
        let occ = self.occurrences.get_mut(&occurrence_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Occurrence {} not found", occurrence_id),
                ErrorContext::new("mark_conducted")
                    .with_entity("occurrence")
                    .with_entity_id(occurrence_id),
            )
        })?;
        if occ.conducted_at.is_none() {
            occ.conducted_at = Some(at);
        }
        Ok(occ.clone())
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing store failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        let revision = data.revision + 1;
        *data = LocalData {
            is_healthy: data.is_healthy,
            revision,
            ..Default::default()
        };
    }

    /// Number of stored occurrences.
    pub fn occurrence_count(&self) -> usize {
        self.data.read().occurrences.len()
    }

    /// Apply a change outside of an explicit transaction.
    fn mutate<T>(&self, f: impl FnOnce(&mut LocalData) -> RepositoryResult<T>) -> RepositoryResult<T> {
        let mut data = self.data.write();
        data.check_health()?;
        let result = f(&mut data)?;
        data.revision += 1;
        Ok(result)
    }

    fn read<T>(&self, f: impl FnOnce(&LocalData) -> RepositoryResult<T>) -> RepositoryResult<T> {
        let data = self.data.read();
        data.check_health()?;
        f(&data)
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== Template Repository ====================

#[async_trait]
impl TemplateRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn store_template(&self, template: &Template) -> RepositoryResult<Template> {
        self.mutate(|data| Ok(data.store_template(template)))
    }

    async fn get_template(&self, template_id: TemplateId) -> RepositoryResult<Template> {
        self.read(|data| data.get_template(template_id))
    }

    async fn list_templates(&self) -> RepositoryResult<Vec<TemplateSummary>> {
        self.read(|data| Ok(data.list_templates()))
    }

    async fn active_template_id(&self) -> RepositoryResult<Option<TemplateId>> {
        self.read(|data| Ok(data.active_template))
    }

    async fn set_active_template(&self, template_id: TemplateId) -> RepositoryResult<()> {
        self.mutate(|data| data.set_active_template(template_id))
    }
}

// ==================== Curriculum Repository ====================

#[async_trait]
impl CurriculumRepository for LocalRepository {
    async fn store_plan(&self, plan: &CurriculumPlan) -> RepositoryResult<CurriculumPlan> {
        self.mutate(|data| Ok(data.store_plan(plan)))
    }

    async fn get_plan(&self, plan_id: CurriculumPlanId) -> RepositoryResult<CurriculumPlan> {
        self.read(|data| data.get_plan(plan_id))
    }

    async fn plans_for(
        &self,
        subject_id: SubjectId,
        class_id: ClassId,
    ) -> RepositoryResult<Vec<CurriculumPlan>> {
        self.read(|data| Ok(data.plans_for(subject_id, class_id)))
    }
}

// ==================== Occurrence Repository ====================

#[async_trait]
impl OccurrenceRepository for LocalRepository {
    async fn list_occurrences(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<LessonOccurrence>> {
        self.read(|data| Ok(data.list_occurrences(from, to)))
    }

    async fn get_occurrence(
        &self,
        occurrence_id: OccurrenceId,
    ) -> RepositoryResult<LessonOccurrence> {
        self.read(|data| data.get_occurrence(occurrence_id))
    }

    async fn latest_version(&self) -> RepositoryResult<u32> {
        self.read(|data| Ok(data.latest_version()))
    }
}

// ==================== Transactions ====================

#[async_trait]
impl TransactionalRepository for LocalRepository {
    async fn begin(&self) -> RepositoryResult<Box<dyn CalendarTransaction>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(Box::new(LocalTransaction {
            store: Arc::clone(&self.data),
            base_revision: data.revision,
            working: data.clone(),
            dirty: false,
        }))
    }
}

/// Working copy of the store owned by one transaction.
struct LocalTransaction {
    store: Arc<RwLock<LocalData>>,
    base_revision: u64,
    working: LocalData,
    dirty: bool,
}

impl LocalTransaction {
    fn write<T>(&mut self, f: impl FnOnce(&mut LocalData) -> RepositoryResult<T>) -> RepositoryResult<T> {
        let result = f(&mut self.working)?;
        self.dirty = true;
        Ok(result)
    }
}

#[async_trait]
impl CalendarTransaction for LocalTransaction {
    async fn active_template_id(&self) -> RepositoryResult<Option<TemplateId>> {
        Ok(self.working.active_template)
    }

    async fn get_template(&self, template_id: TemplateId) -> RepositoryResult<Template> {
        self.working.get_template(template_id)
    }

    async fn store_template(&mut self, template: &Template) -> RepositoryResult<Template> {
        self.write(|data| Ok(data.store_template(template)))
    }

    async fn set_active_template(&mut self, template_id: TemplateId) -> RepositoryResult<()> {
        self.write(|data| data.set_active_template(template_id))
    }

    async fn get_plan(&self, plan_id: CurriculumPlanId) -> RepositoryResult<CurriculumPlan> {
        self.working.get_plan(plan_id)
    }

    async fn plans_for(
        &self,
        subject_id: SubjectId,
        class_id: ClassId,
    ) -> RepositoryResult<Vec<CurriculumPlan>> {
        Ok(self.working.plans_for(subject_id, class_id))
    }

    async fn set_planned_dates(
        &mut self,
        plan_id: CurriculumPlanId,
        dates: &[(CurriculumEntryId, NaiveDate)],
    ) -> RepositoryResult<usize> {
        self.write(|data| data.set_planned_dates(plan_id, dates))
    }

    async fn stamp_actual_date(
        &mut self,
        entry_id: CurriculumEntryId,
        date: NaiveDate,
    ) -> RepositoryResult<bool> {
        self.write(|data| Ok(data.stamp_actual_date(entry_id, date)))
    }

    async fn get_occurrence(
        &self,
        occurrence_id: OccurrenceId,
    ) -> RepositoryResult<LessonOccurrence> {
        self.working.get_occurrence(occurrence_id)
    }

    async fn delete_generated_from(&mut self, from: NaiveDate) -> RepositoryResult<usize> {
        self.write(|data| Ok(data.delete_generated_from(from)))
    }

    async fn bound_entry_ids(&self) -> RepositoryResult<BTreeSet<CurriculumEntryId>> {
        Ok(self.working.bound_entry_ids())
    }

    async fn next_version(&self) -> RepositoryResult<u32> {
        let current = self
            .working
            .latest_version()
            .max(self.working.version_high_water);
        current.checked_add(1).ok_or_else(|| {
            RepositoryError::internal("Occurrence version counter overflowed")
                .with_operation("next_version")
        })
    }

    async fn insert_occurrences(
        &mut self,
        occurrences: Vec<LessonOccurrence>,
    ) -> RepositoryResult<Vec<LessonOccurrence>> {
        self.write(|data| data.insert_occurrences(occurrences))
    }

    async fn mark_conducted(
        &mut self,
        occurrence_id: OccurrenceId,
        at: NaiveDateTime,
    ) -> RepositoryResult<LessonOccurrence> {
        self.write(|data| data.mark_conducted(occurrence_id, at))
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let LocalTransaction {
            store,
            base_revision,
            mut working,
            ..
        } = *self;

        let mut data = store.write();
        data.check_health()?;
        if data.revision != base_revision {
            return Err(RepositoryError::transaction_with_context(
                "Store was modified by another writer since the transaction began",
                ErrorContext::new("commit")
                    .with_details(format!(
                        "base_revision={}, current_revision={}",
                        base_revision, data.revision
                    ))
                    .retryable(),
            ));
        }
        working.revision = base_revision + 1;
        working.is_healthy = data.is_healthy;
        *data = working;
        Ok(())
    }
}
