//! Curriculum repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{ClassId, CurriculumPlanId, SubjectId};
use crate::models::CurriculumPlan;

#[async_trait]
pub trait CurriculumRepository: Send + Sync {
    /// Store a plan, assigning plan, section and entry ids.
    async fn store_plan(&self, plan: &CurriculumPlan) -> RepositoryResult<CurriculumPlan>;

    /// Retrieve a plan by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the plan doesn't exist
    async fn get_plan(&self, plan_id: CurriculumPlanId) -> RepositoryResult<CurriculumPlan>;

    /// All plans for one (subject, class) pair, ordered by id.
    async fn plans_for(
        &self,
        subject_id: SubjectId,
        class_id: ClassId,
    ) -> RepositoryResult<Vec<CurriculumPlan>>;
}
