//! Template repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::TemplateId;
use crate::models::{Template, TemplateSummary};

/// Storage of weekly templates and the active-template pointer.
///
/// Templates are immutable once stored; publishing a new pattern stores a new
/// template and swaps the pointer.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Store a template, assigning template and slot ids.
    ///
    /// # Returns
    /// * `Ok(Template)` - The stored template with ids filled in
    async fn store_template(&self, template: &Template) -> RepositoryResult<Template>;

    /// Retrieve a template by id.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the template doesn't exist
    async fn get_template(&self, template_id: TemplateId) -> RepositoryResult<Template>;

    /// List all templates ordered by id.
    async fn list_templates(&self) -> RepositoryResult<Vec<TemplateSummary>>;

    /// The currently active template, if any.
    async fn active_template_id(&self) -> RepositoryResult<Option<TemplateId>>;

    /// Point the active template at `template_id`.
    async fn set_active_template(&self, template_id: TemplateId) -> RepositoryResult<()>;
}
