//! High-level database service layer.
//!
//! Repository-agnostic operations that work with any implementation of the
//! repository traits. The HTTP handlers call these rather than the traits
//! directly.
//!
//! # Usage
//!
//! ```no_run
//! use lesson_calendar::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let templates = services::list_templates(&repo).await?;
//!     println!("Found {} templates", templates.len());
//!     Ok(())
//! }
//! ```

use chrono::NaiveDate;
use log::{info, warn};

use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::algorithms::{detect_collisions, Cluster, SeverityPolicy};
use crate::api::{CurriculumPlanId, OccurrenceId, TemplateId};
use crate::models::{CurriculumPlan, LessonOccurrence, Template, TemplateSummary};

// ==================== Health & Connection ====================

/// Check if the store is healthy.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Template Operations ====================

/// Store a template.
///
/// An already stored template with the same fingerprint is returned instead
/// of storing a duplicate.
pub async fn store_template<R: FullRepository + ?Sized>(
    repo: &R,
    template: &Template,
) -> RepositoryResult<Template> {
    let fingerprint = template.fingerprint();
    for summary in repo.list_templates().await? {
        let existing = repo.get_template(summary.template_id).await?;
        if existing.fingerprint() == fingerprint {
            info!(
                "Template '{}' matches stored template {}, reusing it",
                template.name, summary.template_id
            );
            return Ok(existing);
        }
    }
    let stored = repo.store_template(template).await?;
    info!(
        "Stored template {:?} '{}' with {} slots",
        stored.id,
        stored.name,
        stored.slots.len()
    );
    Ok(stored)
}

pub async fn get_template<R: FullRepository + ?Sized>(
    repo: &R,
    template_id: TemplateId,
) -> RepositoryResult<Template> {
    repo.get_template(template_id).await
}

pub async fn list_templates<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<TemplateSummary>> {
    repo.list_templates().await
}

/// The active template.
///
/// # Returns
/// * `Err(RepositoryError::NotFound)` - If no template is active
pub async fn get_active_template<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Template> {
    match repo.active_template_id().await? {
        Some(template_id) => repo.get_template(template_id).await,
        None => Err(RepositoryError::not_found("No active template")),
    }
}

pub async fn activate_template<R: FullRepository + ?Sized>(
    repo: &R,
    template_id: TemplateId,
) -> RepositoryResult<()> {
    repo.set_active_template(template_id).await?;
    info!("Template {} is now active", template_id);
    Ok(())
}

// ==================== Curriculum Operations ====================

pub async fn store_plan<R: FullRepository + ?Sized>(
    repo: &R,
    plan: &CurriculumPlan,
) -> RepositoryResult<CurriculumPlan> {
    repo.store_plan(plan).await
}

pub async fn get_plan<R: FullRepository + ?Sized>(
    repo: &R,
    plan_id: CurriculumPlanId,
) -> RepositoryResult<CurriculumPlan> {
    repo.get_plan(plan_id).await
}

// ==================== Occurrence Operations ====================

/// Occurrences dated within `[from, to]`.
pub async fn list_occurrences<R: FullRepository + ?Sized>(
    repo: &R,
    from: NaiveDate,
    to: NaiveDate,
) -> RepositoryResult<Vec<LessonOccurrence>> {
    if from > to {
        return Err(RepositoryError::validation(format!(
            "Invalid date range: {} is after {}",
            from, to
        )));
    }
    repo.list_occurrences(from, to).await
}

pub async fn get_occurrence<R: FullRepository + ?Sized>(
    repo: &R,
    occurrence_id: OccurrenceId,
) -> RepositoryResult<LessonOccurrence> {
    repo.get_occurrence(occurrence_id).await
}

/// Cluster stored occurrences in `[from, to]`, manual rows included.
///
/// Cluster members are occurrence ids.
pub async fn audit_collisions<R: FullRepository + ?Sized>(
    repo: &R,
    from: NaiveDate,
    to: NaiveDate,
    policy: &SeverityPolicy,
) -> RepositoryResult<Vec<Cluster<NaiveDate, i64>>> {
    let occurrences = list_occurrences(repo, from, to).await?;
    let clusters = detect_collisions(&occurrences, policy);
    if clusters.iter().any(|cluster| cluster.is_error()) {
        warn!(
            "Stored calendar has {} collision cluster(s) between {} and {}",
            clusters.len(),
            from,
            to
        );
    }
    Ok(clusters)
}
