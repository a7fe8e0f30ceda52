//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use super::dto::{
    CollisionAuditResponse, ConductRequest, ConductResult, DistributeRequest, DistributeResult,
    DraftValidationReport, DraftValidationRequest, GenerateCalendarRequest, GenerationSummary,
    HealthResponse, ManualOccurrenceRequest, OccurrenceListResponse, OccurrenceQuery,
    PublishDraftRequest, PublishResult, TemplateListResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{CurriculumPlanId, OccurrenceId};
use crate::db::services as db_services;
use crate::models::{LessonOccurrence, Template};
use crate::services::{conduct, curriculum_planner, draft_validator, generator, publish};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create something.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and storage is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Templates
// =============================================================================

/// GET /v1/templates
pub async fn list_templates(State(state): State<AppState>) -> HandlerResult<TemplateListResponse> {
    let templates = db_services::list_templates(state.repository.as_ref()).await?;
    let total = templates.len();
    Ok(Json(TemplateListResponse { templates, total }))
}

/// GET /v1/templates/active
pub async fn get_active_template(State(state): State<AppState>) -> HandlerResult<Template> {
    let template = db_services::get_active_template(state.repository.as_ref()).await?;
    Ok(Json(template))
}

/// POST /v1/templates/publish
///
/// Validate a draft and make it the active template.
pub async fn publish_draft(
    State(state): State<AppState>,
    payload: Result<Json<PublishDraftRequest>, JsonRejection>,
) -> CreatedResult<PublishResult> {
    let Json(request) = payload?;
    let result =
        publish::publish_draft(state.repository.as_ref(), &request, &state.settings.severity)
            .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

// =============================================================================
// Drafts
// =============================================================================

/// POST /v1/drafts/validate
///
/// Dry-run collision report for an unpublished draft. Never writes.
pub async fn validate_draft(
    State(state): State<AppState>,
    payload: Result<Json<DraftValidationRequest>, JsonRejection>,
) -> HandlerResult<DraftValidationReport> {
    let Json(request) = payload?;
    Ok(Json(draft_validator::validate_draft(
        &request,
        &state.settings.severity,
    )))
}

// =============================================================================
// Calendar Generation
// =============================================================================

/// POST /v1/calendar/generate
///
/// Generate dated lessons for a window. Rejections carry the failure code and,
/// for collisions, the offending clusters.
pub async fn generate_calendar(
    State(state): State<AppState>,
    payload: Result<Json<GenerateCalendarRequest>, JsonRejection>,
) -> CreatedResult<GenerationSummary> {
    let Json(request) = payload?;
    let summary = generator::generate(
        state.repository.as_ref(),
        &request,
        &state.settings,
        state.holidays.as_ref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

// =============================================================================
// Occurrences
// =============================================================================

/// GET /v1/occurrences?from=YYYY-MM-DD&to=YYYY-MM-DD
pub async fn list_occurrences(
    State(state): State<AppState>,
    query: Result<Query<OccurrenceQuery>, QueryRejection>,
) -> HandlerResult<OccurrenceListResponse> {
    let Query(query) = query?;
    let occurrences =
        db_services::list_occurrences(state.repository.as_ref(), query.from, query.to).await?;
    let total = occurrences.len();
    Ok(Json(OccurrenceListResponse {
        from: query.from,
        to: query.to,
        occurrences,
        total,
    }))
}

/// POST /v1/occurrences
///
/// Add a manual lesson. Manual lessons are never replaced by generation.
pub async fn add_manual_occurrence(
    State(state): State<AppState>,
    payload: Result<Json<ManualOccurrenceRequest>, JsonRejection>,
) -> CreatedResult<LessonOccurrence> {
    let Json(request) = payload?;
    let occurrence = conduct::add_manual_occurrence(state.repository.as_ref(), &request).await?;
    Ok((StatusCode::CREATED, Json(occurrence)))
}

/// GET /v1/occurrences/collisions?from=YYYY-MM-DD&to=YYYY-MM-DD
///
/// Overlaps among stored lessons, manual ones included.
pub async fn audit_collisions(
    State(state): State<AppState>,
    query: Result<Query<OccurrenceQuery>, QueryRejection>,
) -> HandlerResult<CollisionAuditResponse> {
    let Query(query) = query?;
    let clusters = db_services::audit_collisions(
        state.repository.as_ref(),
        query.from,
        query.to,
        &state.settings.severity,
    )
    .await?;
    Ok(Json(CollisionAuditResponse {
        from: query.from,
        to: query.to,
        collisions: clusters.into_iter().map(Into::into).collect(),
    }))
}

/// POST /v1/occurrences/{occurrence_id}/conduct
pub async fn mark_conducted(
    State(state): State<AppState>,
    occurrence_id: Result<Path<i64>, PathRejection>,
    payload: Option<Json<ConductRequest>>,
) -> HandlerResult<ConductResult> {
    let Path(occurrence_id) = occurrence_id?;
    let at = payload.and_then(|Json(request)| request.at);
    let result = conduct::mark_conducted(
        state.repository.as_ref(),
        OccurrenceId::new(occurrence_id),
        at,
    )
    .await?;
    Ok(Json(result))
}

// =============================================================================
// Curriculum
// =============================================================================

/// POST /v1/curriculum/plans/{plan_id}/distribute
pub async fn distribute_planned_dates(
    State(state): State<AppState>,
    plan_id: Result<Path<i64>, PathRejection>,
    payload: Option<Json<DistributeRequest>>,
) -> HandlerResult<DistributeResult> {
    let Path(plan_id) = plan_id?;
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let result = curriculum_planner::distribute_planned_dates(
        state.repository.as_ref(),
        CurriculumPlanId::new(plan_id),
        &request,
        state.holidays.as_ref(),
    )
    .await?;
    Ok(Json(result))
}
