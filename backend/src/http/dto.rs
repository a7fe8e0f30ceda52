//! Data Transfer Objects for the HTTP API.
//!
//! Request and response bodies come from the routes module since they already
//! derive Serialize/Deserialize; this module adds the transport-only ones.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Re-export existing DTOs that are already serializable
pub use crate::api::{
    // Curriculum
    DistributeRequest, DistributeResult,
    // Drafts
    CollisionRecord, DraftValidationReport, DraftValidationRequest,
    // Generation
    CollisionReport, GenerateCalendarRequest, GenerationSummary,
    // Occurrences
    ConductRequest, ConductResult, ManualOccurrenceRequest, OccurrenceQuery,
    // Templates
    PublishDraftRequest, PublishResult, TemplateSummary,
};
use crate::algorithms::{Cluster, ResourceKind, Severity};
use crate::models::LessonOccurrence;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Repository status
    pub database: String,
}

/// Template list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateListResponse {
    pub templates: Vec<TemplateSummary>,
    pub total: usize,
}

/// Occurrence list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceListResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub occurrences: Vec<LessonOccurrence>,
    pub total: usize,
}

/// One overlap among stored occurrences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCollisionDto {
    pub resource_type: ResourceKind,
    pub resource_id: i64,
    pub date: NaiveDate,
    pub occurrence_ids: Vec<i64>,
    pub severity: Severity,
}

impl From<Cluster<NaiveDate, i64>> for StoredCollisionDto {
    fn from(cluster: Cluster<NaiveDate, i64>) -> Self {
        Self {
            resource_type: cluster.kind,
            resource_id: cluster.resource_id,
            date: cluster.day,
            occurrence_ids: cluster.members,
            severity: cluster.severity,
        }
    }
}

/// Stored-calendar audit response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionAuditResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub collisions: Vec<StoredCollisionDto>,
}
