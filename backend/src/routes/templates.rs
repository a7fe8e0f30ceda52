use serde::{Deserialize, Serialize};

use crate::api::{DraftLessonInput, TemplateId, WeeklyNorm};

/// Promote a draft into a new active template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishDraftRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub lessons: Vec<DraftLessonInput>,
    #[serde(default)]
    pub weekly_norms: Vec<WeeklyNorm>,
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub template_id: TemplateId,
    pub slot_count: usize,
    /// SHA-256 of the normalized slot list.
    pub fingerprint: String,
}

/// Template route function name constants
pub const LIST_TEMPLATES: &str = "list_templates";
pub const GET_ACTIVE_TEMPLATE: &str = "get_active_template";
pub const PUBLISH_DRAFT: &str = "publish_draft";
