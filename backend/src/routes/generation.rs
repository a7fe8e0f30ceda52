use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::algorithms::clustering::{ResourceKind, Severity};
use crate::api::{ClassId, RoomId, SlotId, SubjectId, TeacherId, TemplateId};
use crate::services::binder::MissCause;

/// Generation trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateCalendarRequest {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Defaults to the active template.
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    /// Defaults to `from`.
    #[serde(default)]
    pub rewrite_from: Option<NaiveDate>,
    #[serde(default)]
    pub verbose: bool,
}

impl GenerateCalendarRequest {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from,
            to,
            template_id: None,
            rewrite_from: None,
            verbose: false,
        }
    }
}

/// A lesson generated without a curriculum topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingWarning {
    pub code: MissCause,
    pub message: String,
    pub date: NaiveDate,
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub origin_slot_id: Option<SlotId>,
}

/// One collision cluster found in a candidate batch.
///
/// Cluster members are indices into the candidate batch, since candidates
/// have no stored ids yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionReport {
    pub resource_type: ResourceKind,
    pub resource_id: i64,
    pub date: NaiveDate,
    pub cluster_of_occurrence_ids: Vec<i64>,
    pub severity: Severity,
    pub message: String,
    /// Filled only for verbose requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<CollisionDetail>>,
}

/// Verbose description of one cluster member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionDetail {
    pub index: i64,
    pub origin_slot_id: Option<SlotId>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub teacher_id: TeacherId,
    pub class_id: ClassId,
    pub subject_id: SubjectId,
    pub room_id: Option<RoomId>,
}

/// Successful generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub template_id: TemplateId,
    pub version: u32,
    pub batch_id: Uuid,
    pub deleted: usize,
    pub created: usize,
    pub created_with_binding: usize,
    pub created_without_binding: usize,
    pub warnings: Vec<BindingWarning>,
    pub warnings_count: usize,
    /// Warning counts keyed by miss cause code.
    pub warnings_summary: BTreeMap<String, usize>,
    /// Warning counts keyed by `"class/subject"`.
    pub warnings_by_pair: BTreeMap<String, usize>,
    /// Warning-severity collisions (rooms by default); never block a run.
    #[serde(default)]
    pub collision_warnings: Vec<CollisionReport>,
}

pub const GENERATE_CALENDAR: &str = "generate_calendar";
