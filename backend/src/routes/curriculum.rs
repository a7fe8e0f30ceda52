use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::{CurriculumPlanId, TemplateId};

/// Spread a plan's entries over the lesson dates of a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributeRequest {
    /// Defaults to the active template.
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    /// Defaults to the Monday after today.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributeResult {
    pub plan_id: CurriculumPlanId,
    pub template_id: TemplateId,
    pub start_date: NaiveDate,
    /// Entries that received a planned date.
    pub updated: usize,
    /// Date given to the last entry, if any.
    pub last_date: Option<NaiveDate>,
}

/// Curriculum route function name constant
pub const DISTRIBUTE_PLANNED_DATES: &str = "distribute_planned_dates";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_is_valid() {
        let req: DistributeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, DistributeRequest::default());
    }

    #[test]
    fn test_result_serialization() {
        let result = DistributeResult {
            plan_id: CurriculumPlanId::new(3),
            template_id: TemplateId::new(1),
            start_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            updated: 0,
            last_date: None,
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["plan_id"], 3);
        assert_eq!(json["start_date"], "2025-09-01");
        assert!(json["last_date"].is_null());
    }
}
