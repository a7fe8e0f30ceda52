//! Curriculum plans: the ordered topic list a (subject, class) pair covers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{
    ClassId, CurriculumEntryId, CurriculumPlanId, CurriculumSectionId, SlotId, SubjectId,
};
use crate::models::template::default_lesson_kind;

/// One planned lesson topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumEntry {
    pub id: Option<CurriculumEntryId>,
    pub ordinal: u32,
    pub title: String,
    #[serde(default = "default_lesson_kind")]
    pub kind: String,
    #[serde(default)]
    pub planned_date: Option<NaiveDate>,
    #[serde(default)]
    pub actual_date: Option<NaiveDate>,
    /// Hard link to a template slot; wins over every date rule.
    #[serde(default)]
    pub pinned_slot_id: Option<SlotId>,
}

impl CurriculumEntry {
    pub fn new(ordinal: u32, title: impl Into<String>) -> Self {
        Self {
            id: None,
            ordinal,
            title: title.into(),
            kind: default_lesson_kind(),
            planned_date: None,
            actual_date: None,
            pinned_slot_id: None,
        }
    }

    pub fn planned_on(mut self, date: NaiveDate) -> Self {
        self.planned_date = Some(date);
        self
    }

    pub fn pinned_to(mut self, slot: SlotId) -> Self {
        self.pinned_slot_id = Some(slot);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumSection {
    pub id: Option<CurriculumSectionId>,
    pub title: String,
    pub ordinal: u32,
    #[serde(default)]
    pub entries: Vec<CurriculumEntry>,
}

/// Ordered topic plan for one (subject, class) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumPlan {
    pub id: Option<CurriculumPlanId>,
    pub subject_id: SubjectId,
    pub class_id: ClassId,
    pub name: String,
    #[serde(default)]
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sections: Vec<CurriculumSection>,
}

impl CurriculumPlan {
    pub fn new(subject_id: SubjectId, class_id: ClassId, name: impl Into<String>) -> Self {
        Self {
            id: None,
            subject_id,
            class_id,
            name: name.into(),
            is_current: false,
            created_at: Utc::now(),
            sections: Vec::new(),
        }
    }

    /// Append a section holding `entries`, numbered after the existing ones.
    pub fn with_section(mut self, title: impl Into<String>, entries: Vec<CurriculumEntry>) -> Self {
        let ordinal = self.sections.len() as u32 + 1;
        self.sections.push(CurriculumSection {
            id: None,
            title: title.into(),
            ordinal,
            entries,
        });
        self
    }

    /// Entries in curriculum order: section ordinal, then entry ordinal.
    pub fn entries_in_order(&self) -> Vec<&CurriculumEntry> {
        let mut sections: Vec<&CurriculumSection> = self.sections.iter().collect();
        sections.sort_by_key(|section| (section.ordinal, section.id));
        sections
            .into_iter()
            .flat_map(|section| {
                let mut entries: Vec<&CurriculumEntry> = section.entries.iter().collect();
                entries.sort_by_key(|entry| (entry.ordinal, entry.id));
                entries
            })
            .collect()
    }

    pub fn entry(&self, id: CurriculumEntryId) -> Option<&CurriculumEntry> {
        self.sections
            .iter()
            .flat_map(|section| section.entries.iter())
            .find(|entry| entry.id == Some(id))
    }

    pub fn entry_mut(&mut self, id: CurriculumEntryId) -> Option<&mut CurriculumEntry> {
        self.sections
            .iter_mut()
            .flat_map(|section| section.entries.iter_mut())
            .find(|entry| entry.id == Some(id))
    }

    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|section| section.entries.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_in_order_follows_sections() {
        let plan = CurriculumPlan::new(SubjectId::new(1), ClassId::new(1), "Algebra")
            .with_section(
                "Numbers",
                vec![CurriculumEntry::new(2, "b"), CurriculumEntry::new(1, "a")],
            )
            .with_section("Geometry", vec![CurriculumEntry::new(1, "c")]);

        let titles: Vec<&str> = plan
            .entries_in_order()
            .into_iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(plan.entry_count(), 3);
    }

    #[test]
    fn test_entry_lookup_by_id() {
        let mut entry = CurriculumEntry::new(1, "a");
        entry.id = Some(CurriculumEntryId::new(5));
        let mut plan =
            CurriculumPlan::new(SubjectId::new(1), ClassId::new(1), "p").with_section("s", vec![entry]);

        assert!(plan.entry(CurriculumEntryId::new(5)).is_some());
        assert!(plan.entry(CurriculumEntryId::new(6)).is_none());

        let date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        plan.entry_mut(CurriculumEntryId::new(5)).unwrap().actual_date = Some(date);
        assert_eq!(plan.entry(CurriculumEntryId::new(5)).unwrap().actual_date, Some(date));
    }
}
