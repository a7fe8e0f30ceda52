//! Curriculum binding: pick at most one curriculum entry for a lesson.
//!
//! Selection priority, first match wins, skipping consumed entries:
//!
//! 1. entry pinned to the lesson's origin slot;
//! 2. entry planned exactly on the lesson date;
//! 3. floating entry (no planned date);
//! 4. entry with the nearest planned date, the future one on a tie.
//!
//! Within each rule the curriculum order `(section ordinal, entry ordinal, id)`
//! breaks remaining ties. Consumption lives in a run-scoped
//! [`BindingContext`] so one run never binds an entry twice.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::{ClassId, CurriculumEntryId, CurriculumPlanId, SlotId, SubjectId};
use crate::models::{CurriculumEntry, CurriculumPlan};

/// Why a lesson could not be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissCause {
    /// No curriculum plan exists for the (subject, class) pair.
    NoPlan,
    /// Every entry of the selected plan is already bound.
    PlanExhausted,
}

impl MissCause {
    pub fn code(&self) -> &'static str {
        match self {
            MissCause::NoPlan => "NO_PLAN",
            MissCause::PlanExhausted => "PLAN_EXHAUSTED",
        }
    }
}

impl std::fmt::Display for MissCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Which priority rule produced a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingRule {
    PinnedSlot,
    ExactDate,
    Floating,
    NearestDate,
}

/// The entry chosen for one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundEntry {
    pub plan_id: CurriculumPlanId,
    pub entry_id: CurriculumEntryId,
    pub ordinal: u32,
    pub title: String,
    pub rule: BindingRule,
}

/// Entries already bound, either persisted before the run or chosen during it.
#[derive(Debug, Clone, Default)]
pub struct BindingContext {
    consumed: BTreeSet<CurriculumEntryId>,
}

impl BindingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the bindings already persisted.
    pub fn seeded(bound: impl IntoIterator<Item = CurriculumEntryId>) -> Self {
        Self {
            consumed: bound.into_iter().collect(),
        }
    }

    pub fn is_consumed(&self, entry_id: CurriculumEntryId) -> bool {
        self.consumed.contains(&entry_id)
    }

    /// Mark an entry as bound. Returns `false` when it already was.
    pub fn consume(&mut self, entry_id: CurriculumEntryId) -> bool {
        self.consumed.insert(entry_id)
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }
}

/// Pick the plan to bind against when a pair has several.
///
/// The unique plan flagged current wins. Otherwise the latest `created_at`
/// among the current plans (or among all plans when none is current) wins,
/// with the highest id breaking ties.
pub fn select_plan(plans: &[CurriculumPlan]) -> Option<&CurriculumPlan> {
    let current: Vec<&CurriculumPlan> = plans.iter().filter(|plan| plan.is_current).collect();
    if current.len() == 1 {
        return current.into_iter().next();
    }
    let pool: Vec<&CurriculumPlan> = if current.is_empty() {
        plans.iter().collect()
    } else {
        current
    };
    pool.into_iter().max_by_key(|plan| (plan.created_at, plan.id))
}

/// One plan's entries flattened in curriculum order.
#[derive(Debug, Clone)]
struct PlanEntries {
    plan_id: CurriculumPlanId,
    entries: Vec<CurriculumEntry>,
}

/// Binds lessons to entries of the plans loaded into it.
#[derive(Debug, Clone, Default)]
pub struct CurriculumBinder {
    plans: BTreeMap<(SubjectId, ClassId), Option<PlanEntries>>,
}

impl CurriculumBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether plans for the pair were already loaded.
    pub fn has_pair(&self, subject_id: SubjectId, class_id: ClassId) -> bool {
        self.plans.contains_key(&(subject_id, class_id))
    }

    /// Load the candidate plans of one pair; the chosen plan is fixed for the
    /// rest of the run. Entries without an id are ignored.
    pub fn load_pair(&mut self, subject_id: SubjectId, class_id: ClassId, plans: &[CurriculumPlan]) {
        let selected = select_plan(plans).and_then(|plan| {
            let plan_id = plan.id?;
            let entries = plan
                .entries_in_order()
                .into_iter()
                .filter(|entry| entry.id.is_some())
                .cloned()
                .collect();
            Some(PlanEntries { plan_id, entries })
        });
        self.plans.insert((subject_id, class_id), selected);
    }

    /// Bind one lesson, consuming the chosen entry in `ctx`.
    pub fn bind(
        &self,
        subject_id: SubjectId,
        class_id: ClassId,
        date: NaiveDate,
        origin_slot: Option<SlotId>,
        ctx: &mut BindingContext,
    ) -> Result<BoundEntry, MissCause> {
        let plan = self
            .plans
            .get(&(subject_id, class_id))
            .and_then(Option::as_ref)
            .ok_or(MissCause::NoPlan)?;

        let (entry, rule) = choose(&plan.entries, date, origin_slot, ctx)
            .ok_or(MissCause::PlanExhausted)?;
        let entry_id = entry.id.ok_or(MissCause::PlanExhausted)?;
        ctx.consume(entry_id);

        Ok(BoundEntry {
            plan_id: plan.plan_id,
            entry_id,
            ordinal: entry.ordinal,
            title: entry.title.clone(),
            rule,
        })
    }
}

fn choose<'a>(
    entries: &'a [CurriculumEntry],
    date: NaiveDate,
    origin_slot: Option<SlotId>,
    ctx: &BindingContext,
) -> Option<(&'a CurriculumEntry, BindingRule)> {
    let available: Vec<&CurriculumEntry> = entries
        .iter()
        .filter(|entry| entry.id.is_some_and(|id| !ctx.is_consumed(id)))
        .collect();

    if let Some(slot) = origin_slot {
        if let Some(entry) = available.iter().copied().find(|e| e.pinned_slot_id == Some(slot)) {
            return Some((entry, BindingRule::PinnedSlot));
        }
    }
    if let Some(entry) = available.iter().copied().find(|e| e.planned_date == Some(date)) {
        return Some((entry, BindingRule::ExactDate));
    }
    if let Some(entry) = available.iter().copied().find(|e| e.planned_date.is_none()) {
        return Some((entry, BindingRule::Floating));
    }

    // Distance first, then future before past; min_by_key keeps the first
    // (lowest curriculum order) on a full tie.
    available
        .into_iter()
        .filter_map(|entry| {
            let planned = entry.planned_date?;
            let delta = (planned - date).num_days();
            Some((entry, (delta.abs(), delta < 0)))
        })
        .min_by_key(|(_, key)| *key)
        .map(|(entry, _)| (entry, BindingRule::NearestDate))
}
