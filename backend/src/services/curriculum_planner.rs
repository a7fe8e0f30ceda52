//! Planned-date distribution for curriculum plans.
//!
//! Entries are taken in `(section, entry)` order and each one is given the
//! date of the next lesson of the plan's (subject, class) pair, walking the
//! calendar day by day from the start date. Days off consume no entries.

use chrono::{Datelike, Duration, Local, NaiveDate};
use log::{debug, info};

use crate::api::{CurriculumEntryId, CurriculumPlanId, DistributeRequest, DistributeResult};
use crate::db::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::models::{weekday_index, CurriculumPlan, Template, DAYS_PER_WEEK};
use crate::services::expander::HolidayCalendar;

/// Monday strictly after `today`.
pub fn next_monday(today: NaiveDate) -> NaiveDate {
    let ahead = 7 - i64::from(today.weekday().num_days_from_monday());
    today + Duration::days(ahead)
}

/// Pair each entry of `plan` with a lesson date.
///
/// Returns an empty list when the template has no usable slot for the pair.
pub fn plan_dates(
    plan: &CurriculumPlan,
    template: &Template,
    start_date: NaiveDate,
    holidays: &dyn HolidayCalendar,
) -> Vec<(CurriculumEntryId, NaiveDate)> {
    let mut per_weekday = [0usize; DAYS_PER_WEEK as usize];
    for slot in template.slots_for(plan.subject_id, plan.class_id) {
        if let Some(count) = per_weekday.get_mut(slot.weekday as usize) {
            *count += 1;
        }
    }
    if per_weekday.iter().all(|count| *count == 0) {
        return Vec::new();
    }

    let entries: Vec<CurriculumEntryId> = plan
        .entries_in_order()
        .into_iter()
        .filter_map(|entry| entry.id)
        .collect();

    let mut dates = Vec::with_capacity(entries.len());
    let mut pending = entries.into_iter();
    let mut day = start_date;
    'days: loop {
        if !holidays.is_day_off(day) {
            for _ in 0..per_weekday[weekday_index(day) as usize] {
                match pending.next() {
                    Some(entry_id) => dates.push((entry_id, day)),
                    None => break 'days,
                }
            }
        }
        if pending.len() == 0 {
            break;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    dates
}

/// Assign planned dates to every entry of a plan in one transaction.
pub async fn distribute_planned_dates<R: FullRepository + ?Sized>(
    repo: &R,
    plan_id: CurriculumPlanId,
    request: &DistributeRequest,
    holidays: &dyn HolidayCalendar,
) -> RepositoryResult<DistributeResult> {
    let start_date = request
        .start_date
        .unwrap_or_else(|| next_monday(Local::now().date_naive()));

    let mut tx = repo.begin().await?;
    let template_id = match request.template_id {
        Some(id) => id,
        None => tx
            .active_template_id()
            .await?
            .ok_or_else(|| RepositoryError::validation("No active template"))?,
    };
    let template = tx.get_template(template_id).await?;
    let plan = tx.get_plan(plan_id).await?;

    let dates = plan_dates(&plan, &template, start_date, holidays);
    if dates.is_empty() {
        debug!(
            "Template {} has no lessons for subject {} class {}",
            template_id, plan.subject_id, plan.class_id
        );
    }
    let updated = tx.set_planned_dates(plan_id, &dates).await?;
    tx.commit().await?;

    info!(
        "Distributed {} entries of plan {} from {}",
        updated, plan_id, start_date
    );
    Ok(DistributeResult {
        plan_id,
        template_id,
        start_date,
        updated,
        last_date: dates.last().map(|(_, date)| *date),
    })
}
