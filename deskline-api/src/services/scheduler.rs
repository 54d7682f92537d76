//! Scheduler Service
//!
//! Batch schedule assignment, grid editing, automatic shift generation,
//! and the grid query used by the roster view.

use std::collections::HashMap;

use chrono::NaiveDate;
use deskline_core::{Agent, RowId, ScheduleError, ScheduleStatus};
use deskline_storage::{NewScheduleEntry, Store};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::types::{
    GridAgentResponse, ScheduleEntryResponse, ScheduleGridResponse, ShiftResponse,
};

/// Automatic scheduling range cap, in days.
pub const MAX_AUTO_DAYS: i64 = 31;
/// Grid query range cap, in days.
pub const MAX_GRID_DAYS: i64 = 62;

/// Assign one shift to a set of agents on one date, all-or-nothing.
/// On conflict the error names the conflicting agent ids so the caller can
/// resubmit the remainder; on success every agent is marked working.
pub async fn assign_schedule(
    store: &dyn Store,
    shift_id: RowId,
    agent_ids: &[String],
    date: NaiveDate,
) -> ApiResult<Vec<RowId>> {
    if agent_ids.is_empty() {
        return Err(ApiError::missing_field("agent_ids"));
    }

    let entries: Vec<NewScheduleEntry> = agent_ids
        .iter()
        .map(|agent_id| NewScheduleEntry {
            agent_id: agent_id.clone(),
            shift_id,
            date,
        })
        .collect();

    let ids = store.schedule_assign_batch(&entries).await?;
    info!(shift_id, %date, entries = ids.len(), "schedule assigned");
    Ok(ids)
}

/// Point edit of one roster cell; shift id 0 clears it.
pub async fn upsert_cell(
    store: &dyn Store,
    agent_id: &str,
    date: NaiveDate,
    shift_id: RowId,
) -> ApiResult<()> {
    let shift = if shift_id == 0 { None } else { Some(shift_id) };
    store.schedule_upsert_cell(agent_id, date, shift).await?;
    Ok(())
}

fn matches_filter(agent: &Agent, department: Option<&str>, team: Option<&str>) -> bool {
    department.is_none_or(|d| agent.department == d) && team.is_none_or(|t| agent.team == t)
}

/// Generate entries for a date range: every eligible active agent without
/// an entry that day gets the next shift in a rotation over all templates.
/// The rotation index runs continuously across days so agents spread over
/// shifts instead of all landing on the first one. Returns the number of
/// entries created.
pub async fn auto_schedule(
    store: &dyn Store,
    start: NaiveDate,
    end: NaiveDate,
    department: Option<&str>,
    team: Option<&str>,
) -> ApiResult<usize> {
    let days = (end - start).num_days() + 1;
    if days < 1 {
        return Err(ApiError::validation_failed("end_date is before start_date"));
    }
    if days > MAX_AUTO_DAYS {
        return Err(ScheduleError::RangeTooLarge {
            days,
            max: MAX_AUTO_DAYS,
        }
        .into());
    }

    let shifts = store.shift_list().await?;
    if shifts.is_empty() {
        return Err(ApiError::validation_failed(
            "no shift templates to rotate through",
        ));
    }
    let agents: Vec<Agent> = store
        .agent_list()
        .await?
        .into_iter()
        .filter(|a| a.is_active())
        .filter(|a| matches_filter(a, department, team))
        .collect();

    let mut rotation = 0usize;
    let mut created = 0usize;
    let mut date = start;
    while date <= end {
        for agent in &agents {
            if store.schedule_find(&agent.agent_id, date).await?.is_some() {
                continue;
            }
            let shift_id = shifts[rotation % shifts.len()].shift_id;
            rotation += 1;
            store
                .schedule_assign_batch(&[NewScheduleEntry {
                    agent_id: agent.agent_id.clone(),
                    shift_id,
                    date,
                }])
                .await?;
            created += 1;
        }
        date = date.succ_opt().ok_or_else(|| {
            ApiError::validation_failed("date range exceeds the calendar")
        })?;
    }

    info!(%start, %end, created, "auto schedule generated");
    Ok(created)
}

/// Roster grid query: the date axis, the filtered agent axis, every shift
/// template, and the matching entries; the client assembles the table.
/// An inverted range is swapped rather than rejected; the corrected range
/// is capped at 62 days.
pub async fn schedule_grid(
    store: &dyn Store,
    start: NaiveDate,
    end: NaiveDate,
    department: Option<&str>,
    team: Option<&str>,
) -> ApiResult<ScheduleGridResponse> {
    let (start, end) = if start > end { (end, start) } else { (start, end) };
    let days = (end - start).num_days() + 1;
    if days > MAX_GRID_DAYS {
        return Err(ScheduleError::RangeTooLarge {
            days,
            max: MAX_GRID_DAYS,
        }
        .into());
    }

    let mut dates = Vec::with_capacity(days as usize);
    let mut date = start;
    while date <= end {
        dates.push(date);
        date = date.succ_opt().ok_or_else(|| {
            ApiError::validation_failed("date range exceeds the calendar")
        })?;
    }

    let agents: Vec<Agent> = store
        .agent_list()
        .await?
        .into_iter()
        .filter(|a| matches_filter(a, department, team))
        .collect();
    let agent_names: HashMap<String, String> = agents
        .iter()
        .map(|a| (a.agent_id.clone(), a.name.clone()))
        .collect();

    let shifts = store.shift_list().await?;
    let shift_names: HashMap<RowId, String> = shifts
        .iter()
        .map(|s| (s.shift_id, s.name.clone()))
        .collect();

    let entries = store
        .schedule_list_range(start, end)
        .await?
        .into_iter()
        .filter(|e| agent_names.contains_key(&e.agent_id))
        .map(|entry| {
            let agent_name = agent_names.get(&entry.agent_id).cloned().unwrap_or_default();
            let shift_name = shift_names.get(&entry.shift_id).cloned().unwrap_or_default();
            ScheduleEntryResponse::from_entry(entry, agent_name, shift_name)
        })
        .collect();

    Ok(ScheduleGridResponse {
        dates,
        agents: agents
            .into_iter()
            .map(|a| GridAgentResponse {
                agent_id: a.agent_id,
                name: a.name,
                department: a.department,
                team: a.team,
            })
            .collect(),
        shifts: shifts.into_iter().map(ShiftResponse::from).collect(),
        entries,
    })
}

/// The set of agents on duty at `date`/`time_of_day`: active agents whose
/// Normal entry's shift window covers the time, including overnight wraps.
pub async fn on_duty_agents(
    store: &dyn Store,
    date: NaiveDate,
    time_of_day: chrono::NaiveTime,
) -> ApiResult<Vec<String>> {
    let entries = store.schedule_list_range(date, date).await?;
    let shifts: HashMap<RowId, deskline_core::ShiftTemplate> = store
        .shift_list()
        .await?
        .into_iter()
        .map(|s| (s.shift_id, s))
        .collect();
    let agents: HashMap<String, Agent> = store
        .agent_list()
        .await?
        .into_iter()
        .map(|a| (a.agent_id.clone(), a))
        .collect();

    let mut on_duty: Vec<String> = entries
        .into_iter()
        .filter(|e| e.status == ScheduleStatus::Normal)
        .filter(|e| shifts.get(&e.shift_id).is_some_and(|s| s.covers(time_of_day)))
        .filter(|e| agents.get(&e.agent_id).is_some_and(|a| a.is_active()))
        .map(|e| e.agent_id)
        .collect();
    on_duty.sort();
    on_duty.dedup();
    Ok(on_duty)
}
