//! Scheduling workflow tests: batch assignment atomicity, automatic
//! generation, and the leave/swap approval side effects.

mod support;

use chrono::NaiveTime;
use deskline_api::services::{leave, scheduler};
use deskline_api::ErrorCode;
use deskline_core::{ApprovalStatus, LiveStatus, RequestType, ScheduleStatus};
use deskline_storage::{InMemoryStore, Store};

use support::*;

fn morning() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}

fn evening() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 0, 0).unwrap()
}

#[tokio::test]
async fn test_assign_conflict_rolls_back_and_names_agents() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    seed_agent(&store, "CS002", "Lee", false).await;
    let shift = seed_shift(&store, "day", morning(), evening()).await;
    let date = today();
    put_on_duty(&store, "CS001", shift, date).await;

    let err = scheduler::assign_schedule(
        &store,
        shift,
        &["CS001".to_string(), "CS002".to_string()],
        date,
    )
    .await
    .unwrap_err();

    assert_eq!(err.code, ErrorCode::ScheduleConflict);
    let details = err.details.expect("conflict details");
    assert_eq!(details["agent_ids"][0], "CS001");
    // All-or-nothing: the non-conflicting agent gained no entry either.
    assert!(store.schedule_find("CS002", date).await.unwrap().is_none());
}

#[tokio::test]
async fn test_assign_marks_agents_working() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    seed_agent(&store, "CS002", "Lee", false).await;
    let shift = seed_shift(&store, "day", morning(), evening()).await;

    scheduler::assign_schedule(
        &store,
        shift,
        &["CS001".to_string(), "CS002".to_string()],
        today(),
    )
    .await
    .unwrap();

    for id in ["CS001", "CS002"] {
        let agent = store.agent_get(id).await.unwrap().unwrap();
        assert_eq!(agent.live_status, LiveStatus::Working);
    }
}

#[tokio::test]
async fn test_auto_schedule_spreads_agents_across_shifts() {
    let store = InMemoryStore::new();
    for (id, name) in [("CS001", "Dana"), ("CS002", "Lee"), ("CS003", "Ash")] {
        seed_agent(&store, id, name, false).await;
    }
    let day = seed_shift(&store, "day", morning(), evening()).await;
    let night = seed_shift(
        &store,
        "night",
        NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
    )
    .await;
    let date = today();

    let created = scheduler::auto_schedule(&store, date, date, None, None)
        .await
        .unwrap();
    assert_eq!(created, 3);

    // The rotation index advances per assignment, so the agents alternate
    // between the two templates instead of all landing on the first.
    let mut shifts = Vec::new();
    for id in ["CS001", "CS002", "CS003"] {
        let entry = store.schedule_find(id, date).await.unwrap().unwrap();
        shifts.push(entry.shift_id);
    }
    assert_eq!(shifts, vec![day, night, day]);
}

#[tokio::test]
async fn test_auto_schedule_skips_busy_agents() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    seed_agent(&store, "CS002", "Lee", false).await;
    let shift = seed_shift(&store, "day", morning(), evening()).await;
    let date = today();
    put_on_duty(&store, "CS001", shift, date).await;

    let created = scheduler::auto_schedule(&store, date, date, None, None)
        .await
        .unwrap();

    assert_eq!(created, 1);
    let entry = store.schedule_find("CS002", date).await.unwrap().unwrap();
    assert_eq!(entry.status, ScheduleStatus::Normal);
}

#[tokio::test]
async fn test_auto_schedule_honors_team_filter() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    seed_shift(&store, "day", morning(), evening()).await;
    let date = today();

    // Seeded agents all sit in tier1; an unmatched team yields no work.
    let created = scheduler::auto_schedule(&store, date, date, None, Some("tier9"))
        .await
        .unwrap();
    assert_eq!(created, 0);

    let created = scheduler::auto_schedule(&store, date, date, Some("support"), Some("tier1"))
        .await
        .unwrap();
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_auto_schedule_range_is_capped() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    seed_shift(&store, "day", morning(), evening()).await;
    let start = today();
    let end = start + chrono::Days::new(40);

    let err = scheduler::auto_schedule(&store, start, end, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidRange);
}

#[tokio::test]
async fn test_grid_returns_axes_and_joined_entries() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    seed_agent(&store, "CS002", "Lee", false).await;
    let shift = seed_shift(&store, "day", morning(), evening()).await;
    let start = today();
    let end = start + chrono::Days::new(1);
    put_on_duty(&store, "CS001", shift, start).await;

    let grid = scheduler::schedule_grid(&store, start, end, None, None)
        .await
        .unwrap();
    assert_eq!(grid.dates, vec![start, end]);
    assert_eq!(grid.agents.len(), 2);
    assert_eq!(grid.shifts.len(), 1);
    assert_eq!(grid.entries.len(), 1);
    assert_eq!(grid.entries[0].agent_name, "Dana");
    assert_eq!(grid.entries[0].shift_name, "day");
}

#[tokio::test]
async fn test_leave_approval_applies_schedule_side_effects() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    let shift = seed_shift(&store, "day", morning(), evening()).await;
    let date = today();
    put_on_duty(&store, "CS001", shift, date).await;

    let request = leave::apply(
        &store,
        "CS001",
        RequestType::Leave,
        date,
        shift,
        None,
        "dentist".to_string(),
    )
    .await
    .unwrap();
    assert_eq!(request.status, ApprovalStatus::Pending);

    let decided = leave::decide(&store, request.request_id, "manager", true)
        .await
        .unwrap();
    assert_eq!(decided.status, ApprovalStatus::Approved);
    assert_eq!(decided.decided_by.as_deref(), Some("manager"));

    let entry = store.schedule_find("CS001", date).await.unwrap().unwrap();
    assert_eq!(entry.status, ScheduleStatus::OnLeave);
    let agent = store.agent_get("CS001").await.unwrap().unwrap();
    assert_eq!(agent.live_status, LiveStatus::OnLeave);
}

#[tokio::test]
async fn test_swap_approval_reassigns_the_shift() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    seed_agent(&store, "CS002", "Lee", false).await;
    let shift = seed_shift(&store, "day", morning(), evening()).await;
    let date = today();
    put_on_duty(&store, "CS001", shift, date).await;

    let request = leave::apply(
        &store,
        "CS001",
        RequestType::Swap,
        date,
        shift,
        Some("CS002".to_string()),
        String::new(),
    )
    .await
    .unwrap();
    leave::decide(&store, request.request_id, "manager", true)
        .await
        .unwrap();

    let source = store.schedule_find("CS001", date).await.unwrap().unwrap();
    assert_eq!(source.status, ScheduleStatus::Swapped);
    assert_eq!(source.replacement.as_deref(), Some("CS002"));

    let target = store.schedule_find("CS002", date).await.unwrap().unwrap();
    assert_eq!(target.status, ScheduleStatus::Normal);
    assert_eq!(target.shift_id, shift);
}

#[tokio::test]
async fn test_swap_conflict_leaves_everything_unchanged() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    seed_agent(&store, "CS002", "Lee", false).await;
    let shift = seed_shift(&store, "day", morning(), evening()).await;
    let date = today();
    put_on_duty(&store, "CS001", shift, date).await;
    // Target is already scheduled on that date.
    put_on_duty(&store, "CS002", shift, date).await;

    let request = leave::apply(
        &store,
        "CS001",
        RequestType::Swap,
        date,
        shift,
        Some("CS002".to_string()),
        String::new(),
    )
    .await
    .unwrap();
    let err = leave::decide(&store, request.request_id, "manager", true)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ScheduleConflict);

    let source = store.schedule_find("CS001", date).await.unwrap().unwrap();
    assert_eq!(source.status, ScheduleStatus::Normal);
    assert!(source.replacement.is_none());
    let stored = store.leave_get(request.request_id).await.unwrap().unwrap();
    assert_eq!(stored.status, ApprovalStatus::Pending);
}

#[tokio::test]
async fn test_swap_requires_a_different_target() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    let shift = seed_shift(&store, "day", morning(), evening()).await;

    let err = leave::apply(
        &store,
        "CS001",
        RequestType::Swap,
        today(),
        shift,
        Some("CS001".to_string()),
        String::new(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    let err = leave::apply(
        &store,
        "CS001",
        RequestType::Swap,
        today(),
        shift,
        None,
        String::new(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn test_decide_is_single_shot() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    let shift = seed_shift(&store, "day", morning(), evening()).await;
    let date = today();
    put_on_duty(&store, "CS001", shift, date).await;

    let request = leave::apply(
        &store,
        "CS001",
        RequestType::Leave,
        date,
        shift,
        None,
        String::new(),
    )
    .await
    .unwrap();
    leave::decide(&store, request.request_id, "manager", false)
        .await
        .unwrap();

    let err = leave::decide(&store, request.request_id, "manager", true)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadyDecided);
    // Rejection never touched the roster.
    let entry = store.schedule_find("CS001", date).await.unwrap().unwrap();
    assert_eq!(entry.status, ScheduleStatus::Normal);
}

#[tokio::test]
async fn test_overnight_shift_keeps_agent_on_duty_past_midnight() {
    let store = InMemoryStore::new();
    seed_agent(&store, "CS001", "Dana", false).await;
    let night = seed_shift(
        &store,
        "night",
        NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
    )
    .await;
    let date = today();
    put_on_duty(&store, "CS001", night, date).await;

    let late = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
    let early = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
    let midday = NaiveTime::from_hms_opt(12, 0, 0).unwrap();

    assert_eq!(
        scheduler::on_duty_agents(&store, date, late).await.unwrap(),
        vec!["CS001".to_string()]
    );
    assert_eq!(
        scheduler::on_duty_agents(&store, date, early).await.unwrap(),
        vec!["CS001".to_string()]
    );
    assert!(scheduler::on_duty_agents(&store, date, midday)
        .await
        .unwrap()
        .is_empty());
}
