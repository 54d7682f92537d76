//! Shared fixtures for the workflow integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime, Utc};
use deskline_core::{
    Agent, EmploymentStatus, LiveStatus, MessageCategory, MessageEncryptor, RowId, ShiftTemplate,
};
use deskline_storage::{InMemoryStore, NewScheduleEntry, Store};

pub fn test_encryptor() -> MessageEncryptor {
    MessageEncryptor::new("workflow-test-secret")
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub async fn seed_agent(store: &InMemoryStore, agent_id: &str, name: &str, online: bool) {
    let now = Utc::now();
    store
        .agent_insert(&Agent {
            agent_id: agent_id.to_string(),
            name: name.to_string(),
            department: "support".to_string(),
            team: "tier1".to_string(),
            skill_tags: String::new(),
            employment: EmploymentStatus::Active,
            live_status: LiveStatus::Idle,
            online,
            last_heartbeat: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("agent insert");
}

pub async fn seed_shift(
    store: &InMemoryStore,
    name: &str,
    start: NaiveTime,
    end: NaiveTime,
) -> RowId {
    let now = Utc::now();
    store
        .shift_insert(&ShiftTemplate {
            shift_id: 0,
            name: name.to_string(),
            start,
            end,
            min_staff: 1,
            holiday: false,
            created_by: "admin".to_string(),
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("shift insert")
}

/// A shift whose window spans the whole day, so "now" is always covered.
pub async fn all_day_shift(store: &InMemoryStore) -> RowId {
    seed_shift(
        store,
        "all-day",
        NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
    )
    .await
}

pub async fn put_on_duty(store: &InMemoryStore, agent_id: &str, shift_id: RowId, date: NaiveDate) {
    store
        .schedule_assign_batch(&[NewScheduleEntry {
            agent_id: agent_id.to_string(),
            shift_id,
            date,
        }])
        .await
        .expect("schedule assign");
}

pub async fn seed_category(store: &InMemoryStore, name: &str, keywords: &[&str]) -> RowId {
    let now = Utc::now();
    store
        .category_insert(&MessageCategory {
            category_id: 0,
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            sort_order: 0,
            created_by: "admin".to_string(),
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("category insert")
}
