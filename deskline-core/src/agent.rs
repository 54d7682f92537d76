//! Support agent entity and status enums.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent identifier. Agents carry human-assigned ids such as `CS001`,
/// so this is a string key rather than a UUID.
pub type AgentId = String;

/// Employment status of an agent account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Active,
    Inactive,
}

/// Live status of an agent, mutated by scheduling and assignment
/// operations rather than by the agent directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveStatus {
    Idle,
    Working,
    OnLeave,
}

impl LiveStatus {
    /// Integer wire code used in the response envelope (0=idle, 1=working, 2=on_leave).
    pub fn as_code(self) -> i8 {
        match self {
            LiveStatus::Idle => 0,
            LiveStatus::Working => 1,
            LiveStatus::OnLeave => 2,
        }
    }
}

impl fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveStatus::Idle => write!(f, "idle"),
            LiveStatus::Working => write!(f, "working"),
            LiveStatus::OnLeave => write!(f, "on_leave"),
        }
    }
}

/// A support agent that can be scheduled into shifts and assigned
/// conversations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: AgentId,
    pub name: String,
    pub department: String,
    pub team: String,
    /// Comma-separated skill tags, e.g. "billing,refunds".
    pub skill_tags: String,
    pub employment: EmploymentStatus,
    pub live_status: LiveStatus,
    pub online: bool,
    pub last_heartbeat: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Agent {
    /// Whether this agent is eligible for scheduling and assignment at all.
    pub fn is_active(&self) -> bool {
        self.employment == EmploymentStatus::Active
    }
}
