//! Leave and shift-swap requests.

use crate::{AgentId, RowId, Timestamp};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the agent is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// Take the date off entirely.
    Leave,
    /// Hand the shift on that date to another agent.
    Swap,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestType::Leave => write!(f, "leave"),
            RequestType::Swap => write!(f, "swap"),
        }
    }
}

/// Approval workflow status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Integer wire code (0=pending, 1=approved, 2=rejected).
    pub fn as_code(self) -> i8 {
        match self {
            ApprovalStatus::Pending => 0,
            ApprovalStatus::Approved => 1,
            ApprovalStatus::Rejected => 2,
        }
    }

    /// Only pending requests may be decided; decisions are final.
    pub fn is_decided(self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

/// A leave or swap request raised by an agent for a single date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub request_id: RowId,
    pub agent_id: AgentId,
    pub request_type: RequestType,
    pub date: NaiveDate,
    /// Shift the request concerns; approval side effects write roster
    /// entries against this shift.
    pub shift_id: RowId,
    /// Receiving agent for swap requests; absent for plain leave.
    pub target_agent: Option<AgentId>,
    pub reason: String,
    pub status: ApprovalStatus,
    /// Reviewer id, set when the request is decided.
    pub decided_by: Option<String>,
    pub decided_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_undecided() {
        assert!(!ApprovalStatus::Pending.is_decided());
        assert!(ApprovalStatus::Approved.is_decided());
        assert!(ApprovalStatus::Rejected.is_decided());
    }

    #[test]
    fn test_approval_codes() {
        assert_eq!(ApprovalStatus::Pending.as_code(), 0);
        assert_eq!(ApprovalStatus::Approved.as_code(), 1);
        assert_eq!(ApprovalStatus::Rejected.as_code(), 2);
    }
}
