//! Shift templates and schedule entries.
//!
//! A shift template is a reusable time-of-day window; the end may be
//! numerically earlier than the start, meaning the shift crosses midnight
//! (a "wrap" shift). Schedule entries bind an agent to a template on a
//! calendar date.

use crate::{AgentId, RowId, Timestamp};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// SHIFT TEMPLATE
// ============================================================================

/// Reusable shift definition, e.g. "Night 22:00:00-06:00:00".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftTemplate {
    pub shift_id: RowId,
    pub name: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    /// Minimum staffing this shift is supposed to carry.
    pub min_staff: i32,
    pub holiday: bool,
    pub created_by: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ShiftTemplate {
    /// On-duty window test, including the overnight wrap:
    /// start <= end means `now` must lie in [start, end];
    /// start > end means the window spans midnight, so `now` must be
    /// >= start or <= end.
    pub fn covers(&self, now: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= now && now <= self.end
        } else {
            now >= self.start || now <= self.end
        }
    }

    /// Whether the shift spans midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }
}

// ============================================================================
// SCHEDULE ENTRY
// ============================================================================

/// Status of a schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Regular working entry; the only status that makes an agent on-duty.
    Normal,
    /// Approved leave; agent is off-duty for this date.
    OnLeave,
    /// The original holder of a swapped shift; the replacement holds the
    /// Normal entry for the same date.
    Swapped,
}

impl ScheduleStatus {
    /// Integer wire code (0=normal, 1=on_leave, 2=swapped).
    pub fn as_code(self) -> i8 {
        match self {
            ScheduleStatus::Normal => 0,
            ScheduleStatus::OnLeave => 1,
            ScheduleStatus::Swapped => 2,
        }
    }
}

/// One agent's assignment to a shift on a calendar date.
///
/// Unique per (agent, date) among Normal-status rows; never hard-deleted
/// except through grid editing with a zero shift selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub entry_id: RowId,
    pub agent_id: AgentId,
    pub shift_id: RowId,
    pub date: NaiveDate,
    pub status: ScheduleStatus,
    /// Replacement agent reference, set on swapped entries.
    pub replacement: Option<AgentId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn shift(start: &str, end: &str) -> ShiftTemplate {
        ShiftTemplate {
            shift_id: 1,
            name: "test".to_string(),
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            min_staff: 1,
            holiday: false,
            created_by: "admin".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_day_shift_window() {
        let day = shift("09:00:00", "17:00:00");
        assert!(day.covers("09:00:00".parse().unwrap()));
        assert!(day.covers("12:30:00".parse().unwrap()));
        assert!(day.covers("17:00:00".parse().unwrap()));
        assert!(!day.covers("08:59:59".parse().unwrap()));
        assert!(!day.covers("17:00:01".parse().unwrap()));
        assert!(!day.wraps_midnight());
    }

    #[test]
    fn test_night_shift_wraps_midnight() {
        let night = shift("22:00:00", "06:00:00");
        assert!(night.wraps_midnight());
        assert!(night.covers("23:30:00".parse().unwrap()));
        assert!(night.covers("22:00:00".parse().unwrap()));
        assert!(night.covers("02:00:00".parse().unwrap()));
        assert!(night.covers("06:00:00".parse().unwrap()));
        assert!(!night.covers("07:00:00".parse().unwrap()));
        assert!(!night.covers("21:59:59".parse().unwrap()));
    }

    #[test]
    fn test_schedule_status_codes() {
        assert_eq!(ScheduleStatus::Normal.as_code(), 0);
        assert_eq!(ScheduleStatus::OnLeave.as_code(), 1);
        assert_eq!(ScheduleStatus::Swapped.as_code(), 2);
    }

    proptest! {
        /// The wrap rule is exactly "now >= start || now <= end" for
        /// overnight windows and "start <= now <= end" otherwise.
        #[test]
        fn prop_covers_matches_wrap_rule(
            start_secs in 0u32..86_400,
            end_secs in 0u32..86_400,
            now_secs in 0u32..86_400,
        ) {
            let t = |s: u32| NaiveTime::from_num_seconds_from_midnight_opt(s, 0).unwrap();
            let template = ShiftTemplate {
                start: t(start_secs),
                end: t(end_secs),
                ..shift("00:00:00", "00:00:00")
            };
            let now = t(now_secs);
            let expected = if start_secs <= end_secs {
                start_secs <= now_secs && now_secs <= end_secs
            } else {
                now_secs >= start_secs || now_secs <= end_secs
            };
            prop_assert_eq!(template.covers(now), expected);
        }
    }
}
