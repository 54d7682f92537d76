//! Conversation lifecycle types.
//!
//! State machine: Ongoing (initial) -> Transferred | Ended | Abandoned.
//! Ended and Abandoned are terminal. Transferred remains writable for
//! messaging and may itself be transferred again or ended.

use crate::{AgentId, ConversationId, RowId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// STATUS
// ============================================================================

/// Lifecycle status of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Ongoing,
    Ended,
    Transferred,
    Abandoned,
}

impl ConversationStatus {
    /// Integer wire code (0=ongoing, 1=ended, 2=transferred, 3=abandoned).
    pub fn as_code(self) -> i8 {
        match self {
            ConversationStatus::Ongoing => 0,
            ConversationStatus::Ended => 1,
            ConversationStatus::Transferred => 2,
            ConversationStatus::Abandoned => 3,
        }
    }

    /// Legal transition table. Ongoing may move to any terminal-ish state;
    /// Transferred may be handed over again or ended; Ended and Abandoned
    /// accept nothing.
    pub fn can_transition_to(self, next: ConversationStatus) -> bool {
        use ConversationStatus::*;
        match self {
            Ongoing => matches!(next, Transferred | Ended | Abandoned),
            Transferred => matches!(next, Transferred | Ended),
            Ended | Abandoned => false,
        }
    }

    /// Whether messages may still be appended in this state.
    pub fn accepts_messages(self) -> bool {
        matches!(
            self,
            ConversationStatus::Ongoing | ConversationStatus::Transferred
        )
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationStatus::Ongoing => write!(f, "ongoing"),
            ConversationStatus::Ended => write!(f, "ended"),
            ConversationStatus::Transferred => write!(f, "transferred"),
            ConversationStatus::Abandoned => write!(f, "abandoned"),
        }
    }
}

// ============================================================================
// CONVERSATION
// ============================================================================

/// A support session between one end-user and their assigned agent.
///
/// The `version` counter only increases; every state transition is applied
/// as a compare-and-swap against the last-seen version so concurrent writers
/// observe a retryable conflict instead of overwriting each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: ConversationId,
    pub user_id: String,
    pub user_nickname: String,
    pub agent_id: AgentId,
    /// Source channel, e.g. "web" or "app".
    pub source: String,
    pub started_at: Timestamp,
    /// Set when the conversation reaches Ended or Abandoned.
    pub ended_at: Option<Timestamp>,
    pub last_message_at: Timestamp,
    pub status: ConversationStatus,
    /// Topic category id; 0 means unclassified.
    pub category_id: RowId,
    /// True once an operator manually set the category; blocks auto-classify.
    pub manually_classified: bool,
    /// Comma-separated free-text tags.
    pub tags: String,
    pub core: bool,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    /// Session duration in whole seconds relative to `now`.
    pub fn duration_secs(&self, now: Timestamp) -> i64 {
        (now - self.started_at).num_seconds()
    }
}

// ============================================================================
// TRANSFER RECORD
// ============================================================================

/// Append-only audit row, one per transfer hop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub transfer_id: RowId,
    pub conversation_id: ConversationId,
    pub from_agent: AgentId,
    pub to_agent: AgentId,
    pub transferred_at: Timestamp,
    /// Outcome of the handover; transfers applied by the state machine are
    /// recorded as accepted.
    pub accepted: bool,
}

// ============================================================================
// MESSAGE
// ============================================================================

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    User,
    Agent,
    System,
}

impl SenderType {
    /// Integer wire code (0=user, 1=agent, 2=system).
    pub fn as_code(self) -> i8 {
        match self {
            SenderType::User => 0,
            SenderType::Agent => 1,
            SenderType::System => 2,
        }
    }

    pub fn from_code(code: i8) -> Option<SenderType> {
        match code {
            0 => Some(SenderType::User),
            1 => Some(SenderType::Agent),
            2 => Some(SenderType::System),
            _ => None,
        }
    }
}

/// Append-only message row. Content may be stored encrypted through the
/// message encryptor; the hub and history queries treat it opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub message_id: RowId,
    pub conversation_id: ConversationId,
    pub sender_type: SenderType,
    pub sender_id: String,
    pub content: String,
    pub quick_reply: bool,
    pub quick_reply_id: Option<RowId>,
    /// Authoritative ordering timestamp, assigned at persistence time.
    pub sent_at: Timestamp,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ConversationStatus::*;

    #[test]
    fn test_ongoing_transitions() {
        assert!(Ongoing.can_transition_to(Transferred));
        assert!(Ongoing.can_transition_to(Ended));
        assert!(Ongoing.can_transition_to(Abandoned));
        assert!(!Ongoing.can_transition_to(Ongoing));
    }

    #[test]
    fn test_transferred_transitions() {
        assert!(Transferred.can_transition_to(Transferred));
        assert!(Transferred.can_transition_to(Ended));
        assert!(!Transferred.can_transition_to(Abandoned));
        assert!(!Transferred.can_transition_to(Ongoing));
    }

    #[test]
    fn test_terminal_states_are_sealed() {
        for next in [Ongoing, Ended, Transferred, Abandoned] {
            assert!(!Ended.can_transition_to(next));
            assert!(!Abandoned.can_transition_to(next));
        }
    }

    #[test]
    fn test_messaging_windows() {
        assert!(Ongoing.accepts_messages());
        assert!(Transferred.accepts_messages());
        assert!(!Ended.accepts_messages());
        assert!(!Abandoned.accepts_messages());
    }

    #[test]
    fn test_sender_type_codes_round_trip() {
        for sender in [SenderType::User, SenderType::Agent, SenderType::System] {
            assert_eq!(SenderType::from_code(sender.as_code()), Some(sender));
        }
        assert_eq!(SenderType::from_code(7), None);
    }
}
