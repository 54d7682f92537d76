//! Error types for Deskline operations

use crate::{AgentId, ConversationId, ConversationStatus};
use chrono::NaiveDate;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Insert failed for {entity}: {reason}")]
    InsertFailed { entity: &'static str, reason: String },

    #[error("Update failed for {entity} with id {id}: {reason}")]
    UpdateFailed {
        entity: &'static str,
        id: String,
        reason: String,
    },

    #[error("Duplicate key for {entity}: {key}")]
    DuplicateKey { entity: &'static str, key: String },

    #[error("{entity} {id} is still referenced and cannot be deleted")]
    StillReferenced { entity: &'static str, id: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Value for {field} out of range: {value} not in [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Scheduling and leave-workflow errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Schedule conflict on {date} for agents: {agent_ids:?}")]
    Conflict {
        date: NaiveDate,
        agent_ids: Vec<AgentId>,
    },

    #[error("Request {request_id} already decided")]
    AlreadyDecided { request_id: i64 },

    #[error("Swap target {target} already holds a shift on {date}")]
    SwapTargetBusy { target: AgentId, date: NaiveDate },

    #[error("Swap request must name a target agent")]
    SwapTargetMissing,

    #[error("Agent cannot swap a shift with themselves")]
    SelfSwap,

    #[error("Date range too large: {days} days exceeds the {max}-day cap")]
    RangeTooLarge { days: i64, max: i64 },
}

/// Conversation lifecycle errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Illegal transition from {from} to {to} for conversation {conversation_id}")]
    IllegalTransition {
        conversation_id: ConversationId,
        from: ConversationStatus,
        to: ConversationStatus,
    },

    #[error("Conversation {conversation_id} state changed, retry")]
    StaleVersion { conversation_id: ConversationId },

    #[error("No agent currently on duty")]
    NoAgentAvailable,

    #[error("Transfer target {agent_id} is not active and online")]
    TargetUnavailable { agent_id: AgentId },

    #[error("Cannot transfer a conversation to its current agent")]
    SelfTransfer,

    #[error("Conversation {conversation_id} no longer accepts messages ({status})")]
    Closed {
        conversation_id: ConversationId,
        status: ConversationStatus,
    },
}

/// Master error type for all Deskline errors.
#[derive(Debug, Clone, Error)]
pub enum DesklineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),
}

/// Result type alias for Deskline operations.
pub type DesklineResult<T> = Result<T, DesklineError>;

// =============================================================================
// TESTS
// =============================================================================
