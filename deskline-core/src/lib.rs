//! Deskline Core - Domain Types
//!
//! Pure data structures and small pure logic shared by every other crate:
//! entity types, closed status enums, the shift-window test, the conversation
//! transition table, the keyword classifier and the message encryptor.
//! No storage and no transport lives here.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod agent;
pub mod category;
pub mod classifier;
pub mod conversation;
pub mod crypto;
pub mod error;
pub mod leave;
pub mod shift;

pub use agent::{Agent, AgentId, EmploymentStatus, LiveStatus};
pub use category::{ConvTag, MessageCategory, DEFAULT_TAG_COLOR};
pub use classifier::{ClassifyOutcome, KeywordClassifier};
pub use conversation::{
    Conversation, ConversationMessage, ConversationStatus, SenderType, TransferRecord,
};
pub use crypto::{CryptoError, MessageEncryptor};
pub use error::{
    ConversationError, DesklineError, DesklineResult, ScheduleError, StorageError,
    ValidationError,
};
pub use leave::{ApprovalStatus, LeaveRequest, RequestType};
pub use shift::{ScheduleEntry, ScheduleStatus, ShiftTemplate};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Conversation identifier using UUIDv7 for timestamp-sortable IDs.
pub type ConversationId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Numeric row identifier for auto-increment style entities
/// (shift templates, schedule entries, leave requests, messages, categories).
pub type RowId = i64;

/// Generate a new UUIDv7 conversation id (timestamp-sortable).
pub fn new_conversation_id() -> ConversationId {
    Uuid::now_v7()
}

/// Sender id used for system-generated messages.
pub const SYSTEM_SENDER: &str = "SYSTEM";
