//! Request/Response DTOs for the Deskline API
//!
//! Wire types are kept separate from the domain types: dates travel as
//! `YYYY-MM-DD` strings, times of day as `HH:MM:SS`, and every success
//! response is wrapped in the `{code, msg, data}` envelope with code 0.

use chrono::NaiveDate;
use deskline_core::{
    Agent, ApprovalStatus, ConvTag, Conversation, ConversationId, ConversationMessage,
    ConversationStatus, LeaveRequest, LiveStatus, MessageCategory, RequestType, RowId,
    ScheduleEntry, ScheduleStatus, SenderType, ShiftTemplate, Timestamp, TransferRecord,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// RESPONSE ENVELOPE
// ============================================================================

/// Uniform success envelope. Errors produce the same shape through
/// `ApiError`, with a non-zero code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope {
            code: 0,
            msg: "success".to_string(),
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    pub fn ok_empty() -> Self {
        Envelope {
            code: 0,
            msg: "success".to_string(),
            data: None,
        }
    }
}

/// Paginated listing payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPayload<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

// ============================================================================
// SHIFT TEMPLATES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateShiftRequest {
    pub name: String,
    /// `HH:MM:SS`
    pub start: String,
    /// `HH:MM:SS`; earlier than `start` means the shift wraps midnight.
    pub end: String,
    #[serde(default = "default_min_staff")]
    pub min_staff: i32,
    #[serde(default)]
    pub holiday: bool,
    pub created_by: String,
}

fn default_min_staff() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateShiftRequest {
    pub name: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub min_staff: Option<i32>,
    pub holiday: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftResponse {
    pub shift_id: RowId,
    pub name: String,
    pub start: String,
    pub end: String,
    pub min_staff: i32,
    pub holiday: bool,
    pub wraps_midnight: bool,
    pub created_by: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ShiftTemplate> for ShiftResponse {
    fn from(shift: ShiftTemplate) -> Self {
        let wraps = shift.wraps_midnight();
        ShiftResponse {
            shift_id: shift.shift_id,
            name: shift.name,
            start: shift.start.format("%H:%M:%S").to_string(),
            end: shift.end.format("%H:%M:%S").to_string(),
            min_staff: shift.min_staff,
            holiday: shift.holiday,
            wraps_midnight: wraps,
            created_by: shift.created_by,
            created_at: shift.created_at,
            updated_at: shift.updated_at,
        }
    }
}

// ============================================================================
// SCHEDULING
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AssignScheduleRequest {
    pub shift_id: RowId,
    pub agent_ids: Vec<String>,
    /// `YYYY-MM-DD`; every agent is assigned the shift on this date.
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertCellRequest {
    pub agent_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// 0 clears the cell.
    pub shift_id: RowId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoScheduleRequest {
    /// `YYYY-MM-DD`, inclusive.
    pub start_date: String,
    /// `YYYY-MM-DD`, inclusive. Range is capped at 31 days.
    pub end_date: String,
    /// Restrict the eligible agents to one department.
    pub department: Option<String>,
    /// Restrict the eligible agents to one team.
    pub team: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridQuery {
    pub start_date: String,
    pub end_date: String,
    pub department: Option<String>,
    pub team: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntryResponse {
    pub entry_id: RowId,
    pub agent_id: String,
    /// Joined for display; empty when the agent row is gone.
    pub agent_name: String,
    pub shift_id: RowId,
    pub shift_name: String,
    pub date: NaiveDate,
    pub status: ScheduleStatus,
    pub replacement: Option<String>,
}

impl ScheduleEntryResponse {
    pub fn from_entry(entry: ScheduleEntry, agent_name: String, shift_name: String) -> Self {
        ScheduleEntryResponse {
            entry_id: entry.entry_id,
            agent_id: entry.agent_id,
            agent_name,
            shift_id: entry.shift_id,
            shift_name,
            date: entry.date,
            status: entry.status,
            replacement: entry.replacement,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridAgentResponse {
    pub agent_id: String,
    pub name: String,
    pub department: String,
    pub team: String,
}

/// Raw material for the roster table: the date axis, the (filtered) agent
/// axis, every shift template, and the matching entries. The client lays
/// them out; empty cells are simply absent entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleGridResponse {
    pub dates: Vec<NaiveDate>,
    pub agents: Vec<GridAgentResponse>,
    pub shifts: Vec<ShiftResponse>,
    pub entries: Vec<ScheduleEntryResponse>,
}

// ============================================================================
// LEAVE / SWAP
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyLeaveRequest {
    pub agent_id: String,
    pub request_type: RequestType,
    /// `YYYY-MM-DD`
    pub date: String,
    /// Shift the request concerns.
    pub shift_id: RowId,
    pub target_agent: Option<String>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecideLeaveRequest {
    pub approve: bool,
    pub reviewer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListLeaveQuery {
    pub status: Option<ApprovalStatus>,
    pub keyword: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveResponse {
    pub request_id: RowId,
    pub agent_id: String,
    pub agent_name: String,
    pub request_type: RequestType,
    pub date: NaiveDate,
    pub shift_id: RowId,
    /// Joined for display; empty when the shift row is gone.
    pub shift_name: String,
    pub target_agent: Option<String>,
    pub target_name: Option<String>,
    pub reason: String,
    pub status: ApprovalStatus,
    pub decided_by: Option<String>,
    pub decided_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl LeaveResponse {
    pub fn from_request(
        request: LeaveRequest,
        agent_name: String,
        shift_name: String,
        target_name: Option<String>,
    ) -> Self {
        LeaveResponse {
            request_id: request.request_id,
            agent_id: request.agent_id,
            agent_name,
            request_type: request.request_type,
            date: request.date,
            shift_id: request.shift_id,
            shift_name,
            target_agent: request.target_agent,
            target_name,
            reason: request.reason,
            status: request.status,
            decided_by: request.decided_by,
            decided_at: request.decided_at,
            created_at: request.created_at,
        }
    }
}

// ============================================================================
// CONVERSATIONS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AssignConversationRequest {
    pub user_id: String,
    pub nickname: String,
    /// Source channel; defaults to "web".
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignConversationResponse {
    pub conversation_id: ConversationId,
    pub agent_id: String,
    pub agent_name: String,
    /// True when an existing ongoing conversation was returned instead of
    /// a new one.
    pub reused: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferConversationRequest {
    pub to_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndConversationRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReclassifyRequest {
    pub category_id: RowId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListConversationsQuery {
    pub agent_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<ConversationStatus>,
    /// When true, restrict to closed conversations (history view).
    #[serde(default)]
    pub history: bool,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: ConversationId,
    pub user_id: String,
    pub user_nickname: String,
    pub agent_id: String,
    pub source: String,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub last_message_at: Timestamp,
    pub status: ConversationStatus,
    pub category_id: RowId,
    pub manually_classified: bool,
    pub tags: String,
    pub core: bool,
    pub version: i64,
    /// Whole seconds; only present on closed conversations.
    pub duration_secs: Option<i64>,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        let duration_secs = c.ended_at.map(|end| (end - c.started_at).num_seconds());
        ConversationResponse {
            conversation_id: c.conversation_id,
            user_id: c.user_id,
            user_nickname: c.user_nickname,
            agent_id: c.agent_id,
            source: c.source,
            started_at: c.started_at,
            ended_at: c.ended_at,
            last_message_at: c.last_message_at,
            status: c.status,
            category_id: c.category_id,
            manually_classified: c.manually_classified,
            tags: c.tags,
            core: c.core,
            version: c.version,
            duration_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub transfer_id: RowId,
    pub conversation_id: ConversationId,
    pub from_agent: String,
    pub to_agent: String,
    pub transferred_at: Timestamp,
}

impl From<TransferRecord> for TransferResponse {
    fn from(record: TransferRecord) -> Self {
        TransferResponse {
            transfer_id: record.transfer_id,
            conversation_id: record.conversation_id,
            from_agent: record.from_agent,
            to_agent: record.to_agent,
            transferred_at: record.transferred_at,
        }
    }
}

// ============================================================================
// MESSAGES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub sender_type: SenderType,
    pub sender_id: String,
    pub content: String,
    #[serde(default)]
    pub quick_reply: bool,
    pub quick_reply_id: Option<RowId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListMessagesQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message_id: RowId,
    pub conversation_id: ConversationId,
    pub sender_type: SenderType,
    pub sender_id: String,
    /// Plaintext; stored content is decrypted before leaving the API.
    pub content: String,
    pub quick_reply: bool,
    pub sent_at: Timestamp,
}

impl MessageResponse {
    pub fn from_message(message: ConversationMessage, content: String) -> Self {
        MessageResponse {
            message_id: message.message_id,
            conversation_id: message.conversation_id,
            sender_type: message.sender_type,
            sender_id: message.sender_id,
            content,
            quick_reply: message.quick_reply,
            sent_at: message.sent_at,
        }
    }
}

// ============================================================================
// CATEGORIES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sort_order: i32,
    pub created_by: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub category_id: RowId,
    pub name: String,
    pub keywords: Vec<String>,
    pub sort_order: i32,
    pub created_by: String,
}

impl From<MessageCategory> for CategoryResponse {
    fn from(category: MessageCategory) -> Self {
        CategoryResponse {
            category_id: category.category_id,
            name: category.name,
            keywords: category.keywords,
            sort_order: category.sort_order,
            created_by: category.created_by,
        }
    }
}

// ============================================================================
// TAGS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    /// Hex display color; defaults when omitted.
    pub color: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    pub created_by: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTagRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagResponse {
    pub tag_id: RowId,
    pub name: String,
    pub color: String,
    pub sort_order: i32,
    pub created_by: String,
}

impl From<ConvTag> for TagResponse {
    fn from(tag: ConvTag) -> Self {
        TagResponse {
            tag_id: tag.tag_id,
            name: tag.name,
            color: tag.color,
            sort_order: tag.sort_order,
            created_by: tag.created_by,
        }
    }
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatusResponse {
    pub agent_id: String,
    pub name: String,
    pub live_status: LiveStatus,
    pub online: bool,
    pub ongoing_conversations: usize,
}

impl AgentStatusResponse {
    pub fn from_agent(agent: Agent, ongoing: usize) -> Self {
        AgentStatusResponse {
            agent_id: agent.agent_id,
            name: agent.name,
            live_status: agent.live_status,
            online: agent.online,
            ongoing_conversations: ongoing,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineStatsResponse {
    /// Live real-time connections registered with the hub.
    pub connected_users: usize,
    /// Agents currently flagged online.
    pub online_agents: usize,
    pub agents: Vec<AgentStatusResponse>,
}

// ============================================================================
// REAL-TIME FRAMES
// ============================================================================

/// Duplex frame envelope carried over the real-time connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    pub payload: serde_json::Value,
}

/// Payload for inbound (and relayed) `"chat"` frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatPayload {
    pub conversation_id: ConversationId,
    pub content: String,
    #[serde(default)]
    pub msg_type: Option<String>,
    pub to_user_id: String,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_code_is_zero() {
        let envelope = Envelope::ok(42);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["msg"], "success");
        assert_eq!(json["data"], 42);
    }

    #[test]
    fn test_empty_envelope_omits_data() {
        let json = serde_json::to_value(Envelope::ok_empty()).unwrap();
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_chat_frame_round_trip() {
        let raw = r#"{"type":"chat","payload":{"conversation_id":"0191a0b0-0000-7000-8000-000000000000","content":"hi","to_user_id":"CS001"}}"#;
        let frame: WsFrame = serde_json::from_str(raw).unwrap();
        assert_eq!(frame.frame_type, "chat");
        let payload: ChatPayload = serde_json::from_value(frame.payload).unwrap();
        assert_eq!(payload.content, "hi");
        assert_eq!(payload.to_user_id, "CS001");
        assert!(payload.msg_type.is_none());
    }
}
