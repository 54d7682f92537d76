//! Async storage trait for Deskline entities.
//!
//! Backends must guarantee atomicity for the compound methods:
//! `schedule_assign_batch` either inserts every entry or none,
//! `leave_approve` applies the full approval side effects or none, and
//! `conversation_transition` is a compare-and-swap on the version column.

use ::async_trait::async_trait;
use chrono::NaiveDate;
use deskline_core::{
    Agent, AgentId, ApprovalStatus, ConvTag, Conversation, ConversationId, ConversationMessage,
    ConversationStatus, DesklineResult, LeaveRequest, LiveStatus, MessageCategory, RowId,
    ScheduleEntry, SenderType, ShiftTemplate, Timestamp, TransferRecord,
};

// ============================================================================
// PARAMETER TYPES
// ============================================================================

/// Pagination window. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn new(page: u32, page_size: u32) -> Self {
        Page {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }
}

/// One entry of a batch schedule assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScheduleEntry {
    pub agent_id: AgentId,
    pub shift_id: RowId,
    pub date: NaiveDate,
}

/// Fields a conversation transition may change alongside its status.
/// All optional fields default to "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationPatch {
    pub status: Option<ConversationStatus>,
    pub agent_id: Option<AgentId>,
    pub ended_at: Option<Timestamp>,
    pub category_id: Option<RowId>,
    pub manually_classified: Option<bool>,
}

/// Filters for conversation listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationQuery {
    pub agent_id: Option<AgentId>,
    pub user_id: Option<String>,
    pub status: Option<ConversationStatus>,
    /// When set, restrict to closed (Ended/Abandoned) conversations.
    pub history_only: bool,
}

/// Filters for leave-request listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveQuery {
    pub status: Option<ApprovalStatus>,
    /// Case-insensitive substring match over agent id and reason.
    pub keyword: Option<String>,
}

/// A message to append; id and authoritative timestamp are assigned by
/// the store at persistence time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub sender_type: SenderType,
    pub sender_id: String,
    pub content: String,
    pub quick_reply: bool,
    pub quick_reply_id: Option<RowId>,
}

// ============================================================================
// STORE TRAIT
// ============================================================================

#[async_trait]
pub trait Store: Send + Sync {
    // ========================================================================
    // SHIFT TEMPLATE OPERATIONS
    // ========================================================================

    /// Insert a shift template, returning its assigned id.
    async fn shift_insert(&self, template: &ShiftTemplate) -> DesklineResult<RowId>;

    async fn shift_get(&self, shift_id: RowId) -> DesklineResult<Option<ShiftTemplate>>;

    async fn shift_update(&self, template: &ShiftTemplate) -> DesklineResult<()>;

    /// Delete a template. Fails with `StillReferenced` while any schedule
    /// entry points at it.
    async fn shift_delete(&self, shift_id: RowId) -> DesklineResult<()>;

    async fn shift_list(&self) -> DesklineResult<Vec<ShiftTemplate>>;

    // ========================================================================
    // SCHEDULE OPERATIONS
    // ========================================================================

    /// Insert every entry or none. A conflict is an existing Normal entry
    /// for the same (agent, date); on conflict the error names the
    /// conflicting agent ids so the caller can resubmit the remainder.
    /// On success every assigned agent's live status becomes Working.
    async fn schedule_assign_batch(
        &self,
        entries: &[NewScheduleEntry],
    ) -> DesklineResult<Vec<RowId>>;

    /// Point edit of one grid cell. `shift_id = None` deletes the entry for
    /// that (agent, date); otherwise the entry is inserted or retargeted
    /// and the agent's live status becomes Working.
    async fn schedule_upsert_cell(
        &self,
        agent_id: &str,
        date: NaiveDate,
        shift_id: Option<RowId>,
    ) -> DesklineResult<()>;

    /// Entries with date in [start, end].
    async fn schedule_list_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DesklineResult<Vec<ScheduleEntry>>;

    /// The entry for one (agent, date), regardless of status.
    async fn schedule_find(
        &self,
        agent_id: &str,
        date: NaiveDate,
    ) -> DesklineResult<Option<ScheduleEntry>>;

    // ========================================================================
    // AGENT OPERATIONS
    // ========================================================================

    async fn agent_insert(&self, agent: &Agent) -> DesklineResult<()>;

    async fn agent_get(&self, agent_id: &str) -> DesklineResult<Option<Agent>>;

    async fn agent_list(&self) -> DesklineResult<Vec<Agent>>;

    async fn agent_set_live_status(
        &self,
        agent_id: &str,
        status: LiveStatus,
    ) -> DesklineResult<()>;

    async fn agent_set_online(
        &self,
        agent_id: &str,
        online: bool,
        heartbeat: Option<Timestamp>,
    ) -> DesklineResult<()>;

    // ========================================================================
    // LEAVE / SWAP OPERATIONS
    // ========================================================================

    /// Insert a pending request, returning its assigned id.
    async fn leave_insert(&self, request: &LeaveRequest) -> DesklineResult<RowId>;

    async fn leave_get(&self, request_id: RowId) -> DesklineResult<Option<LeaveRequest>>;

    /// Filtered, paginated listing; returns the page plus the total match
    /// count before paging.
    async fn leave_list(
        &self,
        query: &LeaveQuery,
        page: Page,
    ) -> DesklineResult<(Vec<LeaveRequest>, usize)>;

    /// Decide a pending request. Approval applies all schedule and agent
    /// side effects atomically: for leave, the requester's entry for that
    /// date is marked on-leave (created against the request's shift when
    /// absent) and the agent goes off duty; for swap, the target's
    /// availability is re-checked, the requester's entry becomes swapped
    /// with a replacement reference, and the target gains a normal entry.
    /// Rejection only flips the request status.
    async fn leave_decide(
        &self,
        request_id: RowId,
        reviewer: &str,
        approve: bool,
        now: Timestamp,
    ) -> DesklineResult<LeaveRequest>;

    // ========================================================================
    // CONVERSATION OPERATIONS
    // ========================================================================

    async fn conversation_insert(&self, conversation: &Conversation) -> DesklineResult<()>;

    async fn conversation_get(
        &self,
        conversation_id: ConversationId,
    ) -> DesklineResult<Option<Conversation>>;

    /// The user's open conversation, if any (repeat contacts reuse it).
    async fn conversation_find_ongoing(
        &self,
        user_id: &str,
    ) -> DesklineResult<Option<Conversation>>;

    /// Ongoing-conversation count per agent, for load balancing. Agents
    /// with no open conversation are reported with a zero count.
    async fn conversation_count_ongoing(
        &self,
        agent_ids: &[AgentId],
    ) -> DesklineResult<Vec<(AgentId, usize)>>;

    /// Compare-and-swap state transition. Fails with `StaleVersion` when
    /// `expected_version` no longer matches, without mutating anything.
    /// On success the version increases by exactly one.
    async fn conversation_transition(
        &self,
        conversation_id: ConversationId,
        expected_version: i64,
        patch: ConversationPatch,
    ) -> DesklineResult<Conversation>;

    async fn conversation_list(
        &self,
        query: &ConversationQuery,
        page: Page,
    ) -> DesklineResult<(Vec<Conversation>, usize)>;

    /// Manually set the topic category, marking the conversation as
    /// manually classified so auto-classification never overrides it.
    async fn conversation_set_category(
        &self,
        conversation_id: ConversationId,
        category_id: RowId,
    ) -> DesklineResult<Conversation>;

    // ========================================================================
    // TRANSFER RECORDS
    // ========================================================================

    async fn transfer_insert(&self, record: &TransferRecord) -> DesklineResult<RowId>;

    async fn transfer_list(
        &self,
        conversation_id: ConversationId,
    ) -> DesklineResult<Vec<TransferRecord>>;

    // ========================================================================
    // MESSAGE OPERATIONS
    // ========================================================================

    /// Append a message, assigning its id and the authoritative send
    /// timestamp, and refresh the conversation's last-message time.
    async fn message_append(&self, message: NewMessage) -> DesklineResult<ConversationMessage>;

    /// Messages for one conversation in send order, paginated, plus the
    /// total count.
    async fn message_list(
        &self,
        conversation_id: ConversationId,
        page: Page,
    ) -> DesklineResult<(Vec<ConversationMessage>, usize)>;

    /// The oldest `limit` user/agent messages, for classification.
    async fn message_first_n(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> DesklineResult<Vec<ConversationMessage>>;

    // ========================================================================
    // CATEGORY OPERATIONS
    // ========================================================================

    async fn category_insert(&self, category: &MessageCategory) -> DesklineResult<RowId>;

    async fn category_get(&self, category_id: RowId) -> DesklineResult<Option<MessageCategory>>;

    async fn category_update(&self, category: &MessageCategory) -> DesklineResult<()>;

    async fn category_delete(&self, category_id: RowId) -> DesklineResult<()>;

    /// All categories in sort order.
    async fn category_list(&self) -> DesklineResult<Vec<MessageCategory>>;

    // ========================================================================
    // CONVERSATION TAG OPERATIONS
    // ========================================================================

    /// Insert a tag, returning its assigned id. Tag names are unique;
    /// a duplicate fails with `DuplicateKey`.
    async fn tag_insert(&self, tag: &ConvTag) -> DesklineResult<RowId>;

    async fn tag_get(&self, tag_id: RowId) -> DesklineResult<Option<ConvTag>>;

    /// Replace a tag row; the unique-name rule still applies.
    async fn tag_update(&self, tag: &ConvTag) -> DesklineResult<()>;

    async fn tag_delete(&self, tag_id: RowId) -> DesklineResult<()>;

    /// All tags in sort order.
    async fn tag_list(&self) -> DesklineResult<Vec<ConvTag>>;
}
