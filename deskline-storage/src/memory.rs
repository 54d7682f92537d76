//! In-memory store.
//!
//! Every table lives behind one `RwLock`, so the compound operations are
//! atomic by construction: they mutate under a single write guard and bail
//! out before touching anything when a precondition fails.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ::async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use deskline_core::{
    Agent, AgentId, ApprovalStatus, ConvTag, Conversation, ConversationError, ConversationId,
    ConversationMessage, ConversationStatus, DesklineResult, LeaveRequest, LiveStatus,
    MessageCategory, RequestType, RowId, ScheduleEntry, ScheduleError, ScheduleStatus,
    SenderType, ShiftTemplate, StorageError, Timestamp, TransferRecord,
};

use crate::store::{
    ConversationPatch, ConversationQuery, LeaveQuery, NewMessage, NewScheduleEntry, Page, Store,
};

#[derive(Debug, Default)]
struct Inner {
    shifts: HashMap<RowId, ShiftTemplate>,
    schedule: HashMap<RowId, ScheduleEntry>,
    agents: HashMap<AgentId, Agent>,
    leaves: HashMap<RowId, LeaveRequest>,
    conversations: HashMap<ConversationId, Conversation>,
    transfers: Vec<TransferRecord>,
    messages: Vec<ConversationMessage>,
    categories: HashMap<RowId, MessageCategory>,
    tags: HashMap<RowId, ConvTag>,
    next_shift_id: RowId,
    next_entry_id: RowId,
    next_leave_id: RowId,
    next_transfer_id: RowId,
    next_message_id: RowId,
    next_category_id: RowId,
    next_tag_id: RowId,
}

impl Inner {
    fn next_id(counter: &mut RowId) -> RowId {
        *counter += 1;
        *counter
    }

    /// The Normal-status entry for (agent, date), if any.
    fn normal_entry(&self, agent_id: &str, date: NaiveDate) -> Option<RowId> {
        self.schedule
            .iter()
            .find(|(_, e)| {
                e.agent_id == agent_id && e.date == date && e.status == ScheduleStatus::Normal
            })
            .map(|(id, _)| *id)
    }

    fn entry_for(&self, agent_id: &str, date: NaiveDate) -> Option<RowId> {
        self.schedule
            .iter()
            .find(|(_, e)| e.agent_id == agent_id && e.date == date)
            .map(|(id, _)| *id)
    }
}

/// Thread-safe in-memory implementation of [`Store`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DesklineResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn write(&self) -> DesklineResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StorageError::LockPoisoned.into())
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> deskline_core::DesklineError {
    StorageError::NotFound {
        entity,
        id: id.to_string(),
    }
    .into()
}

#[async_trait]
impl Store for InMemoryStore {
    // ========================================================================
    // SHIFT TEMPLATE OPERATIONS
    // ========================================================================

    async fn shift_insert(&self, template: &ShiftTemplate) -> DesklineResult<RowId> {
        let mut inner = self.write()?;
        let id = Inner::next_id(&mut inner.next_shift_id);
        let mut stored = template.clone();
        stored.shift_id = id;
        inner.shifts.insert(id, stored);
        Ok(id)
    }

    async fn shift_get(&self, shift_id: RowId) -> DesklineResult<Option<ShiftTemplate>> {
        Ok(self.read()?.shifts.get(&shift_id).cloned())
    }

    async fn shift_update(&self, template: &ShiftTemplate) -> DesklineResult<()> {
        let mut inner = self.write()?;
        if !inner.shifts.contains_key(&template.shift_id) {
            return Err(not_found("shift", template.shift_id));
        }
        inner.shifts.insert(template.shift_id, template.clone());
        Ok(())
    }

    async fn shift_delete(&self, shift_id: RowId) -> DesklineResult<()> {
        let mut inner = self.write()?;
        if !inner.shifts.contains_key(&shift_id) {
            return Err(not_found("shift", shift_id));
        }
        if inner.schedule.values().any(|e| e.shift_id == shift_id) {
            return Err(StorageError::StillReferenced {
                entity: "shift",
                id: shift_id.to_string(),
            }
            .into());
        }
        inner.shifts.remove(&shift_id);
        Ok(())
    }

    async fn shift_list(&self) -> DesklineResult<Vec<ShiftTemplate>> {
        let inner = self.read()?;
        let mut shifts: Vec<_> = inner.shifts.values().cloned().collect();
        shifts.sort_by_key(|s| s.shift_id);
        Ok(shifts)
    }

    // ========================================================================
    // SCHEDULE OPERATIONS
    // ========================================================================

    async fn schedule_assign_batch(
        &self,
        entries: &[NewScheduleEntry],
    ) -> DesklineResult<Vec<RowId>> {
        let mut inner = self.write()?;

        for entry in entries {
            if !inner.shifts.contains_key(&entry.shift_id) {
                return Err(not_found("shift", entry.shift_id));
            }
            if !inner.agents.contains_key(&entry.agent_id) {
                return Err(not_found("agent", &entry.agent_id));
            }
        }

        // Conflict scan before any insert keeps the batch all-or-nothing.
        let mut conflicts: Vec<(NaiveDate, AgentId)> = entries
            .iter()
            .filter(|e| inner.normal_entry(&e.agent_id, e.date).is_some())
            .map(|e| (e.date, e.agent_id.clone()))
            .collect();
        if !conflicts.is_empty() {
            conflicts.sort();
            let date = conflicts[0].0;
            let mut agent_ids: Vec<AgentId> = conflicts.into_iter().map(|(_, a)| a).collect();
            agent_ids.sort();
            agent_ids.dedup();
            return Err(ScheduleError::Conflict { date, agent_ids }.into());
        }

        let now = Utc::now();
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = Inner::next_id(&mut inner.next_entry_id);
            inner.schedule.insert(
                id,
                ScheduleEntry {
                    entry_id: id,
                    agent_id: entry.agent_id.clone(),
                    shift_id: entry.shift_id,
                    date: entry.date,
                    status: ScheduleStatus::Normal,
                    replacement: None,
                    created_at: now,
                    updated_at: now,
                },
            );
            ids.push(id);
        }
        for entry in entries {
            if let Some(agent) = inner.agents.get_mut(&entry.agent_id) {
                agent.live_status = LiveStatus::Working;
                agent.updated_at = now;
            }
        }
        Ok(ids)
    }

    async fn schedule_upsert_cell(
        &self,
        agent_id: &str,
        date: NaiveDate,
        shift_id: Option<RowId>,
    ) -> DesklineResult<()> {
        let mut inner = self.write()?;
        let existing = inner.entry_for(agent_id, date);

        let Some(shift_id) = shift_id else {
            if let Some(id) = existing {
                inner.schedule.remove(&id);
            }
            return Ok(());
        };

        if !inner.shifts.contains_key(&shift_id) {
            return Err(not_found("shift", shift_id));
        }
        if !inner.agents.contains_key(agent_id) {
            return Err(not_found("agent", agent_id));
        }

        let now = Utc::now();
        match existing {
            Some(id) => {
                if let Some(entry) = inner.schedule.get_mut(&id) {
                    entry.shift_id = shift_id;
                    entry.status = ScheduleStatus::Normal;
                    entry.replacement = None;
                    entry.updated_at = now;
                }
            }
            None => {
                let id = Inner::next_id(&mut inner.next_entry_id);
                inner.schedule.insert(
                    id,
                    ScheduleEntry {
                        entry_id: id,
                        agent_id: agent_id.to_string(),
                        shift_id,
                        date,
                        status: ScheduleStatus::Normal,
                        replacement: None,
                        created_at: now,
                        updated_at: now,
                    },
                );
            }
        }
        if let Some(agent) = inner.agents.get_mut(agent_id) {
            agent.live_status = LiveStatus::Working;
            agent.updated_at = now;
        }
        Ok(())
    }

    async fn schedule_list_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DesklineResult<Vec<ScheduleEntry>> {
        let inner = self.read()?;
        let mut entries: Vec<_> = inner
            .schedule
            .values()
            .filter(|e| e.date >= start && e.date <= end)
            .cloned()
            .collect();
        entries.sort_by(|a, b| (a.date, &a.agent_id).cmp(&(b.date, &b.agent_id)));
        Ok(entries)
    }

    async fn schedule_find(
        &self,
        agent_id: &str,
        date: NaiveDate,
    ) -> DesklineResult<Option<ScheduleEntry>> {
        let inner = self.read()?;
        Ok(inner
            .entry_for(agent_id, date)
            .and_then(|id| inner.schedule.get(&id).cloned()))
    }

    // ========================================================================
    // AGENT OPERATIONS
    // ========================================================================

    async fn agent_insert(&self, agent: &Agent) -> DesklineResult<()> {
        let mut inner = self.write()?;
        if inner.agents.contains_key(&agent.agent_id) {
            return Err(StorageError::DuplicateKey {
                entity: "agent",
                key: agent.agent_id.clone(),
            }
            .into());
        }
        inner.agents.insert(agent.agent_id.clone(), agent.clone());
        Ok(())
    }

    async fn agent_get(&self, agent_id: &str) -> DesklineResult<Option<Agent>> {
        Ok(self.read()?.agents.get(agent_id).cloned())
    }

    async fn agent_list(&self) -> DesklineResult<Vec<Agent>> {
        let inner = self.read()?;
        let mut agents: Vec<_> = inner.agents.values().cloned().collect();
        agents.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        Ok(agents)
    }

    async fn agent_set_live_status(
        &self,
        agent_id: &str,
        status: LiveStatus,
    ) -> DesklineResult<()> {
        let mut inner = self.write()?;
        let agent = inner
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| not_found("agent", agent_id))?;
        agent.live_status = status;
        agent.updated_at = Utc::now();
        Ok(())
    }

    async fn agent_set_online(
        &self,
        agent_id: &str,
        online: bool,
        heartbeat: Option<Timestamp>,
    ) -> DesklineResult<()> {
        let mut inner = self.write()?;
        let agent = inner
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| not_found("agent", agent_id))?;
        agent.online = online;
        if heartbeat.is_some() {
            agent.last_heartbeat = heartbeat;
        }
        agent.updated_at = Utc::now();
        Ok(())
    }

    // ========================================================================
    // LEAVE / SWAP OPERATIONS
    // ========================================================================

    async fn leave_insert(&self, request: &LeaveRequest) -> DesklineResult<RowId> {
        let mut inner = self.write()?;
        let id = Inner::next_id(&mut inner.next_leave_id);
        let mut stored = request.clone();
        stored.request_id = id;
        inner.leaves.insert(id, stored);
        Ok(id)
    }

    async fn leave_get(&self, request_id: RowId) -> DesklineResult<Option<LeaveRequest>> {
        Ok(self.read()?.leaves.get(&request_id).cloned())
    }

    async fn leave_list(
        &self,
        query: &LeaveQuery,
        page: Page,
    ) -> DesklineResult<(Vec<LeaveRequest>, usize)> {
        let inner = self.read()?;
        let keyword = query.keyword.as_ref().map(|k| k.to_lowercase());
        let mut matches: Vec<_> = inner
            .leaves
            .values()
            .filter(|r| query.status.is_none_or(|s| r.status == s))
            .filter(|r| {
                keyword.as_ref().is_none_or(|k| {
                    r.agent_id.to_lowercase().contains(k) || r.reason.to_lowercase().contains(k)
                })
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matches.len();
        let paged = matches
            .into_iter()
            .skip(page.offset())
            .take(page.page_size as usize)
            .collect();
        Ok((paged, total))
    }

    async fn leave_decide(
        &self,
        request_id: RowId,
        reviewer: &str,
        approve: bool,
        now: Timestamp,
    ) -> DesklineResult<LeaveRequest> {
        let mut inner = self.write()?;
        let request = inner
            .leaves
            .get(&request_id)
            .cloned()
            .ok_or_else(|| not_found("leave request", request_id))?;
        if request.status.is_decided() {
            return Err(ScheduleError::AlreadyDecided { request_id }.into());
        }

        if approve {
            match request.request_type {
                RequestType::Leave => {
                    match inner.entry_for(&request.agent_id, request.date) {
                        Some(id) => {
                            if let Some(entry) = inner.schedule.get_mut(&id) {
                                entry.status = ScheduleStatus::OnLeave;
                                entry.replacement = None;
                                entry.updated_at = now;
                            }
                        }
                        // No roster entry yet; record the leave against the
                        // requested shift so the day reads as off, not blank.
                        None => {
                            let id = Inner::next_id(&mut inner.next_entry_id);
                            inner.schedule.insert(
                                id,
                                ScheduleEntry {
                                    entry_id: id,
                                    agent_id: request.agent_id.clone(),
                                    shift_id: request.shift_id,
                                    date: request.date,
                                    status: ScheduleStatus::OnLeave,
                                    replacement: None,
                                    created_at: now,
                                    updated_at: now,
                                },
                            );
                        }
                    }
                    if let Some(agent) = inner.agents.get_mut(&request.agent_id) {
                        agent.live_status = LiveStatus::OnLeave;
                        agent.updated_at = now;
                    }
                }
                RequestType::Swap => {
                    let target = request
                        .target_agent
                        .clone()
                        .ok_or(ScheduleError::SwapTargetMissing)?;
                    // Precondition checks first; nothing is mutated on failure.
                    if inner.normal_entry(&target, request.date).is_some() {
                        return Err(ScheduleError::SwapTargetBusy {
                            target,
                            date: request.date,
                        }
                        .into());
                    }

                    match inner.entry_for(&request.agent_id, request.date) {
                        Some(id) => {
                            if let Some(entry) = inner.schedule.get_mut(&id) {
                                entry.shift_id = request.shift_id;
                                entry.status = ScheduleStatus::Swapped;
                                entry.replacement = Some(target.clone());
                                entry.updated_at = now;
                            }
                        }
                        None => {
                            let id = Inner::next_id(&mut inner.next_entry_id);
                            inner.schedule.insert(
                                id,
                                ScheduleEntry {
                                    entry_id: id,
                                    agent_id: request.agent_id.clone(),
                                    shift_id: request.shift_id,
                                    date: request.date,
                                    status: ScheduleStatus::Swapped,
                                    replacement: Some(target.clone()),
                                    created_at: now,
                                    updated_at: now,
                                },
                            );
                        }
                    }
                    match inner.entry_for(&target, request.date) {
                        Some(id) => {
                            if let Some(entry) = inner.schedule.get_mut(&id) {
                                entry.shift_id = request.shift_id;
                                entry.status = ScheduleStatus::Normal;
                                entry.replacement = Some(request.agent_id.clone());
                                entry.updated_at = now;
                            }
                        }
                        None => {
                            let id = Inner::next_id(&mut inner.next_entry_id);
                            inner.schedule.insert(
                                id,
                                ScheduleEntry {
                                    entry_id: id,
                                    agent_id: target.clone(),
                                    shift_id: request.shift_id,
                                    date: request.date,
                                    status: ScheduleStatus::Normal,
                                    replacement: Some(request.agent_id.clone()),
                                    created_at: now,
                                    updated_at: now,
                                },
                            );
                        }
                    }
                    for id in [&request.agent_id, &target] {
                        if let Some(agent) = inner.agents.get_mut(id) {
                            agent.live_status = LiveStatus::Working;
                            agent.updated_at = now;
                        }
                    }
                }
            }
        }

        let stored = inner
            .leaves
            .get_mut(&request_id)
            .ok_or_else(|| not_found("leave request", request_id))?;
        stored.status = if approve {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Rejected
        };
        stored.decided_by = Some(reviewer.to_string());
        stored.decided_at = Some(now);
        stored.updated_at = now;
        Ok(stored.clone())
    }

    // ========================================================================
    // CONVERSATION OPERATIONS
    // ========================================================================

    async fn conversation_insert(&self, conversation: &Conversation) -> DesklineResult<()> {
        let mut inner = self.write()?;
        if inner
            .conversations
            .contains_key(&conversation.conversation_id)
        {
            return Err(StorageError::DuplicateKey {
                entity: "conversation",
                key: conversation.conversation_id.to_string(),
            }
            .into());
        }
        inner
            .conversations
            .insert(conversation.conversation_id, conversation.clone());
        Ok(())
    }

    async fn conversation_get(
        &self,
        conversation_id: ConversationId,
    ) -> DesklineResult<Option<Conversation>> {
        Ok(self.read()?.conversations.get(&conversation_id).cloned())
    }

    async fn conversation_find_ongoing(
        &self,
        user_id: &str,
    ) -> DesklineResult<Option<Conversation>> {
        let inner = self.read()?;
        Ok(inner
            .conversations
            .values()
            .find(|c| c.user_id == user_id && c.status == ConversationStatus::Ongoing)
            .cloned())
    }

    async fn conversation_count_ongoing(
        &self,
        agent_ids: &[AgentId],
    ) -> DesklineResult<Vec<(AgentId, usize)>> {
        let inner = self.read()?;
        Ok(agent_ids
            .iter()
            .map(|agent_id| {
                let count = inner
                    .conversations
                    .values()
                    .filter(|c| {
                        c.agent_id == *agent_id && c.status == ConversationStatus::Ongoing
                    })
                    .count();
                (agent_id.clone(), count)
            })
            .collect())
    }

    async fn conversation_transition(
        &self,
        conversation_id: ConversationId,
        expected_version: i64,
        patch: ConversationPatch,
    ) -> DesklineResult<Conversation> {
        let mut inner = self.write()?;
        let conversation = inner
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| not_found("conversation", conversation_id))?;
        if conversation.version != expected_version {
            return Err(ConversationError::StaleVersion { conversation_id }.into());
        }

        if let Some(status) = patch.status {
            conversation.status = status;
        }
        if let Some(agent_id) = patch.agent_id {
            conversation.agent_id = agent_id;
        }
        if patch.ended_at.is_some() {
            conversation.ended_at = patch.ended_at;
        }
        if let Some(category_id) = patch.category_id {
            conversation.category_id = category_id;
        }
        if let Some(manual) = patch.manually_classified {
            conversation.manually_classified = manual;
        }
        conversation.version += 1;
        conversation.updated_at = Utc::now();
        Ok(conversation.clone())
    }

    async fn conversation_list(
        &self,
        query: &ConversationQuery,
        page: Page,
    ) -> DesklineResult<(Vec<Conversation>, usize)> {
        let inner = self.read()?;
        let mut matches: Vec<_> = inner
            .conversations
            .values()
            .filter(|c| query.agent_id.as_ref().is_none_or(|a| c.agent_id == *a))
            .filter(|c| query.user_id.as_ref().is_none_or(|u| c.user_id == *u))
            .filter(|c| query.status.is_none_or(|s| c.status == s))
            .filter(|c| {
                !query.history_only
                    || matches!(
                        c.status,
                        ConversationStatus::Ended | ConversationStatus::Abandoned
                    )
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        let total = matches.len();
        let paged = matches
            .into_iter()
            .skip(page.offset())
            .take(page.page_size as usize)
            .collect();
        Ok((paged, total))
    }

    async fn conversation_set_category(
        &self,
        conversation_id: ConversationId,
        category_id: RowId,
    ) -> DesklineResult<Conversation> {
        let mut inner = self.write()?;
        if category_id != 0 && !inner.categories.contains_key(&category_id) {
            return Err(not_found("category", category_id));
        }
        let conversation = inner
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| not_found("conversation", conversation_id))?;
        conversation.category_id = category_id;
        conversation.manually_classified = true;
        conversation.version += 1;
        conversation.updated_at = Utc::now();
        Ok(conversation.clone())
    }

    // ========================================================================
    // TRANSFER RECORDS
    // ========================================================================

    async fn transfer_insert(&self, record: &TransferRecord) -> DesklineResult<RowId> {
        let mut inner = self.write()?;
        let id = Inner::next_id(&mut inner.next_transfer_id);
        let mut stored = record.clone();
        stored.transfer_id = id;
        inner.transfers.push(stored);
        Ok(id)
    }

    async fn transfer_list(
        &self,
        conversation_id: ConversationId,
    ) -> DesklineResult<Vec<TransferRecord>> {
        let inner = self.read()?;
        Ok(inner
            .transfers
            .iter()
            .filter(|t| t.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    // ========================================================================
    // MESSAGE OPERATIONS
    // ========================================================================

    async fn message_append(&self, message: NewMessage) -> DesklineResult<ConversationMessage> {
        let mut inner = self.write()?;
        let now = Utc::now();
        let conversation = inner
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or_else(|| not_found("conversation", message.conversation_id))?;
        conversation.last_message_at = now;
        conversation.updated_at = now;

        let id = Inner::next_id(&mut inner.next_message_id);
        let stored = ConversationMessage {
            message_id: id,
            conversation_id: message.conversation_id,
            sender_type: message.sender_type,
            sender_id: message.sender_id,
            content: message.content,
            quick_reply: message.quick_reply,
            quick_reply_id: message.quick_reply_id,
            sent_at: now,
        };
        inner.messages.push(stored.clone());
        Ok(stored)
    }

    async fn message_list(
        &self,
        conversation_id: ConversationId,
        page: Page,
    ) -> DesklineResult<(Vec<ConversationMessage>, usize)> {
        let inner = self.read()?;
        let mut matches: Vec<_> = inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| (a.sent_at, a.message_id).cmp(&(b.sent_at, b.message_id)));
        let total = matches.len();
        let paged = matches
            .into_iter()
            .skip(page.offset())
            .take(page.page_size as usize)
            .collect();
        Ok((paged, total))
    }

    async fn message_first_n(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> DesklineResult<Vec<ConversationMessage>> {
        let inner = self.read()?;
        // System messages are excluded before the window is cut, so they
        // never consume classification slots.
        let mut matches: Vec<_> = inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .filter(|m| m.sender_type != SenderType::System)
            .cloned()
            .collect();
        matches.sort_by(|a, b| (a.sent_at, a.message_id).cmp(&(b.sent_at, b.message_id)));
        matches.truncate(limit);
        Ok(matches)
    }

    // ========================================================================
    // CATEGORY OPERATIONS
    // ========================================================================

    async fn category_insert(&self, category: &MessageCategory) -> DesklineResult<RowId> {
        let mut inner = self.write()?;
        let id = Inner::next_id(&mut inner.next_category_id);
        let mut stored = category.clone();
        stored.category_id = id;
        inner.categories.insert(id, stored);
        Ok(id)
    }

    async fn category_get(&self, category_id: RowId) -> DesklineResult<Option<MessageCategory>> {
        Ok(self.read()?.categories.get(&category_id).cloned())
    }

    async fn category_update(&self, category: &MessageCategory) -> DesklineResult<()> {
        let mut inner = self.write()?;
        if !inner.categories.contains_key(&category.category_id) {
            return Err(not_found("category", category.category_id));
        }
        inner.categories.insert(category.category_id, category.clone());
        Ok(())
    }

    async fn category_delete(&self, category_id: RowId) -> DesklineResult<()> {
        let mut inner = self.write()?;
        inner
            .categories
            .remove(&category_id)
            .ok_or_else(|| not_found("category", category_id))?;
        Ok(())
    }

    async fn category_list(&self) -> DesklineResult<Vec<MessageCategory>> {
        let inner = self.read()?;
        let mut categories: Vec<_> = inner.categories.values().cloned().collect();
        categories.sort_by_key(|c| (c.sort_order, c.category_id));
        Ok(categories)
    }

    // ========================================================================
    // CONVERSATION TAG OPERATIONS
    // ========================================================================

    async fn tag_insert(&self, tag: &ConvTag) -> DesklineResult<RowId> {
        let mut inner = self.write()?;
        if inner.tags.values().any(|t| t.name == tag.name) {
            return Err(StorageError::DuplicateKey {
                entity: "tag",
                key: tag.name.clone(),
            }
            .into());
        }
        let id = Inner::next_id(&mut inner.next_tag_id);
        let mut stored = tag.clone();
        stored.tag_id = id;
        inner.tags.insert(id, stored);
        Ok(id)
    }

    async fn tag_get(&self, tag_id: RowId) -> DesklineResult<Option<ConvTag>> {
        Ok(self.read()?.tags.get(&tag_id).cloned())
    }

    async fn tag_update(&self, tag: &ConvTag) -> DesklineResult<()> {
        let mut inner = self.write()?;
        if !inner.tags.contains_key(&tag.tag_id) {
            return Err(not_found("tag", tag.tag_id));
        }
        if inner
            .tags
            .values()
            .any(|t| t.tag_id != tag.tag_id && t.name == tag.name)
        {
            return Err(StorageError::DuplicateKey {
                entity: "tag",
                key: tag.name.clone(),
            }
            .into());
        }
        inner.tags.insert(tag.tag_id, tag.clone());
        Ok(())
    }

    async fn tag_delete(&self, tag_id: RowId) -> DesklineResult<()> {
        let mut inner = self.write()?;
        inner
            .tags
            .remove(&tag_id)
            .ok_or_else(|| not_found("tag", tag_id))?;
        Ok(())
    }

    async fn tag_list(&self) -> DesklineResult<Vec<ConvTag>> {
        let inner = self.read()?;
        let mut tags: Vec<_> = inner.tags.values().cloned().collect();
        tags.sort_by_key(|t| (t.sort_order, t.tag_id));
        Ok(tags)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use deskline_core::{new_conversation_id, EmploymentStatus, SenderType};

    fn agent(id: &str) -> Agent {
        Agent {
            agent_id: id.to_string(),
            name: id.to_string(),
            department: "support".to_string(),
            team: "tier1".to_string(),
            skill_tags: String::new(),
            employment: EmploymentStatus::Active,
            live_status: LiveStatus::Idle,
            online: true,
            last_heartbeat: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn shift(name: &str, start: &str, end: &str) -> ShiftTemplate {
        ShiftTemplate {
            shift_id: 0,
            name: name.to_string(),
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            min_staff: 1,
            holiday: false,
            created_by: "admin".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn conversation(user: &str, agent: &str) -> Conversation {
        let now = Utc::now();
        Conversation {
            conversation_id: new_conversation_id(),
            user_id: user.to_string(),
            user_nickname: user.to_string(),
            agent_id: agent.to_string(),
            source: "web".to_string(),
            started_at: now,
            ended_at: None,
            last_message_at: now,
            status: ConversationStatus::Ongoing,
            category_id: 0,
            manually_classified: false,
            tags: String::new(),
            core: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn leave_request(agent: &str, kind: RequestType, date: &str, shift_id: RowId) -> LeaveRequest {
        LeaveRequest {
            request_id: 0,
            agent_id: agent.to_string(),
            request_type: kind,
            date: date.parse().unwrap(),
            shift_id,
            target_agent: None,
            reason: "family".to_string(),
            status: ApprovalStatus::Pending,
            decided_by: None,
            decided_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn seeded() -> (InMemoryStore, RowId) {
        let store = InMemoryStore::new();
        store.agent_insert(&agent("CS001")).await.unwrap();
        store.agent_insert(&agent("CS002")).await.unwrap();
        let shift_id = store
            .shift_insert(&shift("day", "09:00:00", "17:00:00"))
            .await
            .unwrap();
        (store, shift_id)
    }

    #[tokio::test]
    async fn test_shift_delete_blocked_while_referenced() {
        let (store, shift_id) = seeded().await;
        store
            .schedule_assign_batch(&[NewScheduleEntry {
                agent_id: "CS001".to_string(),
                shift_id,
                date: "2025-03-10".parse().unwrap(),
            }])
            .await
            .unwrap();

        let err = store.shift_delete(shift_id).await.unwrap_err();
        assert!(matches!(
            err,
            deskline_core::DesklineError::Storage(StorageError::StillReferenced { .. })
        ));
        let agent = store.agent_get("CS001").await.unwrap().unwrap();
        assert_eq!(agent.live_status, LiveStatus::Working);

        store
            .schedule_upsert_cell("CS001", "2025-03-10".parse().unwrap(), None)
            .await
            .unwrap();
        store.shift_delete(shift_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_assign_batch_is_all_or_nothing() {
        let (store, shift_id) = seeded().await;
        let date: NaiveDate = "2025-03-10".parse().unwrap();
        store
            .schedule_assign_batch(&[NewScheduleEntry {
                agent_id: "CS001".to_string(),
                shift_id,
                date,
            }])
            .await
            .unwrap();

        // CS001 conflicts; CS002 must not be inserted either.
        let err = store
            .schedule_assign_batch(&[
                NewScheduleEntry {
                    agent_id: "CS001".to_string(),
                    shift_id,
                    date,
                },
                NewScheduleEntry {
                    agent_id: "CS002".to_string(),
                    shift_id,
                    date,
                },
            ])
            .await
            .unwrap_err();
        match err {
            deskline_core::DesklineError::Schedule(ScheduleError::Conflict {
                agent_ids, ..
            }) => assert_eq!(agent_ids, vec!["CS001".to_string()]),
            other => panic!("expected conflict, got {other:?}"),
        }
        assert!(store.schedule_find("CS002", date).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_cell_insert_update_delete() {
        let (store, shift_id) = seeded().await;
        let date: NaiveDate = "2025-03-11".parse().unwrap();

        store
            .schedule_upsert_cell("CS001", date, Some(shift_id))
            .await
            .unwrap();
        let entry = store.schedule_find("CS001", date).await.unwrap().unwrap();
        assert_eq!(entry.shift_id, shift_id);
        let agent = store.agent_get("CS001").await.unwrap().unwrap();
        assert_eq!(agent.live_status, LiveStatus::Working);

        let night = store
            .shift_insert(&shift("night", "22:00:00", "06:00:00"))
            .await
            .unwrap();
        store
            .schedule_upsert_cell("CS001", date, Some(night))
            .await
            .unwrap();
        let entry = store.schedule_find("CS001", date).await.unwrap().unwrap();
        assert_eq!(entry.shift_id, night);

        store.schedule_upsert_cell("CS001", date, None).await.unwrap();
        assert!(store.schedule_find("CS001", date).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_leave_approval_marks_entry_and_agent() {
        let (store, shift_id) = seeded().await;
        let date: NaiveDate = "2025-03-12".parse().unwrap();
        store
            .schedule_upsert_cell("CS001", date, Some(shift_id))
            .await
            .unwrap();
        let request_id = store
            .leave_insert(&leave_request(
                "CS001",
                RequestType::Leave,
                "2025-03-12",
                shift_id,
            ))
            .await
            .unwrap();

        let decided = store
            .leave_decide(request_id, "admin", true, Utc::now())
            .await
            .unwrap();
        assert_eq!(decided.status, ApprovalStatus::Approved);

        let entry = store.schedule_find("CS001", date).await.unwrap().unwrap();
        assert_eq!(entry.status, ScheduleStatus::OnLeave);
        let agent = store.agent_get("CS001").await.unwrap().unwrap();
        assert_eq!(agent.live_status, LiveStatus::OnLeave);
    }

    #[tokio::test]
    async fn test_leave_approval_creates_missing_entry() {
        let (store, shift_id) = seeded().await;
        let date: NaiveDate = "2025-03-20".parse().unwrap();
        let request_id = store
            .leave_insert(&leave_request(
                "CS001",
                RequestType::Leave,
                "2025-03-20",
                shift_id,
            ))
            .await
            .unwrap();

        store
            .leave_decide(request_id, "admin", true, Utc::now())
            .await
            .unwrap();

        // The agent had no roster entry; approval records one on-leave
        // against the requested shift.
        let entry = store.schedule_find("CS001", date).await.unwrap().unwrap();
        assert_eq!(entry.status, ScheduleStatus::OnLeave);
        assert_eq!(entry.shift_id, shift_id);
    }

    #[tokio::test]
    async fn test_swap_approval_creates_replacement_pair() {
        let (store, shift_id) = seeded().await;
        let date: NaiveDate = "2025-03-13".parse().unwrap();
        store
            .schedule_upsert_cell("CS001", date, Some(shift_id))
            .await
            .unwrap();
        let mut request = leave_request("CS001", RequestType::Swap, "2025-03-13", shift_id);
        request.target_agent = Some("CS002".to_string());
        let request_id = store.leave_insert(&request).await.unwrap();

        store
            .leave_decide(request_id, "admin", true, Utc::now())
            .await
            .unwrap();

        let source = store.schedule_find("CS001", date).await.unwrap().unwrap();
        assert_eq!(source.status, ScheduleStatus::Swapped);
        assert_eq!(source.replacement.as_deref(), Some("CS002"));
        let target = store.schedule_find("CS002", date).await.unwrap().unwrap();
        assert_eq!(target.status, ScheduleStatus::Normal);
        assert_eq!(target.shift_id, shift_id);
    }

    #[tokio::test]
    async fn test_swap_conflict_leaves_nothing_mutated() {
        let (store, shift_id) = seeded().await;
        let date: NaiveDate = "2025-03-14".parse().unwrap();
        store
            .schedule_upsert_cell("CS001", date, Some(shift_id))
            .await
            .unwrap();
        store
            .schedule_upsert_cell("CS002", date, Some(shift_id))
            .await
            .unwrap();
        let mut request = leave_request("CS001", RequestType::Swap, "2025-03-14", shift_id);
        request.target_agent = Some("CS002".to_string());
        let request_id = store.leave_insert(&request).await.unwrap();

        let err = store
            .leave_decide(request_id, "admin", true, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            deskline_core::DesklineError::Schedule(ScheduleError::SwapTargetBusy { .. })
        ));

        // Source entry untouched, request still pending.
        let source = store.schedule_find("CS001", date).await.unwrap().unwrap();
        assert_eq!(source.status, ScheduleStatus::Normal);
        let request = store.leave_get(request_id).await.unwrap().unwrap();
        assert_eq!(request.status, ApprovalStatus::Pending);
    }

    #[tokio::test]
    async fn test_decided_request_cannot_be_decided_again() {
        let (store, shift_id) = seeded().await;
        let request_id = store
            .leave_insert(&leave_request(
                "CS001",
                RequestType::Leave,
                "2025-03-15",
                shift_id,
            ))
            .await
            .unwrap();
        store
            .leave_decide(request_id, "admin", false, Utc::now())
            .await
            .unwrap();

        let err = store
            .leave_decide(request_id, "admin", true, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            deskline_core::DesklineError::Schedule(ScheduleError::AlreadyDecided { .. })
        ));
    }

    #[tokio::test]
    async fn test_transition_cas_rejects_stale_version() {
        let (store, _) = seeded().await;
        let conv = conversation("user-1", "CS001");
        store.conversation_insert(&conv).await.unwrap();

        let updated = store
            .conversation_transition(
                conv.conversation_id,
                0,
                ConversationPatch {
                    status: Some(ConversationStatus::Transferred),
                    agent_id: Some("CS002".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.version, 1);
        assert_eq!(updated.agent_id, "CS002");

        // Second writer still holding version 0 loses.
        let err = store
            .conversation_transition(
                conv.conversation_id,
                0,
                ConversationPatch {
                    status: Some(ConversationStatus::Ended),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            deskline_core::DesklineError::Conversation(ConversationError::StaleVersion { .. })
        ));
        let current = store
            .conversation_get(conv.conversation_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, ConversationStatus::Transferred);
    }

    #[tokio::test]
    async fn test_count_ongoing_reports_zero_for_idle_agents() {
        let (store, _) = seeded().await;
        store
            .conversation_insert(&conversation("user-1", "CS001"))
            .await
            .unwrap();
        store
            .conversation_insert(&conversation("user-2", "CS001"))
            .await
            .unwrap();

        let counts = store
            .conversation_count_ongoing(&["CS001".to_string(), "CS002".to_string()])
            .await
            .unwrap();
        assert_eq!(counts, vec![("CS001".to_string(), 2), ("CS002".to_string(), 0)]);
    }

    #[tokio::test]
    async fn test_message_append_assigns_order_and_touches_conversation() {
        let (store, _) = seeded().await;
        let conv = conversation("user-1", "CS001");
        store.conversation_insert(&conv).await.unwrap();

        for i in 0..3 {
            store
                .message_append(NewMessage {
                    conversation_id: conv.conversation_id,
                    sender_type: SenderType::User,
                    sender_id: "user-1".to_string(),
                    content: format!("message {i}"),
                    quick_reply: false,
                    quick_reply_id: None,
                })
                .await
                .unwrap();
        }

        let (messages, total) = store
            .message_list(conv.conversation_id, Page::new(1, 10))
            .await
            .unwrap();
        assert_eq!(total, 3);
        let ids: Vec<_> = messages.iter().map(|m| m.message_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let current = store
            .conversation_get(conv.conversation_id)
            .await
            .unwrap()
            .unwrap();
        assert!(current.last_message_at >= conv.last_message_at);
    }

    #[tokio::test]
    async fn test_first_n_skips_system_messages() {
        let (store, _) = seeded().await;
        let conv = conversation("user-1", "CS001");
        store.conversation_insert(&conv).await.unwrap();

        let senders = [
            (SenderType::System, "SYSTEM"),
            (SenderType::User, "user-1"),
            (SenderType::System, "SYSTEM"),
            (SenderType::Agent, "CS001"),
            (SenderType::User, "user-1"),
        ];
        for (sender_type, sender_id) in senders {
            store
                .message_append(NewMessage {
                    conversation_id: conv.conversation_id,
                    sender_type,
                    sender_id: sender_id.to_string(),
                    content: format!("{sender_id} says hi"),
                    quick_reply: false,
                    quick_reply_id: None,
                })
                .await
                .unwrap();
        }

        // The window is cut after system messages are dropped, so both
        // user messages fit in a limit of 3.
        let window = store
            .message_first_n(conv.conversation_id, 3)
            .await
            .unwrap();
        let kinds: Vec<_> = window.iter().map(|m| m.sender_type).collect();
        assert_eq!(
            kinds,
            vec![SenderType::User, SenderType::Agent, SenderType::User]
        );
    }

    #[tokio::test]
    async fn test_manual_category_bumps_version() {
        let (store, _) = seeded().await;
        let category_id = store
            .category_insert(&MessageCategory {
                category_id: 0,
                name: "billing".to_string(),
                keywords: vec!["refund".to_string()],
                sort_order: 0,
                created_by: "admin".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        let conv = conversation("user-1", "CS001");
        store.conversation_insert(&conv).await.unwrap();

        let updated = store
            .conversation_set_category(conv.conversation_id, category_id)
            .await
            .unwrap();
        assert!(updated.manually_classified);
        assert_eq!(updated.category_id, category_id);
        assert_eq!(updated.version, 1);
    }

    fn tag(name: &str, sort_order: i32) -> ConvTag {
        ConvTag {
            tag_id: 0,
            name: name.to_string(),
            color: "#1890ff".to_string(),
            sort_order,
            created_by: "admin".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_tag_names_are_unique() {
        let store = InMemoryStore::new();
        let vip = store.tag_insert(&tag("vip", 2)).await.unwrap();
        store.tag_insert(&tag("urgent", 1)).await.unwrap();

        let err = store.tag_insert(&tag("vip", 9)).await.unwrap_err();
        assert!(matches!(
            err,
            deskline_core::DesklineError::Storage(StorageError::DuplicateKey { .. })
        ));

        // Renaming onto another tag's name is rejected the same way.
        let mut renamed = store.tag_get(vip).await.unwrap().unwrap();
        renamed.name = "urgent".to_string();
        let err = store.tag_update(&renamed).await.unwrap_err();
        assert!(matches!(
            err,
            deskline_core::DesklineError::Storage(StorageError::DuplicateKey { .. })
        ));

        let names: Vec<_> = store
            .tag_list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["urgent", "vip"]);

        store.tag_delete(vip).await.unwrap();
        assert!(store.tag_get(vip).await.unwrap().is_none());
    }
}
