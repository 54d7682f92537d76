//! Assignment Service
//!
//! Entry point for incoming chat sessions: reuse the user's open
//! conversation when one exists, otherwise pick the least-loaded on-duty
//! agent and open a new one.

use chrono::Utc;
use deskline_core::{
    new_conversation_id, Agent, Conversation, ConversationError, ConversationStatus,
    MessageEncryptor, SenderType, SYSTEM_SENDER,
};
use deskline_storage::{NewMessage, Store};
use rand::Rng;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::validation::ValidateNonEmpty;

/// Assign a conversation for `user_id`, reusing their open one if present.
/// Returns the conversation, its agent, and whether it was reused.
pub async fn assign_or_reuse(
    store: &dyn Store,
    encryptor: &MessageEncryptor,
    user_id: &str,
    nickname: &str,
    source: Option<String>,
) -> ApiResult<(Conversation, Agent, bool)> {
    user_id.validate_non_empty("user_id")?;
    nickname.validate_non_empty("nickname")?;

    // Idempotent repeat contact.
    if let Some(existing) = store.conversation_find_ongoing(user_id).await? {
        let agent = store
            .agent_get(&existing.agent_id)
            .await?
            .ok_or_else(|| ApiError::agent_not_found(&existing.agent_id))?;
        return Ok((existing, agent, true));
    }

    let now = Utc::now();
    let agent_id = pick_least_loaded(store, now).await?;
    let agent = store
        .agent_get(&agent_id)
        .await?
        .ok_or_else(|| ApiError::agent_not_found(&agent_id))?;

    let conversation = Conversation {
        conversation_id: new_conversation_id(),
        user_id: user_id.to_string(),
        user_nickname: nickname.to_string(),
        agent_id: agent_id.clone(),
        source: source.unwrap_or_else(|| "web".to_string()),
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
    };
    store.conversation_insert(&conversation).await?;

    let welcome = format!("Agent {} has joined the conversation", agent.name);
    store
        .message_append(NewMessage {
            conversation_id: conversation.conversation_id,
            sender_type: SenderType::System,
            sender_id: SYSTEM_SENDER.to_string(),
            content: encryptor.encrypt_if_needed(&welcome).map_err(|e| {
                ApiError::internal_error(format!("Failed to encrypt welcome message: {}", e))
            })?,
            quick_reply: false,
            quick_reply_id: None,
        })
        .await?;

    info!(
        conversation_id = %conversation.conversation_id,
        user_id,
        agent_id = %agent_id,
        "conversation assigned"
    );
    Ok((conversation, agent, false))
}

/// Least-loaded selection over the on-duty set; ties break pseudo-randomly
/// for simple fairness.
async fn pick_least_loaded(store: &dyn Store, now: deskline_core::Timestamp) -> ApiResult<String> {
    let on_duty =
        super::scheduler::on_duty_agents(store, now.date_naive(), now.time()).await?;
    if on_duty.is_empty() {
        return Err(ConversationError::NoAgentAvailable.into());
    }

    let counts = store.conversation_count_ongoing(&on_duty).await?;
    let min = counts
        .iter()
        .map(|(_, c)| *c)
        .min()
        .unwrap_or_default();
    let tied: Vec<&String> = counts
        .iter()
        .filter(|(_, c)| *c == min)
        .map(|(agent_id, _)| agent_id)
        .collect();
    let pick = if tied.len() == 1 {
        tied[0]
    } else {
        tied[rand::thread_rng().gen_range(0..tied.len())]
    };
    Ok(pick.clone())
}
