//! Conversation Service
//!
//! Guarded lifecycle transitions (transfer, end, abandon), message
//! persistence, and end-of-conversation auto-classification. Every
//! transition loads the current row, validates the requested move against
//! the transition table, and applies the update as a compare-and-swap on
//! the loaded version; a concurrent winner surfaces as a retryable
//! conflict.

use chrono::Utc;
use deskline_core::{
    Conversation, ConversationError, ConversationId, ConversationMessage, ConversationStatus,
    KeywordClassifier, MessageEncryptor, RowId, SenderType, TransferRecord, SYSTEM_SENDER,
};
use deskline_storage::{ConversationPatch, NewMessage, Store};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::validation::ValidateNonEmpty;

/// How many leading user/agent messages feed the classifier.
pub const CLASSIFY_MESSAGE_LIMIT: usize = 50;

async fn load(store: &dyn Store, conversation_id: ConversationId) -> ApiResult<Conversation> {
    store
        .conversation_get(conversation_id)
        .await?
        .ok_or_else(|| ApiError::conversation_not_found(conversation_id))
}

fn check_transition(
    conversation: &Conversation,
    to: ConversationStatus,
) -> ApiResult<()> {
    if !conversation.status.can_transition_to(to) {
        return Err(ConversationError::IllegalTransition {
            conversation_id: conversation.conversation_id,
            from: conversation.status,
            to,
        }
        .into());
    }
    Ok(())
}

/// Persist a message on an open conversation, encrypting the content at
/// rest. The returned row carries the stored (encrypted) content and the
/// authoritative send timestamp.
pub async fn send_message(
    store: &dyn Store,
    encryptor: &MessageEncryptor,
    conversation_id: ConversationId,
    sender_type: SenderType,
    sender_id: &str,
    content: &str,
    quick_reply: bool,
    quick_reply_id: Option<RowId>,
) -> ApiResult<ConversationMessage> {
    sender_id.validate_non_empty("sender_id")?;
    content.validate_non_empty("content")?;

    let conversation = load(store, conversation_id).await?;
    if !conversation.status.accepts_messages() {
        return Err(ConversationError::Closed {
            conversation_id,
            status: conversation.status,
        }
        .into());
    }

    let stored_content = encryptor.encrypt_if_needed(content).map_err(|e| {
        ApiError::internal_error(format!("Failed to encrypt message: {}", e))
    })?;
    let message = store
        .message_append(NewMessage {
            conversation_id,
            sender_type,
            sender_id: sender_id.to_string(),
            content: stored_content,
            quick_reply,
            quick_reply_id,
        })
        .await?;
    Ok(message)
}

/// Hand the conversation to another agent. The target must exist, be
/// active and online, and differ from the current agent. Writes a
/// transfer record and a system handover message.
pub async fn transfer(
    store: &dyn Store,
    encryptor: &MessageEncryptor,
    conversation_id: ConversationId,
    to_agent: &str,
) -> ApiResult<Conversation> {
    to_agent.validate_non_empty("to_agent")?;
    let conversation = load(store, conversation_id).await?;
    check_transition(&conversation, ConversationStatus::Transferred)?;

    if to_agent == conversation.agent_id {
        return Err(ConversationError::SelfTransfer.into());
    }
    let target = store
        .agent_get(to_agent)
        .await?
        .ok_or_else(|| ApiError::agent_not_found(to_agent))?;
    if !target.is_active() || !target.online {
        return Err(ConversationError::TargetUnavailable {
            agent_id: to_agent.to_string(),
        }
        .into());
    }

    let from_agent = conversation.agent_id.clone();
    let updated = store
        .conversation_transition(
            conversation_id,
            conversation.version,
            ConversationPatch {
                status: Some(ConversationStatus::Transferred),
                agent_id: Some(to_agent.to_string()),
                ..Default::default()
            },
        )
        .await?;

    store
        .transfer_insert(&TransferRecord {
            transfer_id: 0,
            conversation_id,
            from_agent: from_agent.clone(),
            to_agent: to_agent.to_string(),
            transferred_at: Utc::now(),
            accepted: true,
        })
        .await?;
    append_system_message(
        store,
        encryptor,
        conversation_id,
        &format!(
            "Conversation transferred from {} to {}",
            from_agent, target.name
        ),
    )
    .await?;

    info!(%conversation_id, from = %from_agent, to = to_agent, "conversation transferred");
    Ok(updated)
}

/// Close the conversation from the agent side. When no category was set
/// manually or previously, the first messages are classified and a
/// confident result is committed as part of the same update.
pub async fn end(
    store: &dyn Store,
    encryptor: &MessageEncryptor,
    conversation_id: ConversationId,
    reason: Option<String>,
) -> ApiResult<Conversation> {
    let conversation = load(store, conversation_id).await?;
    check_transition(&conversation, ConversationStatus::Ended)?;

    let category_id = if conversation.category_id == 0 && !conversation.manually_classified {
        classify(store, encryptor, conversation_id).await?
    } else {
        None
    };

    let now = Utc::now();
    let updated = store
        .conversation_transition(
            conversation_id,
            conversation.version,
            ConversationPatch {
                status: Some(ConversationStatus::Ended),
                ended_at: Some(now),
                category_id,
                ..Default::default()
            },
        )
        .await?;

    let note = match reason {
        Some(reason) if !reason.trim().is_empty() => {
            format!("Conversation ended: {}", reason.trim())
        }
        _ => "Conversation ended".to_string(),
    };
    append_system_message(store, encryptor, conversation_id, &note).await?;

    info!(
        %conversation_id,
        duration_secs = updated.duration_secs(now),
        category_id = updated.category_id,
        "conversation ended"
    );
    Ok(updated)
}

/// Terminal close for user-initiated disconnects. Same duration
/// bookkeeping as `end`, no classification.
pub async fn abandon(
    store: &dyn Store,
    conversation_id: ConversationId,
) -> ApiResult<Conversation> {
    let conversation = load(store, conversation_id).await?;
    check_transition(&conversation, ConversationStatus::Abandoned)?;

    let now = Utc::now();
    let updated = store
        .conversation_transition(
            conversation_id,
            conversation.version,
            ConversationPatch {
                status: Some(ConversationStatus::Abandoned),
                ended_at: Some(now),
                ..Default::default()
            },
        )
        .await?;
    info!(%conversation_id, "conversation abandoned");
    Ok(updated)
}

/// Operator override of the topic category; blocks future auto-classify.
pub async fn reclassify(
    store: &dyn Store,
    conversation_id: ConversationId,
    category_id: RowId,
) -> ApiResult<Conversation> {
    let updated = store
        .conversation_set_category(conversation_id, category_id)
        .await?;
    info!(%conversation_id, category_id, "conversation reclassified");
    Ok(updated)
}

/// Run the keyword classifier over the first user/agent messages. Returns
/// a category only when the classifier is confident.
async fn classify(
    store: &dyn Store,
    encryptor: &MessageEncryptor,
    conversation_id: ConversationId,
) -> ApiResult<Option<RowId>> {
    let categories = store.category_list().await?;
    if categories.is_empty() {
        return Ok(None);
    }

    let messages = store
        .message_first_n(conversation_id, CLASSIFY_MESSAGE_LIMIT)
        .await?;
    let text: String = messages
        .iter()
        .map(|m| encryptor.decrypt_if_needed(&m.content))
        .collect::<Vec<_>>()
        .join(" ");
    if text.trim().is_empty() {
        return Ok(None);
    }

    let outcome = KeywordClassifier::new(&categories).classify(&text);
    debug!(
        %conversation_id,
        category_id = outcome.category_id,
        confidence = outcome.confidence,
        needs_manual = outcome.needs_manual,
        "auto-classification"
    );
    if outcome.needs_manual {
        Ok(None)
    } else {
        Ok(Some(outcome.category_id))
    }
}

async fn append_system_message(
    store: &dyn Store,
    encryptor: &MessageEncryptor,
    conversation_id: ConversationId,
    text: &str,
) -> ApiResult<()> {
    store
        .message_append(NewMessage {
            conversation_id,
            sender_type: SenderType::System,
            sender_id: SYSTEM_SENDER.to_string(),
            content: encryptor.encrypt_if_needed(text).map_err(|e| {
                ApiError::internal_error(format!("Failed to encrypt system message: {}", e))
            })?,
            quick_reply: false,
            quick_reply_id: None,
        })
        .await?;
    Ok(())
}
