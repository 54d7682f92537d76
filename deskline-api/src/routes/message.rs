//! Conversation Message REST Routes
//!
//! History queries and the HTTP send path (the real-time channel is the
//! primary send path; this mirrors it for gateway clients).

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use deskline_core::ConversationId;
use deskline_storage::{Page, Store};

use crate::error::ApiResult;
use crate::services::conversation;
use crate::state::AppState;
use crate::types::{
    Envelope, ListMessagesQuery, ListPayload, MessageResponse, SendMessageRequest,
};

const MAX_PAGE_SIZE: u32 = 100;

/// GET /api/v1/conversations/:id/messages - paginated history in send order
pub async fn list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<Json<Envelope<ListPayload<MessageResponse>>>> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(50).min(MAX_PAGE_SIZE);
    let (messages, total) = state
        .store
        .message_list(conversation_id, Page::new(page, page_size))
        .await?;

    let items = messages
        .into_iter()
        .map(|m| {
            let plaintext = state.encryptor.decrypt_if_needed(&m.content);
            MessageResponse::from_message(m, plaintext)
        })
        .collect();
    Ok(Json(Envelope::ok(ListPayload {
        items,
        total,
        page,
        page_size,
    })))
}

/// POST /api/v1/conversations/:id/messages - persist a message over HTTP
pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<Envelope<MessageResponse>>> {
    let stored = conversation::send_message(
        state.store.as_ref(),
        &state.encryptor,
        conversation_id,
        req.sender_type,
        &req.sender_id,
        &req.content,
        req.quick_reply,
        req.quick_reply_id,
    )
    .await?;
    let plaintext = state.encryptor.decrypt_if_needed(&stored.content);
    Ok(Json(Envelope::ok(MessageResponse::from_message(
        stored, plaintext,
    ))))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/:id/messages", get(list_messages).post(send_message))
}
