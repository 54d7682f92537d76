//! Conversation REST Routes
//!
//! Assignment entry point plus the guarded lifecycle operations and
//! listing/history queries.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use deskline_core::ConversationId;
use deskline_storage::{ConversationQuery, Page, Store};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::services::{assignment, conversation};
use crate::state::AppState;
use crate::types::{
    AssignConversationRequest, AssignConversationResponse, ConversationResponse,
    EndConversationRequest, Envelope, ListConversationsQuery, ListPayload, ReclassifyRequest,
    TransferConversationRequest, TransferResponse,
};

const MAX_PAGE_SIZE: u32 = 100;

/// POST /api/v1/conversations - assign or reuse a conversation for a user
pub async fn assign_conversation(
    State(state): State<AppState>,
    Json(req): Json<AssignConversationRequest>,
) -> ApiResult<Json<Envelope<AssignConversationResponse>>> {
    let (conversation, agent, reused) = assignment::assign_or_reuse(
        state.store.as_ref(),
        &state.encryptor,
        &req.user_id,
        &req.nickname,
        req.source,
    )
    .await?;
    Ok(Json(Envelope::ok(AssignConversationResponse {
        conversation_id: conversation.conversation_id,
        agent_id: agent.agent_id,
        agent_name: agent.name,
        reused,
    })))
}

/// GET /api/v1/conversations - filtered listing; `history=true` restricts
/// to closed conversations
pub async fn list_conversations(
    State(store): State<Arc<dyn Store>>,
    Query(query): Query<ListConversationsQuery>,
) -> ApiResult<Json<Envelope<ListPayload<ConversationResponse>>>> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(20).min(MAX_PAGE_SIZE);
    let filter = ConversationQuery {
        agent_id: query.agent_id,
        user_id: query.user_id,
        status: query.status,
        history_only: query.history,
    };
    let (items, total) = store
        .conversation_list(&filter, Page::new(page, page_size))
        .await?;
    Ok(Json(Envelope::ok(ListPayload {
        items: items.into_iter().map(ConversationResponse::from).collect(),
        total,
        page,
        page_size,
    })))
}

/// GET /api/v1/conversations/:id
pub async fn get_conversation(
    State(store): State<Arc<dyn Store>>,
    Path(conversation_id): Path<ConversationId>,
) -> ApiResult<Json<Envelope<ConversationResponse>>> {
    let conversation = store
        .conversation_get(conversation_id)
        .await?
        .ok_or_else(|| crate::error::ApiError::conversation_not_found(conversation_id))?;
    Ok(Json(Envelope::ok(conversation.into())))
}

/// POST /api/v1/conversations/:id/transfer - hand over to another agent
pub async fn transfer_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
    Json(req): Json<TransferConversationRequest>,
) -> ApiResult<Json<Envelope<ConversationResponse>>> {
    let updated = conversation::transfer(
        state.store.as_ref(),
        &state.encryptor,
        conversation_id,
        &req.to_agent,
    )
    .await?;
    Ok(Json(Envelope::ok(updated.into())))
}

/// POST /api/v1/conversations/:id/end - agent-side close with
/// auto-classification
pub async fn end_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
    Json(req): Json<EndConversationRequest>,
) -> ApiResult<Json<Envelope<ConversationResponse>>> {
    let updated = conversation::end(
        state.store.as_ref(),
        &state.encryptor,
        conversation_id,
        req.reason,
    )
    .await?;
    Ok(Json(Envelope::ok(updated.into())))
}

/// POST /api/v1/conversations/:id/abandon - user-side terminal close
pub async fn abandon_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
) -> ApiResult<Json<Envelope<ConversationResponse>>> {
    let updated = conversation::abandon(state.store.as_ref(), conversation_id).await?;
    Ok(Json(Envelope::ok(updated.into())))
}

/// POST /api/v1/conversations/:id/category - manual reclassification
pub async fn reclassify_conversation(
    State(store): State<Arc<dyn Store>>,
    Path(conversation_id): Path<ConversationId>,
    Json(req): Json<ReclassifyRequest>,
) -> ApiResult<Json<Envelope<ConversationResponse>>> {
    let updated =
        conversation::reclassify(store.as_ref(), conversation_id, req.category_id).await?;
    Ok(Json(Envelope::ok(updated.into())))
}

/// GET /api/v1/conversations/:id/transfers - handover audit trail
pub async fn list_transfers(
    State(store): State<Arc<dyn Store>>,
    Path(conversation_id): Path<ConversationId>,
) -> ApiResult<Json<Envelope<Vec<TransferResponse>>>> {
    let records = store.transfer_list(conversation_id).await?;
    Ok(Json(Envelope::ok(
        records.into_iter().map(TransferResponse::from).collect(),
    )))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(assign_conversation).get(list_conversations))
        .route("/:id", get(get_conversation))
        .route("/:id/transfer", post(transfer_conversation))
        .route("/:id/end", post(end_conversation))
        .route("/:id/abandon", post(abandon_conversation))
        .route("/:id/category", post(reclassify_conversation))
        .route("/:id/transfers", get(list_transfers))
}
