//! Leave/Swap Request REST Routes

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use deskline_core::RowId;
use deskline_storage::Store;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::services::leave;
use crate::state::AppState;
use crate::types::{
    ApplyLeaveRequest, DecideLeaveRequest, Envelope, LeaveResponse, ListLeaveQuery, ListPayload,
};
use crate::validation::parse_date;

/// POST /api/v1/leaves - raise a leave or swap request
pub async fn apply_leave(
    State(store): State<Arc<dyn Store>>,
    Json(req): Json<ApplyLeaveRequest>,
) -> ApiResult<Json<Envelope<LeaveResponse>>> {
    let date = parse_date("date", &req.date)?;
    let response = leave::apply(
        store.as_ref(),
        &req.agent_id,
        req.request_type,
        date,
        req.shift_id,
        req.target_agent,
        req.reason,
    )
    .await?;
    Ok(Json(Envelope::ok(response)))
}

/// POST /api/v1/leaves/:id/decide - approve or reject a pending request
pub async fn decide_leave(
    State(store): State<Arc<dyn Store>>,
    Path(request_id): Path<RowId>,
    Json(req): Json<DecideLeaveRequest>,
) -> ApiResult<Json<Envelope<LeaveResponse>>> {
    let response = leave::decide(store.as_ref(), request_id, &req.reviewer, req.approve).await?;
    Ok(Json(Envelope::ok(response)))
}

/// GET /api/v1/leaves/:id - fetch one request with display names
pub async fn get_leave(
    State(store): State<Arc<dyn Store>>,
    Path(request_id): Path<RowId>,
) -> ApiResult<Json<Envelope<LeaveResponse>>> {
    let response = leave::get(store.as_ref(), request_id).await?;
    Ok(Json(Envelope::ok(response)))
}

/// GET /api/v1/leaves - filtered, paginated listing
pub async fn list_leaves(
    State(store): State<Arc<dyn Store>>,
    Query(query): Query<ListLeaveQuery>,
) -> ApiResult<Json<Envelope<ListPayload<LeaveResponse>>>> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(20);
    let (items, total) = leave::list(
        store.as_ref(),
        query.status,
        query.keyword,
        page,
        page_size,
    )
    .await?;
    Ok(Json(Envelope::ok(ListPayload {
        items,
        total,
        page,
        page_size: page_size.min(leave::MAX_PAGE_SIZE),
    })))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(apply_leave).get(list_leaves))
        .route("/:id", get(get_leave))
        .route("/:id/decide", post(decide_leave))
}
