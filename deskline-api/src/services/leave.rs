//! Leave Service
//!
//! Application and approval workflow for leave and shift-swap requests.
//! Approval side effects are applied atomically by the store; this layer
//! owns the request-time validation and display joins.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use deskline_core::{
    ApprovalStatus, LeaveRequest, RequestType, RowId, ScheduleError,
};
use deskline_storage::{LeaveQuery, Page, Store};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::types::LeaveResponse;
use crate::validation::ValidateNonEmpty;

/// Listing page size cap.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raise a pending leave or swap request.
pub async fn apply(
    store: &dyn Store,
    agent_id: &str,
    request_type: RequestType,
    date: NaiveDate,
    shift_id: RowId,
    target_agent: Option<String>,
    reason: String,
) -> ApiResult<LeaveResponse> {
    agent_id.validate_non_empty("agent_id")?;
    let agent = store
        .agent_get(agent_id)
        .await?
        .ok_or_else(|| ApiError::agent_not_found(agent_id))?;
    if !agent.is_active() {
        return Err(ApiError::validation_failed(format!(
            "Agent {} is not active",
            agent_id
        )));
    }
    let shift = store
        .shift_get(shift_id)
        .await?
        .ok_or_else(|| ApiError::shift_not_found(shift_id))?;

    let target_name = match request_type {
        RequestType::Swap => {
            let target = target_agent
                .as_deref()
                .ok_or(ScheduleError::SwapTargetMissing)?;
            if target == agent_id {
                return Err(ScheduleError::SelfSwap.into());
            }
            let target_row = store
                .agent_get(target)
                .await?
                .ok_or_else(|| ApiError::agent_not_found(target))?;
            if !target_row.is_active() {
                return Err(ApiError::validation_failed(format!(
                    "Swap target {} is not active",
                    target
                )));
            }
            Some(target_row.name)
        }
        RequestType::Leave => None,
    };

    let now = Utc::now();
    let request = LeaveRequest {
        request_id: 0,
        agent_id: agent_id.to_string(),
        request_type,
        date,
        shift_id,
        target_agent: target_agent.filter(|_| request_type == RequestType::Swap),
        reason,
        status: ApprovalStatus::Pending,
        decided_by: None,
        decided_at: None,
        created_at: now,
        updated_at: now,
    };
    let request_id = store.leave_insert(&request).await?;
    info!(request_id, agent_id, %request_type, "leave request raised");

    let stored = store
        .leave_get(request_id)
        .await?
        .ok_or_else(|| ApiError::request_not_found(request_id))?;
    Ok(LeaveResponse::from_request(
        stored,
        agent.name,
        shift.name,
        target_name,
    ))
}

/// Approve or reject a pending request. All approval side effects happen
/// inside one storage transaction; a swap conflict mutates nothing.
pub async fn decide(
    store: &dyn Store,
    request_id: RowId,
    reviewer: &str,
    approve: bool,
) -> ApiResult<LeaveResponse> {
    reviewer.validate_non_empty("reviewer")?;
    let decided = store
        .leave_decide(request_id, reviewer, approve, Utc::now())
        .await?;
    info!(request_id, approve, "leave request decided");
    with_names(store, decided).await
}

pub async fn get(store: &dyn Store, request_id: RowId) -> ApiResult<LeaveResponse> {
    let request = store
        .leave_get(request_id)
        .await?
        .ok_or_else(|| ApiError::request_not_found(request_id))?;
    with_names(store, request).await
}

/// Filtered listing, page size capped at 100.
pub async fn list(
    store: &dyn Store,
    status: Option<ApprovalStatus>,
    keyword: Option<String>,
    page: u32,
    page_size: u32,
) -> ApiResult<(Vec<LeaveResponse>, usize)> {
    let page = Page::new(page, page_size.min(MAX_PAGE_SIZE));
    let query = LeaveQuery { status, keyword };
    let (requests, total) = store.leave_list(&query, page).await?;

    let names: HashMap<String, String> = store
        .agent_list()
        .await?
        .into_iter()
        .map(|a| (a.agent_id, a.name))
        .collect();
    let shift_names: HashMap<RowId, String> = store
        .shift_list()
        .await?
        .into_iter()
        .map(|s| (s.shift_id, s.name))
        .collect();
    let responses = requests
        .into_iter()
        .map(|r| {
            let agent_name = names.get(&r.agent_id).cloned().unwrap_or_default();
            let shift_name = shift_names.get(&r.shift_id).cloned().unwrap_or_default();
            let target_name = r
                .target_agent
                .as_ref()
                .and_then(|t| names.get(t).cloned());
            LeaveResponse::from_request(r, agent_name, shift_name, target_name)
        })
        .collect();
    Ok((responses, total))
}

async fn with_names(store: &dyn Store, request: LeaveRequest) -> ApiResult<LeaveResponse> {
    let agent_name = store
        .agent_get(&request.agent_id)
        .await?
        .map(|a| a.name)
        .unwrap_or_default();
    let shift_name = store
        .shift_get(request.shift_id)
        .await?
        .map(|s| s.name)
        .unwrap_or_default();
    let target_name = match &request.target_agent {
        Some(target) => store.agent_get(target).await?.map(|a| a.name),
        None => None,
    };
    Ok(LeaveResponse::from_request(
        request,
        agent_name,
        shift_name,
        target_name,
    ))
}
