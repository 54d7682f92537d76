//! Schedule REST Routes
//!
//! Batch assignment, single-cell editing, automatic generation, and the
//! roster grid query.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use deskline_core::RowId;
use deskline_storage::Store;
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::services::scheduler;
use crate::state::AppState;
use crate::types::{
    AssignScheduleRequest, AutoScheduleRequest, Envelope, GridQuery, ScheduleGridResponse,
    UpsertCellRequest,
};
use crate::validation::parse_date;

#[derive(Debug, Serialize)]
pub struct AssignResponse {
    pub entry_ids: Vec<RowId>,
}

#[derive(Debug, Serialize)]
pub struct AutoScheduleResponse {
    pub created: usize,
}

/// POST /api/v1/schedule/assign - assign one shift to agents on one date,
/// all-or-nothing
pub async fn assign_schedule(
    State(store): State<Arc<dyn Store>>,
    Json(req): Json<AssignScheduleRequest>,
) -> ApiResult<Json<Envelope<AssignResponse>>> {
    let date = parse_date("date", &req.date)?;
    let entry_ids =
        scheduler::assign_schedule(store.as_ref(), req.shift_id, &req.agent_ids, date).await?;
    Ok(Json(Envelope::ok(AssignResponse { entry_ids })))
}

/// POST /api/v1/schedule/cell - upsert one roster cell (shift_id 0 clears)
pub async fn upsert_cell(
    State(store): State<Arc<dyn Store>>,
    Json(req): Json<UpsertCellRequest>,
) -> ApiResult<Json<Envelope<()>>> {
    let date = parse_date("date", &req.date)?;
    scheduler::upsert_cell(store.as_ref(), &req.agent_id, date, req.shift_id).await?;
    Ok(Json(Envelope::ok_empty()))
}

/// POST /api/v1/schedule/auto - rotate eligible agents through the shift
/// templates over a range
pub async fn auto_schedule(
    State(store): State<Arc<dyn Store>>,
    Json(req): Json<AutoScheduleRequest>,
) -> ApiResult<Json<Envelope<AutoScheduleResponse>>> {
    let start = parse_date("start_date", &req.start_date)?;
    let end = parse_date("end_date", &req.end_date)?;
    let created = scheduler::auto_schedule(
        store.as_ref(),
        start,
        end,
        req.department.as_deref(),
        req.team.as_deref(),
    )
    .await?;
    Ok(Json(Envelope::ok(AutoScheduleResponse { created })))
}

/// GET /api/v1/schedule/grid - roster axes and entries for a date range
pub async fn schedule_grid(
    State(store): State<Arc<dyn Store>>,
    Query(query): Query<GridQuery>,
) -> ApiResult<Json<Envelope<ScheduleGridResponse>>> {
    let start = parse_date("start_date", &query.start_date)?;
    let end = parse_date("end_date", &query.end_date)?;
    let grid = scheduler::schedule_grid(
        store.as_ref(),
        start,
        end,
        query.department.as_deref(),
        query.team.as_deref(),
    )
    .await?;
    Ok(Json(Envelope::ok(grid)))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/assign", post(assign_schedule))
        .route("/cell", post(upsert_cell))
        .route("/auto", post(auto_schedule))
        .route("/grid", get(schedule_grid))
}
