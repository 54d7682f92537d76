//! Shift Template REST Routes

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use deskline_core::{RowId, ShiftTemplate};
use deskline_storage::Store;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{CreateShiftRequest, Envelope, ShiftResponse, UpdateShiftRequest};
use crate::validation::{parse_time, ValidateNonEmpty, ValidateRange};

/// POST /api/v1/shifts - create a shift template
pub async fn create_shift(
    State(store): State<Arc<dyn Store>>,
    Json(req): Json<CreateShiftRequest>,
) -> ApiResult<Json<Envelope<ShiftResponse>>> {
    req.name.validate_non_empty("name")?;
    req.created_by.validate_non_empty("created_by")?;
    req.min_staff.validate_range("min_staff", 1, 500)?;
    let start = parse_time("start", &req.start)?;
    let end = parse_time("end", &req.end)?;
    if start == end {
        return Err(ApiError::validation_failed(
            "start and end must differ; a 24h shift is not representable",
        ));
    }

    let now = Utc::now();
    let template = ShiftTemplate {
        shift_id: 0,
        name: req.name,
        start,
        end,
        min_staff: req.min_staff,
        holiday: req.holiday,
        created_by: req.created_by,
        created_at: now,
        updated_at: now,
    };
    let shift_id = store.shift_insert(&template).await?;
    let stored = store
        .shift_get(shift_id)
        .await?
        .ok_or_else(|| ApiError::shift_not_found(shift_id))?;
    Ok(Json(Envelope::ok(stored.into())))
}

/// GET /api/v1/shifts - list all shift templates
pub async fn list_shifts(
    State(store): State<Arc<dyn Store>>,
) -> ApiResult<Json<Envelope<Vec<ShiftResponse>>>> {
    let shifts = store.shift_list().await?;
    Ok(Json(Envelope::ok(
        shifts.into_iter().map(ShiftResponse::from).collect(),
    )))
}

/// GET /api/v1/shifts/:id - fetch one shift template
pub async fn get_shift(
    State(store): State<Arc<dyn Store>>,
    Path(shift_id): Path<RowId>,
) -> ApiResult<Json<Envelope<ShiftResponse>>> {
    let shift = store
        .shift_get(shift_id)
        .await?
        .ok_or_else(|| ApiError::shift_not_found(shift_id))?;
    Ok(Json(Envelope::ok(shift.into())))
}

/// PUT /api/v1/shifts/:id - update fields of a shift template
pub async fn update_shift(
    State(store): State<Arc<dyn Store>>,
    Path(shift_id): Path<RowId>,
    Json(req): Json<UpdateShiftRequest>,
) -> ApiResult<Json<Envelope<ShiftResponse>>> {
    let mut shift = store
        .shift_get(shift_id)
        .await?
        .ok_or_else(|| ApiError::shift_not_found(shift_id))?;

    if let Some(name) = req.name {
        name.validate_non_empty("name")?;
        shift.name = name;
    }
    if let Some(start) = req.start {
        shift.start = parse_time("start", &start)?;
    }
    if let Some(end) = req.end {
        shift.end = parse_time("end", &end)?;
    }
    if shift.start == shift.end {
        return Err(ApiError::validation_failed(
            "start and end must differ; a 24h shift is not representable",
        ));
    }
    if let Some(min_staff) = req.min_staff {
        min_staff.validate_range("min_staff", 1, 500)?;
        shift.min_staff = min_staff;
    }
    if let Some(holiday) = req.holiday {
        shift.holiday = holiday;
    }
    shift.updated_at = Utc::now();

    store.shift_update(&shift).await?;
    Ok(Json(Envelope::ok(shift.into())))
}

/// DELETE /api/v1/shifts/:id - delete a template with no schedule entries
pub async fn delete_shift(
    State(store): State<Arc<dyn Store>>,
    Path(shift_id): Path<RowId>,
) -> ApiResult<Json<Envelope<()>>> {
    store.shift_delete(shift_id).await?;
    Ok(Json(Envelope::ok_empty()))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_shift).get(list_shifts))
        .route("/:id", get(get_shift).put(update_shift).delete(delete_shift))
}
