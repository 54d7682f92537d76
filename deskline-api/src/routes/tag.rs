//! Conversation Tag REST Routes
//!
//! CRUD for the flat tag table agents use to label conversations.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use deskline_core::{ConvTag, RowId, DEFAULT_TAG_COLOR};
use deskline_storage::Store;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{CreateTagRequest, Envelope, TagResponse, UpdateTagRequest};
use crate::validation::ValidateNonEmpty;

/// POST /api/v1/tags - create a tag; names must be unique
pub async fn create_tag(
    State(store): State<Arc<dyn Store>>,
    Json(req): Json<CreateTagRequest>,
) -> ApiResult<Json<Envelope<TagResponse>>> {
    req.name.validate_non_empty("name")?;
    req.created_by.validate_non_empty("created_by")?;

    let now = Utc::now();
    let tag = ConvTag {
        tag_id: 0,
        name: req.name,
        color: req
            .color
            .unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string()),
        sort_order: req.sort_order,
        created_by: req.created_by,
        created_at: now,
        updated_at: now,
    };
    let tag_id = store.tag_insert(&tag).await?;
    let stored = store
        .tag_get(tag_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tag {tag_id} not found")))?;
    Ok(Json(Envelope::ok(stored.into())))
}

/// GET /api/v1/tags - list tags in sort order
pub async fn list_tags(
    State(store): State<Arc<dyn Store>>,
) -> ApiResult<Json<Envelope<Vec<TagResponse>>>> {
    let tags = store.tag_list().await?;
    Ok(Json(Envelope::ok(
        tags.into_iter().map(TagResponse::from).collect(),
    )))
}

/// GET /api/v1/tags/:id
pub async fn get_tag(
    State(store): State<Arc<dyn Store>>,
    Path(tag_id): Path<RowId>,
) -> ApiResult<Json<Envelope<TagResponse>>> {
    let tag = store
        .tag_get(tag_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tag {tag_id} not found")))?;
    Ok(Json(Envelope::ok(tag.into())))
}

/// PUT /api/v1/tags/:id - update name, color, or ordering
pub async fn update_tag(
    State(store): State<Arc<dyn Store>>,
    Path(tag_id): Path<RowId>,
    Json(req): Json<UpdateTagRequest>,
) -> ApiResult<Json<Envelope<TagResponse>>> {
    let mut tag = store
        .tag_get(tag_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Tag {tag_id} not found")))?;

    if let Some(name) = req.name {
        name.validate_non_empty("name")?;
        tag.name = name;
    }
    if let Some(color) = req.color {
        color.validate_non_empty("color")?;
        tag.color = color;
    }
    if let Some(sort_order) = req.sort_order {
        tag.sort_order = sort_order;
    }
    tag.updated_at = Utc::now();

    store.tag_update(&tag).await?;
    Ok(Json(Envelope::ok(tag.into())))
}

/// DELETE /api/v1/tags/:id
pub async fn delete_tag(
    State(store): State<Arc<dyn Store>>,
    Path(tag_id): Path<RowId>,
) -> ApiResult<Json<Envelope<()>>> {
    store.tag_delete(tag_id).await?;
    Ok(Json(Envelope::ok_empty()))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tag).get(list_tags))
        .route("/:id", get(get_tag).put(update_tag).delete(delete_tag))
}
