//! Message Category REST Routes
//!
//! CRUD for the keyword tables that drive auto-classification.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use deskline_core::{MessageCategory, RowId};
use deskline_storage::Store;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::{CategoryResponse, CreateCategoryRequest, Envelope, UpdateCategoryRequest};
use crate::validation::ValidateNonEmpty;

fn normalize_keywords(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// POST /api/v1/categories - create a category with its keyword list
pub async fn create_category(
    State(store): State<Arc<dyn Store>>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<Json<Envelope<CategoryResponse>>> {
    req.name.validate_non_empty("name")?;
    req.created_by.validate_non_empty("created_by")?;
    let keywords = normalize_keywords(&req.keywords);
    if keywords.is_empty() {
        return Err(ApiError::missing_field("keywords"));
    }

    let now = Utc::now();
    let category = MessageCategory {
        category_id: 0,
        name: req.name,
        keywords,
        sort_order: req.sort_order,
        created_by: req.created_by,
        created_at: now,
        updated_at: now,
    };
    let category_id = store.category_insert(&category).await?;
    let stored = store
        .category_get(category_id)
        .await?
        .ok_or_else(|| ApiError::category_not_found(category_id))?;
    Ok(Json(Envelope::ok(stored.into())))
}

/// GET /api/v1/categories - list categories in sort order
pub async fn list_categories(
    State(store): State<Arc<dyn Store>>,
) -> ApiResult<Json<Envelope<Vec<CategoryResponse>>>> {
    let categories = store.category_list().await?;
    Ok(Json(Envelope::ok(
        categories.into_iter().map(CategoryResponse::from).collect(),
    )))
}

/// GET /api/v1/categories/:id
pub async fn get_category(
    State(store): State<Arc<dyn Store>>,
    Path(category_id): Path<RowId>,
) -> ApiResult<Json<Envelope<CategoryResponse>>> {
    let category = store
        .category_get(category_id)
        .await?
        .ok_or_else(|| ApiError::category_not_found(category_id))?;
    Ok(Json(Envelope::ok(category.into())))
}

/// PUT /api/v1/categories/:id - update name, keywords, or ordering
pub async fn update_category(
    State(store): State<Arc<dyn Store>>,
    Path(category_id): Path<RowId>,
    Json(req): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<Envelope<CategoryResponse>>> {
    let mut category = store
        .category_get(category_id)
        .await?
        .ok_or_else(|| ApiError::category_not_found(category_id))?;

    if let Some(name) = req.name {
        name.validate_non_empty("name")?;
        category.name = name;
    }
    if let Some(keywords) = req.keywords {
        let keywords = normalize_keywords(&keywords);
        if keywords.is_empty() {
            return Err(ApiError::missing_field("keywords"));
        }
        category.keywords = keywords;
    }
    if let Some(sort_order) = req.sort_order {
        category.sort_order = sort_order;
    }
    category.updated_at = Utc::now();

    store.category_update(&category).await?;
    Ok(Json(Envelope::ok(category.into())))
}

/// DELETE /api/v1/categories/:id
pub async fn delete_category(
    State(store): State<Arc<dyn Store>>,
    Path(category_id): Path<RowId>,
) -> ApiResult<Json<Envelope<()>>> {
    store.category_delete(category_id).await?;
    Ok(Json(Envelope::ok_empty()))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category).get(list_categories))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

// =============================================================================
// TESTS
// =============================================================================
