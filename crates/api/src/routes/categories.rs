//! Category endpoints, including the cached hierarchy view.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use cache::keys;
use common::CategoryId;
use domain::{Category, CategoryNode, build_tree};
use fulfillment::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::routes::orders::AppState;
use crate::routes::parse_uuid;

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parent_id: Option<String>,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parent_id: Option<String>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        CategoryResponse {
            id: category.id.to_string(),
            name: category.name,
            description: category.description,
            parent_id: category.parent_id.map(|id| id.to_string()),
        }
    }
}

/// POST /categories — create a category, optionally under a parent.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let parent_id = req
        .parent_id
        .as_deref()
        .map(|s| parse_uuid(s).map(CategoryId::from_uuid))
        .transpose()?;

    if let Some(parent_id) = parent_id
        && state.store.get_category(parent_id).await?.is_none()
    {
        return Err(ApiError::BadRequest(format!(
            "parent category {parent_id} not found"
        )));
    }

    let category = Category::new(req.name, req.description, parent_id);
    state.store.insert_category(category.clone()).await?;

    // Any cached tree might gain this node.
    state.cache.invalidate_category_trees().await;

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// GET /categories/:id — load one category.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category_id = CategoryId::from_uuid(parse_uuid(&id)?);
    let category = state
        .store
        .get_category(category_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("category {id} not found")))?;

    Ok(Json(category.into()))
}

/// GET /categories — list all categories flat.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.store.list_categories().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// GET /categories/:id/tree — the cached subtree rooted at a category.
#[tracing::instrument(skip(state))]
pub async fn tree<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<CategoryNode>, ApiError> {
    let category_id = CategoryId::from_uuid(parse_uuid(&id)?);

    let node = state
        .cache
        .trees
        .get_or_load(&keys::category_tree(category_id), || async {
            let categories = state.store.list_categories().await?;
            build_tree(category_id, &categories)
                .ok_or_else(|| ApiError::NotFound(format!("category {id} not found")))
        })
        .await?;

    Ok(Json(node))
}
