//! User endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use cache::keys;
use common::UserId;
use domain::User;
use fulfillment::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::routes::orders::AppState;
use crate::routes::parse_uuid;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub active: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.to_string(),
            email: user.email,
            name: user.name,
            active: user.active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// POST /users — register a user. Email must be unique.
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn create<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user =
        User::new(req.email, req.name).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    state.store.insert_user(user.clone()).await?;
    state.cache.invalidate_user(user.id).await;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users/:id — read-through cached user lookup.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static, G: PaymentGateway + 'static>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = UserId::from_uuid(parse_uuid(&id)?);

    let user = state
        .cache
        .users
        .get_or_load(&keys::user(user_id), || async {
            state
                .store
                .get_user(user_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
        })
        .await?;

    Ok(Json(user.into()))
}
