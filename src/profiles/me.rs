use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::AuthUser;
use crate::db::Profile;
use crate::error::{AppError, AppResult};
use crate::store;

/// Only full_name and avatar_url are caller-writable; everything else on
/// the profile is managed by the server.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineStatusRequest {
    pub is_online: bool,
}

#[axum::debug_handler(state = crate::AppState)]
pub(crate) async fn update_me(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    store::update_profile(
        &db_pool,
        user.id,
        req.full_name.as_deref(),
        req.avatar_url.as_deref(),
    )
    .await?;

    let updated = store::profile_by_id(&db_pool, user.id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    Ok(Json(updated))
}

#[axum::debug_handler(state = crate::AppState)]
pub(crate) async fn set_online(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(OnlineStatusRequest { is_online }): Json<OnlineStatusRequest>,
) -> AppResult<Json<Profile>> {
    store::set_online_status(&db_pool, user.id, is_online).await?;

    let updated = store::profile_by_id(&db_pool, user.id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    Ok(Json(updated))
}
