mod me;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{patch, post},
};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::store;

pub use me::{OnlineStatusRequest, UpdateProfileRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", patch(me::update_me))
        .route("/me/online", post(me::set_online))
        .route("/{id}/block", post(block_profile))
}

#[axum::debug_handler(state = AppState)]
async fn block_profile(
    State(db_pool): State<SqlitePool>,
    AuthUser(_user): AuthUser,
    Path(profile_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !store::block_profile(&db_pool, profile_id).await? {
        return Err(AppError::NotFound("user"));
    }

    Ok(Json(json!({ "ok": true })))
}
