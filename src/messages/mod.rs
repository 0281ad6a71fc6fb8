use axum::{
    Json, Router,
    extract::{Path, State},
    routing::delete,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::store;

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", delete(delete_message))
}

/// Sender-only soft delete; the row stays behind as a tombstone.
#[axum::debug_handler(state = AppState)]
async fn delete_message(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let Some(message) = store::message_by_id(&db_pool, message_id).await? else {
        return Err(AppError::NotFound("message"));
    };

    if message.sender_id != user.id {
        return Err(AppError::Forbidden("only the sender may delete a message"));
    }

    store::soft_delete_message(&db_pool, message_id).await?;

    Ok(Json(json!({ "ok": true })))
}
