use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::store;

/// Soft delete: tombstones the conversation's messages, keeps the row.
#[axum::debug_handler(state = crate::AppState)]
pub(crate) async fn delete_conversation(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let Some(conversation) = store::conversation_by_id(&db_pool, conversation_id).await? else {
        return Err(AppError::NotFound("conversation"));
    };

    if !conversation.involves(user.id) {
        return Err(AppError::Forbidden("not a participant of this conversation"));
    }

    store::soft_delete_conversation_messages(&db_pool, conversation_id).await?;

    Ok(Json(json!({ "ok": true })))
}
