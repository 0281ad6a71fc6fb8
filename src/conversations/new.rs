use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::store;

use super::list::ConversationSummary;

#[derive(Debug, Serialize, Deserialize)]
pub struct NewConversationRequest {
    pub username: String,
}

/// Starts (or returns) the conversation with the named user. Calling this
/// twice for the same pair yields the same conversation id.
#[axum::debug_handler(state = crate::AppState)]
pub(crate) async fn new_conversation(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(NewConversationRequest { username }): Json<NewConversationRequest>,
) -> AppResult<Json<ConversationSummary>> {
    let Some(other_user) = store::profile_by_username(&db_pool, &username).await? else {
        return Err(AppError::NotFound("user"));
    };

    if other_user.id == user.id {
        return Err(AppError::Validation(
            "cannot start a conversation with yourself".to_owned(),
        ));
    }

    let conversation = store::find_or_create_conversation(&db_pool, user.id, other_user.id).await?;
    let last_message = store::last_message(&db_pool, conversation.id).await?;
    let unread_count = store::unread_count(&db_pool, conversation.id, user.id).await?;

    Ok(Json(ConversationSummary {
        conversation,
        other_user,
        last_message,
        unread_count,
    }))
}
