use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::AuthUser;
use crate::db::{Conversation, Message, Profile};
use crate::error::AppResult;
use crate::store;

/// One row of the conversation list: the thread, the other participant,
/// the latest message and how many are waiting unread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub other_user: Profile,
    pub last_message: Option<Message>,
    pub unread_count: i64,
}

#[axum::debug_handler(state = crate::AppState)]
pub(crate) async fn list(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<ConversationSummary>>> {
    let conversations = store::conversations_for_user(&db_pool, user.id).await?;

    let mut out = Vec::with_capacity(conversations.len());
    for (conversation, other_user) in conversations {
        let last_message = store::last_message(&db_pool, conversation.id).await?;
        let unread_count = store::unread_count(&db_pool, conversation.id, user.id).await?;
        out.push(ConversationSummary {
            conversation,
            other_user,
            last_message,
            unread_count,
        });
    }

    Ok(Json(out))
}
