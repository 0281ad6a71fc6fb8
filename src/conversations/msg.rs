use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::{Conversation, Message, MessageStatus, Profile, unix_now};
use crate::error::{AppError, AppResult};
use crate::store;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageWithSender {
    pub message: Message,
    pub sender: Profile,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    pub status: Option<MessageStatus>,
    pub is_offline: Option<bool>,
    pub reply_to_id: Option<Uuid>,
}

async fn member_conversation(
    db_pool: &SqlitePool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> AppResult<Conversation> {
    let Some(conversation) = store::conversation_by_id(db_pool, conversation_id).await? else {
        return Err(AppError::NotFound("conversation"));
    };

    if !conversation.involves(user_id) {
        return Err(AppError::Forbidden("not a participant of this conversation"));
    }

    Ok(conversation)
}

/// Messages in creation order with sender attached. Side effect: every
/// not-from-self message is marked read, so the caller's unread count for
/// this conversation drops to zero.
#[axum::debug_handler(state = crate::AppState)]
pub(crate) async fn list_messages(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<Vec<MessageWithSender>>> {
    let conversation = member_conversation(&db_pool, conversation_id, user.id).await?;

    store::mark_messages_read(&db_pool, conversation_id, user.id).await?;

    let other_id = conversation.other_participant(user.id);
    let other = store::profile_by_id(&db_pool, other_id)
        .await?
        .ok_or(AppError::NotFound("profile"))?;

    let messages = store::messages_for_conversation(&db_pool, conversation_id).await?;
    let out = messages
        .into_iter()
        .map(|message| {
            let sender = if message.sender_id == user.id {
                user.clone()
            } else {
                other.clone()
            };
            MessageWithSender { message, sender }
        })
        .collect();

    Ok(Json(out))
}

#[axum::debug_handler(state = crate::AppState)]
pub(crate) async fn send_message(
    State(db_pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<Message>> {
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("message content is empty".to_owned()));
    }

    member_conversation(&db_pool, conversation_id, user.id).await?;

    let message = Message {
        id: Uuid::now_v7(),
        conversation_id,
        sender_id: user.id,
        content: req.content,
        status: req.status.unwrap_or(MessageStatus::Sent),
        is_offline: req.is_offline.unwrap_or(false),
        is_read: None,
        is_deleted: None,
        reply_to_id: req.reply_to_id,
        created_at: unix_now(),
    };

    // two independent statements, not a transaction: a crash in between
    // leaves the list ordering stale but the message intact
    store::insert_message(&db_pool, &message).await?;
    store::touch_conversation(&db_pool, conversation_id).await?;

    Ok(Json(message))
}
