//! Storage adapter: one single-purpose query per function, `Option` for
//! absent rows. Ids live as TEXT in sqlite and are parsed back to `Uuid`
//! on the way out. No function spans more than one statement; callers
//! that need multiple statements issue them sequentially.

use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::db::{Conversation, Message, MessageStatus, Profile, unix_now};
use crate::error::{AppError, AppResult};

#[derive(FromRow)]
struct ProfileRow {
    id: String,
    email: String,
    username: String,
    password: String,
    full_name: Option<String>,
    avatar_url: Option<String>,
    is_online: bool,
    last_seen: Option<i64>,
    is_blocked: bool,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> AppResult<Profile> {
        Ok(Profile {
            id: Uuid::parse_str(&row.id)?,
            email: row.email,
            username: row.username,
            password: row.password,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            is_online: row.is_online,
            last_seen: row.last_seen,
            is_blocked: row.is_blocked,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ConversationRow {
    id: String,
    participant_1: String,
    participant_2: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = AppError;

    fn try_from(row: ConversationRow) -> AppResult<Conversation> {
        Ok(Conversation {
            id: Uuid::parse_str(&row.id)?,
            participant_1: Uuid::parse_str(&row.participant_1)?,
            participant_2: Uuid::parse_str(&row.participant_2)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: String,
    conversation_id: String,
    sender_id: String,
    content: String,
    status: String,
    is_offline: bool,
    is_read: Option<bool>,
    is_deleted: Option<bool>,
    reply_to_id: Option<String>,
    created_at: i64,
}

impl TryFrom<MessageRow> for Message {
    type Error = AppError;

    fn try_from(row: MessageRow) -> AppResult<Message> {
        let status = MessageStatus::parse(&row.status)
            .ok_or_else(|| anyhow::anyhow!("unknown message status {:?}", row.status))?;

        Ok(Message {
            id: Uuid::parse_str(&row.id)?,
            conversation_id: Uuid::parse_str(&row.conversation_id)?,
            sender_id: Uuid::parse_str(&row.sender_id)?,
            content: row.content,
            status,
            is_offline: row.is_offline,
            is_read: row.is_read,
            is_deleted: row.is_deleted,
            reply_to_id: row.reply_to_id.as_deref().map(Uuid::parse_str).transpose()?,
            created_at: row.created_at,
        })
    }
}

pub async fn profile_by_id(db_pool: &SqlitePool, id: Uuid) -> AppResult<Option<Profile>> {
    sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE id=?")
        .bind(id.to_string())
        .fetch_optional(db_pool)
        .await?
        .map(Profile::try_from)
        .transpose()
}

pub async fn profile_by_email(db_pool: &SqlitePool, email: &str) -> AppResult<Option<Profile>> {
    sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE email=?")
        .bind(email)
        .fetch_optional(db_pool)
        .await?
        .map(Profile::try_from)
        .transpose()
}

pub async fn profile_by_username(
    db_pool: &SqlitePool,
    username: &str,
) -> AppResult<Option<Profile>> {
    sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE username=?")
        .bind(username)
        .fetch_optional(db_pool)
        .await?
        .map(Profile::try_from)
        .transpose()
}

/// Inserts a new profile. The UNIQUE indexes on email and username are the
/// authoritative duplicate signal; a violation is mapped to the matching
/// typed error by offending column.
pub async fn insert_profile(db_pool: &SqlitePool, profile: &Profile) -> AppResult<()> {
    let result = sqlx::query(
        "INSERT INTO profiles \
         (id,email,username,password,full_name,avatar_url,is_online,last_seen,is_blocked,created_at,updated_at) \
         VALUES (?,?,?,?,?,?,?,?,?,?,?)",
    )
    .bind(profile.id.to_string())
    .bind(&profile.email)
    .bind(&profile.username)
    .bind(&profile.password)
    .bind(&profile.full_name)
    .bind(&profile.avatar_url)
    .bind(profile.is_online)
    .bind(profile.last_seen)
    .bind(profile.is_blocked)
    .bind(profile.created_at)
    .bind(profile.updated_at)
    .execute(db_pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            if err.message().contains("profiles.email") {
                Err(AppError::DuplicateEmail)
            } else if err.message().contains("profiles.username") {
                Err(AppError::DuplicateUsername)
            } else {
                Err(sqlx::Error::Database(err).into())
            }
        }
        Err(err) => Err(err.into()),
    }
}

/// Partial update: only full_name and avatar_url are caller-writable here.
pub async fn update_profile(
    db_pool: &SqlitePool,
    id: Uuid,
    full_name: Option<&str>,
    avatar_url: Option<&str>,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE profiles SET \
         full_name = COALESCE(?, full_name), \
         avatar_url = COALESCE(?, avatar_url), \
         updated_at = ? \
         WHERE id = ?",
    )
    .bind(full_name)
    .bind(avatar_url)
    .bind(unix_now())
    .bind(id.to_string())
    .execute(db_pool)
    .await?;

    Ok(())
}

pub async fn set_online_status(
    db_pool: &SqlitePool,
    id: Uuid,
    is_online: bool,
) -> AppResult<()> {
    sqlx::query("UPDATE profiles SET is_online=?, last_seen=?, updated_at=? WHERE id=?")
        .bind(is_online)
        .bind(unix_now())
        .bind(unix_now())
        .bind(id.to_string())
        .execute(db_pool)
        .await?;

    Ok(())
}

pub async fn block_profile(db_pool: &SqlitePool, id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("UPDATE profiles SET is_blocked=1, updated_at=? WHERE id=?")
        .bind(unix_now())
        .bind(id.to_string())
        .execute(db_pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Orders an unordered pair so the conversations UNIQUE index sees one
/// canonical form per pair.
pub fn normalize_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

pub async fn conversation_by_id(
    db_pool: &SqlitePool,
    id: Uuid,
) -> AppResult<Option<Conversation>> {
    sqlx::query_as::<_, ConversationRow>("SELECT * FROM conversations WHERE id=?")
        .bind(id.to_string())
        .fetch_optional(db_pool)
        .await?
        .map(Conversation::try_from)
        .transpose()
}

pub async fn find_conversation_between(
    db_pool: &SqlitePool,
    a: Uuid,
    b: Uuid,
) -> AppResult<Option<Conversation>> {
    let (p1, p2) = normalize_pair(a, b);

    sqlx::query_as::<_, ConversationRow>(
        "SELECT * FROM conversations WHERE participant_1=? AND participant_2=?",
    )
    .bind(p1.to_string())
    .bind(p2.to_string())
    .fetch_optional(db_pool)
    .await?
    .map(Conversation::try_from)
    .transpose()
}

/// Returns the existing conversation for the pair, or inserts a new one.
/// When two requests race past the lookup, the UNIQUE constraint rejects
/// the loser, which then refetches the winner's row.
pub async fn find_or_create_conversation(
    db_pool: &SqlitePool,
    a: Uuid,
    b: Uuid,
) -> AppResult<Conversation> {
    if let Some(existing) = find_conversation_between(db_pool, a, b).await? {
        return Ok(existing);
    }

    let (p1, p2) = normalize_pair(a, b);
    let now = unix_now();
    let conversation = Conversation {
        id: Uuid::now_v7(),
        participant_1: p1,
        participant_2: p2,
        created_at: now,
        updated_at: now,
    };

    let result = sqlx::query(
        "INSERT INTO conversations (id,participant_1,participant_2,created_at,updated_at) \
         VALUES (?,?,?,?,?)",
    )
    .bind(conversation.id.to_string())
    .bind(p1.to_string())
    .bind(p2.to_string())
    .bind(now)
    .bind(now)
    .execute(db_pool)
    .await;

    match result {
        Ok(_) => Ok(conversation),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            find_conversation_between(db_pool, a, b)
                .await?
                .ok_or_else(|| anyhow::anyhow!("conversation vanished after duplicate insert").into())
        }
        Err(err) => Err(err.into()),
    }
}

/// All conversations the user participates in, most recently updated
/// first, each paired with the *other* participant's profile.
pub async fn conversations_for_user(
    db_pool: &SqlitePool,
    user_id: Uuid,
) -> AppResult<Vec<(Conversation, Profile)>> {
    let rows = sqlx::query_as::<_, ConversationRow>(
        "SELECT * FROM conversations WHERE participant_1=? OR participant_2=? \
         ORDER BY updated_at DESC, id DESC",
    )
    .bind(user_id.to_string())
    .bind(user_id.to_string())
    .fetch_all(db_pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let conversation = Conversation::try_from(row)?;
        let other_id = conversation.other_participant(user_id);
        let other = profile_by_id(db_pool, other_id)
            .await?
            .ok_or(AppError::NotFound("profile"))?;
        out.push((conversation, other));
    }

    Ok(out)
}

pub async fn messages_for_conversation(
    db_pool: &SqlitePool,
    conversation_id: Uuid,
) -> AppResult<Vec<Message>> {
    sqlx::query_as::<_, MessageRow>(
        "SELECT * FROM messages WHERE conversation_id=? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(conversation_id.to_string())
    .fetch_all(db_pool)
    .await?
    .into_iter()
    .map(Message::try_from)
    .collect()
}

pub async fn last_message(
    db_pool: &SqlitePool,
    conversation_id: Uuid,
) -> AppResult<Option<Message>> {
    sqlx::query_as::<_, MessageRow>(
        "SELECT * FROM messages WHERE conversation_id=? ORDER BY created_at DESC, rowid DESC LIMIT 1",
    )
    .bind(conversation_id.to_string())
    .fetch_optional(db_pool)
    .await?
    .map(Message::try_from)
    .transpose()
}

pub async fn message_by_id(db_pool: &SqlitePool, id: Uuid) -> AppResult<Option<Message>> {
    sqlx::query_as::<_, MessageRow>("SELECT * FROM messages WHERE id=?")
        .bind(id.to_string())
        .fetch_optional(db_pool)
        .await?
        .map(Message::try_from)
        .transpose()
}

pub async fn insert_message(db_pool: &SqlitePool, message: &Message) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO messages \
         (id,conversation_id,sender_id,content,status,is_offline,is_read,is_deleted,reply_to_id,created_at) \
         VALUES (?,?,?,?,?,?,?,?,?,?)",
    )
    .bind(message.id.to_string())
    .bind(message.conversation_id.to_string())
    .bind(message.sender_id.to_string())
    .bind(&message.content)
    .bind(message.status.as_str())
    .bind(message.is_offline)
    .bind(message.is_read)
    .bind(message.is_deleted)
    .bind(message.reply_to_id.as_ref().map(Uuid::to_string))
    .bind(message.created_at)
    .execute(db_pool)
    .await?;

    Ok(())
}

/// Bumps the conversation's updated_at. Deliberately a separate statement
/// from the message insert; a crash in between leaves list ordering stale
/// but message data intact.
pub async fn touch_conversation(db_pool: &SqlitePool, id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE conversations SET updated_at=? WHERE id=?")
        .bind(unix_now())
        .bind(id.to_string())
        .execute(db_pool)
        .await?;

    Ok(())
}

/// Messages in the conversation not sent by `user_id` and not yet read.
/// Tombstoned messages still count.
pub async fn unread_count(
    db_pool: &SqlitePool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> AppResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM messages \
         WHERE conversation_id=? AND sender_id != ? AND (is_read IS NULL OR is_read = 0)",
    )
    .bind(conversation_id.to_string())
    .bind(user_id.to_string())
    .fetch_one(db_pool)
    .await?;

    Ok(count)
}

/// Flips is_read for every unread not-from-`user_id` message in one
/// statement.
pub async fn mark_messages_read(
    db_pool: &SqlitePool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE messages SET is_read=1 \
         WHERE conversation_id=? AND sender_id != ? AND (is_read IS NULL OR is_read = 0)",
    )
    .bind(conversation_id.to_string())
    .bind(user_id.to_string())
    .execute(db_pool)
    .await?;

    Ok(())
}

pub async fn soft_delete_message(db_pool: &SqlitePool, id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE messages SET is_deleted=1 WHERE id=?")
        .bind(id.to_string())
        .execute(db_pool)
        .await?;

    Ok(())
}

/// "Deleting" a conversation tombstones its messages; the conversation row
/// itself stays.
pub async fn soft_delete_conversation_messages(
    db_pool: &SqlitePool,
    conversation_id: Uuid,
) -> AppResult<()> {
    sqlx::query("UPDATE messages SET is_deleted=1 WHERE conversation_id=?")
        .bind(conversation_id.to_string())
        .execute(db_pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_normalization_is_order_independent() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert_eq!(normalize_pair(a, b), normalize_pair(b, a));
        assert!(normalize_pair(a, b).0 <= normalize_pair(a, b).1);
    }
}
