use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Current wall-clock time as unix seconds, the timestamp format used
/// throughout the schema.
pub fn unix_now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        full_name TEXT,
        avatar_url TEXT,
        is_online INTEGER NOT NULL DEFAULT 0,
        last_seen INTEGER,
        is_blocked INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    // the participant pair is normalized (smaller id first) before insert,
    // so this UNIQUE covers the unordered pair
    "CREATE TABLE IF NOT EXISTS conversations (
        id TEXT PRIMARY KEY,
        participant_1 TEXT NOT NULL REFERENCES profiles(id),
        participant_2 TEXT NOT NULL REFERENCES profiles(id),
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        UNIQUE (participant_1, participant_2)
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        conversation_id TEXT NOT NULL REFERENCES conversations(id),
        sender_id TEXT NOT NULL REFERENCES profiles(id),
        content TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'sent'
            CHECK (status IN ('sending', 'sent', 'failed', 'delivered')),
        is_offline INTEGER NOT NULL DEFAULT 0,
        is_read INTEGER,
        is_deleted INTEGER,
        reply_to_id TEXT,
        created_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_messages_conversation
        ON messages (conversation_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_conversations_updated
        ON conversations (updated_at)",
];

pub async fn migrate(db_pool: &SqlitePool) -> sqlx::Result<()> {
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(db_pool).await?;
    }
    Ok(())
}

/// A registered account. The password column holds an argon2 hash and is
/// never serialized into API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_online: bool,
    pub last_seen: Option<i64>,
    pub is_blocked: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A two-party thread. `updated_at` is bumped on every message send and
/// drives the conversation-list ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub participant_1: Uuid,
    pub participant_2: Uuid,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Conversation {
    pub fn involves(&self, profile_id: Uuid) -> bool {
        self.participant_1 == profile_id || self.participant_2 == profile_id
    }

    /// The participant that is not `profile_id`.
    pub fn other_participant(&self, profile_id: Uuid) -> Uuid {
        if self.participant_1 == profile_id {
            self.participant_2
        } else {
            self.participant_1
        }
    }
}

/// Delivery state of a message. Transitions are client-driven; the server
/// never confirms delivery, so `delivered` and `failed` are representable
/// but not set by any server path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    Sent,
    Failed,
    Delivered,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sending" => Some(Self::Sending),
            "sent" => Some(Self::Sent),
            "failed" => Some(Self::Failed),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub status: MessageStatus,
    pub is_offline: bool,
    pub is_read: Option<bool>,
    pub is_deleted: Option<bool>,
    pub reply_to_id: Option<Uuid>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_status_round_trips_through_text() {
        for status in [
            MessageStatus::Sending,
            MessageStatus::Sent,
            MessageStatus::Failed,
            MessageStatus::Delivered,
        ] {
            assert_eq!(MessageStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(MessageStatus::parse("queued"), None);
    }

    #[test]
    fn message_status_serializes_lowercase() {
        let json = serde_json::to_string(&MessageStatus::Sent).unwrap();
        assert_eq!(json, "\"sent\"");
    }
}
