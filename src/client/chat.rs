use std::time::Duration;

use uuid::Uuid;

use crate::conversations::{ConversationSummary, MessageWithSender, SendMessageRequest};
use crate::db::{Message, MessageStatus, Profile, unix_now};

use super::api::{Api, ApiError};

/// Fixed refresh interval for the conversation list; there is no push
/// channel, polling is the only update path.
pub const CONVERSATION_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// In-memory chat state for one signed-in user: the conversation list,
/// the messages of the selected conversation and the offline outbox.
///
/// The outbox is deliberately not persisted and never drained
/// automatically; `resend` is the only path that transmits a queued
/// message. Going back online flips a flag and nothing else.
pub struct ChatClient {
    api: Api,
    me: Profile,
    online: bool,
    conversations: Vec<ConversationSummary>,
    selected: Option<Uuid>,
    messages: Vec<MessageWithSender>,
    outbox: Vec<Message>,
}

impl ChatClient {
    pub fn new(api: Api, me: Profile) -> Self {
        Self {
            api,
            me,
            online: true,
            conversations: Vec::new(),
            selected: None,
            messages: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Connectivity toggle. Does not touch the outbox.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn me(&self) -> &Profile {
        &self.me
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub fn messages(&self) -> &[MessageWithSender] {
        &self.messages
    }

    pub fn outbox(&self) -> &[Message] {
        &self.outbox
    }

    /// The poll body: one refresh of the conversation list.
    pub async fn refresh_conversations(&mut self) -> Result<&[ConversationSummary], ApiError> {
        self.conversations = self.api.conversations().await?;
        Ok(&self.conversations)
    }

    /// Refreshes the list forever on the fixed interval. Intended to be
    /// spawned alongside the UI loop.
    pub async fn poll_conversations(&mut self) -> Result<(), ApiError> {
        let mut interval = tokio::time::interval(CONVERSATION_POLL_INTERVAL);
        loop {
            interval.tick().await;
            self.refresh_conversations().await?;
        }
    }

    pub async fn start_conversation(
        &mut self,
        username: &str,
    ) -> Result<ConversationSummary, ApiError> {
        let summary = self.api.create_conversation(username).await?;
        if !self
            .conversations
            .iter()
            .any(|c| c.conversation.id == summary.conversation.id)
        {
            self.conversations.insert(0, summary.clone());
        }
        Ok(summary)
    }

    /// Fetch-on-select: loads the conversation's messages once. The server
    /// marks the other side's messages read as a side effect of this fetch.
    pub async fn select_conversation(&mut self, conversation_id: Uuid) -> Result<(), ApiError> {
        self.messages = self.api.messages(conversation_id).await?;
        self.selected = Some(conversation_id);
        Ok(())
    }

    pub fn selected_conversation(&self) -> Option<Uuid> {
        self.selected
    }

    /// Sends into the selected conversation. Offline, the message is only
    /// synthesized locally: temporary id, status `sending`, appended to the
    /// visible message list and the outbox. It stays unsent until the user
    /// resends it manually.
    pub async fn send(&mut self, content: &str) -> Result<Message, ApiError> {
        let Some(conversation_id) = self.selected else {
            return Err(ApiError::Status {
                status: 400,
                message: "no conversation selected".to_owned(),
            });
        };

        if !self.online {
            let local = Message {
                id: Uuid::now_v7(),
                conversation_id,
                sender_id: self.me.id,
                content: content.to_owned(),
                status: MessageStatus::Sending,
                is_offline: true,
                is_read: None,
                is_deleted: None,
                reply_to_id: None,
                created_at: unix_now(),
            };
            self.outbox.push(local.clone());
            self.messages.push(MessageWithSender {
                message: local.clone(),
                sender: self.me.clone(),
            });
            return Ok(local);
        }

        let req = SendMessageRequest {
            content: content.to_owned(),
            ..Default::default()
        };
        let message = self.api.send_message(conversation_id, &req).await?;
        self.messages.push(MessageWithSender {
            message: message.clone(),
            sender: self.me.clone(),
        });
        Ok(message)
    }

    /// Manual resend of one queued message. On success the local copy is
    /// replaced by the server's row and dropped from the outbox.
    pub async fn resend(&mut self, local_id: Uuid) -> Result<Message, ApiError> {
        let Some(index) = self.outbox.iter().position(|m| m.id == local_id) else {
            return Err(ApiError::Status {
                status: 404,
                message: "message is not queued".to_owned(),
            });
        };

        let queued = self.outbox[index].clone();
        let req = SendMessageRequest {
            content: queued.content.clone(),
            status: Some(MessageStatus::Sent),
            is_offline: Some(true),
            reply_to_id: queued.reply_to_id,
        };
        let sent = self.api.send_message(queued.conversation_id, &req).await?;

        self.outbox.remove(index);
        if let Some(local) = self
            .messages
            .iter_mut()
            .find(|m| m.message.id == local_id)
        {
            local.message = sent.clone();
        }

        Ok(sent)
    }

    pub async fn delete_message(&mut self, message_id: Uuid) -> Result<(), ApiError> {
        self.api.delete_message(message_id).await?;
        if let Some(local) = self
            .messages
            .iter_mut()
            .find(|m| m.message.id == message_id)
        {
            local.message.is_deleted = Some(true);
        }
        Ok(())
    }
}
