use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{AuthResponse, SigninRequest, SignupRequest};
use crate::conversations::{
    ConversationSummary, MessageWithSender, NewConversationRequest, SendMessageRequest,
};
use crate::db::{Message, Profile};
use crate::profiles::{OnlineStatusRequest, UpdateProfileRequest};

#[derive(Debug, Error)]
pub enum ApiError {
    /// A non-2xx response, carrying the server's error string.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Thin typed wrapper over the REST API. Attaches the bearer token to every
/// request and turns non-2xx responses into `ApiError::Status`.
#[derive(Debug, Clone)]
pub struct Api {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl Api {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let req = match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        };

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.json().await?)
        } else {
            let message = resp
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "request failed".to_owned());
            Err(ApiError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }

    pub async fn sign_up(&self, req: &SignupRequest) -> Result<AuthResponse, ApiError> {
        self.send(self.http.post(self.url("/api/auth/signup")).json(req))
            .await
    }

    pub async fn sign_in(&self, req: &SigninRequest) -> Result<AuthResponse, ApiError> {
        self.send(self.http.post(self.url("/api/auth/signin")).json(req))
            .await
    }

    pub async fn current_user(&self) -> Result<Profile, ApiError> {
        self.send(self.http.get(self.url("/api/auth/user"))).await
    }

    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        self.send(self.http.get(self.url("/api/conversations")))
            .await
    }

    pub async fn create_conversation(
        &self,
        username: &str,
    ) -> Result<ConversationSummary, ApiError> {
        let req = NewConversationRequest {
            username: username.to_owned(),
        };
        self.send(self.http.post(self.url("/api/conversations")).json(&req))
            .await
    }

    pub async fn messages(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<MessageWithSender>, ApiError> {
        self.send(
            self.http
                .get(self.url(&format!("/api/conversations/{conversation_id}/messages"))),
        )
        .await
    }

    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        req: &SendMessageRequest,
    ) -> Result<Message, ApiError> {
        self.send(
            self.http
                .post(self.url(&format!("/api/conversations/{conversation_id}/messages")))
                .json(req),
        )
        .await
    }

    pub async fn delete_conversation(&self, conversation_id: Uuid) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(
            self.http
                .delete(self.url(&format!("/api/conversations/{conversation_id}"))),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_message(&self, message_id: Uuid) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(
            self.http
                .delete(self.url(&format!("/api/messages/{message_id}"))),
        )
        .await?;
        Ok(())
    }

    pub async fn update_profile(&self, req: &UpdateProfileRequest) -> Result<Profile, ApiError> {
        self.send(self.http.patch(self.url("/api/profiles/me")).json(req))
            .await
    }

    pub async fn set_online(&self, is_online: bool) -> Result<Profile, ApiError> {
        let req = OnlineStatusRequest { is_online };
        self.send(
            self.http
                .post(self.url("/api/profiles/me/online"))
                .json(&req),
        )
        .await
    }

    pub async fn block_profile(&self, profile_id: Uuid) -> Result<(), ApiError> {
        self.send::<serde_json::Value>(
            self.http
                .post(self.url(&format!("/api/profiles/{profile_id}/block"))),
        )
        .await?;
        Ok(())
    }
}
