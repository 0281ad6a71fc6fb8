use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{Profile, unix_now};
use crate::error::{AppError, AppResult};
use crate::store;

use super::{password, token::TokenKeys};

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: Profile,
}

fn validate(req: &SignupRequest) -> AppResult<()> {
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_owned()));
    }
    if req.username.trim().len() < 3 {
        return Err(AppError::Validation(
            "username must be at least 3 characters".to_owned(),
        ));
    }
    if req.password.len() < 6 {
        return Err(AppError::Validation(
            "password must be at least 6 characters".to_owned(),
        ));
    }
    Ok(())
}

#[axum::debug_handler(state = crate::AppState)]
pub(crate) async fn signup(
    State(db_pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    Json(req): Json<SignupRequest>,
) -> AppResult<Json<AuthResponse>> {
    validate(&req)?;

    // fast-path duplicate checks; the UNIQUE indexes in insert_profile are
    // the authoritative signal when concurrent signups race past these
    if store::profile_by_email(&db_pool, &req.email).await?.is_some() {
        return Err(AppError::DuplicateEmail);
    }
    if store::profile_by_username(&db_pool, &req.username)
        .await?
        .is_some()
    {
        return Err(AppError::DuplicateUsername);
    }

    let now = unix_now();
    let user = Profile {
        id: Uuid::now_v7(),
        email: req.email,
        username: req.username,
        password: password::hash(&req.password)?,
        full_name: req.full_name,
        avatar_url: None,
        is_online: true,
        last_seen: Some(now),
        is_blocked: false,
        created_at: now,
        updated_at: now,
    };

    store::insert_profile(&db_pool, &user).await?;
    tracing::info!(username = %user.username, "new profile");

    let token = tokens.issue(user.id)?;
    Ok(Json(AuthResponse { token, user }))
}
