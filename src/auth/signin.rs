use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::store;

use super::signup::AuthResponse;
use super::{password, token::TokenKeys};

#[derive(Debug, Serialize, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[axum::debug_handler(state = crate::AppState)]
pub(crate) async fn signin(
    State(db_pool): State<SqlitePool>,
    State(tokens): State<TokenKeys>,
    Json(SigninRequest { email, password }): Json<SigninRequest>,
) -> AppResult<Json<AuthResponse>> {
    // unknown email and wrong password must be indistinguishable
    let Some(mut user) = store::profile_by_email(&db_pool, &email).await? else {
        return Err(AppError::InvalidCredentials);
    };

    if !password::verify(&password, &user.password)? {
        return Err(AppError::InvalidCredentials);
    }

    store::set_online_status(&db_pool, user.id, true).await?;
    user.is_online = true;

    let token = tokens.issue(user.id)?;
    Ok(Json(AuthResponse { token, user }))
}
